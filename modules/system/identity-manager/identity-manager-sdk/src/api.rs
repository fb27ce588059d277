//! Public API trait for the identity provider manager.
//!
//! Consumed by the request-handling layer: it builds an
//! [`AuthenticationRequest`] from whatever the transport carried and asks the
//! manager for the resulting [`SecurityIdentity`].

use async_trait::async_trait;

use crate::error::AuthenticationError;
use crate::identity::SecurityIdentity;
use crate::request::AuthenticationRequest;

/// Resolves authentication requests into security identities.
///
/// ```ignore
/// let identity = manager.authenticate(AuthenticationRequest::ANONYMOUS).await?;
/// assert!(identity.is_anonymous());
/// ```
#[async_trait]
pub trait IdentityProviderManager: Send + Sync {
    /// Resolve `request`.
    ///
    /// # Errors
    ///
    /// - `NoProvider` if no provider is registered for the request kind
    /// - `Failed` if the credentials are invalid or every provider declined
    /// - `Augmentation` if an augmentor's backend failed
    async fn authenticate(
        &self,
        request: AuthenticationRequest,
    ) -> Result<SecurityIdentity, AuthenticationError>;

    /// Blocking variant of [`IdentityProviderManager::authenticate`].
    ///
    /// # Errors
    ///
    /// Same as [`IdentityProviderManager::authenticate`].
    fn authenticate_blocking(
        &self,
        request: AuthenticationRequest,
    ) -> Result<SecurityIdentity, AuthenticationError>;
}
