//! Provider-side API: identity providers, augmentors and the blocking
//! execution context they receive.
//!
//! Implementations are registered with the identity provider manager builder;
//! the manager routes each request to the providers of its exact kind.

use async_trait::async_trait;

use crate::error::IdentityError;
use crate::identity::SecurityIdentity;
use crate::request::{RequestAttributes, RequestKind, TypedRequest};

/// Lowest priority reserved for system providers.
pub const SYSTEM_LAST: i32 = 0;

/// Highest priority reserved for system providers.
pub const SYSTEM_FIRST: i32 = 1000;

/// Default provider priority: ahead of every system provider.
pub const DEFAULT_PROVIDER_PRIORITY: i32 = SYSTEM_FIRST + 1;

/// Outcome of a provider: `Ok(None)` means "not mine, try the next provider".
pub type ProviderResult = Result<Option<SecurityIdentity>, IdentityError>;

/// Synchronous work submitted to [`AuthenticationRequestContext::run_blocking`].
pub type BlockingWork = Box<dyn FnOnce() -> ProviderResult + Send + 'static>;

/// Runs blocking work without stalling the async scheduler.
///
/// Providers and augmentors whose logic performs synchronous I/O (password
/// hashing, blocking drivers) must submit that work here instead of running it
/// on the calling task.
#[async_trait]
pub trait AuthenticationRequestContext: Send + Sync {
    /// Run `work` on an execution context dedicated to blocking work.
    ///
    /// # Errors
    ///
    /// Returns whatever `work` returns, or [`IdentityError::Backend`] if the
    /// work could not be run to completion (e.g. it panicked).
    async fn run_blocking(&self, work: BlockingWork) -> ProviderResult;
}

/// Authenticates one concrete request type.
#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    type Request: TypedRequest;

    /// Request kind this provider is registered under.
    ///
    /// Defaults to the kind of [`IdentityProvider::Request`]; providers of
    /// custom requests must override it with their custom kind name.
    fn request_kind(&self) -> Option<RequestKind> {
        <Self::Request as TypedRequest>::KIND
    }

    /// Higher runs first.
    fn priority(&self) -> i32 {
        DEFAULT_PROVIDER_PRIORITY
    }

    /// Attempt authentication.
    ///
    /// # Errors
    ///
    /// - [`IdentityError::InvalidCredentials`] to reject the credentials
    ///   outright; no further provider is tried
    /// - [`IdentityError::Backend`] when the backend failed; the next provider
    ///   is tried
    async fn authenticate(
        &self,
        request: &Self::Request,
        ctx: &dyn AuthenticationRequestContext,
    ) -> ProviderResult;
}

/// Post-authentication transform enriching or correcting an identity.
#[async_trait]
pub trait SecurityIdentityAugmentor: Send + Sync + 'static {
    /// Higher runs first.
    fn priority(&self) -> i32 {
        0
    }

    /// Produce the next identity from `identity`.
    ///
    /// `attributes` are the attributes of the original request.
    ///
    /// # Errors
    ///
    /// Any [`IdentityError`]; resolution fails with it.
    async fn augment(
        &self,
        identity: SecurityIdentity,
        ctx: &dyn AuthenticationRequestContext,
        attributes: &RequestAttributes,
    ) -> Result<SecurityIdentity, IdentityError>;
}
