//! Resolution engine.

use std::sync::Arc;

use identity_manager_sdk::blocking;
use identity_manager_sdk::{
    AuthenticationRequest, AuthenticationRequestContext, IdentityError, RequestAttributes,
    RequestKind, SecurityIdentity,
};
use tracing::{debug, warn};

use super::error::DomainError;
use super::registry::{ErasedProvider, NamedAugmentor, ProviderRegistry};

/// Immutable identity provider manager.
///
/// Providers of one request kind are tried strictly one after another in
/// priority order:
///
/// - an identity ends the search
/// - `None` moves on to the next provider
/// - an invalid-credentials verdict stops the search (fail-fast)
/// - a backend failure is logged and the next provider is tried (fail-through)
///
/// The identity is then passed through every augmentor in priority order,
/// each one seeing the previous one's output.
pub struct Service {
    registry: ProviderRegistry,
    augmentors: Box<[NamedAugmentor]>,
    blocking: Arc<dyn AuthenticationRequestContext>,
}

impl std::fmt::Debug for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service").finish_non_exhaustive()
    }
}

impl Service {
    pub(crate) fn new(
        registry: ProviderRegistry,
        augmentors: Box<[NamedAugmentor]>,
        blocking: Arc<dyn AuthenticationRequestContext>,
    ) -> Self {
        Self {
            registry,
            augmentors,
            blocking,
        }
    }

    /// Request kinds that have at least one provider.
    pub fn request_kinds(&self) -> impl Iterator<Item = &RequestKind> {
        self.registry.kinds()
    }

    /// Names of the providers serving `kind`, in the order they are tried.
    /// Empty if none is registered.
    #[must_use]
    pub fn provider_names(&self, kind: &RequestKind) -> impl Iterator<Item = &'static str> + '_ {
        self.registry
            .providers(kind)
            .unwrap_or_default()
            .iter()
            .map(|provider| provider.name())
    }

    /// Number of providers serving `kind`.
    #[must_use]
    pub fn provider_count(&self, kind: &RequestKind) -> usize {
        self.registry.providers(kind).map_or(0, <[_]>::len)
    }

    /// Resolve `request` into an identity.
    ///
    /// Dropping the returned future abandons the resolution; the provider or
    /// augmentor in flight is dropped with it and no later step runs.
    ///
    /// # Errors
    ///
    /// - [`DomainError::NoProvider`] if nothing is registered for the kind
    /// - [`DomainError::InvalidCredentials`] on a fail-fast verdict
    /// - [`DomainError::Exhausted`] if every provider declined or failed
    /// - [`DomainError::Augmentor`] if an augmentor failed
    #[tracing::instrument(skip_all, fields(kind = %request.kind()))]
    pub async fn authenticate(
        &self,
        request: &AuthenticationRequest,
    ) -> Result<SecurityIdentity, DomainError> {
        let kind = request.kind();
        let Some(providers) = self.registry.providers(&kind) else {
            return Err(DomainError::NoProvider { kind });
        };
        let identity = Self::dispatch(&kind, providers, request, self.blocking.as_ref()).await?;
        self.augment(identity, request.attributes()).await
    }

    /// Blocking variant of [`Service::authenticate`].
    ///
    /// # Errors
    ///
    /// Same as [`Service::authenticate`].
    pub fn authenticate_blocking(
        &self,
        request: &AuthenticationRequest,
    ) -> Result<SecurityIdentity, DomainError> {
        blocking::wait(self.authenticate(request))
    }

    async fn dispatch(
        kind: &RequestKind,
        providers: &[Box<dyn ErasedProvider>],
        request: &AuthenticationRequest,
        ctx: &dyn AuthenticationRequestContext,
    ) -> Result<SecurityIdentity, DomainError> {
        let mut backend_failures = 0usize;

        for provider in providers {
            let name = provider.name();
            debug!(provider = name, priority = provider.priority(), "Trying identity provider");

            match provider.authenticate(request, ctx).await {
                Ok(Some(identity)) => {
                    debug!(provider = name, "Identity provider authenticated request");
                    return Ok(identity);
                }
                Ok(None) => debug!(provider = name, "Identity provider declined request"),
                Err(IdentityError::InvalidCredentials(source)) => {
                    debug!(provider = name, "Identity provider rejected credentials");
                    return Err(DomainError::InvalidCredentials {
                        kind: kind.clone(),
                        provider: name,
                        source,
                    });
                }
                Err(IdentityError::Backend(error)) => {
                    backend_failures += 1;
                    warn!(
                        provider = name,
                        error = %error,
                        "Identity provider backend failed, trying next provider"
                    );
                }
            }
        }

        Err(DomainError::Exhausted {
            kind: kind.clone(),
            tried: providers.len(),
            backend_failures,
        })
    }

    async fn augment(
        &self,
        mut identity: SecurityIdentity,
        attributes: &RequestAttributes,
    ) -> Result<SecurityIdentity, DomainError> {
        for entry in &self.augmentors {
            debug!(augmentor = entry.name, "Applying identity augmentor");
            identity = entry
                .augmentor
                .augment(identity, self.blocking.as_ref(), attributes)
                .await
                .map_err(|source| DomainError::Augmentor {
                    augmentor: entry.name,
                    source,
                })?;
        }
        Ok(identity)
    }
}
