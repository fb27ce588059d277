//! Two-phase construction of the identity provider manager.

use std::sync::Arc;

use identity_manager_sdk::{
    AuthenticationRequestContext, IdentityProvider, RequestKind, SecurityIdentityAugmentor,
    TypedRequest,
};
use tracing::info;

use super::blocking::TokioBlockingContext;
use super::error::BuildError;
use super::registry::{ErasedProvider, NamedAugmentor, ProviderRegistry, Typed, order_augmentors};
use super::service::Service;
use crate::config::IdentityManagerConfig;

/// Collects providers and augmentors; [`IdentityProviderManagerBuilder::build`]
/// consumes it and returns an immutable [`Service`].
///
/// ```ignore
/// let service = IdentityProviderManagerBuilder::new(IdentityManagerConfig::default())
///     .identity_provider(AnonymousIdentityProvider)
///     .identity_provider(LdapPasswordProvider::new(ldap))
///     .identity_augmentor(RolesAugmentor::new(directory))
///     .build()?;
/// ```
pub struct IdentityProviderManagerBuilder {
    config: IdentityManagerConfig,
    providers: Vec<(RequestKind, Box<dyn ErasedProvider>)>,
    augmentors: Vec<NamedAugmentor>,
    blocking_context: Option<Arc<dyn AuthenticationRequestContext>>,
    first_error: Option<BuildError>,
}

impl Default for IdentityProviderManagerBuilder {
    fn default() -> Self {
        Self::new(IdentityManagerConfig::default())
    }
}

impl IdentityProviderManagerBuilder {
    #[must_use]
    pub fn new(config: IdentityManagerConfig) -> Self {
        Self {
            config,
            providers: Vec::new(),
            augmentors: Vec::new(),
            blocking_context: None,
            first_error: None,
        }
    }

    /// Register a provider under the request kind it declares.
    ///
    /// The declared kind must be the kind of the provider's request type;
    /// providers of custom requests must declare a custom kind. A violation is
    /// reported by [`IdentityProviderManagerBuilder::build`].
    #[must_use]
    pub fn identity_provider<P: IdentityProvider>(mut self, provider: P) -> Self {
        let name = std::any::type_name::<P>();
        let declared = provider.request_kind();
        let expected = <P::Request as TypedRequest>::KIND;
        match (declared, expected) {
            (None, _) => {
                self.first_error
                    .get_or_insert(BuildError::MissingRequestKind { provider: name });
            }
            (Some(kind), Some(expected)) if kind != expected => {
                self.first_error.get_or_insert(BuildError::RequestKindMismatch {
                    provider: name,
                    declared: kind,
                    expected: expected.to_string(),
                });
            }
            (Some(kind), None) if !matches!(kind, RequestKind::Custom(_)) => {
                self.first_error.get_or_insert(BuildError::RequestKindMismatch {
                    provider: name,
                    declared: kind,
                    expected: "custom:<name>".to_owned(),
                });
            }
            (Some(kind), _) => self.providers.push((kind, Box::new(Typed(provider)))),
        }
        self
    }

    #[must_use]
    pub fn identity_augmentor<A: SecurityIdentityAugmentor>(mut self, augmentor: A) -> Self {
        self.augmentors.push(NamedAugmentor::new(augmentor));
        self
    }

    /// Override the blocking execution context handed to providers.
    ///
    /// Defaults to a [`TokioBlockingContext`] sized from the configuration.
    #[must_use]
    pub fn blocking_context(mut self, ctx: Arc<dyn AuthenticationRequestContext>) -> Self {
        self.blocking_context = Some(ctx);
        self
    }

    /// Freeze the registry and the augmentor chain.
    ///
    /// # Errors
    ///
    /// - [`BuildError::MissingAnonymousProvider`] if no provider serves
    ///   anonymous requests
    /// - [`BuildError::MissingRequestKind`] if a custom-request provider did
    ///   not name its kind
    /// - [`BuildError::RequestKindMismatch`] if a provider declared a kind its
    ///   request type cannot serve
    /// - [`BuildError::InvalidConfig`] if `max_blocking_tasks` is zero
    pub fn build(self) -> Result<Service, BuildError> {
        if let Some(err) = self.first_error {
            return Err(err);
        }
        if self.config.max_blocking_tasks == 0 {
            return Err(BuildError::InvalidConfig(
                "max_blocking_tasks must be greater than zero".to_owned(),
            ));
        }

        let registry = ProviderRegistry::new(self.providers);
        if !registry.contains(&RequestKind::Anonymous) {
            return Err(BuildError::MissingAnonymousProvider);
        }
        let augmentors = order_augmentors(self.augmentors);
        let blocking = self.blocking_context.unwrap_or_else(|| {
            Arc::new(TokioBlockingContext::new(self.config.max_blocking_tasks))
        });

        info!(
            providers = registry.len(),
            request_kinds = registry.kinds().count(),
            augmentors = augmentors.len(),
            "Identity provider manager built"
        );

        Ok(Service::new(registry, augmentors, blocking))
    }
}
