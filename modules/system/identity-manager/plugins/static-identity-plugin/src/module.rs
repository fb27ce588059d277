//! Static identity plugin registration.

use std::sync::Arc;

use identity_manager::{AnonymousIdentityProvider, BuildError, IdentityProviderManagerBuilder};
use tracing::{info, warn};

use crate::config::StaticIdentityPluginConfig;
use crate::domain::{
    Directory, StaticPasswordProvider, StaticRolesAugmentor, StaticTokenProvider,
    StaticTrustedProvider,
};

/// Static identity plugin.
///
/// Validates the configuration once, then registers its providers and
/// augmentor with an [`IdentityProviderManagerBuilder`]:
/// - the anonymous provider, unless disabled
/// - username/password and token providers when users are configured
/// - the trusted provider when enabled
/// - the roles augmentor when role permissions are configured
pub struct StaticIdentityPlugin {
    directory: Arc<Directory>,
    augmentor: StaticRolesAugmentor,
    priority: i32,
    anonymous: bool,
    trusted: bool,
}

impl StaticIdentityPlugin {
    /// # Errors
    ///
    /// [`BuildError::InvalidConfig`] if the configuration is inconsistent.
    pub fn from_config(cfg: &StaticIdentityPluginConfig) -> Result<Self, BuildError> {
        if !cfg.users.is_empty() {
            warn!(
                "Static identity plugin holds plaintext credentials from configuration. \
                 Do NOT use it in production."
            );
        }

        let directory = Arc::new(Directory::from_config(cfg)?);
        let augmentor = StaticRolesAugmentor::from_config(cfg)?;

        info!(
            priority = cfg.priority,
            anonymous = cfg.anonymous,
            trusted = cfg.trusted,
            user_count = directory.user_count(),
            token_count = directory.token_count(),
            role_count = cfg.role_permissions.len(),
            "Loaded plugin configuration"
        );

        Ok(Self {
            directory,
            augmentor,
            priority: cfg.priority,
            anonymous: cfg.anonymous,
            trusted: cfg.trusted,
        })
    }

    /// Register this plugin's providers and augmentor.
    #[must_use]
    pub fn register(self, builder: IdentityProviderManagerBuilder) -> IdentityProviderManagerBuilder {
        let mut builder = builder;
        if self.anonymous {
            builder = builder.identity_provider(AnonymousIdentityProvider);
        }
        if self.directory.user_count() > 0 {
            builder = builder
                .identity_provider(StaticPasswordProvider::new(
                    Arc::clone(&self.directory),
                    self.priority,
                ))
                .identity_provider(StaticTokenProvider::new(
                    Arc::clone(&self.directory),
                    self.priority,
                ));
        }
        if self.trusted {
            builder = builder.identity_provider(StaticTrustedProvider::new(
                Arc::clone(&self.directory),
                self.priority,
            ));
        }
        if !self.augmentor.is_empty() {
            builder = builder.identity_augmentor(self.augmentor);
        }

        info!("Static identity plugin registered");
        builder
    }
}
