//! Role-to-permission augmentor.

use std::collections::HashMap;

use async_trait::async_trait;
use identity_manager::BuildError;
use identity_manager_sdk::{
    AuthenticationRequestContext, IdentityError, RequestAttributes, SecurityIdentity,
    SecurityIdentityAugmentor, StringPermission,
};
use tracing::debug;

use super::directory::parse_permissions;
use crate::config::StaticIdentityPluginConfig;

/// Grants every identity the permissions configured for its roles.
///
/// Applies to identities from any provider, not only this plugin's.
pub struct StaticRolesAugmentor {
    role_permissions: HashMap<String, Vec<StringPermission>>,
}

impl StaticRolesAugmentor {
    /// # Errors
    ///
    /// [`BuildError::InvalidConfig`] if a permission does not parse.
    pub fn from_config(cfg: &StaticIdentityPluginConfig) -> Result<Self, BuildError> {
        let role_permissions = cfg
            .role_permissions
            .iter()
            .map(|(role, encoded)| Ok((role.clone(), parse_permissions(encoded)?)))
            .collect::<Result<_, BuildError>>()?;
        Ok(Self { role_permissions })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.role_permissions.is_empty()
    }
}

#[async_trait]
impl SecurityIdentityAugmentor for StaticRolesAugmentor {
    async fn augment(
        &self,
        identity: SecurityIdentity,
        _ctx: &dyn AuthenticationRequestContext,
        _attributes: &RequestAttributes,
    ) -> Result<SecurityIdentity, IdentityError> {
        let granted: Vec<StringPermission> = identity
            .roles()
            .iter()
            .filter_map(|role| self.role_permissions.get(role))
            .flatten()
            .cloned()
            .collect();
        if granted.is_empty() {
            return Ok(identity);
        }

        debug!(count = granted.len(), "Granting role permissions");
        Ok(identity.to_builder().permissions(granted).build())
    }
}
