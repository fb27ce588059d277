//! The resolved security identity.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::blocking;
use crate::credential::{Credential, CredentialKind, CredentialType};
use crate::error::PermissionCheckError;
use crate::permission::{Permission, StringPermission};

/// Prefix of attribute keys owned by the identity manager and its plugins.
pub const RESERVED_ATTRIBUTE_PREFIX: &str = "idm.";

/// Attribute holding the provider-specific user representation.
pub const USER_ATTRIBUTE: &str = "idm.user";

/// A named identity subject.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Principal {
    name: String,
}

impl Principal {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Deferred permission evaluation attached to an identity, typically by an
/// augmentor that knows how to ask a remote policy service.
///
/// Consulted only when the identity's own permission set does not grant the
/// requested permission.
#[async_trait]
pub trait PermissionCheck: Send + Sync {
    /// # Errors
    ///
    /// Returns [`PermissionCheckError`] if the evaluation itself fails.
    async fn check(
        &self,
        identity: &SecurityIdentity,
        permission: &dyn Permission,
    ) -> Result<bool, PermissionCheckError>;
}

struct Inner {
    principal: Option<Principal>,
    roles: BTreeSet<String>,
    permissions: HashSet<StringPermission>,
    credentials: HashMap<CredentialKind, Credential>,
    attributes: HashMap<String, serde_json::Value>,
    permission_checks: Vec<Arc<dyn PermissionCheck>>,
}

/// Immutable result of authentication.
///
/// Cloning is cheap and the value can be shared across tasks without locking.
/// Augmentors derive new identities with [`SecurityIdentity::to_builder`].
#[derive(Clone)]
pub struct SecurityIdentity {
    inner: Arc<Inner>,
}

impl SecurityIdentity {
    #[must_use]
    pub fn builder() -> SecurityIdentityBuilder {
        SecurityIdentityBuilder::default()
    }

    /// The anonymous identity: no principal, roles, permissions or credentials.
    #[must_use]
    pub fn anonymous() -> Self {
        SecurityIdentityBuilder::default().build()
    }

    /// Start a builder pre-populated with everything this identity holds.
    #[must_use]
    pub fn to_builder(&self) -> SecurityIdentityBuilder {
        let inner = &self.inner;
        SecurityIdentityBuilder {
            principal: inner.principal.clone(),
            roles: inner.roles.clone(),
            permissions: inner.permissions.clone(),
            credentials: inner.credentials.clone(),
            attributes: inner.attributes.clone(),
            permission_checks: inner.permission_checks.clone(),
        }
    }

    /// `None` for the anonymous identity.
    #[must_use]
    pub fn principal(&self) -> Option<&Principal> {
        self.inner.principal.as_ref()
    }

    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.inner.principal.is_none()
    }

    #[must_use]
    pub fn roles(&self) -> &BTreeSet<String> {
        &self.inner.roles
    }

    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.inner.roles.contains(role)
    }

    /// Pre-resolved permissions only; deferred checks are not enumerable.
    #[must_use]
    pub fn permissions(&self) -> &HashSet<StringPermission> {
        &self.inner.permissions
    }

    pub fn credentials(&self) -> impl Iterator<Item = &Credential> {
        self.inner.credentials.values()
    }

    #[must_use]
    pub fn credential<C: CredentialType>(&self) -> Option<&C> {
        self.inner
            .credentials
            .get(&C::KIND)
            .and_then(C::from_credential)
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&serde_json::Value> {
        self.inner.attributes.get(name)
    }

    #[must_use]
    pub fn attributes(&self) -> &HashMap<String, serde_json::Value> {
        &self.inner.attributes
    }

    /// Check whether this identity holds `permission`.
    ///
    /// The pre-resolved permission set is consulted first; when it does not
    /// grant the permission, attached [`PermissionCheck`]s are asked in order
    /// until one grants it. A denial is `Ok(false)`, not an error.
    ///
    /// # Errors
    ///
    /// Propagates the first failure of an attached check.
    pub async fn check_permission(
        &self,
        permission: &dyn Permission,
    ) -> Result<bool, PermissionCheckError> {
        if self
            .inner
            .permissions
            .iter()
            .any(|held| held.implies(permission))
        {
            return Ok(true);
        }
        for check in &self.inner.permission_checks {
            if check.check(self, permission).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Shorthand for a `"name[:action...]"` permission.
    ///
    /// # Errors
    ///
    /// [`PermissionCheckError::InvalidPermission`] if `permission` does not
    /// parse; otherwise as [`SecurityIdentity::check_permission`].
    pub async fn check_permission_str(&self, permission: &str) -> Result<bool, PermissionCheckError> {
        let permission = StringPermission::parse(permission)?;
        self.check_permission(&permission).await
    }

    /// Blocking variant of [`SecurityIdentity::check_permission`].
    ///
    /// # Errors
    ///
    /// Same as [`SecurityIdentity::check_permission`], returned unchanged.
    pub fn check_permission_blocking(
        &self,
        permission: &dyn Permission,
    ) -> Result<bool, PermissionCheckError> {
        blocking::wait(self.check_permission(permission))
    }

    /// Blocking variant of [`SecurityIdentity::check_permission_str`].
    ///
    /// # Errors
    ///
    /// Same as [`SecurityIdentity::check_permission_str`].
    pub fn check_permission_str_blocking(
        &self,
        permission: &str,
    ) -> Result<bool, PermissionCheckError> {
        blocking::wait(self.check_permission_str(permission))
    }
}

impl fmt::Debug for SecurityIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = &self.inner;
        f.debug_struct("SecurityIdentity")
            .field("principal", &inner.principal)
            .field("roles", &inner.roles)
            .field("permissions", &inner.permissions)
            .field("credentials", &inner.credentials)
            .field("attributes", &inner.attributes)
            .field("permission_checks", &inner.permission_checks.len())
            .finish()
    }
}

#[derive(Default)]
pub struct SecurityIdentityBuilder {
    principal: Option<Principal>,
    roles: BTreeSet<String>,
    permissions: HashSet<StringPermission>,
    credentials: HashMap<CredentialKind, Credential>,
    attributes: HashMap<String, serde_json::Value>,
    permission_checks: Vec<Arc<dyn PermissionCheck>>,
}

impl SecurityIdentityBuilder {
    /// Setting a principal makes the identity non-anonymous.
    #[must_use]
    pub fn principal(mut self, principal: Principal) -> Self {
        self.principal = Some(principal);
        self
    }

    #[must_use]
    pub fn role(mut self, role: &str) -> Self {
        self.roles.insert(role.to_owned());
        self
    }

    #[must_use]
    pub fn roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles.extend(roles.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn permission(mut self, permission: StringPermission) -> Self {
        self.permissions.insert(permission);
        self
    }

    #[must_use]
    pub fn permissions(mut self, permissions: impl IntoIterator<Item = StringPermission>) -> Self {
        self.permissions.extend(permissions);
        self
    }

    /// Replaces any credential of the same kind.
    #[must_use]
    pub fn credential(mut self, credential: impl Into<Credential>) -> Self {
        let credential = credential.into();
        self.credentials.insert(credential.kind(), credential);
        self
    }

    #[must_use]
    pub fn attribute(mut self, name: &str, value: serde_json::Value) -> Self {
        self.attributes.insert(name.to_owned(), value);
        self
    }

    #[must_use]
    pub fn permission_check(mut self, check: Arc<dyn PermissionCheck>) -> Self {
        self.permission_checks.push(check);
        self
    }

    #[must_use]
    pub fn build(self) -> SecurityIdentity {
        SecurityIdentity {
            inner: Arc::new(Inner {
                principal: self.principal,
                roles: self.roles,
                permissions: self.permissions,
                credentials: self.credentials,
                attributes: self.attributes,
                permission_checks: self.permission_checks,
            }),
        }
    }
}
