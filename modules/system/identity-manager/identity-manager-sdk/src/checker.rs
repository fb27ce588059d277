//! Permission checkers and declarative permission requirements.
//!
//! A [`PermissionChecker`] is an externally supplied capability that decides
//! one named permission from parameters taken from the call site. Checkers are
//! registered once in [`PermissionCheckers`], together with a binding table
//! that maps each checker parameter to a call-site argument.
//!
//! [`PermissionsAllowed`] is the declarative requirement attached to a secured
//! operation: a list of `"name[:action]"` permissions evaluated either
//! disjunctively (default) or conjunctively.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{AccessError, PermissionCheckError};
use crate::identity::SecurityIdentity;
use crate::permission::{PermissionError, StringPermission};

/// Call-site arguments and checker parameters.
pub type CheckParams = HashMap<String, serde_json::Value>;

/// Decides one named permission.
#[async_trait]
pub trait PermissionChecker: Send + Sync {
    /// # Errors
    ///
    /// [`PermissionCheckError::Backend`] if a remote evaluation fails.
    async fn check(
        &self,
        identity: &SecurityIdentity,
        params: &CheckParams,
    ) -> Result<bool, PermissionCheckError>;
}

/// How several checks combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckPolicy {
    /// At least one must grant.
    #[default]
    AnyOf,
    /// All must grant.
    AllOf,
}

struct RegisteredChecker {
    checker: Arc<dyn PermissionChecker>,
    /// `(checker parameter, call-site argument)`; empty passes all arguments through.
    bindings: Vec<(String, String)>,
}

/// Immutable registry of named permission checkers.
#[derive(Default)]
pub struct PermissionCheckers {
    checkers: HashMap<String, RegisteredChecker>,
}

#[derive(Default)]
pub struct PermissionCheckersBuilder {
    checkers: HashMap<String, RegisteredChecker>,
}

impl PermissionCheckersBuilder {
    /// Register `checker` under `name`; it receives every call-site argument.
    #[must_use]
    pub fn checker(self, name: &str, checker: Arc<dyn PermissionChecker>) -> Self {
        self.checker_with_bindings(name, checker, std::iter::empty::<(&str, &str)>())
    }

    /// Register `checker` under `name` with an explicit parameter binding
    /// table of `(checker parameter, call-site argument)` pairs.
    ///
    /// A later registration under the same name replaces the earlier one.
    #[must_use]
    pub fn checker_with_bindings<'a>(
        mut self,
        name: &str,
        checker: Arc<dyn PermissionChecker>,
        bindings: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        let bindings = bindings
            .into_iter()
            .map(|(param, arg)| (param.to_owned(), arg.to_owned()))
            .collect();
        self.checkers
            .insert(name.to_owned(), RegisteredChecker { checker, bindings });
        self
    }

    #[must_use]
    pub fn build(self) -> PermissionCheckers {
        PermissionCheckers {
            checkers: self.checkers,
        }
    }
}

impl PermissionCheckers {
    #[must_use]
    pub fn builder() -> PermissionCheckersBuilder {
        PermissionCheckersBuilder::default()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.checkers.contains_key(name)
    }

    /// Verify that every name refers to a registered checker.
    ///
    /// # Errors
    ///
    /// [`PermissionCheckError::UnknownChecker`] for the first unknown name.
    pub fn validate<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Result<(), PermissionCheckError> {
        for name in names {
            if !self.contains(name) {
                return Err(PermissionCheckError::UnknownChecker(name.to_owned()));
            }
        }
        Ok(())
    }

    /// Run the checker registered under `name`.
    ///
    /// # Errors
    ///
    /// - [`PermissionCheckError::UnknownChecker`] if nothing is registered
    /// - [`PermissionCheckError::MissingArgument`] if a bound argument is absent
    /// - any error of the checker itself
    pub async fn check(
        &self,
        name: &str,
        identity: &SecurityIdentity,
        args: &CheckParams,
    ) -> Result<bool, PermissionCheckError> {
        let registered = self
            .checkers
            .get(name)
            .ok_or_else(|| PermissionCheckError::UnknownChecker(name.to_owned()))?;
        let granted = if registered.bindings.is_empty() {
            registered.checker.check(identity, args).await?
        } else {
            let params = bind(name, &registered.bindings, args)?;
            registered.checker.check(identity, &params).await?
        };
        tracing::debug!(checker = name, granted, "permission checker evaluated");
        Ok(granted)
    }

    /// Run several checkers sequentially and combine them per `policy`.
    ///
    /// Evaluation stops as soon as the outcome is known. With no names,
    /// `AnyOf` denies and `AllOf` grants.
    ///
    /// # Errors
    ///
    /// Same as [`PermissionCheckers::check`].
    pub async fn evaluate_all(
        &self,
        names: &[&str],
        policy: CheckPolicy,
        identity: &SecurityIdentity,
        args: &CheckParams,
    ) -> Result<bool, PermissionCheckError> {
        for name in names {
            let granted = self.check(name, identity, args).await?;
            match (policy, granted) {
                (CheckPolicy::AnyOf, true) => return Ok(true),
                (CheckPolicy::AllOf, false) => return Ok(false),
                _ => {}
            }
        }
        Ok(policy == CheckPolicy::AllOf)
    }
}

fn bind(
    checker: &str,
    bindings: &[(String, String)],
    args: &CheckParams,
) -> Result<CheckParams, PermissionCheckError> {
    bindings
        .iter()
        .map(|(param, arg)| {
            args.get(arg)
                .map(|value| (param.clone(), value.clone()))
                .ok_or_else(|| PermissionCheckError::MissingArgument {
                    checker: checker.to_owned(),
                    argument: arg.clone(),
                })
        })
        .collect()
}

/// Permissions required by a secured operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionsAllowed {
    permissions: Vec<StringPermission>,
    inclusive: bool,
}

impl PermissionsAllowed {
    /// Build from `"name[:action...]"` strings.
    ///
    /// Strings sharing a name are merged into one permission carrying the
    /// union of their actions, so `["resource:crud", "resource:retrieve"]`
    /// yields a single `resource` permission with both actions.
    ///
    /// # Errors
    ///
    /// [`PermissionError`] for the first malformed string.
    pub fn new<I, S>(values: I) -> Result<Self, PermissionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut permissions: Vec<StringPermission> = Vec::new();
        for value in values {
            let parsed = StringPermission::parse(value.as_ref())?;
            if let Some(pos) = permissions.iter().position(|p| p.name() == parsed.name()) {
                let merged = permissions.remove(pos).merge_actions(&parsed);
                permissions.insert(pos, merged);
            } else {
                permissions.push(parsed);
            }
        }
        Ok(Self {
            permissions,
            inclusive: false,
        })
    }

    /// Require every permission instead of any one of them.
    #[must_use]
    pub fn inclusive(mut self, inclusive: bool) -> Self {
        self.inclusive = inclusive;
        self
    }

    #[must_use]
    pub fn permissions(&self) -> &[StringPermission] {
        &self.permissions
    }

    #[must_use]
    pub fn policy(&self) -> CheckPolicy {
        if self.inclusive {
            CheckPolicy::AllOf
        } else {
            CheckPolicy::AnyOf
        }
    }

    async fn granted(
        permission: &StringPermission,
        identity: &SecurityIdentity,
        checkers: &PermissionCheckers,
        args: &CheckParams,
    ) -> Result<bool, PermissionCheckError> {
        if identity.check_permission(permission).await? {
            return Ok(true);
        }
        if checkers.contains(permission.name()) {
            return checkers.check(permission.name(), identity, args).await;
        }
        Ok(false)
    }

    /// Evaluate against `identity`.
    ///
    /// Each permission is checked on the identity first; when the identity
    /// does not grant it, the checker registered under the permission name
    /// (if any) decides.
    ///
    /// # Errors
    ///
    /// Propagates identity check and checker failures.
    pub async fn evaluate(
        &self,
        identity: &SecurityIdentity,
        checkers: &PermissionCheckers,
        args: &CheckParams,
    ) -> Result<bool, PermissionCheckError> {
        let policy = self.policy();
        for permission in &self.permissions {
            let granted = Self::granted(permission, identity, checkers, args).await?;
            match (policy, granted) {
                (CheckPolicy::AnyOf, true) => return Ok(true),
                (CheckPolicy::AllOf, false) => return Ok(false),
                _ => {}
            }
        }
        Ok(policy == CheckPolicy::AllOf)
    }

    /// Like [`PermissionsAllowed::evaluate`] but turns a denial into an error.
    ///
    /// # Errors
    ///
    /// - [`AccessError::Unauthorized`] when an anonymous identity is denied
    /// - [`AccessError::Forbidden`] when an authenticated identity is denied
    /// - [`AccessError::Check`] when evaluation fails
    pub async fn enforce(
        &self,
        identity: &SecurityIdentity,
        checkers: &PermissionCheckers,
        args: &CheckParams,
    ) -> Result<(), AccessError> {
        if self.evaluate(identity, checkers, args).await? {
            Ok(())
        } else if identity.is_anonymous() {
            Err(AccessError::Unauthorized)
        } else {
            Err(AccessError::Forbidden)
        }
    }
}
