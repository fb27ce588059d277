//! Permission model.
//!
//! [`Permission`] is the object-safe abstraction every authorization check is
//! expressed in; [`StringPermission`] is the built-in, name + actions based
//! implementation. Custom, parameterized permission types implement
//! [`Permission`] directly and are usually evaluated by a permission checker
//! that downcasts them through [`Permission::as_any`].

use std::any::Any;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Separator used when rendering a permission's actions as a single string.
pub const ACTIONS_SEPARATOR: char = ',';

/// Separator between a permission name and its actions in the
/// `"name:action1:action2"` encoding.
pub const PERMISSION_TO_ACTION_SEPARATOR: char = ':';

/// A named, optionally action-scoped authorization grant.
pub trait Permission: fmt::Debug + Send + Sync + 'static {
    /// Permission name.
    fn name(&self) -> &str;

    /// Comma-joined actions, `None` when the permission carries no actions.
    fn actions(&self) -> Option<String> {
        None
    }

    /// Returns `true` when holding `self` satisfies the `required` permission.
    fn implies(&self, required: &dyn Permission) -> bool;

    /// Upcast used by checkers to recover the concrete permission type.
    fn as_any(&self) -> &dyn Any;
}

/// Invalid permission name or action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{what} must not contain '{separator}'")]
    ContainsSeparator { what: &'static str, separator: char },
}

/// Permission identified by a name and a (possibly empty) set of actions.
///
/// Equality and hashing cover both the name and the action set, so two
/// permissions with the same name but different actions are distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StringPermission {
    name: String,
    actions: BTreeSet<String>,
}

impl StringPermission {
    /// Create a permission from a name and its actions.
    ///
    /// Name and actions are trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionError`] if the name or an action is empty after
    /// trimming, or contains [`ACTIONS_SEPARATOR`] or
    /// [`PERMISSION_TO_ACTION_SEPARATOR`].
    pub fn new<I, S>(name: &str, actions: I) -> Result<Self, PermissionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let name = validate_and_trim(name, "Permission name")?;
        let actions = actions
            .into_iter()
            .map(|a| validate_and_trim(a.as_ref(), "Action"))
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self { name, actions })
    }

    /// Create a name-only permission.
    ///
    /// # Errors
    ///
    /// Same as [`StringPermission::new`].
    pub fn named(name: &str) -> Result<Self, PermissionError> {
        Self::new(name, std::iter::empty::<&str>())
    }

    /// Parse the `"name:action1:action2"` encoding.
    ///
    /// # Errors
    ///
    /// Same as [`StringPermission::new`] for each segment.
    pub fn parse(encoded: &str) -> Result<Self, PermissionError> {
        let mut segments = encoded.split(PERMISSION_TO_ACTION_SEPARATOR);
        let name = segments.next().unwrap_or_default();
        Self::new(name, segments)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn action_set(&self) -> &BTreeSet<String> {
        &self.actions
    }

    /// Union of both action sets; names must match.
    #[must_use]
    pub(crate) fn merge_actions(mut self, other: &Self) -> Self {
        debug_assert_eq!(self.name, other.name);
        self.actions.extend(other.actions.iter().cloned());
        self
    }
}

fn validate_and_trim(raw: &str, what: &'static str) -> Result<String, PermissionError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PermissionError::Empty(what));
    }
    for separator in [ACTIONS_SEPARATOR, PERMISSION_TO_ACTION_SEPARATOR] {
        if trimmed.contains(separator) {
            return Err(PermissionError::ContainsSeparator { what, separator });
        }
    }
    Ok(trimmed.to_owned())
}

impl Permission for StringPermission {
    fn name(&self) -> &str {
        &self.name
    }

    fn actions(&self) -> Option<String> {
        if self.actions.is_empty() {
            return None;
        }
        let mut rendered = String::new();
        for action in &self.actions {
            if !rendered.is_empty() {
                rendered.push(ACTIONS_SEPARATOR);
            }
            rendered.push_str(action);
        }
        Some(rendered)
    }

    fn implies(&self, required: &dyn Permission) -> bool {
        let Some(required) = required.as_any().downcast_ref::<StringPermission>() else {
            return false;
        };
        if self.name != required.name {
            return false;
        }
        // name-only requirement is satisfied by any same-named grant
        if required.actions.is_empty() {
            return true;
        }
        !self.actions.is_disjoint(&required.actions)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Display for StringPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for action in &self.actions {
            write!(f, "{PERMISSION_TO_ACTION_SEPARATOR}{action}")?;
        }
        Ok(())
    }
}

impl FromStr for StringPermission {
    type Err = PermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
