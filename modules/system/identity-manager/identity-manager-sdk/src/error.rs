//! Error types for the identity manager module.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::permission::PermissionError;
use crate::request::RequestKind;

/// Credentials were presented but could not be verified.
///
/// Deliberately carries no message. Diagnostic attributes may be attached for
/// internal logging; they are never part of the `Display` output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("authentication failed")]
pub struct AuthenticationFailed {
    attributes: BTreeMap<String, String>,
}

impl AuthenticationFailed {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an internal diagnostic attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(key.to_owned(), value.into());
        self
    }

    #[must_use]
    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }
}

/// Errors raised by identity providers and augmentors.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Definitive verdict: the credentials are invalid. Stops the provider chain.
    #[error(transparent)]
    InvalidCredentials(#[from] AuthenticationFailed),

    /// The provider's backend failed (store unreachable, timeout, ...).
    /// The next provider is tried.
    #[error("identity backend failure: {0}")]
    Backend(#[from] anyhow::Error),
}

impl IdentityError {
    /// Shorthand for an attribute-free [`IdentityError::InvalidCredentials`].
    #[must_use]
    pub fn invalid_credentials() -> Self {
        Self::InvalidCredentials(AuthenticationFailed::new())
    }

    #[must_use]
    pub fn backend(msg: impl std::fmt::Display + std::fmt::Debug + Send + Sync + 'static) -> Self {
        Self::Backend(anyhow::Error::msg(msg))
    }
}

/// Errors returned by the identity provider manager.
#[derive(Debug, Error)]
pub enum AuthenticationError {
    /// Configuration error: nothing can authenticate this request type.
    #[error("no identity provider registered for request type '{kind}'")]
    NoProvider { kind: RequestKind },

    /// Invalid credentials, or every provider declined.
    #[error(transparent)]
    Failed(#[from] AuthenticationFailed),

    /// An augmentor's backend failed after successful authentication.
    #[error("identity augmentation failed: {0}")]
    Augmentation(anyhow::Error),

    /// The owning request scope ended before the identity was resolved.
    #[error("authentication scope ended before the identity was resolved")]
    ScopeEnded,
}

impl AuthenticationError {
    /// `true` for configuration errors, which must never be retried.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::NoProvider { .. })
    }
}

/// Errors raised while evaluating a permission.
#[derive(Debug, Error)]
pub enum PermissionCheckError {
    #[error("invalid permission: {0}")]
    InvalidPermission(#[from] PermissionError),

    #[error("unknown permission checker '{0}'")]
    UnknownChecker(String),

    #[error("permission checker '{checker}' is missing call-site argument '{argument}'")]
    MissingArgument { checker: String, argument: String },

    /// Remote or deferred evaluation failed.
    #[error("permission check failed: {0}")]
    Backend(#[from] anyhow::Error),
}

/// Outcome of enforcing a permission requirement.
#[derive(Debug, Error)]
pub enum AccessError {
    /// Denied for an anonymous identity: authenticating may help.
    #[error("unauthorized")]
    Unauthorized,

    /// Denied for an authenticated identity.
    #[error("forbidden")]
    Forbidden,

    #[error(transparent)]
    Check(#[from] PermissionCheckError),
}
