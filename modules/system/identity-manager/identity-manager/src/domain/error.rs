//! Domain errors for the identity manager.

use identity_manager_sdk::{AuthenticationError, AuthenticationFailed, IdentityError, RequestKind};

/// Errors detected while building the manager. Fatal.
#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    #[error(
        "no anonymous identity provider registered; one is required to create the anonymous identity"
    )]
    MissingAnonymousProvider,

    #[error("identity provider '{provider}' serves custom requests but declares no request kind")]
    MissingRequestKind { provider: &'static str },

    #[error(
        "identity provider '{provider}' declares request kind '{declared}' but its request type serves '{expected}'"
    )]
    RequestKindMismatch {
        provider: &'static str,
        declared: RequestKind,
        expected: String,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Internal resolution errors.
///
/// Carry the detail operators need; converted into the public
/// [`AuthenticationError`] with that detail stripped.
#[derive(thiserror::Error, Debug)]
pub enum DomainError {
    #[error("no identity provider registered for request type '{kind}'")]
    NoProvider { kind: RequestKind },

    #[error(
        "all {tried} identity providers for '{kind}' declined ({backend_failures} backend failures)"
    )]
    Exhausted {
        kind: RequestKind,
        tried: usize,
        backend_failures: usize,
    },

    #[error("invalid credentials for '{kind}' rejected by '{provider}'")]
    InvalidCredentials {
        kind: RequestKind,
        provider: &'static str,
        source: AuthenticationFailed,
    },

    #[error("augmentor '{augmentor}' failed: {source}")]
    Augmentor {
        augmentor: &'static str,
        source: IdentityError,
    },
}

impl From<DomainError> for AuthenticationError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NoProvider { kind } => Self::NoProvider { kind },
            DomainError::Exhausted { .. } => Self::Failed(AuthenticationFailed::new()),
            DomainError::InvalidCredentials { source, .. }
            | DomainError::Augmentor {
                source: IdentityError::InvalidCredentials(source),
                ..
            } => Self::Failed(source),
            DomainError::Augmentor {
                source: IdentityError::Backend(source),
                ..
            } => Self::Augmentation(source),
        }
    }
}
