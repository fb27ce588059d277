//! Domain layer for the identity manager.

pub mod anonymous;
pub mod association;
pub mod blocking;
pub mod builder;
pub mod error;
pub mod local_client;
mod registry;
pub mod service;

pub use anonymous::AnonymousIdentityProvider;
pub use association::IdentityAssociation;
pub use blocking::TokioBlockingContext;
pub use builder::IdentityProviderManagerBuilder;
pub use error::{BuildError, DomainError};
pub use local_client::IdentityProviderManagerLocalClient;
pub use service::Service;
