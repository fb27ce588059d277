//! Identity Manager Module
//!
//! Routes authentication requests to the identity providers registered for
//! their exact request kind, in priority order, and pipes the resulting
//! identity through the augmentor chain.
//!
//! Build once with [`IdentityProviderManagerBuilder`]; the result is immutable
//! and shared without locking. Consumers use the
//! [`identity_manager_sdk::IdentityProviderManager`] trait, implemented by
//! [`IdentityProviderManagerLocalClient`].
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod domain;

pub use config::IdentityManagerConfig;
pub use domain::{
    AnonymousIdentityProvider, BuildError, DomainError, IdentityAssociation,
    IdentityProviderManagerBuilder, IdentityProviderManagerLocalClient, Service,
    TokioBlockingContext,
};
