//! Identity Manager SDK
//!
//! This crate provides the public API for the `identity_manager` module:
//!
//! - [`IdentityProviderManager`] - Public API trait for consumers
//! - [`IdentityProvider`], [`SecurityIdentityAugmentor`] - Provider API traits
//! - [`AuthenticationRequestContext`] - Blocking-execution capability handed to providers
//! - [`AuthenticationRequest`] - What is being proven
//! - [`SecurityIdentity`] - The resolved identity and its permission checks
//! - [`StringPermission`], [`PermissionsAllowed`], [`PermissionCheckers`] - Authorization model
//! - [`AuthenticationError`], [`IdentityError`] - Error types
//!
//! ## Usage
//!
//! ```ignore
//! use identity_manager_sdk::{AuthenticationRequest, IdentityProviderManager};
//!
//! let identity = manager.authenticate(request).await?;
//! if identity.check_permission_str("docs:read").await? {
//!     // ...
//! }
//! ```
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod api;
pub mod blocking;
pub mod checker;
pub mod credential;
pub mod error;
pub mod identity;
pub mod permission;
pub mod provider_api;
pub mod request;

// Re-export main types at crate root
pub use api::IdentityProviderManager;
pub use checker::{CheckParams, CheckPolicy, PermissionChecker, PermissionCheckers, PermissionsAllowed};
pub use credential::{
    CertificateCredential, Credential, CredentialKind, CredentialType, PasswordCredential,
    TokenCredential,
};
pub use error::{
    AccessError, AuthenticationError, AuthenticationFailed, IdentityError, PermissionCheckError,
};
pub use identity::{
    PermissionCheck, Principal, RESERVED_ATTRIBUTE_PREFIX, SecurityIdentity,
    SecurityIdentityBuilder, USER_ATTRIBUTE,
};
pub use permission::{Permission, PermissionError, StringPermission};
pub use provider_api::{
    AuthenticationRequestContext, BlockingWork, DEFAULT_PROVIDER_PRIORITY, IdentityProvider,
    ProviderResult, SYSTEM_FIRST, SYSTEM_LAST, SecurityIdentityAugmentor,
};
pub use request::{
    AnonymousRequest, AuthenticationRequest, CertificateRequest, CustomRequest, RequestAttributes,
    RequestKind, TokenRequest, TrustedRequest, TypedRequest, UsernamePasswordRequest,
};
