#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Static Identity Plugin
//!
//! Identity providers backed by static configuration, for development and
//! testing.
//!
//! ## Providers
//!
//! - **anonymous** (default on): resolves the anonymous request.
//! - **username/password**: configured users; a wrong password for a known
//!   user is rejected, an unknown user is left to other providers.
//! - **token**: static bearer tokens, each mapped to a configured user.
//! - **trusted** (default off): configured users by principal name, no
//!   credential.
//!
//! A roles augmentor grants `role_permissions` to any identity holding the role.
//!
//! ## Configuration
//!
//! The plugin reads a top-level document:
//!
//! ```yaml
//! priority: 1001
//! anonymous: true
//! trusted: false
//! users:
//!   - username: alice
//!     password: wonderland
//!     roles: [editor]
//!     permissions: ["profile:read"]
//! tokens:
//!   - token: t-alice
//!     username: alice
//! role_permissions:
//!   editor: ["docs:read:write"]
//! ```

pub mod config;
pub mod domain;
pub mod module;

pub use config::StaticIdentityPluginConfig;
pub use module::StaticIdentityPlugin;
