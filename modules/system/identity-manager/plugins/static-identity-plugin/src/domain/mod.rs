//! Domain layer for the static identity plugin.

pub mod augmentor;
pub mod directory;
pub mod providers;

pub use augmentor::StaticRolesAugmentor;
pub use directory::Directory;
pub use providers::{StaticPasswordProvider, StaticTokenProvider, StaticTrustedProvider};
