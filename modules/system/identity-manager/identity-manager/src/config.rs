//! Configuration for the identity manager.

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};

/// Environment variable prefix for configuration overrides,
/// e.g. `IDM__MAX_BLOCKING_TASKS=8`.
pub const ENV_PREFIX: &str = "IDM__";

/// Configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct IdentityManagerConfig {
    /// Maximum number of blocking provider/augmentor tasks running at once.
    pub max_blocking_tasks: usize,
}

impl Default for IdentityManagerConfig {
    fn default() -> Self {
        Self {
            max_blocking_tasks: 64,
        }
    }
}

impl IdentityManagerConfig {
    /// Load from a YAML document layered over the defaults, with
    /// [`ENV_PREFIX`] environment variables applied last.
    ///
    /// # Errors
    ///
    /// Returns a `figment::Error` if the YAML is malformed or contains
    /// unknown fields.
    pub fn load(yaml: &str) -> Result<Self, Box<figment::Error>> {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Yaml::string(yaml))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(Box::new)
    }
}
