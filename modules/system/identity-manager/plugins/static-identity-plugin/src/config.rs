//! Configuration for the static identity plugin.

use std::collections::HashMap;

use identity_manager_sdk::DEFAULT_PROVIDER_PRIORITY;
use secrecy::SecretString;
use serde::Deserialize;

/// Plugin configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StaticIdentityPluginConfig {
    /// Priority of every provider this plugin registers (higher runs first).
    pub priority: i32,

    /// Register the anonymous provider.
    pub anonymous: bool,

    /// Accept trusted requests for configured users without a credential.
    pub trusted: bool,

    /// Known users, authenticated by username and password.
    pub users: Vec<UserConfig>,

    /// Static bearer tokens, each standing for one configured user.
    pub tokens: Vec<TokenMapping>,

    /// Permissions granted per role by the roles augmentor.
    pub role_permissions: HashMap<String, Vec<String>>,
}

impl Default for StaticIdentityPluginConfig {
    fn default() -> Self {
        Self {
            priority: DEFAULT_PROVIDER_PRIORITY,
            anonymous: true,
            trusted: false,
            users: Vec::new(),
            tokens: Vec::new(),
            role_permissions: HashMap::new(),
        }
    }
}

/// A configured user.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserConfig {
    pub username: String,

    pub password: SecretString,

    #[serde(default)]
    pub roles: Vec<String>,

    /// Permissions in `name[:action...]` form.
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Maps a static token to a configured user.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenMapping {
    pub token: SecretString,

    /// Username of the user the token authenticates as.
    pub username: String,
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use figment::Figment;
    use figment::providers::{Format, Yaml};
    use secrecy::ExposeSecret;

    use super::*;

    fn load(yaml: &str) -> Result<StaticIdentityPluginConfig, figment::Error> {
        Figment::new().merge(Yaml::string(yaml)).extract()
    }

    #[test]
    fn defaults_register_only_anonymous() {
        let cfg = load("{}").unwrap();

        assert!(cfg.anonymous);
        assert!(!cfg.trusted);
        assert!(cfg.users.is_empty());
        assert_eq!(cfg.priority, DEFAULT_PROVIDER_PRIORITY);
    }

    #[test]
    fn parses_users_tokens_and_roles() {
        let cfg = load(
            r"
priority: 50
trusted: true
users:
  - username: alice
    password: wonderland
    roles: [admin]
    permissions: ['docs:read']
tokens:
  - token: t-alice
    username: alice
role_permissions:
  admin: ['docs:read:write', 'users']
",
        )
        .unwrap();

        assert_eq!(cfg.priority, 50);
        assert!(cfg.trusted);
        assert_eq!(cfg.users[0].password.expose_secret(), "wonderland");
        assert_eq!(cfg.users[0].roles, ["admin"]);
        assert_eq!(cfg.tokens[0].token.expose_secret(), "t-alice");
        assert_eq!(cfg.role_permissions["admin"].len(), 2);
    }

    #[test]
    fn crate_level_example_parses() {
        let cfg = load(
            r#"
priority: 1001
anonymous: true
trusted: false
users:
  - username: alice
    password: wonderland
    roles: [editor]
    permissions: ["profile:read"]
tokens:
  - token: t-alice
    username: alice
role_permissions:
  editor: ["docs:read:write"]
"#,
        )
        .unwrap();

        assert_eq!(cfg.users.len(), 1);
        assert_eq!(cfg.tokens[0].username, "alice");
        assert!(load("static_identity_plugin: { anonymous: true }").is_err());
    }

    #[test]
    fn rejects_unknown_fields() {
        assert!(load("mode: accept_all").is_err());
    }

    #[test]
    fn password_is_redacted_in_debug_output() {
        let cfg = load("users: [{ username: bob, password: hunter2 }]").unwrap();

        assert!(!format!("{cfg:?}").contains("hunter2"));
    }
}
