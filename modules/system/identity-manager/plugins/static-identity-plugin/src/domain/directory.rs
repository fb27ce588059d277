//! In-memory user directory built from configuration.

use std::collections::HashMap;

use identity_manager::BuildError;
use identity_manager_sdk::{Principal, SecurityIdentity, StringPermission, USER_ATTRIBUTE};
use secrecy::{ExposeSecret, SecretString};

use crate::config::StaticIdentityPluginConfig;

pub(crate) struct StaticUser {
    pub(crate) password: SecretString,
    pub(crate) identity: SecurityIdentity,
}

/// Users and tokens from [`StaticIdentityPluginConfig`], with each user's
/// identity built once up front.
pub struct Directory {
    users: HashMap<String, StaticUser>,
    tokens: HashMap<String, String>,
}

impl Directory {
    /// Build the directory.
    ///
    /// # Errors
    ///
    /// [`BuildError::InvalidConfig`] for duplicate usernames or tokens,
    /// unparsable permissions, or tokens naming an unknown user.
    pub fn from_config(cfg: &StaticIdentityPluginConfig) -> Result<Self, BuildError> {
        let mut users = HashMap::with_capacity(cfg.users.len());
        for user in &cfg.users {
            let permissions = parse_permissions(&user.permissions)?;
            let identity = SecurityIdentity::builder()
                .principal(Principal::new(&user.username))
                .roles(&user.roles)
                .permissions(permissions)
                .attribute(USER_ATTRIBUTE, user.username.clone().into())
                .build();
            let entry = StaticUser {
                password: user.password.clone(),
                identity,
            };
            if users.insert(user.username.clone(), entry).is_some() {
                return Err(BuildError::InvalidConfig(format!(
                    "duplicate static user '{}'",
                    user.username
                )));
            }
        }

        let mut tokens = HashMap::with_capacity(cfg.tokens.len());
        for mapping in &cfg.tokens {
            if !users.contains_key(&mapping.username) {
                return Err(BuildError::InvalidConfig(format!(
                    "static token maps to unknown user '{}'",
                    mapping.username
                )));
            }
            let previous = tokens.insert(
                mapping.token.expose_secret().to_owned(),
                mapping.username.clone(),
            );
            if let Some(previous) = previous {
                return Err(BuildError::InvalidConfig(format!(
                    "static token of user '{}' is already assigned to user '{previous}'",
                    mapping.username
                )));
            }
        }

        Ok(Self { users, tokens })
    }

    pub(crate) fn user(&self, username: &str) -> Option<&StaticUser> {
        self.users.get(username)
    }

    pub(crate) fn user_by_token(&self, token: &str) -> Option<&StaticUser> {
        self.tokens.get(token).and_then(|username| self.users.get(username))
    }

    #[must_use]
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    #[must_use]
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }
}

pub(crate) fn parse_permissions(encoded: &[String]) -> Result<Vec<StringPermission>, BuildError> {
    encoded
        .iter()
        .map(|p| {
            StringPermission::parse(p)
                .map_err(|e| BuildError::InvalidConfig(format!("invalid permission '{p}': {e}")))
        })
        .collect()
}
