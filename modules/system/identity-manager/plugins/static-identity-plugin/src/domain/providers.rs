//! Identity providers served from the static directory.

use std::sync::Arc;

use async_trait::async_trait;
use identity_manager_sdk::{
    AuthenticationRequestContext, IdentityError, IdentityProvider, ProviderResult, TokenRequest,
    TrustedRequest, UsernamePasswordRequest,
};
use secrecy::ExposeSecret;
use subtle::ConstantTimeEq;
use tracing::debug;

use super::directory::Directory;

/// Username/password provider.
///
/// Unknown users are declined so another provider may know them; a wrong
/// password for a known user is rejected outright.
pub struct StaticPasswordProvider {
    directory: Arc<Directory>,
    priority: i32,
}

impl StaticPasswordProvider {
    #[must_use]
    pub fn new(directory: Arc<Directory>, priority: i32) -> Self {
        Self {
            directory,
            priority,
        }
    }
}

#[async_trait]
impl IdentityProvider for StaticPasswordProvider {
    type Request = UsernamePasswordRequest;

    fn priority(&self) -> i32 {
        self.priority
    }

    async fn authenticate(
        &self,
        request: &UsernamePasswordRequest,
        ctx: &dyn AuthenticationRequestContext,
    ) -> ProviderResult {
        let Some(user) = self.directory.user(request.username()) else {
            debug!("Static user not found, declining");
            return Ok(None);
        };

        let expected = user.password.clone();
        let presented = request.password().password().clone();
        let identity = user.identity.clone();

        // password comparison stands in for hashing and runs off the scheduler
        ctx.run_blocking(Box::new(move || {
            if constant_time_eq(
                expected.expose_secret().as_bytes(),
                presented.expose_secret().as_bytes(),
            ) {
                Ok(Some(identity))
            } else {
                Err(IdentityError::invalid_credentials())
            }
        }))
        .await
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Bearer-token provider; the matched user's identity carries the token
/// credential.
pub struct StaticTokenProvider {
    directory: Arc<Directory>,
    priority: i32,
}

impl StaticTokenProvider {
    #[must_use]
    pub fn new(directory: Arc<Directory>, priority: i32) -> Self {
        Self {
            directory,
            priority,
        }
    }
}

#[async_trait]
impl IdentityProvider for StaticTokenProvider {
    type Request = TokenRequest;

    fn priority(&self) -> i32 {
        self.priority
    }

    async fn authenticate(
        &self,
        request: &TokenRequest,
        _ctx: &dyn AuthenticationRequestContext,
    ) -> ProviderResult {
        let token = request.token();
        Ok(self
            .directory
            .user_by_token(token.token().expose_secret())
            .map(|user| user.identity.to_builder().credential(token.clone()).build()))
    }
}

/// Trusted-request provider: the principal was already verified upstream, so
/// only its existence in the directory is checked.
pub struct StaticTrustedProvider {
    directory: Arc<Directory>,
    priority: i32,
}

impl StaticTrustedProvider {
    #[must_use]
    pub fn new(directory: Arc<Directory>, priority: i32) -> Self {
        Self {
            directory,
            priority,
        }
    }
}

#[async_trait]
impl IdentityProvider for StaticTrustedProvider {
    type Request = TrustedRequest;

    fn priority(&self) -> i32 {
        self.priority
    }

    async fn authenticate(
        &self,
        request: &TrustedRequest,
        _ctx: &dyn AuthenticationRequestContext,
    ) -> ProviderResult {
        Ok(self
            .directory
            .user(request.principal())
            .map(|user| user.identity.clone()))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use identity_manager::TokioBlockingContext;
    use identity_manager_sdk::{PasswordCredential, Principal, TokenCredential};
    use secrecy::SecretString;

    use super::*;
    use crate::config::{StaticIdentityPluginConfig, TokenMapping, UserConfig};

    fn directory() -> Arc<Directory> {
        let cfg = StaticIdentityPluginConfig {
            users: vec![UserConfig {
                username: "alice".to_owned(),
                password: SecretString::from("wonderland"),
                roles: vec!["admin".to_owned()],
                permissions: Vec::new(),
            }],
            tokens: vec![TokenMapping {
                token: SecretString::from("t-alice"),
                username: "alice".to_owned(),
            }],
            ..StaticIdentityPluginConfig::default()
        };
        Arc::new(Directory::from_config(&cfg).unwrap())
    }

    fn password(username: &str, password: &str) -> UsernamePasswordRequest {
        UsernamePasswordRequest::new(username, PasswordCredential::new(password))
    }

    #[tokio::test]
    async fn password_provider_accepts_correct_password() {
        let provider = StaticPasswordProvider::new(directory(), 10);
        let ctx = TokioBlockingContext::new(1);

        let identity = provider
            .authenticate(&password("alice", "wonderland"), &ctx)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(identity.principal().map(Principal::name), Some("alice"));
        assert!(identity.has_role("admin"));
    }

    #[tokio::test]
    async fn password_provider_rejects_wrong_password() {
        let provider = StaticPasswordProvider::new(directory(), 10);
        let ctx = TokioBlockingContext::new(1);

        let err = provider
            .authenticate(&password("alice", "looking-glass"), &ctx)
            .await
            .unwrap_err();

        assert!(matches!(err, IdentityError::InvalidCredentials(_)));
    }

    #[tokio::test]
    async fn password_provider_declines_unknown_user() {
        let provider = StaticPasswordProvider::new(directory(), 10);
        let ctx = TokioBlockingContext::new(1);

        let outcome = provider
            .authenticate(&password("bob", "wonderland"), &ctx)
            .await
            .unwrap();

        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn token_provider_attaches_token_credential() {
        let provider = StaticTokenProvider::new(directory(), 10);
        let ctx = TokioBlockingContext::new(1);
        let request = TokenRequest::new(TokenCredential::new("t-alice", "bearer"));

        let identity = provider.authenticate(&request, &ctx).await.unwrap().unwrap();

        let credential = identity.credential::<TokenCredential>().unwrap();
        assert_eq!(credential.token().expose_secret(), "t-alice");
        assert_eq!(credential.token_type(), "bearer");
    }

    #[tokio::test]
    async fn token_provider_declines_unknown_token() {
        let provider = StaticTokenProvider::new(directory(), 10);
        let ctx = TokioBlockingContext::new(1);
        let request = TokenRequest::new(TokenCredential::new("t-mallory", "bearer"));

        assert!(provider.authenticate(&request, &ctx).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn trusted_provider_resolves_known_principal() {
        let provider = StaticTrustedProvider::new(directory(), 10);
        let ctx = TokioBlockingContext::new(1);

        let known = provider
            .authenticate(&TrustedRequest::new("alice"), &ctx)
            .await
            .unwrap();
        let unknown = provider
            .authenticate(&TrustedRequest::new("bob"), &ctx)
            .await
            .unwrap();

        assert!(known.is_some());
        assert!(unknown.is_none());
    }

    #[test]
    fn constant_time_eq_compares_bytes() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
    }
}
