//! Provider of the anonymous identity.

use async_trait::async_trait;
use identity_manager_sdk::{
    AnonymousRequest, AuthenticationRequestContext, IdentityProvider, ProviderResult, SYSTEM_LAST,
    SecurityIdentity,
};

/// Answers every anonymous request with [`SecurityIdentity::anonymous`].
///
/// Registered last among system providers so that an application provider for
/// anonymous requests, if any, wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousIdentityProvider;

#[async_trait]
impl IdentityProvider for AnonymousIdentityProvider {
    type Request = AnonymousRequest;

    fn priority(&self) -> i32 {
        SYSTEM_LAST
    }

    async fn authenticate(
        &self,
        _request: &AnonymousRequest,
        _ctx: &dyn AuthenticationRequestContext,
    ) -> ProviderResult {
        Ok(Some(SecurityIdentity::anonymous()))
    }
}
