//! Local (in-process) client for the identity manager.

use std::sync::Arc;

use async_trait::async_trait;
use identity_manager_sdk::{
    AuthenticationError, AuthenticationRequest, IdentityError, IdentityProviderManager,
    SecurityIdentity,
};

use super::{DomainError, Service};

/// Local client wrapping the service.
///
/// Logs the detailed domain error and hands callers the stripped public one.
#[derive(Clone)]
pub struct IdentityProviderManagerLocalClient {
    svc: Arc<Service>,
}

impl IdentityProviderManagerLocalClient {
    #[must_use]
    pub fn new(svc: Arc<Service>) -> Self {
        Self { svc }
    }
}

fn log_and_convert(op: &str, e: DomainError) -> AuthenticationError {
    match &e {
        DomainError::NoProvider { .. }
        | DomainError::Augmentor {
            source: IdentityError::Backend(_),
            ..
        } => tracing::error!(operation = op, error = %e, "identity_manager call failed"),
        DomainError::Exhausted { .. }
        | DomainError::InvalidCredentials { .. }
        | DomainError::Augmentor { .. } => {
            tracing::debug!(operation = op, error = %e, "authentication failed");
        }
    }
    e.into()
}

#[async_trait]
impl IdentityProviderManager for IdentityProviderManagerLocalClient {
    async fn authenticate(
        &self,
        request: AuthenticationRequest,
    ) -> Result<SecurityIdentity, AuthenticationError> {
        self.svc
            .authenticate(&request)
            .await
            .map_err(|e| log_and_convert("authenticate", e))
    }

    fn authenticate_blocking(
        &self,
        request: AuthenticationRequest,
    ) -> Result<SecurityIdentity, AuthenticationError> {
        self.svc
            .authenticate_blocking(&request)
            .map_err(|e| log_and_convert("authenticate_blocking", e))
    }
}
