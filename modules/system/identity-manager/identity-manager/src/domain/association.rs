//! Request-scoped identity association.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use identity_manager_sdk::{
    AuthenticationError, AuthenticationRequest, IdentityProviderManager, SecurityIdentity,
};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Binds the identity of one request to that request's lifetime.
///
/// The identity is either resolved through the manager or installed directly
/// with [`IdentityAssociation::set_identity`]. Ending the scope cancels an
/// in-flight resolution; a result arriving after that point is discarded.
pub struct IdentityAssociation {
    manager: Arc<dyn IdentityProviderManager>,
    scope: CancellationToken,
    identity: ArcSwapOption<SecurityIdentity>,
}

impl IdentityAssociation {
    #[must_use]
    pub fn new(manager: Arc<dyn IdentityProviderManager>) -> Self {
        Self::with_scope(manager, CancellationToken::new())
    }

    /// Tie the association to an existing scope token, e.g. a child of the
    /// connection's token.
    #[must_use]
    pub fn with_scope(manager: Arc<dyn IdentityProviderManager>, scope: CancellationToken) -> Self {
        Self {
            manager,
            scope,
            identity: ArcSwapOption::from(None),
        }
    }

    /// Resolve `request` and remember the identity for the rest of the scope.
    ///
    /// Returns the current identity without consulting the manager if one is
    /// already associated.
    ///
    /// # Errors
    ///
    /// [`AuthenticationError::ScopeEnded`] if the scope ended before the
    /// identity was stored; otherwise whatever the manager returns.
    pub async fn resolve(
        &self,
        request: AuthenticationRequest,
    ) -> Result<SecurityIdentity, AuthenticationError> {
        if self.scope.is_cancelled() {
            return Err(AuthenticationError::ScopeEnded);
        }
        if let Some(identity) = self.identity.load_full() {
            return Ok(SecurityIdentity::clone(&identity));
        }

        let identity = tokio::select! {
            biased;
            () = self.scope.cancelled() => {
                debug!("Scope ended during identity resolution");
                return Err(AuthenticationError::ScopeEnded);
            }
            result = self.manager.authenticate(request) => result?,
        };

        self.set_identity(identity)
    }

    /// Install `identity` as the scope's identity, replacing any previous one
    /// (programmatic login, run-as).
    ///
    /// # Errors
    ///
    /// [`AuthenticationError::ScopeEnded`] if the scope already ended.
    pub fn set_identity(
        &self,
        identity: SecurityIdentity,
    ) -> Result<SecurityIdentity, AuthenticationError> {
        if self.scope.is_cancelled() {
            return Err(AuthenticationError::ScopeEnded);
        }
        self.identity.store(Some(Arc::new(identity.clone())));
        Ok(identity)
    }

    /// Identity associated with this scope, if any. `None` once the scope ended.
    #[must_use]
    pub fn identity(&self) -> Option<SecurityIdentity> {
        if self.scope.is_cancelled() {
            return None;
        }
        self.identity
            .load_full()
            .map(|identity| SecurityIdentity::clone(&identity))
    }

    /// End the scope, cancelling any in-flight resolution.
    pub fn end_scope(&self) {
        self.scope.cancel();
        self.identity.store(None);
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.scope.is_cancelled()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use identity_manager_sdk::Principal;

    use super::*;

    struct SlowManager {
        delay: Duration,
    }

    #[async_trait]
    impl IdentityProviderManager for SlowManager {
        async fn authenticate(
            &self,
            _request: AuthenticationRequest,
        ) -> Result<SecurityIdentity, AuthenticationError> {
            tokio::time::sleep(self.delay).await;
            Ok(SecurityIdentity::builder()
                .principal(Principal::new("alice"))
                .build())
        }

        fn authenticate_blocking(
            &self,
            _request: AuthenticationRequest,
        ) -> Result<SecurityIdentity, AuthenticationError> {
            Ok(SecurityIdentity::anonymous())
        }
    }

    fn association(delay: Duration) -> IdentityAssociation {
        IdentityAssociation::new(Arc::new(SlowManager { delay }))
    }

    #[tokio::test]
    async fn stores_resolved_identity() {
        let assoc = association(Duration::ZERO);

        let identity = assoc.resolve(AuthenticationRequest::ANONYMOUS).await.unwrap();

        assert_eq!(identity.principal().map(Principal::name), Some("alice"));
        assert!(assoc.identity().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn ending_scope_discards_in_flight_resolution() {
        let assoc = Arc::new(association(Duration::from_secs(60)));

        let resolving = {
            let assoc = Arc::clone(&assoc);
            tokio::spawn(async move { assoc.resolve(AuthenticationRequest::ANONYMOUS).await })
        };
        tokio::task::yield_now().await;
        assoc.end_scope();

        let err = resolving.await.unwrap().unwrap_err();
        assert!(matches!(err, AuthenticationError::ScopeEnded));
        assert!(assoc.identity().is_none());
        assert!(!assoc.is_active());
    }

    #[tokio::test]
    async fn set_identity_replaces_resolved_identity() {
        let assoc = association(Duration::ZERO);
        assoc.resolve(AuthenticationRequest::ANONYMOUS).await.unwrap();

        let run_as = SecurityIdentity::builder()
            .principal(Principal::new("batch"))
            .role("system")
            .build();
        assoc.set_identity(run_as).unwrap();

        let current = assoc.identity().unwrap();
        assert_eq!(current.principal().map(Principal::name), Some("batch"));
        let again = assoc.resolve(AuthenticationRequest::ANONYMOUS).await.unwrap();
        assert!(again.has_role("system"));
    }

    #[test]
    fn set_identity_after_scope_end_fails() {
        let assoc = association(Duration::ZERO);
        assoc.end_scope();

        let err = assoc.set_identity(SecurityIdentity::anonymous()).unwrap_err();

        assert!(matches!(err, AuthenticationError::ScopeEnded));
        assert!(assoc.identity().is_none());
    }

    #[tokio::test]
    async fn resolve_after_scope_end_fails() {
        let assoc = association(Duration::ZERO);
        assoc.end_scope();

        let err = assoc.resolve(AuthenticationRequest::ANONYMOUS).await.unwrap_err();
        assert!(matches!(err, AuthenticationError::ScopeEnded));
    }
}
