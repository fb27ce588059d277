#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end resolution through the built manager.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use identity_manager::{
    AnonymousIdentityProvider, IdentityAssociation, IdentityProviderManagerBuilder,
    IdentityProviderManagerLocalClient,
};
use identity_manager_sdk::{
    AuthenticationError, AuthenticationRequest, AuthenticationRequestContext, CustomRequest,
    IdentityError, IdentityProvider, IdentityProviderManager, PasswordCredential, Principal,
    ProviderResult, RequestAttributes, RequestKind, SecurityIdentity, SecurityIdentityAugmentor,
    TokenCredential, TokenRequest, TrustedRequest, UsernamePasswordRequest,
};
use tracing_test::traced_test;

type Calls = Arc<Mutex<Vec<&'static str>>>;

#[derive(Clone, Copy)]
enum Outcome {
    Identity,
    Decline,
    Reject,
    Backend,
}

struct Scripted {
    name: &'static str,
    priority: i32,
    outcome: Outcome,
    calls: Calls,
}

impl Scripted {
    fn new(name: &'static str, priority: i32, outcome: Outcome, calls: &Calls) -> Self {
        Self {
            name,
            priority,
            outcome,
            calls: Arc::clone(calls),
        }
    }
}

#[async_trait]
impl IdentityProvider for Scripted {
    type Request = TokenRequest;

    fn priority(&self) -> i32 {
        self.priority
    }

    async fn authenticate(
        &self,
        _request: &TokenRequest,
        _ctx: &dyn AuthenticationRequestContext,
    ) -> ProviderResult {
        self.calls.lock().unwrap().push(self.name);
        match self.outcome {
            Outcome::Identity => Ok(Some(
                SecurityIdentity::builder()
                    .principal(Principal::new(self.name))
                    .build(),
            )),
            Outcome::Decline => Ok(None),
            Outcome::Reject => Err(IdentityError::invalid_credentials()),
            Outcome::Backend => Err(IdentityError::backend("directory unreachable")),
        }
    }
}

fn token_request() -> AuthenticationRequest {
    TokenRequest::new(TokenCredential::new("t-1", "bearer")).into()
}

fn client(builder: IdentityProviderManagerBuilder) -> IdentityProviderManagerLocalClient {
    IdentityProviderManagerLocalClient::new(Arc::new(builder.build().unwrap()))
}

fn base() -> IdentityProviderManagerBuilder {
    IdentityProviderManagerBuilder::default().identity_provider(AnonymousIdentityProvider)
}

fn principal_name(identity: &SecurityIdentity) -> Option<&str> {
    identity.principal().map(Principal::name)
}

#[tokio::test]
async fn anonymous_request_resolves_to_anonymous_identity() {
    let manager = client(base());

    let identity = manager.authenticate(AuthenticationRequest::ANONYMOUS).await.unwrap();

    assert!(identity.is_anonymous());
    assert!(identity.roles().is_empty());
}

#[tokio::test]
async fn providers_run_in_descending_priority() {
    let calls = Calls::default();
    let manager = client(
        base()
            .identity_provider(Scripted::new("low", 10, Outcome::Identity, &calls))
            .identity_provider(Scripted::new("high", 20, Outcome::Decline, &calls))
            .identity_provider(Scripted::new("mid", 15, Outcome::Decline, &calls)),
    );

    let identity = manager.authenticate(token_request()).await.unwrap();

    assert_eq!(principal_name(&identity), Some("low"));
    assert_eq!(*calls.lock().unwrap(), ["high", "mid", "low"]);
}

#[tokio::test]
async fn equal_priorities_keep_registration_order() {
    let calls = Calls::default();
    let manager = client(
        base()
            .identity_provider(Scripted::new("first", 5, Outcome::Decline, &calls))
            .identity_provider(Scripted::new("second", 5, Outcome::Identity, &calls))
            .identity_provider(Scripted::new("third", 5, Outcome::Identity, &calls)),
    );

    let identity = manager.authenticate(token_request()).await.unwrap();

    assert_eq!(principal_name(&identity), Some("second"));
    assert_eq!(*calls.lock().unwrap(), ["first", "second"]);
}

#[test]
fn providers_are_listed_per_kind_in_try_order() {
    let calls = Calls::default();
    let service = base()
        .identity_provider(Scripted::new("low", 1, Outcome::Decline, &calls))
        .identity_provider(ApiKeyProvider)
        .identity_provider(Scripted::new("high", 9, Outcome::Decline, &calls))
        .build()
        .unwrap();

    assert_eq!(service.provider_count(&RequestKind::Token), 2);
    assert_eq!(service.provider_count(&RequestKind::Custom("api-key".into())), 1);
    assert_eq!(service.provider_count(&RequestKind::Trusted), 0);
    assert!(service.provider_names(&RequestKind::Trusted).next().is_none());

    let anonymous: Vec<_> = service.provider_names(&RequestKind::Anonymous).collect();
    assert_eq!(anonymous, [std::any::type_name::<AnonymousIdentityProvider>()]);
    // both token providers share a type, so names repeat in priority order
    assert_eq!(
        service.provider_names(&RequestKind::Token).collect::<Vec<_>>(),
        [std::any::type_name::<Scripted>(); 2]
    );
}

#[tokio::test]
async fn invalid_credentials_stop_the_search() {
    let calls = Calls::default();
    let manager = client(
        base()
            .identity_provider(Scripted::new("rejecting", 20, Outcome::Reject, &calls))
            .identity_provider(Scripted::new("accepting", 10, Outcome::Identity, &calls)),
    );

    let err = manager.authenticate(token_request()).await.unwrap_err();

    assert!(matches!(err, AuthenticationError::Failed(_)));
    assert_eq!(*calls.lock().unwrap(), ["rejecting"]);
}

#[tokio::test]
#[traced_test]
async fn backend_failure_falls_through_to_next_provider() {
    let calls = Calls::default();
    let manager = client(
        base()
            .identity_provider(Scripted::new("broken", 20, Outcome::Backend, &calls))
            .identity_provider(Scripted::new("healthy", 10, Outcome::Identity, &calls)),
    );

    let identity = manager.authenticate(token_request()).await.unwrap();

    assert_eq!(principal_name(&identity), Some("healthy"));
    assert_eq!(*calls.lock().unwrap(), ["broken", "healthy"]);
    assert!(logs_contain("directory unreachable"));
}

#[tokio::test]
async fn all_providers_declining_is_a_generic_failure() {
    let calls = Calls::default();
    let manager = client(
        base()
            .identity_provider(Scripted::new("declining", 20, Outcome::Decline, &calls))
            .identity_provider(Scripted::new("broken", 10, Outcome::Backend, &calls)),
    );

    let err = manager.authenticate(token_request()).await.unwrap_err();

    match err {
        AuthenticationError::Failed(failed) => assert!(failed.attributes().is_empty()),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(calls.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn unknown_request_kind_is_a_configuration_error() {
    let manager = client(base());

    let err = manager
        .authenticate(TrustedRequest::new("alice").into())
        .await
        .unwrap_err();

    assert!(err.is_configuration());
    assert!(matches!(
        err,
        AuthenticationError::NoProvider {
            kind: RequestKind::Trusted
        }
    ));
}

#[tokio::test]
async fn providers_only_see_their_own_kind() {
    let calls = Calls::default();
    let manager = client(base().identity_provider(Scripted::new("token", 10, Outcome::Identity, &calls)));

    let request = UsernamePasswordRequest::new("alice", PasswordCredential::new("secret"));
    let err = manager.authenticate(request.into()).await.unwrap_err();

    assert!(matches!(err, AuthenticationError::NoProvider { .. }));
    assert!(calls.lock().unwrap().is_empty());
}

struct AppendRole {
    role: &'static str,
    priority: i32,
}

#[async_trait]
impl SecurityIdentityAugmentor for AppendRole {
    fn priority(&self) -> i32 {
        self.priority
    }

    async fn augment(
        &self,
        identity: SecurityIdentity,
        _ctx: &dyn AuthenticationRequestContext,
        _attributes: &RequestAttributes,
    ) -> Result<SecurityIdentity, IdentityError> {
        // records the order augmentors saw the identity in
        let seen = identity.attribute("trail").and_then(|v| v.as_str()).unwrap_or("");
        let trail = format!("{seen}{}", self.role);
        Ok(identity
            .to_builder()
            .role(self.role)
            .attribute("trail", trail.into())
            .build())
    }
}

#[tokio::test]
async fn augmentors_chain_in_priority_order() {
    let calls = Calls::default();
    let manager = client(
        base()
            .identity_provider(Scripted::new("token", 10, Outcome::Identity, &calls))
            .identity_augmentor(AppendRole { role: "y", priority: 1 })
            .identity_augmentor(AppendRole { role: "x", priority: 2 }),
    );

    let identity = manager.authenticate(token_request()).await.unwrap();

    assert!(identity.has_role("x"));
    assert!(identity.has_role("y"));
    assert_eq!(identity.attribute("trail").and_then(|v| v.as_str()), Some("xy"));
}

#[tokio::test]
async fn augmentors_also_run_for_anonymous_identity() {
    let manager = client(base().identity_augmentor(AppendRole { role: "guest", priority: 0 }));

    let identity = manager.authenticate(AuthenticationRequest::ANONYMOUS).await.unwrap();

    assert!(identity.is_anonymous());
    assert!(identity.has_role("guest"));
}

struct TenantFromAttributes;

#[async_trait]
impl SecurityIdentityAugmentor for TenantFromAttributes {
    async fn augment(
        &self,
        identity: SecurityIdentity,
        _ctx: &dyn AuthenticationRequestContext,
        attributes: &RequestAttributes,
    ) -> Result<SecurityIdentity, IdentityError> {
        match attributes.get("tenant") {
            Some(tenant) => Ok(identity.to_builder().attribute("tenant", tenant.clone()).build()),
            None => Ok(identity),
        }
    }
}

#[tokio::test]
async fn augmentors_receive_request_attributes() {
    let calls = Calls::default();
    let manager = client(
        base()
            .identity_provider(Scripted::new("token", 10, Outcome::Identity, &calls))
            .identity_augmentor(TenantFromAttributes),
    );

    let mut request = token_request();
    assert!(request.set_attribute("tenant", "acme".into()));
    let identity = manager.authenticate(request).await.unwrap();

    assert_eq!(identity.attribute("tenant").and_then(|v| v.as_str()), Some("acme"));
}

struct FailingAugmentor(bool);

#[async_trait]
impl SecurityIdentityAugmentor for FailingAugmentor {
    async fn augment(
        &self,
        _identity: SecurityIdentity,
        _ctx: &dyn AuthenticationRequestContext,
        _attributes: &RequestAttributes,
    ) -> Result<SecurityIdentity, IdentityError> {
        if self.0 {
            Err(IdentityError::invalid_credentials())
        } else {
            Err(IdentityError::backend("role store down"))
        }
    }
}

#[tokio::test]
async fn augmentor_failures_propagate() {
    let rejecting = client(base().identity_augmentor(FailingAugmentor(true)));
    let err = rejecting.authenticate(AuthenticationRequest::ANONYMOUS).await.unwrap_err();
    assert!(matches!(err, AuthenticationError::Failed(_)));

    let broken = client(base().identity_augmentor(FailingAugmentor(false)));
    let err = broken.authenticate(AuthenticationRequest::ANONYMOUS).await.unwrap_err();
    assert!(matches!(err, AuthenticationError::Augmentation(_)));
}

struct ApiKeyProvider;

#[async_trait]
impl IdentityProvider for ApiKeyProvider {
    type Request = CustomRequest;

    fn request_kind(&self) -> Option<RequestKind> {
        Some(RequestKind::Custom("api-key".into()))
    }

    async fn authenticate(
        &self,
        request: &CustomRequest,
        ctx: &dyn AuthenticationRequestContext,
    ) -> ProviderResult {
        let Some(owner) = request.payload().get("owner").and_then(|v| v.as_str()) else {
            return Ok(None);
        };
        let owner = owner.to_owned();
        ctx.run_blocking(Box::new(move || {
            Ok(Some(
                SecurityIdentity::builder()
                    .principal(Principal::new(&owner))
                    .build(),
            ))
        }))
        .await
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn custom_request_kinds_route_to_their_provider() {
    let manager = client(base().identity_provider(ApiKeyProvider));

    let request = CustomRequest::new("api-key", serde_json::json!({ "owner": "ci-bot" }));
    let identity = manager.authenticate(request.into()).await.unwrap();

    assert_eq!(principal_name(&identity), Some("ci-bot"));

    let other = CustomRequest::new("session", serde_json::Value::Null);
    let err = manager.authenticate(other.into()).await.unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn blocking_resolution_outside_runtime() {
    let calls = Calls::default();
    let manager = client(
        base()
            .identity_provider(Scripted::new("token", 10, Outcome::Identity, &calls))
            .identity_augmentor(AppendRole { role: "x", priority: 0 }),
    );

    let identity = manager.authenticate_blocking(token_request()).unwrap();

    assert_eq!(principal_name(&identity), Some("token"));
    assert!(identity.has_role("x"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn blocking_resolution_inside_runtime() {
    let manager = client(base());

    let identity = manager.authenticate_blocking(AuthenticationRequest::ANONYMOUS).unwrap();

    assert!(identity.is_anonymous());
}

#[tokio::test]
async fn association_keeps_identity_for_the_scope() {
    let calls = Calls::default();
    let manager: Arc<dyn IdentityProviderManager> = Arc::new(client(
        base().identity_provider(Scripted::new("token", 10, Outcome::Identity, &calls)),
    ));
    let association = IdentityAssociation::new(manager);

    association.resolve(token_request()).await.unwrap();
    let again = association.resolve(token_request()).await.unwrap();

    assert_eq!(principal_name(&again), Some("token"));
    assert_eq!(calls.lock().unwrap().len(), 1);

    association.end_scope();
    assert!(association.identity().is_none());
}
