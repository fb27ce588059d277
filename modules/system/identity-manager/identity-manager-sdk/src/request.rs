//! Authentication requests.
//!
//! A request says *what is being proven*. Each variant owns its credential
//! payload and a bag of attributes that collaborators (e.g. the transport
//! layer) may annotate before the request is submitted. The anonymous variant
//! carries no state at all.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use crate::credential::{CertificateCredential, PasswordCredential, TokenCredential};

/// String-keyed request attributes.
pub type RequestAttributes = HashMap<String, serde_json::Value>;

static NO_ATTRIBUTES: LazyLock<RequestAttributes> = LazyLock::new(HashMap::new);

/// Tag identifying the concrete request type; providers are registered per tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RequestKind {
    Anonymous,
    UsernamePassword,
    Token,
    Certificate,
    Trusted,
    /// Application-defined request type.
    Custom(Cow<'static, str>),
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => f.write_str("anonymous"),
            Self::UsernamePassword => f.write_str("username_password"),
            Self::Token => f.write_str("token"),
            Self::Certificate => f.write_str("certificate"),
            Self::Trusted => f.write_str("trusted"),
            Self::Custom(name) => write!(f, "custom:{name}"),
        }
    }
}

/// The anonymous request. Stateless; [`AnonymousRequest::INSTANCE`] is the
/// only value anyone needs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnonymousRequest;

impl AnonymousRequest {
    pub const INSTANCE: Self = Self;
}

/// Username and password.
#[derive(Debug, Clone)]
pub struct UsernamePasswordRequest {
    username: String,
    password: PasswordCredential,
    attributes: RequestAttributes,
}

impl UsernamePasswordRequest {
    #[must_use]
    pub fn new(username: &str, password: PasswordCredential) -> Self {
        Self {
            username: username.to_owned(),
            password,
            attributes: RequestAttributes::new(),
        }
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn password(&self) -> &PasswordCredential {
        &self.password
    }
}

/// Token, e.g. a bearer token extracted from a header.
#[derive(Debug, Clone)]
pub struct TokenRequest {
    token: TokenCredential,
    attributes: RequestAttributes,
}

impl TokenRequest {
    #[must_use]
    pub fn new(token: TokenCredential) -> Self {
        Self {
            token,
            attributes: RequestAttributes::new(),
        }
    }

    #[must_use]
    pub fn token(&self) -> &TokenCredential {
        &self.token
    }
}

/// Client certificate presented by the transport.
#[derive(Debug, Clone)]
pub struct CertificateRequest {
    certificate: CertificateCredential,
    attributes: RequestAttributes,
}

impl CertificateRequest {
    #[must_use]
    pub fn new(certificate: CertificateCredential) -> Self {
        Self {
            certificate,
            attributes: RequestAttributes::new(),
        }
    }

    #[must_use]
    pub fn certificate(&self) -> &CertificateCredential {
        &self.certificate
    }
}

/// A principal that was already verified by a trusted party (e.g. a session
/// cookie issued by this system); only the name is carried.
#[derive(Debug, Clone)]
pub struct TrustedRequest {
    principal: String,
    attributes: RequestAttributes,
}

impl TrustedRequest {
    #[must_use]
    pub fn new(principal: &str) -> Self {
        Self {
            principal: principal.to_owned(),
            attributes: RequestAttributes::new(),
        }
    }

    #[must_use]
    pub fn principal(&self) -> &str {
        &self.principal
    }
}

/// Application-defined request, routed by its `kind` name.
#[derive(Debug, Clone)]
pub struct CustomRequest {
    kind: Cow<'static, str>,
    payload: serde_json::Value,
    attributes: RequestAttributes,
}

impl CustomRequest {
    #[must_use]
    pub fn new(kind: impl Into<Cow<'static, str>>, payload: serde_json::Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
            attributes: RequestAttributes::new(),
        }
    }

    #[must_use]
    pub fn kind_name(&self) -> &str {
        &self.kind
    }

    #[must_use]
    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }
}

/// What is being proven.
#[derive(Debug, Clone)]
pub enum AuthenticationRequest {
    Anonymous(AnonymousRequest),
    UsernamePassword(UsernamePasswordRequest),
    Token(TokenRequest),
    Certificate(CertificateRequest),
    Trusted(TrustedRequest),
    Custom(CustomRequest),
}

impl AuthenticationRequest {
    /// The anonymous request.
    pub const ANONYMOUS: Self = Self::Anonymous(AnonymousRequest::INSTANCE);

    #[must_use]
    pub fn kind(&self) -> RequestKind {
        match self {
            Self::Anonymous(_) => RequestKind::Anonymous,
            Self::UsernamePassword(_) => RequestKind::UsernamePassword,
            Self::Token(_) => RequestKind::Token,
            Self::Certificate(_) => RequestKind::Certificate,
            Self::Trusted(_) => RequestKind::Trusted,
            Self::Custom(r) => RequestKind::Custom(r.kind.clone()),
        }
    }

    /// Request attributes; always empty for the anonymous request.
    #[must_use]
    pub fn attributes(&self) -> &RequestAttributes {
        match self {
            Self::Anonymous(_) => &NO_ATTRIBUTES,
            Self::UsernamePassword(r) => &r.attributes,
            Self::Token(r) => &r.attributes,
            Self::Certificate(r) => &r.attributes,
            Self::Trusted(r) => &r.attributes,
            Self::Custom(r) => &r.attributes,
        }
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&serde_json::Value> {
        self.attributes().get(name)
    }

    /// Set an attribute.
    ///
    /// Returns `false` (and stores nothing) for the anonymous request, which
    /// holds no state.
    pub fn set_attribute(&mut self, name: &str, value: serde_json::Value) -> bool {
        let attributes = match self {
            Self::Anonymous(_) => return false,
            Self::UsernamePassword(r) => &mut r.attributes,
            Self::Token(r) => &mut r.attributes,
            Self::Certificate(r) => &mut r.attributes,
            Self::Trusted(r) => &mut r.attributes,
            Self::Custom(r) => &mut r.attributes,
        };
        attributes.insert(name.to_owned(), value);
        true
    }
}

impl From<AnonymousRequest> for AuthenticationRequest {
    fn from(r: AnonymousRequest) -> Self {
        Self::Anonymous(r)
    }
}

impl From<UsernamePasswordRequest> for AuthenticationRequest {
    fn from(r: UsernamePasswordRequest) -> Self {
        Self::UsernamePassword(r)
    }
}

impl From<TokenRequest> for AuthenticationRequest {
    fn from(r: TokenRequest) -> Self {
        Self::Token(r)
    }
}

impl From<CertificateRequest> for AuthenticationRequest {
    fn from(r: CertificateRequest) -> Self {
        Self::Certificate(r)
    }
}

impl From<TrustedRequest> for AuthenticationRequest {
    fn from(r: TrustedRequest) -> Self {
        Self::Trusted(r)
    }
}

impl From<CustomRequest> for AuthenticationRequest {
    fn from(r: CustomRequest) -> Self {
        Self::Custom(r)
    }
}

/// A concrete request type a provider can declare.
///
/// Lookup is by exact [`RequestKind`]; there is no inheritance between kinds.
pub trait TypedRequest: Send + Sync + 'static {
    /// Kind served by providers of this request type. `None` for
    /// [`CustomRequest`], whose providers name the kind themselves.
    const KIND: Option<RequestKind>;

    fn from_request(request: &AuthenticationRequest) -> Option<&Self>;
}

impl TypedRequest for AnonymousRequest {
    const KIND: Option<RequestKind> = Some(RequestKind::Anonymous);

    fn from_request(request: &AuthenticationRequest) -> Option<&Self> {
        match request {
            AuthenticationRequest::Anonymous(r) => Some(r),
            _ => None,
        }
    }
}

impl TypedRequest for UsernamePasswordRequest {
    const KIND: Option<RequestKind> = Some(RequestKind::UsernamePassword);

    fn from_request(request: &AuthenticationRequest) -> Option<&Self> {
        match request {
            AuthenticationRequest::UsernamePassword(r) => Some(r),
            _ => None,
        }
    }
}

impl TypedRequest for TokenRequest {
    const KIND: Option<RequestKind> = Some(RequestKind::Token);

    fn from_request(request: &AuthenticationRequest) -> Option<&Self> {
        match request {
            AuthenticationRequest::Token(r) => Some(r),
            _ => None,
        }
    }
}

impl TypedRequest for CertificateRequest {
    const KIND: Option<RequestKind> = Some(RequestKind::Certificate);

    fn from_request(request: &AuthenticationRequest) -> Option<&Self> {
        match request {
            AuthenticationRequest::Certificate(r) => Some(r),
            _ => None,
        }
    }
}

impl TypedRequest for TrustedRequest {
    const KIND: Option<RequestKind> = Some(RequestKind::Trusted);

    fn from_request(request: &AuthenticationRequest) -> Option<&Self> {
        match request {
            AuthenticationRequest::Trusted(r) => Some(r),
            _ => None,
        }
    }
}

impl TypedRequest for CustomRequest {
    const KIND: Option<RequestKind> = None;

    fn from_request(request: &AuthenticationRequest) -> Option<&Self> {
        match request {
            AuthenticationRequest::Custom(r) => Some(r),
            _ => None,
        }
    }
}
