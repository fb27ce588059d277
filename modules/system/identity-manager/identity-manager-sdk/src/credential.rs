//! Credentials: proof material backing an authentication request.

use std::sync::Arc;

use secrecy::SecretString;

/// A simple password based credential.
#[derive(Debug, Clone)]
pub struct PasswordCredential {
    password: SecretString,
}

impl PasswordCredential {
    #[must_use]
    pub fn new(password: impl Into<SecretString>) -> Self {
        Self {
            password: password.into(),
        }
    }

    #[must_use]
    pub fn password(&self) -> &SecretString {
        &self.password
    }
}

/// A token based credential, e.g. a bearer token.
#[derive(Debug, Clone)]
pub struct TokenCredential {
    token: SecretString,
    token_type: String,
}

impl TokenCredential {
    #[must_use]
    pub fn new(token: impl Into<SecretString>, token_type: &str) -> Self {
        Self {
            token: token.into(),
            token_type: token_type.to_owned(),
        }
    }

    #[must_use]
    pub fn token(&self) -> &SecretString {
        &self.token
    }

    /// Token type, e.g. `"bearer"`.
    #[must_use]
    pub fn token_type(&self) -> &str {
        &self.token_type
    }
}

/// An X.509 certificate based credential.
///
/// Only the DER encoding and the subject are carried; validating the chain is
/// the transport layer's job.
#[derive(Debug, Clone)]
pub struct CertificateCredential {
    subject: String,
    der: Arc<[u8]>,
}

impl CertificateCredential {
    #[must_use]
    pub fn new(subject: &str, der: impl Into<Arc<[u8]>>) -> Self {
        Self {
            subject: subject.to_owned(),
            der: der.into(),
        }
    }

    /// Subject distinguished name.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub fn der(&self) -> &[u8] {
        &self.der
    }
}

/// Credential held by a resolved identity.
#[derive(Debug, Clone)]
pub enum Credential {
    Password(PasswordCredential),
    Token(TokenCredential),
    Certificate(CertificateCredential),
}

/// Discriminant of [`Credential`]; an identity holds at most one credential per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKind {
    Password,
    Token,
    Certificate,
}

impl Credential {
    #[must_use]
    pub fn kind(&self) -> CredentialKind {
        match self {
            Self::Password(_) => CredentialKind::Password,
            Self::Token(_) => CredentialKind::Token,
            Self::Certificate(_) => CredentialKind::Certificate,
        }
    }
}

/// Typed access to a concrete credential stored in a [`Credential`].
pub trait CredentialType: Sized {
    const KIND: CredentialKind;

    fn from_credential(credential: &Credential) -> Option<&Self>;
}

impl CredentialType for PasswordCredential {
    const KIND: CredentialKind = CredentialKind::Password;

    fn from_credential(credential: &Credential) -> Option<&Self> {
        match credential {
            Credential::Password(c) => Some(c),
            _ => None,
        }
    }
}

impl CredentialType for TokenCredential {
    const KIND: CredentialKind = CredentialKind::Token;

    fn from_credential(credential: &Credential) -> Option<&Self> {
        match credential {
            Credential::Token(c) => Some(c),
            _ => None,
        }
    }
}

impl CredentialType for CertificateCredential {
    const KIND: CredentialKind = CredentialKind::Certificate;

    fn from_credential(credential: &Credential) -> Option<&Self> {
        match credential {
            Credential::Certificate(c) => Some(c),
            _ => None,
        }
    }
}

impl From<PasswordCredential> for Credential {
    fn from(c: PasswordCredential) -> Self {
        Self::Password(c)
    }
}

impl From<TokenCredential> for Credential {
    fn from(c: TokenCredential) -> Self {
        Self::Token(c)
    }
}

impl From<CertificateCredential> for Credential {
    fn from(c: CertificateCredential) -> Self {
        Self::Certificate(c)
    }
}
