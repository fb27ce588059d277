//! Type-indexed provider registry.

use std::cmp::Reverse;
use std::collections::HashMap;

use async_trait::async_trait;
use identity_manager_sdk::{
    AuthenticationRequest, AuthenticationRequestContext, IdentityProvider, ProviderResult,
    RequestKind, SecurityIdentityAugmentor, TypedRequest,
};

/// Object-safe view of an [`IdentityProvider`] of any request type.
#[async_trait]
pub trait ErasedProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn priority(&self) -> i32;

    async fn authenticate(
        &self,
        request: &AuthenticationRequest,
        ctx: &dyn AuthenticationRequestContext,
    ) -> ProviderResult;
}

pub struct Typed<P>(pub P);

#[async_trait]
impl<P: IdentityProvider> ErasedProvider for Typed<P> {
    fn name(&self) -> &'static str {
        std::any::type_name::<P>()
    }

    fn priority(&self) -> i32 {
        self.0.priority()
    }

    async fn authenticate(
        &self,
        request: &AuthenticationRequest,
        ctx: &dyn AuthenticationRequestContext,
    ) -> ProviderResult {
        // registry lookup is by exact kind, so a mismatch means a misregistration
        match P::Request::from_request(request) {
            Some(typed) => self.0.authenticate(typed, ctx).await,
            None => Ok(None),
        }
    }
}

/// Providers keyed by request kind, each list in descending priority with
/// registration order kept among equal priorities. Never mutated after build.
pub struct ProviderRegistry {
    providers: HashMap<RequestKind, Box<[Box<dyn ErasedProvider>]>>,
}

impl ProviderRegistry {
    pub fn new(registrations: Vec<(RequestKind, Box<dyn ErasedProvider>)>) -> Self {
        let mut grouped: HashMap<RequestKind, Vec<Box<dyn ErasedProvider>>> = HashMap::new();
        for (kind, provider) in registrations {
            grouped.entry(kind).or_default().push(provider);
        }
        let providers = grouped
            .into_iter()
            .map(|(kind, mut list)| {
                list.sort_by_key(|p| Reverse(p.priority()));
                (kind, list.into_boxed_slice())
            })
            .collect();
        Self { providers }
    }

    pub fn providers(&self, kind: &RequestKind) -> Option<&[Box<dyn ErasedProvider>]> {
        self.providers.get(kind).map(AsRef::as_ref)
    }

    pub fn contains(&self, kind: &RequestKind) -> bool {
        self.providers.contains_key(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &RequestKind> {
        self.providers.keys()
    }

    pub fn len(&self) -> usize {
        self.providers.values().map(|list| list.len()).sum()
    }
}

pub struct NamedAugmentor {
    pub name: &'static str,
    pub augmentor: Box<dyn SecurityIdentityAugmentor>,
}

impl NamedAugmentor {
    pub fn new<A: SecurityIdentityAugmentor>(augmentor: A) -> Self {
        Self {
            name: std::any::type_name::<A>(),
            augmentor: Box::new(augmentor),
        }
    }
}

/// Sort augmentors once: descending priority, registration order kept.
pub fn order_augmentors(mut augmentors: Vec<NamedAugmentor>) -> Box<[NamedAugmentor]> {
    augmentors.sort_by_key(|a| Reverse(a.augmentor.priority()));
    augmentors.into_boxed_slice()
}
