use crate::token::TokenKind;
use std::{collections::HashSet, sync::Arc};
use tokio::sync::Mutex;

/// Struct that holds the token kinds a member was asked to lose on their next pass.
///
/// Clones share the same set, so the fault injector can hold one handle while the
/// member reads another.
#[derive(Clone, Default)]
pub struct LossRequests(pub Arc<Mutex<HashSet<TokenKind>>>);

impl LossRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Function that asks for the next `kind` token to be lost, returning whether the
    /// request is new.
    pub async fn request(&self, kind: TokenKind) -> bool {
        self.0.lock().await.insert(kind)
    }

    /// Function that consumes a pending request, returning whether there was one.
    pub async fn take(&self, kind: TokenKind) -> bool {
        self.0.lock().await.remove(&kind)
    }

    #[cfg(test)]
    pub async fn contains(&self, kind: TokenKind) -> bool {
        self.0.lock().await.contains(&kind)
    }
}
