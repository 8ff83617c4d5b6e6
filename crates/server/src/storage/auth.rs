//! Identity resolution at its interface. Token issuance is the excluded
//! auth collaborator's job; the in-memory store issues opaque tokens so
//! the HTTP stub and the tests have something to hand out.

use std::collections::HashMap;
use std::sync::Mutex;

pub trait AuthStore: Send + Sync {
    /// The identity behind a token, or None for garbage/expired tokens.
    fn resolve_identity(&self, token: &str) -> Option<String>;
}

#[derive(Default)]
pub struct MemoryAuthStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    next: u64,
    tokens: HashMap<String, String>,
}

impl MemoryAuthStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self, identity: &str) -> String {
        let mut inner = self.inner.lock().expect("auth store lock poisoned");
        inner.next += 1;
        let token = format!("tok-{:08x}", inner.next);
        inner.tokens.insert(token.clone(), identity.to_string());
        token
    }

    pub fn revoke(&self, token: &str) {
        let mut inner = self.inner.lock().expect("auth store lock poisoned");
        inner.tokens.remove(token);
    }
}

impl AuthStore for MemoryAuthStore {
    fn resolve_identity(&self, token: &str) -> Option<String> {
        let inner = self.inner.lock().expect("auth store lock poisoned");
        inner.tokens.get(token).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_resolve_revoke() {
        let store = MemoryAuthStore::new();
        let token = store.issue("alice");
        assert_eq!(store.resolve_identity(&token).as_deref(), Some("alice"));
        assert!(store.resolve_identity("tok-bogus").is_none());

        store.revoke(&token);
        assert!(store.resolve_identity(&token).is_none());
    }

    #[test]
    fn test_tokens_are_distinct() {
        let store = MemoryAuthStore::new();
        assert_ne!(store.issue("alice"), store.issue("alice"));
    }
}
