use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Process-scoped set of revoked access-token ids.
///
/// Logout inserts the token id with the token's remaining validity; lookups
/// ignore entries past their expiry and inserts prune them. Lookups are the
/// hot path, so the map sits behind a reader-preferring lock. The set is not
/// durable: a restart clears it, which is acceptable because access tokens
/// are short-lived.
#[derive(Default)]
pub struct RevocationSet {
    inner: RwLock<HashMap<Uuid, DateTime<Utc>>>,
}

impl RevocationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a token id revoked until `expires_at`.
    pub fn revoke(&self, token_id: Uuid, expires_at: DateTime<Utc>) {
        let now = Utc::now();
        let mut map = self.inner.write().expect("revocation lock poisoned");
        map.retain(|_, exp| *exp > now);
        map.insert(token_id, expires_at);
    }

    /// Whether the token id carries an unexpired revocation marker.
    pub fn is_revoked(&self, token_id: &Uuid) -> bool {
        let map = self.inner.read().expect("revocation lock poisoned");
        map.get(token_id).is_some_and(|exp| *exp > Utc::now())
    }

    /// Number of markers currently held, expired ones included.
    pub fn len(&self) -> usize {
        self.inner.read().expect("revocation lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
