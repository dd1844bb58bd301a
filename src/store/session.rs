use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Opaque identity supplied by the external authentication collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    pub user_id: Uuid,
    pub issued_at: DateTime<Utc>,
}

impl SessionToken {
    pub fn anonymous() -> Self {
        Self {
            user_id: Uuid::new_v4(),
            issued_at: Utc::now(),
        }
    }
}

/// Process-wide session slot, established once and reused by every store
/// call. The store client only reads it; filling it is the bootstrap's job.
#[derive(Clone, Default)]
pub struct Session {
    token: Arc<RwLock<Option<SessionToken>>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn establish(&self, token: SessionToken) {
        *self.token.write().expect("session lock poisoned") = Some(token);
    }

    pub fn token(&self) -> Option<SessionToken> {
        self.token.read().expect("session lock poisoned").clone()
    }

    pub fn is_established(&self) -> bool {
        self.token().is_some()
    }
}
