use crate::error::AppError;
use crate::store::backend::DocumentBackend;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// In-process document store used for development and tests. Can be flipped
/// offline to simulate connectivity loss.
#[derive(Default)]
pub struct InMemoryBackend {
    collections: RwLock<HashMap<String, Vec<(String, Value)>>>,
    offline: AtomicBool,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), AppError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(AppError::StoreUnavailable)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DocumentBackend for InMemoryBackend {
    async fn insert(&self, collection: &str, document: Value) -> Result<String, AppError> {
        self.check_online()?;
        let id = Uuid::new_v4().to_string();
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push((id.clone(), document));
        debug!(collection, id = %id, "Inserted document");
        Ok(id)
    }

    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<(String, Value)>, AppError> {
        self.check_online()?;
        let collections = self.collections.read().await;
        let matches = collections
            .get(collection)
            .map(|documents| {
                documents
                    .iter()
                    .filter(|(_, document)| document.get(field).and_then(Value::as_str) == Some(value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn query_matches_exactly_and_case_sensitively() {
        let backend = InMemoryBackend::new();
        backend
            .insert("faces", json!({"label": "Alice"}))
            .await
            .unwrap();
        backend
            .insert("faces", json!({"label": "alice"}))
            .await
            .unwrap();

        let upper = backend.query_eq("faces", "label", "Alice").await.unwrap();
        assert_eq!(upper.len(), 1);
        let partial = backend.query_eq("faces", "label", "Ali").await.unwrap();
        assert!(partial.is_empty());
    }

    #[tokio::test]
    async fn offline_backend_reports_unavailable() {
        let backend = InMemoryBackend::new();
        backend.set_offline(true);
        let result = backend.insert("faces", json!({})).await;
        assert!(matches!(result, Err(AppError::StoreUnavailable)));
        backend.set_offline(false);
        backend.insert("faces", json!({})).await.unwrap();
    }
}
