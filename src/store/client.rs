use crate::error::AppError;
use crate::store::backend::DocumentBackend;
use crate::store::session::Session;
use crate::types::{FaceRecord, NewFaceRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// Shape of a face document at the store boundary: the input record plus
/// the write timestamp. The id lives outside the document.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FaceDocument {
    #[serde(flatten)]
    record: NewFaceRecord,
    created_at: DateTime<Utc>,
}

/// Append-only write and label-equality read against the shared collection,
/// scoped under the application namespace. Requires an established session;
/// the client never authenticates by itself.
pub struct StoreClient {
    backend: Arc<dyn DocumentBackend>,
    session: Session,
    collection: String,
}

impl StoreClient {
    pub fn new(backend: Arc<dyn DocumentBackend>, session: Session, app_id: &str) -> Self {
        Self {
            backend,
            session,
            collection: format!("{app_id}/faces"),
        }
    }

    fn authorize(&self) -> Result<(), AppError> {
        if self.session.is_established() {
            Ok(())
        } else {
            warn!("Store call rejected: no session established");
            Err(AppError::Unauthorized)
        }
    }

    /// Writes a new record; the store assigns the id.
    pub async fn append(&self, record: NewFaceRecord) -> Result<String, AppError> {
        self.authorize()?;
        let label = record.label.clone();
        let document = FaceDocument {
            record,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&document)
            .map_err(|e| AppError::validation(format!("Unencodable record: {e}")))?;
        let id = self.backend.insert(&self.collection, value).await?;
        info!(%label, %id, "Face record appended");
        Ok(id)
    }

    /// Returns all records whose label exactly equals `label`
    /// (case-sensitive). Empty result is not an error; ordering is
    /// store-defined.
    pub async fn find_by_label(&self, label: &str) -> Result<Vec<FaceRecord>, AppError> {
        self.authorize()?;
        let documents = self.backend.query_eq(&self.collection, "label", label).await?;
        let records = documents
            .into_iter()
            .filter_map(|(id, value)| Self::into_record(id, value))
            .collect::<Vec<_>>();
        info!(%label, count = records.len(), "Label query complete");
        Ok(records)
    }

    // Malformed documents written by other clients are skipped, not fatal.
    fn into_record(id: String, value: Value) -> Option<FaceRecord> {
        let document: FaceDocument = serde_json::from_value(value).ok()?;
        Some(FaceRecord {
            id,
            label: document.record.label,
            image: document.record.image,
            features: document.record.features,
            created_at: document.created_at,
        })
    }
}
