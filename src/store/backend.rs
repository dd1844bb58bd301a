use crate::error::AppError;
use async_trait::async_trait;
use serde_json::Value;

/// Narrow interface to the remote document store. Documents are schema-free
/// JSON; the store assigns ids and is the sole authority for uniqueness.
/// Result ordering is store-defined and must not be relied on.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Appends a document to a collection, returning the assigned id.
    async fn insert(&self, collection: &str, document: Value) -> Result<String, AppError>;

    /// Returns all documents whose `field` exactly equals `value`
    /// (case-sensitive), paired with their ids.
    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<(String, Value)>, AppError>;
}
