use crate::error::ApiError;
use crate::model::object::{ObjectId, ObjectKind};
use async_trait::async_trait;
use serde_json::Value;

/// Abstraction over the NSX Manager REST API.
///
/// Implemented by the HTTP client and by the in-memory manager used in tests. Retries,
/// timeouts and authentication are the implementor's concern; callers only see the
/// terminal outcome of each call.
#[async_trait]
pub trait NsxApi: Send + Sync {
    /// Lists every object of a collection (following pagination).
    async fn list(&self, kind: ObjectKind) -> Result<Vec<Value>, ApiError>;

    /// Creates an object and returns the server representation.
    async fn create(&self, kind: ObjectKind, body: &Value) -> Result<Value, ApiError>;

    /// Replaces an object. `body` must carry the current `_revision`.
    async fn update(&self, kind: ObjectKind, id: &ObjectId, body: &Value)
        -> Result<Value, ApiError>;

    async fn delete(&self, kind: ObjectKind, id: &ObjectId) -> Result<(), ApiError>;

    /// Accepts the end-user license agreement. Idempotent on the manager side.
    async fn accept_eula(&self) -> Result<(), ApiError>;
}
