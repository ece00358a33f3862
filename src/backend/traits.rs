//! Session Traits
//!
//! Defines the capabilities the facade consumes from a connected store.
//! Sessions are created once by the connection layer and shared by every
//! operation, so implementations must be safe for concurrent use.

use async_trait::async_trait;
use futures_util::io::AsyncRead;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{DbError, DbResult};
use crate::filter::Filter;

/// Field holding a blob's name in the blob store
pub const FILE_NAME_FIELD: &str = "filename";

/// Byte stream handed to [`BlobSession::store`]
pub type BlobContent<'a> = &'a mut (dyn AsyncRead + Unpin + Send);

/// Describes a binary object to persist
#[derive(Debug, Clone, PartialEq)]
pub struct BlobDescriptor {
    /// Addressing key of the blob
    pub file_name: String,
    /// MIME type, e.g. "text/plain"
    pub content_type: Option<String>,
    /// Arbitrary caller metadata
    pub metadata: Option<serde_json::Value>,
}

impl BlobDescriptor {
    /// Describe a blob by name
    pub fn new<S: Into<String>>(file_name: S) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            metadata: None,
        }
    }

    /// Set the content type
    pub fn with_content_type<S: Into<String>>(mut self, content_type: S) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Attach serializable metadata
    pub fn with_metadata<M: Serialize + ?Sized>(mut self, metadata: &M) -> DbResult<Self> {
        self.metadata = Some(serde_json::to_value(metadata)?);
        Ok(self)
    }

    /// Reject descriptors that cannot address a blob
    pub fn validate(&self) -> DbResult<()> {
        if self.file_name.trim().is_empty() {
            return Err(DbError::invalid_argument("file name must not be empty"));
        }
        Ok(())
    }
}

/// Connected document-store session
///
/// Every method addresses a collection by name and, where relevant, selects
/// documents with a [`Filter`].
#[async_trait]
pub trait DocumentSession: Send + Sync {
    /// Get the backend type name (e.g., "memory", "documentdb")
    fn backend_type(&self) -> &'static str;

    /// Check if the session can reach its store
    async fn is_available(&self) -> bool;

    /// Insert a new document. Must fail with `DuplicateKey` instead of
    /// replacing an existing document with the same primary key.
    async fn insert<T>(&self, collection: &str, document: &T) -> DbResult<()>
    where
        T: Serialize + Send + Sync;

    /// First document matching the filter, in store-defined order
    async fn find_one<T>(&self, collection: &str, filter: &Filter) -> DbResult<Option<T>>
    where
        T: DeserializeOwned + Send + Sync + Unpin;

    /// Every document matching the filter
    async fn find<T>(&self, collection: &str, filter: &Filter) -> DbResult<Vec<T>>
    where
        T: DeserializeOwned + Send + Sync + Unpin;

    /// Every document in the collection
    async fn find_all<T>(&self, collection: &str) -> DbResult<Vec<T>>
    where
        T: DeserializeOwned + Send + Sync + Unpin,
    {
        self.find(collection, &Filter::all()).await
    }

    /// Remove every document matching the filter, returning how many went
    async fn remove(&self, collection: &str, filter: &Filter) -> DbResult<u64>;

    /// Check if any document matches the filter
    async fn exists(&self, collection: &str, filter: &Filter) -> DbResult<bool>;
}

/// Connected blob-store session
#[async_trait]
pub trait BlobSession: Send + Sync {
    /// Get the backend type name (e.g., "memory", "gridfs")
    fn backend_type(&self) -> &'static str;

    /// Check if the session can reach its store
    async fn is_available(&self) -> bool;

    /// Persist the stream under the descriptor's file name
    async fn store(&self, content: BlobContent<'_>, descriptor: &BlobDescriptor) -> DbResult<()>;

    /// Delete every blob matching the filter, returning how many went
    async fn delete(&self, filter: &Filter) -> DbResult<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_descriptor_builder() {
        let descriptor = BlobDescriptor::new("a.txt")
            .with_content_type("text/plain")
            .with_metadata(&serde_json::json!({ "owner": "ana" }))
            .unwrap();

        assert_eq!(descriptor.file_name, "a.txt");
        assert_eq!(descriptor.content_type.as_deref(), Some("text/plain"));
        assert_eq!(descriptor.metadata, Some(serde_json::json!({ "owner": "ana" })));
        assert!(descriptor.validate().is_ok());
    }

    #[test]
    fn test_blob_descriptor_requires_name() {
        let result = BlobDescriptor::new("").validate();
        assert!(matches!(result, Err(DbError::InvalidArgument { .. })));
    }
}
