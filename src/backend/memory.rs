//! In-Memory Sessions
//!
//! HashMap-backed document and blob sessions for tests, development and
//! embedded use. Clone-friendly via Arc; clones share the same data.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::io::AsyncReadExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::traits::{BlobContent, BlobDescriptor, BlobSession, DocumentSession, FILE_NAME_FIELD};
use crate::entity::{describe_key, PRIMARY_KEY_FIELD};
use crate::error::{DbError, DbResult};
use crate::filter::{Document, Filter};

type Collections = HashMap<String, Vec<Document>>;

fn poisoned() -> DbError {
    DbError::unavailable("lock poisoned")
}

fn decode<T: DeserializeOwned>(document: &Document) -> DbResult<T> {
    serde_json::from_value(Value::Object(document.clone()))
        .map_err(|e| DbError::Deserialization(e.to_string()))
}

/// In-memory document session.
///
/// Collections keep documents in insertion order, which is the order
/// `find_one` and `find` observe.
#[derive(Clone, Default)]
pub struct InMemoryDocumentSession {
    collections: Arc<RwLock<Collections>>,
}

impl InMemoryDocumentSession {
    /// Create a new empty session
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> DbResult<RwLockReadGuard<'_, Collections>> {
        self.collections.read().map_err(|_| poisoned())
    }

    fn write(&self) -> DbResult<RwLockWriteGuard<'_, Collections>> {
        self.collections.write().map_err(|_| poisoned())
    }

    /// Number of documents stored in a collection
    pub fn count(&self, collection: &str) -> DbResult<usize> {
        Ok(self.read()?.get(collection).map_or(0, Vec::len))
    }
}

#[async_trait]
impl DocumentSession for InMemoryDocumentSession {
    fn backend_type(&self) -> &'static str {
        "memory"
    }

    async fn is_available(&self) -> bool {
        self.collections.read().is_ok()
    }

    async fn insert<T>(&self, collection: &str, document: &T) -> DbResult<()>
    where
        T: Serialize + Send + Sync,
    {
        let mut document = match serde_json::to_value(document)? {
            Value::Object(map) => map,
            other => {
                return Err(DbError::Serialization(format!(
                    "entity must serialize to an object, got {}",
                    other
                )))
            }
        };

        // Same as the driver: a document without a key gets a generated one
        let key = document
            .entry(PRIMARY_KEY_FIELD)
            .or_insert_with(|| Value::String(uuid::Uuid::new_v4().to_string()))
            .clone();

        let mut collections = self.write()?;
        let stored = collections.entry(collection.to_string()).or_default();
        if stored
            .iter()
            .any(|existing| existing.get(PRIMARY_KEY_FIELD) == Some(&key))
        {
            return Err(DbError::duplicate_key(collection, describe_key(&key)));
        }
        stored.push(document);
        Ok(())
    }

    async fn find_one<T>(&self, collection: &str, filter: &Filter) -> DbResult<Option<T>>
    where
        T: DeserializeOwned + Send + Sync + Unpin,
    {
        let matcher = filter.matcher()?;
        let collections = self.read()?;
        collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| matcher.matches(doc)))
            .map(decode)
            .transpose()
    }

    async fn find<T>(&self, collection: &str, filter: &Filter) -> DbResult<Vec<T>>
    where
        T: DeserializeOwned + Send + Sync + Unpin,
    {
        let matcher = filter.matcher()?;
        let collections = self.read()?;
        match collections.get(collection) {
            Some(docs) => docs
                .iter()
                .filter(|doc| matcher.matches(doc))
                .map(decode)
                .collect(),
            None => Ok(Vec::new()),
        }
    }

    async fn remove(&self, collection: &str, filter: &Filter) -> DbResult<u64> {
        let matcher = filter.matcher()?;
        let mut collections = self.write()?;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|doc| !matcher.matches(doc));
        Ok((before - docs.len()) as u64)
    }

    async fn exists(&self, collection: &str, filter: &Filter) -> DbResult<bool> {
        let matcher = filter.matcher()?;
        let collections = self.read()?;
        Ok(collections
            .get(collection)
            .is_some_and(|docs| docs.iter().any(|doc| matcher.matches(doc))))
    }
}

/// A stored blob revision
#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub file_name: String,
    pub content_type: Option<String>,
    pub metadata: Option<Value>,
    pub data: Vec<u8>,
    pub uploaded_at: DateTime<Utc>,
}

impl StoredBlob {
    /// Files-collection view used for filter evaluation
    fn as_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert(FILE_NAME_FIELD.to_string(), Value::String(self.file_name.clone()));
        doc.insert("length".to_string(), Value::from(self.data.len() as u64));
        if let Some(content_type) = &self.content_type {
            doc.insert("contentType".to_string(), Value::String(content_type.clone()));
        }
        if let Some(metadata) = &self.metadata {
            doc.insert("metadata".to_string(), metadata.clone());
        }
        doc
    }
}

/// In-memory blob session.
///
/// Storing an existing name adds a revision; deletes remove every matching
/// revision.
#[derive(Clone, Default)]
pub struct InMemoryBlobSession {
    blobs: Arc<RwLock<Vec<StoredBlob>>>,
}

impl InMemoryBlobSession {
    /// Create a new empty session
    pub fn new() -> Self {
        Self::default()
    }

    /// All revisions stored under a name, oldest first
    pub fn revisions(&self, file_name: &str) -> DbResult<Vec<StoredBlob>> {
        let blobs = self.blobs.read().map_err(|_| poisoned())?;
        Ok(blobs
            .iter()
            .filter(|blob| blob.file_name == file_name)
            .cloned()
            .collect())
    }

    /// Check if any revision exists under a name
    pub fn contains(&self, file_name: &str) -> DbResult<bool> {
        let blobs = self.blobs.read().map_err(|_| poisoned())?;
        Ok(blobs.iter().any(|blob| blob.file_name == file_name))
    }

    /// Total number of stored revisions
    pub fn len(&self) -> DbResult<usize> {
        Ok(self.blobs.read().map_err(|_| poisoned())?.len())
    }

    pub fn is_empty(&self) -> DbResult<bool> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl BlobSession for InMemoryBlobSession {
    fn backend_type(&self) -> &'static str {
        "memory"
    }

    async fn is_available(&self) -> bool {
        self.blobs.read().is_ok()
    }

    async fn store(&self, content: BlobContent<'_>, descriptor: &BlobDescriptor) -> DbResult<()> {
        let mut data = Vec::new();
        content
            .read_to_end(&mut data)
            .await
            .map_err(|e| DbError::operation(format!("failed to read blob content: {}", e)))?;

        let blob = StoredBlob {
            file_name: descriptor.file_name.clone(),
            content_type: descriptor.content_type.clone(),
            metadata: descriptor.metadata.clone(),
            data,
            uploaded_at: Utc::now(),
        };
        self.blobs.write().map_err(|_| poisoned())?.push(blob);
        Ok(())
    }

    async fn delete(&self, filter: &Filter) -> DbResult<u64> {
        let matcher = filter.matcher()?;
        let mut blobs = self.blobs.write().map_err(|_| poisoned())?;
        let before = blobs.len();
        blobs.retain(|blob| !matcher.matches(&blob.as_document()));
        Ok((before - blobs.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::io::Cursor;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        #[serde(rename = "_id")]
        id: String,
        text: String,
    }

    fn note(id: &str, text: &str) -> Note {
        Note {
            id: id.to_string(),
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let session = InMemoryDocumentSession::new();
        assert_eq!(session.backend_type(), "memory");
        assert!(session.is_available().await);

        session.insert("notes", &note("n1", "first")).await.unwrap();
        session.insert("notes", &note("n2", "second")).await.unwrap();

        let found: Option<Note> = session
            .find_one("notes", &Filter::eq("_id", "n2").unwrap())
            .await
            .unwrap();
        assert_eq!(found, Some(note("n2", "second")));

        let all: Vec<Note> = session.find_all("notes").await.unwrap();
        assert_eq!(all, vec![note("n1", "first"), note("n2", "second")]);
        assert_eq!(session.count("notes").unwrap(), 2);
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_key() {
        let session = InMemoryDocumentSession::new();
        session.insert("notes", &note("n1", "first")).await.unwrap();

        let err = session
            .insert("notes", &note("n1", "replacement"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::DuplicateKey { ref key, .. } if key == "n1"));

        let kept: Option<Note> = session
            .find_one("notes", &Filter::eq("_id", "n1").unwrap())
            .await
            .unwrap();
        assert_eq!(kept.unwrap().text, "first");
    }

    #[tokio::test]
    async fn test_same_key_in_different_collections() {
        let session = InMemoryDocumentSession::new();
        session.insert("notes", &note("n1", "a")).await.unwrap();
        session.insert("archive", &note("n1", "b")).await.unwrap();
        assert_eq!(session.count("notes").unwrap(), 1);
        assert_eq!(session.count("archive").unwrap(), 1);
    }

    #[tokio::test]
    async fn test_insert_generates_missing_key() {
        let session = InMemoryDocumentSession::new();
        session
            .insert("events", &json!({ "kind": "created" }))
            .await
            .unwrap();

        let stored: Vec<Value> = session.find_all("events").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert!(stored[0]["_id"].is_string());
    }

    #[tokio::test]
    async fn test_insert_rejects_non_objects() {
        let session = InMemoryDocumentSession::new();
        let err = session.insert("numbers", &42).await.unwrap_err();
        assert!(matches!(err, DbError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_remove_and_exists() {
        let session = InMemoryDocumentSession::new();
        session.insert("notes", &note("n1", "a")).await.unwrap();
        let by_key = Filter::eq("_id", "n1").unwrap();

        assert!(session.exists("notes", &by_key).await.unwrap());
        assert_eq!(session.remove("notes", &by_key).await.unwrap(), 1);
        assert!(!session.exists("notes", &by_key).await.unwrap());
        assert_eq!(session.remove("notes", &by_key).await.unwrap(), 0);
        assert_eq!(session.remove("missing", &by_key).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_decode_failure_is_reported() {
        let session = InMemoryDocumentSession::new();
        session
            .insert("notes", &json!({ "_id": "n1", "text": 5 }))
            .await
            .unwrap();

        let result: DbResult<Option<Note>> =
            session.find_one("notes", &Filter::all()).await;
        assert!(matches!(result, Err(DbError::Deserialization(_))));
    }

    #[tokio::test]
    async fn test_blob_revisions_and_delete() {
        let session = InMemoryBlobSession::new();
        assert_eq!(session.backend_type(), "memory");
        let started = Utc::now();

        let descriptor = BlobDescriptor::new("a.txt").with_content_type("text/plain");
        session
            .store(&mut Cursor::new(b"one".to_vec()), &descriptor)
            .await
            .unwrap();
        session
            .store(&mut Cursor::new(b"two".to_vec()), &descriptor)
            .await
            .unwrap();
        session
            .store(&mut Cursor::new(b"other".to_vec()), &BlobDescriptor::new("b.txt"))
            .await
            .unwrap();

        let revisions = session.revisions("a.txt").unwrap();
        assert_eq!(revisions.len(), 2);
        assert_eq!(revisions[0].data, b"one");
        assert_eq!(revisions[1].content_type.as_deref(), Some("text/plain"));
        assert!(started <= revisions[0].uploaded_at);
        assert!(revisions[0].uploaded_at <= revisions[1].uploaded_at);
        assert!(revisions[1].uploaded_at <= Utc::now());

        let by_name = Filter::eq(FILE_NAME_FIELD, "a.txt").unwrap();
        assert_eq!(session.delete(&by_name).await.unwrap(), 2);
        assert!(!session.contains("a.txt").unwrap());
        assert!(session.contains("b.txt").unwrap());
        assert_eq!(session.delete(&by_name).await.unwrap(), 0);
        assert_eq!(session.len().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_uncompilable_pattern_is_a_store_failure() {
        let session = InMemoryDocumentSession::new();
        session.insert("notes", &note("n1", "ana")).await.unwrap();
        let look_ahead = Filter::regex("text", "^(?!test)ana").unwrap();

        let result: DbResult<Vec<Note>> = session.find("notes", &look_ahead).await;
        assert!(matches!(result, Err(DbError::StoreOperationFailed { .. })));
        assert!(matches!(
            session.remove("notes", &look_ahead).await,
            Err(DbError::StoreOperationFailed { .. })
        ));
        assert_eq!(session.count("notes").unwrap(), 1);

        let blobs = InMemoryBlobSession::new();
        assert!(blobs.delete(&look_ahead).await.is_err());
    }
}
