//! DocumentDB/MongoDB Sessions
//!
//! Document and blob sessions backed by the official MongoDB driver. Both
//! sessions share one client, so they are reached through the same
//! connection and database scope.
//!
//! ## Usage
//!
//! Enable the `storage-documentdb` feature in Cargo.toml:
//!
//! ```toml
//! nosql-facade = { version = "0.1", features = ["storage-documentdb"] }
//! ```
//!
//! ```rust,no_run
//! use nosql_facade::backend::MongoConnection;
//! use nosql_facade::DocumentStoreAdapter;
//!
//! async fn example() -> nosql_facade::DbResult<()> {
//!     let connection = MongoConnection::connect(
//!         "mongodb://localhost:27017",
//!         "app_db",
//!         "fs",
//!     )
//!     .await?;
//!
//!     let adapter = DocumentStoreAdapter::new(
//!         connection.document_session(),
//!         connection.blob_session(),
//!     );
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use futures_util::io::AsyncWriteExt;
use futures_util::TryStreamExt;
use mongodb::{
    bson::{doc, Bson, Document},
    error::{Error as MongoError, ErrorKind, GridFsErrorKind, WriteFailure},
    gridfs::GridFsBucket,
    options::GridFsBucketOptions,
    Client, Database,
};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::traits::{BlobContent, BlobDescriptor, BlobSession, DocumentSession};
use crate::entity::{describe_key, PRIMARY_KEY_FIELD};
use crate::error::{DbError, DbResult};
use crate::filter::Filter;

/// Server error code for unique index violations
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Map a driver error onto the facade taxonomy
fn store_error(err: MongoError) -> DbError {
    match err.kind.as_ref() {
        ErrorKind::ServerSelection { .. }
        | ErrorKind::Io(_)
        | ErrorKind::Authentication { .. }
        | ErrorKind::DnsResolve { .. }
        | ErrorKind::ConnectionPoolCleared { .. } => DbError::unavailable(err.to_string()),
        _ => DbError::operation(err.to_string()),
    }
}

fn is_duplicate_key(err: &MongoError) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY_CODE
    )
}

/// A GridFS file removed between listing and deleting it
fn is_file_not_found(err: &MongoError) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::GridFs(GridFsErrorKind::FileNotFound { .. })
    )
}

/// Established client plus the database both sessions work in
#[derive(Clone)]
pub struct MongoConnection {
    client: Client,
    database: Database,
    bucket_name: String,
}

impl MongoConnection {
    /// Connect and verify the server answers a ping
    ///
    /// # Arguments
    /// * `connection_string` - MongoDB/DocumentDB connection string
    /// * `database` - Database name
    /// * `bucket` - GridFS bucket name for blobs
    pub async fn connect(connection_string: &str, database: &str, bucket: &str) -> DbResult<Self> {
        let client = Client::with_uri_str(connection_string)
            .await
            .map_err(|e| DbError::unavailable(e.to_string()))?;
        let connection = Self {
            database: client.database(database),
            client,
            bucket_name: bucket.to_string(),
        };

        connection
            .database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| DbError::unavailable(e.to_string()))?;

        tracing::debug!(database, bucket, "connected to document store");
        Ok(connection)
    }

    /// Connect using a loaded store configuration
    #[cfg(feature = "config")]
    pub async fn from_config(config: &crate::config::StoreConfig) -> DbResult<Self> {
        config.validate()?;
        Self::connect(
            &config.data_source.connection_uri(),
            &config.data_source.database,
            &config.blob.bucket,
        )
        .await
    }

    /// Get the MongoDB client (for advanced operations)
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Document session over this connection's database
    pub fn document_session(&self) -> MongoDocumentSession {
        MongoDocumentSession::new(self.database.clone())
    }

    /// Blob session over this connection's GridFS bucket
    pub fn blob_session(&self) -> GridFsBlobSession {
        GridFsBlobSession::new(&self.database, &self.bucket_name)
    }
}

/// Document session over a MongoDB database
#[derive(Clone)]
pub struct MongoDocumentSession {
    database: Database,
}

impl MongoDocumentSession {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Get the database (for advanced operations)
    pub fn database(&self) -> &Database {
        &self.database
    }
}

#[async_trait]
impl DocumentSession for MongoDocumentSession {
    fn backend_type(&self) -> &'static str {
        "documentdb"
    }

    async fn is_available(&self) -> bool {
        self.database.run_command(doc! { "ping": 1 }).await.is_ok()
    }

    async fn insert<T>(&self, collection: &str, document: &T) -> DbResult<()>
    where
        T: Serialize + Send + Sync,
    {
        match self
            .database
            .collection::<T>(collection)
            .insert_one(document)
            .await
        {
            Ok(_) => Ok(()),
            Err(err) if is_duplicate_key(&err) => {
                let key = serde_json::to_value(document)
                    .ok()
                    .and_then(|value| value.get(PRIMARY_KEY_FIELD).map(describe_key))
                    .unwrap_or_default();
                Err(DbError::duplicate_key(collection, key))
            }
            Err(err) => Err(store_error(err)),
        }
    }

    async fn find_one<T>(&self, collection: &str, filter: &Filter) -> DbResult<Option<T>>
    where
        T: DeserializeOwned + Send + Sync + Unpin,
    {
        self.database
            .collection::<T>(collection)
            .find_one(filter.to_document()?)
            .await
            .map_err(store_error)
    }

    async fn find<T>(&self, collection: &str, filter: &Filter) -> DbResult<Vec<T>>
    where
        T: DeserializeOwned + Send + Sync + Unpin,
    {
        let cursor = self
            .database
            .collection::<T>(collection)
            .find(filter.to_document()?)
            .await
            .map_err(store_error)?;

        cursor.try_collect().await.map_err(store_error)
    }

    async fn remove(&self, collection: &str, filter: &Filter) -> DbResult<u64> {
        let result = self
            .database
            .collection::<Document>(collection)
            .delete_many(filter.to_document()?)
            .await
            .map_err(store_error)?;

        Ok(result.deleted_count)
    }

    async fn exists(&self, collection: &str, filter: &Filter) -> DbResult<bool> {
        let count = self
            .database
            .collection::<Document>(collection)
            .count_documents(filter.to_document()?)
            .limit(1)
            .await
            .map_err(store_error)?;

        Ok(count > 0)
    }
}

/// Blob session over a GridFS bucket.
///
/// GridFS keeps every upload under a name as its own file, so deleting by
/// name removes all revisions.
#[derive(Clone)]
pub struct GridFsBlobSession {
    database: Database,
    bucket: GridFsBucket,
}

impl GridFsBlobSession {
    pub fn new(database: &Database, bucket_name: &str) -> Self {
        let options = GridFsBucketOptions::builder()
            .bucket_name(bucket_name.to_string())
            .build();
        Self {
            database: database.clone(),
            bucket: database.gridfs_bucket(options),
        }
    }

    /// Metadata document stored alongside the file
    fn metadata_document(descriptor: &BlobDescriptor) -> DbResult<Document> {
        let mut metadata = Document::new();
        if let Some(content_type) = &descriptor.content_type {
            metadata.insert("contentType", content_type.as_str());
        }
        if let Some(extra) = &descriptor.metadata {
            let extra = Bson::try_from(extra.clone())
                .map_err(|e| DbError::Serialization(e.to_string()))?;
            metadata.insert("metadata", extra);
        }
        Ok(metadata)
    }
}

#[async_trait]
impl BlobSession for GridFsBlobSession {
    fn backend_type(&self) -> &'static str {
        "gridfs"
    }

    async fn is_available(&self) -> bool {
        self.database.run_command(doc! { "ping": 1 }).await.is_ok()
    }

    async fn store(&self, content: BlobContent<'_>, descriptor: &BlobDescriptor) -> DbResult<()> {
        let mut upload = self
            .bucket
            .open_upload_stream(&descriptor.file_name)
            .metadata(Self::metadata_document(descriptor)?)
            .await
            .map_err(store_error)?;

        if let Err(err) = futures_util::io::copy(content, &mut upload).await {
            // Leave no partial chunks behind
            let _ = upload.abort().await;
            return Err(DbError::operation(format!(
                "failed to upload {}: {}",
                descriptor.file_name, err
            )));
        }

        upload
            .close()
            .await
            .map_err(|e| DbError::operation(format!("failed to finish upload: {}", e)))
    }

    async fn delete(&self, filter: &Filter) -> DbResult<u64> {
        let files: Vec<_> = self
            .bucket
            .find(filter.to_document()?)
            .await
            .map_err(store_error)?
            .try_collect()
            .await
            .map_err(store_error)?;

        let mut deleted = 0;
        for file in files {
            match self.bucket.delete(file.id).await {
                Ok(()) => deleted += 1,
                // Already gone, a concurrent delete got there first
                Err(err) if is_file_not_found(&err) => {}
                Err(err) => return Err(store_error(err)),
            }
        }
        Ok(deleted)
    }
}
