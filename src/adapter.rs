//! Document store adapter
//!
//! [`DbNoSql`] realised over a [`DocumentSession`] and a [`BlobSession`].
//! Each operation validates its request locally, builds one filter and makes
//! one session call:
//!
//! ```text
//! find_one / delete / exists   ->  { _id == key }
//! get_all_objects              ->  {}
//! find_one_by_field_value      ->  { field == value }
//! find_by_field_values         ->  { f1 =~ p1 AND f2 =~ p2 AND ... }
//! delete_file                  ->  { filename == name }
//! ```

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::backend::{BlobContent, BlobDescriptor, BlobSession, DocumentSession, FILE_NAME_FIELD};
use crate::contract::DbNoSql;
use crate::entity::{Entity, PRIMARY_KEY_FIELD};
use crate::error::DbResult;
use crate::filter::{FieldFilter, FieldFilterSet, Filter};

/// Behaviour switches for the adapter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdapterOptions {
    /// Log and swallow store failures in `delete` instead of returning them.
    /// Off by default; only for callers that depend on the legacy behaviour.
    pub lenient_delete: bool,
}

/// Production implementation of [`DbNoSql`].
///
/// Holds shared handles to sessions established elsewhere and no other
/// state. Cloning is cheap and clones use the same sessions.
pub struct DocumentStoreAdapter<D, B> {
    documents: Arc<D>,
    blobs: Arc<B>,
    options: AdapterOptions,
}

impl<D, B> Clone for DocumentStoreAdapter<D, B> {
    fn clone(&self) -> Self {
        Self {
            documents: Arc::clone(&self.documents),
            blobs: Arc::clone(&self.blobs),
            options: self.options,
        }
    }
}

impl<D: DocumentSession, B: BlobSession> DocumentStoreAdapter<D, B> {
    /// Create an adapter with default options
    pub fn new(documents: D, blobs: B) -> Self {
        Self::with_options(documents, blobs, AdapterOptions::default())
    }

    /// Create an adapter with explicit options
    pub fn with_options(documents: D, blobs: B, options: AdapterOptions) -> Self {
        Self::from_shared(Arc::new(documents), Arc::new(blobs), options)
    }

    /// Create an adapter over sessions that are already shared elsewhere
    pub fn from_shared(documents: Arc<D>, blobs: Arc<B>, options: AdapterOptions) -> Self {
        Self {
            documents,
            blobs,
            options,
        }
    }

    /// Document session in use
    pub fn documents(&self) -> &D {
        &self.documents
    }

    /// Blob session in use
    pub fn blobs(&self) -> &B {
        &self.blobs
    }

    pub fn options(&self) -> AdapterOptions {
        self.options
    }

    /// Check if both sessions can reach their stores
    pub async fn is_available(&self) -> bool {
        self.documents.is_available().await && self.blobs.is_available().await
    }
}

#[async_trait]
impl<D: DocumentSession, B: BlobSession> DbNoSql for DocumentStoreAdapter<D, B> {
    async fn save<T: Entity>(&self, entity: &T) -> DbResult<bool> {
        let descriptor = T::descriptor()?;
        debug!(collection = %descriptor, "save");

        self.documents
            .insert(descriptor.collection(), entity)
            .await?;
        Ok(true)
    }

    async fn find_one<T, K>(&self, key: &K) -> DbResult<Option<T>>
    where
        T: Entity,
        K: Serialize + Send + Sync + ?Sized,
    {
        let descriptor = T::descriptor()?;
        let filter = Filter::eq(PRIMARY_KEY_FIELD, key)?;
        debug!(collection = %descriptor, "find_one");

        self.documents
            .find_one(descriptor.collection(), &filter)
            .await
    }

    async fn delete<T, K>(&self, key: &K) -> DbResult<()>
    where
        T: Entity,
        K: Serialize + Send + Sync + ?Sized,
    {
        let descriptor = T::descriptor()?;
        let filter = Filter::eq(PRIMARY_KEY_FIELD, key)?;
        debug!(collection = %descriptor, "delete");

        match self.documents.remove(descriptor.collection(), &filter).await {
            Ok(removed) => {
                debug!(collection = %descriptor, removed, "delete finished");
                Ok(())
            }
            Err(err) if self.options.lenient_delete => {
                warn!(collection = %descriptor, error = %err, "delete failed, ignoring");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    async fn exists<T, K>(&self, key: &K) -> DbResult<bool>
    where
        T: Entity,
        K: Serialize + Send + Sync + ?Sized,
    {
        let descriptor = T::descriptor()?;
        let filter = Filter::eq(PRIMARY_KEY_FIELD, key)?;
        debug!(collection = %descriptor, "exists");

        self.documents
            .exists(descriptor.collection(), &filter)
            .await
    }

    async fn get_all_objects<T: Entity>(&self) -> DbResult<Vec<T>> {
        let descriptor = T::descriptor()?;
        debug!(collection = %descriptor, "get_all_objects");

        self.documents.find_all(descriptor.collection()).await
    }

    async fn find_one_by_field_value<T, V>(&self, field: &str, value: &V) -> DbResult<Option<T>>
    where
        T: Entity,
        V: Serialize + Send + Sync + ?Sized,
    {
        let descriptor = T::descriptor()?;
        let filter = FieldFilter::new(field, value)?.to_filter()?;
        debug!(collection = %descriptor, field, "find_one_by_field_value");

        self.documents
            .find_one(descriptor.collection(), &filter)
            .await
    }

    async fn find_by_field_values<T: Entity>(&self, fields: &FieldFilterSet) -> DbResult<Vec<T>> {
        let descriptor = T::descriptor()?;
        let filter = fields.to_filter()?;
        debug!(
            collection = %descriptor,
            clauses = filter.clauses().len(),
            "find_by_field_values"
        );

        self.documents
            .find(descriptor.collection(), &filter)
            .await
    }

    async fn store_file(
        &self,
        content: BlobContent<'_>,
        descriptor: BlobDescriptor,
    ) -> DbResult<()> {
        descriptor.validate()?;
        debug!(file_name = %descriptor.file_name, "store_file");

        self.blobs.store(content, &descriptor).await
    }

    async fn delete_file(&self, file_name: &str) -> DbResult<()> {
        let filter = Filter::eq(FILE_NAME_FIELD, file_name)?;
        let removed = self.blobs.delete(&filter).await?;
        debug!(file_name, removed, "delete_file");
        Ok(())
    }
}
