//! Data-access contract
//!
//! The operation set every backing store implementation provides. The target
//! collection of each document operation is chosen by the entity type
//! parameter, see [`Entity`].
//!
//! Two lookups with deliberately different match semantics exist:
//! [`DbNoSql::find_one_by_field_value`] compares one field by exact equality,
//! while [`DbNoSql::find_by_field_values`] matches every field against a
//! regular expression. Callers may depend on either, so implementations keep
//! them distinct.

use async_trait::async_trait;
use serde::Serialize;

use crate::backend::{BlobContent, BlobDescriptor};
use crate::entity::Entity;
use crate::error::DbResult;
use crate::filter::FieldFilterSet;

/// Generic data-access facade over a document store and a blob store
#[async_trait]
pub trait DbNoSql: Send + Sync {
    /// Store a new entity.
    ///
    /// Never overwrites: fails with `DuplicateKey` if an entity with the same
    /// primary key is already stored. Returns `true` on success.
    async fn save<T: Entity>(&self, entity: &T) -> DbResult<bool>;

    /// Retrieve an entity by primary key, `None` if absent
    async fn find_one<T, K>(&self, key: &K) -> DbResult<Option<T>>
    where
        T: Entity,
        K: Serialize + Send + Sync + ?Sized;

    /// Delete an entity by primary key. Deleting an absent key is a no-op.
    async fn delete<T, K>(&self, key: &K) -> DbResult<()>
    where
        T: Entity,
        K: Serialize + Send + Sync + ?Sized;

    /// Check if an entity with the primary key is stored
    async fn exists<T, K>(&self, key: &K) -> DbResult<bool>
    where
        T: Entity,
        K: Serialize + Send + Sync + ?Sized;

    /// Retrieve every entity of the type; empty when none are stored
    async fn get_all_objects<T: Entity>(&self) -> DbResult<Vec<T>>;

    /// First entity whose `field` equals `value` exactly, `None` if absent.
    ///
    /// Which entity comes first when several match is store-defined.
    async fn find_one_by_field_value<T, V>(&self, field: &str, value: &V) -> DbResult<Option<T>>
    where
        T: Entity,
        V: Serialize + Send + Sync + ?Sized;

    /// Entities whose fields all match their regex patterns.
    ///
    /// Patterns are unanchored, so `{"name": "ana"}` selects both "ana" and
    /// "anabella". An empty set fails with `InvalidArgument` before the
    /// store is touched.
    async fn find_by_field_values<T: Entity>(&self, fields: &FieldFilterSet) -> DbResult<Vec<T>>;

    /// Persist a blob under the descriptor's file name
    async fn store_file(&self, content: BlobContent<'_>, descriptor: BlobDescriptor)
        -> DbResult<()>;

    /// Delete every blob stored under the file name. Deleting an absent
    /// name is a no-op.
    async fn delete_file(&self, file_name: &str) -> DbResult<()>;
}
