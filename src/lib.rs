//! NoSQL Facade - generic data access over document stores
//!
//! Save, fetch, delete, check existence of and query any entity type without
//! writing a query per type, plus blob storage on the same connection.
//!
//! - **`contract`** - the [`DbNoSql`] operation set
//! - **`adapter`** - [`DocumentStoreAdapter`], the production implementation
//! - **`backend`** - session traits with in-memory and MongoDB/DocumentDB sessions
//! - **`filter`** - equality and regex filters, [`FieldFilterSet`]
//! - **`config`** - connection configuration (enabled with the `config` feature)
//!
//! # Features
//!
//! ```toml
//! [dependencies]
//! nosql-facade = { version = "0.1", features = ["storage-documentdb"] }
//! ```
//!
//! # Example
//!
//! ```
//! use nosql_facade::backend::{InMemoryBlobSession, InMemoryDocumentSession};
//! use nosql_facade::prelude::*;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct Person {
//!     #[serde(rename = "_id")]
//!     id: String,
//!     name: String,
//!     city: String,
//! }
//!
//! impl Entity for Person {
//!     const COLLECTION: &'static str = "people";
//! }
//!
//! # async fn example() -> DbResult<()> {
//! let db = DocumentStoreAdapter::new(
//!     InMemoryDocumentSession::new(),
//!     InMemoryBlobSession::new(),
//! );
//!
//! db.save(&Person { id: "p-1".into(), name: "anabella".into(), city: "bogota".into() })
//!     .await?;
//!
//! // Exact equality: no match
//! let exact: Option<Person> = db.find_one_by_field_value("name", "ana").await?;
//! assert!(exact.is_none());
//!
//! // Regex search: matches
//! let loose: Vec<Person> = db
//!     .find_by_field_values(&FieldFilterSet::new().with("name", "ana").with("city", "bog"))
//!     .await?;
//! assert_eq!(loose.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod backend;
pub mod contract;
pub mod entity;
pub mod error;
pub mod filter;

/// Configuration management (enabled with the `config` feature)
#[cfg(feature = "config")]
pub mod config;

pub use adapter::{AdapterOptions, DocumentStoreAdapter};
pub use backend::{BlobDescriptor, BlobSession, DocumentSession};
pub use contract::DbNoSql;
pub use entity::{Entity, EntityDescriptor, PRIMARY_KEY_FIELD};
pub use error::{DbError, DbResult};
pub use filter::{FieldFilter, FieldFilterSet, Filter};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::adapter::{AdapterOptions, DocumentStoreAdapter};
    pub use crate::backend::{BlobDescriptor, BlobSession, DocumentSession};
    pub use crate::contract::DbNoSql;
    pub use crate::entity::{Entity, EntityDescriptor};
    pub use crate::error::{DbError, DbResult};
    pub use crate::filter::{FieldFilter, FieldFilterSet, Filter};

    #[cfg(feature = "config")]
    pub use crate::config::{ConfigurationLoader, EnvironmentLoader, StoreConfig};

    #[cfg(feature = "storage-documentdb")]
    pub use crate::backend::{GridFsBlobSession, MongoConnection, MongoDocumentSession};
}
