//! Session Backends
//!
//! The facade never talks to a driver directly. It consumes two session
//! traits, and this module provides their implementations.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │ DocumentStoreAdapter│
//! │   (DbNoSql impl)    │
//! └──────────┬──────────┘
//!            │
//!     ┌──────┴───────┐
//!     │              │
//! ┌───▼─────────┐ ┌──▼─────────┐
//! │ Document    │ │ Blob       │  <-- Traits
//! │ Session     │ │ Session    │
//! └───┬─────────┘ └──┬─────────┘
//!     │              │
//!  memory /       memory /
//!  documentdb     gridfs
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use nosql_facade::backend::{InMemoryBlobSession, InMemoryDocumentSession};
//! use nosql_facade::DocumentStoreAdapter;
//!
//! let adapter = DocumentStoreAdapter::new(
//!     InMemoryDocumentSession::new(),
//!     InMemoryBlobSession::new(),
//! );
//! ```

mod memory;
mod traits;

pub use memory::*;
pub use traits::*;

#[cfg(feature = "storage-documentdb")]
mod mongodb_backend;

#[cfg(feature = "storage-documentdb")]
pub use mongodb_backend::{GridFsBlobSession, MongoConnection, MongoDocumentSession};
