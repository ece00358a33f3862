//! Entity typing
//!
//! The target collection of every operation is selected at compile time by
//! the entity type parameter. There is no runtime type inspection.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

use crate::error::{DbError, DbResult};

/// Field holding the primary key of every stored document
pub const PRIMARY_KEY_FIELD: &str = "_id";

/// A type that can be persisted through the facade.
///
/// The serialized form must carry its primary key under [`PRIMARY_KEY_FIELD`];
/// with serde that is usually `#[serde(rename = "_id")]` on the id field.
///
/// ```
/// use nosql_facade::Entity;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Person {
///     #[serde(rename = "_id")]
///     id: String,
///     name: String,
/// }
///
/// impl Entity for Person {
///     const COLLECTION: &'static str = "people";
/// }
/// ```
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + Unpin {
    /// Name of the logical collection holding this entity type
    const COLLECTION: &'static str;

    /// Validated descriptor for this entity type
    fn descriptor() -> DbResult<EntityDescriptor> {
        EntityDescriptor::new(Self::COLLECTION)
    }
}

/// Names the logical collection an operation targets.
///
/// Construction rejects empty or whitespace-only names, so a descriptor in
/// hand is always usable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityDescriptor {
    collection: String,
}

impl EntityDescriptor {
    /// Create a descriptor for the named collection
    pub fn new<S: Into<String>>(collection: S) -> DbResult<Self> {
        let collection = collection.into();
        if collection.trim().is_empty() {
            return Err(DbError::invalid_argument(
                "entity descriptor must name a collection",
            ));
        }
        Ok(Self { collection })
    }

    /// Collection name
    pub fn collection(&self) -> &str {
        &self.collection
    }
}

impl fmt::Display for EntityDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.collection)
    }
}

/// Render a primary key for error messages and logs
pub(crate) fn describe_key(key: &serde_json::Value) -> String {
    match key {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize)]
    struct Unnamed {
        #[serde(rename = "_id")]
        id: u32,
    }

    impl Entity for Unnamed {
        const COLLECTION: &'static str = "  ";
    }

    #[test]
    fn test_descriptor_rejects_blank_names() {
        assert!(matches!(
            EntityDescriptor::new(""),
            Err(DbError::InvalidArgument { .. })
        ));
        assert!(matches!(
            Unnamed::descriptor(),
            Err(DbError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_descriptor_display() {
        let descriptor = EntityDescriptor::new("people").unwrap();
        assert_eq!(descriptor.collection(), "people");
        assert_eq!(descriptor.to_string(), "people");
    }

    #[test]
    fn test_describe_key() {
        assert_eq!(describe_key(&serde_json::json!("p-1")), "p-1");
        assert_eq!(describe_key(&serde_json::json!(42)), "42");
    }
}
