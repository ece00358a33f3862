//! Contract properties of the document store adapter, checked against the
//! in-memory sessions.
//!
//! Run with: cargo test --test adapter_properties

use futures_util::io::Cursor;
use nosql_facade::backend::{InMemoryBlobSession, InMemoryDocumentSession};
use nosql_facade::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Person {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    city: String,
    status: String,
}

impl Entity for Person {
    const COLLECTION: &'static str = "people";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Invoice {
    #[serde(rename = "_id")]
    number: u64,
    total_cents: i64,
}

impl Entity for Invoice {
    const COLLECTION: &'static str = "invoices";
}

type MemoryAdapter = DocumentStoreAdapter<InMemoryDocumentSession, InMemoryBlobSession>;

fn adapter() -> MemoryAdapter {
    DocumentStoreAdapter::new(InMemoryDocumentSession::new(), InMemoryBlobSession::new())
}

fn person(id: &str, name: &str, city: &str, status: &str) -> Person {
    Person {
        id: id.to_string(),
        name: name.to_string(),
        city: city.to_string(),
        status: status.to_string(),
    }
}

fn sorted_ids(people: &[Person]) -> Vec<&str> {
    let mut ids: Vec<_> = people.iter().map(|p| p.id.as_str()).collect();
    ids.sort_unstable();
    ids
}

#[tokio::test]
async fn test_save_then_find_and_duplicate_rejected() {
    let db = adapter();
    let ana = person("p-1", "ana", "bogota", "active");

    assert!(db.save(&ana).await.unwrap());
    let found: Option<Person> = db.find_one("p-1").await.unwrap();
    assert_eq!(found, Some(ana.clone()));

    let changed = person("p-1", "other", "cali", "closed");
    let err = db.save(&changed).await.unwrap_err();
    assert!(matches!(err, DbError::DuplicateKey { .. }));

    // The first document is untouched
    let found: Option<Person> = db.find_one("p-1").await.unwrap();
    assert_eq!(found, Some(ana));
}

#[tokio::test]
async fn test_numeric_keys() {
    let db = adapter();
    db.save(&Invoice {
        number: 1001,
        total_cents: 2500,
    })
    .await
    .unwrap();

    let found: Option<Invoice> = db.find_one(&1001u64).await.unwrap();
    assert_eq!(found.map(|i| i.total_cents), Some(2500));
    assert!(!db.exists::<Invoice, _>(&1002u64).await.unwrap());
    // Same key value in another collection is independent
    assert!(!db.exists::<Person, _>(&1001u64).await.unwrap());
}

#[tokio::test]
async fn test_absent_keys() {
    let db = adapter();
    db.save(&person("p-1", "ana", "bogota", "active"))
        .await
        .unwrap();

    let found: Option<Person> = db.find_one("never-stored").await.unwrap();
    assert!(found.is_none());
    assert!(!db.exists::<Person, _>("never-stored").await.unwrap());
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let db = adapter();
    db.save(&person("p-1", "ana", "bogota", "active"))
        .await
        .unwrap();
    assert!(db.exists::<Person, _>("p-1").await.unwrap());

    db.delete::<Person, _>("p-1").await.unwrap();
    assert!(!db.exists::<Person, _>("p-1").await.unwrap());

    db.delete::<Person, _>("p-1").await.unwrap();
    db.delete::<Person, _>("never-stored").await.unwrap();
    assert!(!db.exists::<Person, _>("never-stored").await.unwrap());
}

#[tokio::test]
async fn test_get_all_objects() {
    let db = adapter();
    let empty: Vec<Person> = db.get_all_objects().await.unwrap();
    assert!(empty.is_empty());

    db.save(&person("p-1", "ana", "bogota", "active"))
        .await
        .unwrap();
    db.save(&person("p-2", "luis", "cali", "active"))
        .await
        .unwrap();
    db.save(&Invoice {
        number: 1,
        total_cents: 10,
    })
    .await
    .unwrap();

    let people: Vec<Person> = db.get_all_objects().await.unwrap();
    assert_eq!(sorted_ids(&people), vec!["p-1", "p-2"]);
}

#[tokio::test]
async fn test_regex_search_differs_from_exact_lookup() {
    let db = adapter();
    db.save(&person("p-1", "anabella", "bogota", "active"))
        .await
        .unwrap();

    let exact: Option<Person> = db.find_one_by_field_value("name", "ana").await.unwrap();
    assert!(exact.is_none());

    let loose: Vec<Person> = db
        .find_by_field_values(&FieldFilterSet::new().with("name", "ana"))
        .await
        .unwrap();
    assert_eq!(sorted_ids(&loose), vec!["p-1"]);

    db.save(&person("p-2", "ana", "medellin", "active"))
        .await
        .unwrap();

    let exact: Option<Person> = db.find_one_by_field_value("name", "ana").await.unwrap();
    assert_eq!(exact.map(|p| p.id), Some("p-2".to_string()));

    let loose: Vec<Person> = db
        .find_by_field_values(&FieldFilterSet::new().with("name", "ana"))
        .await
        .unwrap();
    assert_eq!(sorted_ids(&loose), vec!["p-1", "p-2"]);
}

#[tokio::test]
async fn test_conjunctive_search_excludes_partial_matches() {
    let db = adapter();
    db.save(&person("both", "ana", "bogota", "active"))
        .await
        .unwrap();
    db.save(&person("city-only", "luis", "bogota", "closed"))
        .await
        .unwrap();
    db.save(&person("status-only", "eva", "cali", "active"))
        .await
        .unwrap();

    let mut fields = HashMap::new();
    fields.insert("city".to_string(), "bog".to_string());
    fields.insert("status".to_string(), "act".to_string());

    let found: Vec<Person> = db
        .find_by_field_values(&FieldFilterSet::from(fields))
        .await
        .unwrap();
    assert_eq!(sorted_ids(&found), vec!["both"]);

    // Same result whatever order the set was built in
    let mut reversed = BTreeMap::new();
    reversed.insert("status".to_string(), "act".to_string());
    reversed.insert("city".to_string(), "bog".to_string());
    let found_again: Vec<Person> = db
        .find_by_field_values(&FieldFilterSet::from(reversed))
        .await
        .unwrap();
    assert_eq!(sorted_ids(&found_again), vec!["both"]);

    let none: Vec<Person> = db
        .find_by_field_values(&FieldFilterSet::new().with("city", "lima"))
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_empty_filter_set_rejected() {
    let db = adapter();
    let result: DbResult<Vec<Person>> = db.find_by_field_values(&FieldFilterSet::new()).await;
    assert!(matches!(result, Err(DbError::InvalidArgument { .. })));

    let from_empty_map = FieldFilterSet::from(HashMap::<String, String>::new());
    let result: DbResult<Vec<Person>> = db.find_by_field_values(&from_empty_map).await;
    assert!(matches!(result, Err(DbError::InvalidArgument { .. })));
}

#[tokio::test]
async fn test_store_and_delete_file() {
    let blobs = InMemoryBlobSession::new();
    let db = DocumentStoreAdapter::new(InMemoryDocumentSession::new(), blobs.clone());

    let descriptor = BlobDescriptor::new("a.txt")
        .with_content_type("text/plain")
        .with_metadata(&serde_json::json!({ "owner": "ana" }))
        .unwrap();
    let mut content = Cursor::new(b"hello".to_vec());
    db.store_file(&mut content, descriptor).await.unwrap();

    let stored = blobs.revisions("a.txt").unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].data, b"hello");
    assert_eq!(stored[0].content_type.as_deref(), Some("text/plain"));

    db.delete_file("a.txt").await.unwrap();
    assert!(!blobs.contains("a.txt").unwrap());

    // Deleting a name that was never stored is fine
    db.delete_file("missing.txt").await.unwrap();
    assert!(blobs.is_empty().unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_saves_with_distinct_keys() {
    let db = adapter();

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let db = db.clone();
            tokio::spawn(async move {
                db.save(&person(&format!("p-{}", i), "ana", "bogota", "active"))
                    .await
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().unwrap());
    }

    for i in 0..16 {
        let id = format!("p-{}", i);
        let found: Option<Person> = db.find_one(&id).await.unwrap();
        assert_eq!(found.map(|p| p.id), Some(id));
    }
    let all: Vec<Person> = db.get_all_objects().await.unwrap();
    assert_eq!(all.len(), 16);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_saves_with_same_key() {
    let db = adapter();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let db = db.clone();
            tokio::spawn(async move {
                db.save(&person("shared", &format!("writer-{}", i), "cali", "active"))
                    .await
            })
        })
        .collect();

    let mut saved = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => saved += 1,
            Err(err) => assert!(matches!(err, DbError::DuplicateKey { .. })),
        }
    }
    assert_eq!(saved, 1);
}
