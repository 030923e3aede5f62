//! Tests for typed document collections
//!
//! These tests verify:
//! - Save / find / remove by id
//! - Derived queries over the latest version of each document
//! - Isolation between collections sharing one engine
//! - Schema version checks on decode

use std::sync::Arc;

use dynakv::config::{Config, SyncStrategy};
use dynakv::model::{decode_document, encode_document, Collection, Document};
use dynakv::{DynaError, Engine};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

// =============================================================================
// Test Documents
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Product {
    name: String,
    price_cents: u64,
    stock: u32,
}

impl Document for Product {
    const COLLECTION: &'static str = "products";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct User {
    username: String,
    email: String,
    role: String,
}

impl Document for User {
    const COLLECTION: &'static str = "users";
}

/// Same collection as `Product`, newer layout
#[derive(Debug, Serialize, Deserialize)]
struct ProductV2 {
    name: String,
    price_cents: u64,
    stock: u32,
    tags: Vec<String>,
}

impl Document for ProductV2 {
    const COLLECTION: &'static str = "products";
    const SCHEMA_VERSION: u8 = 2;
}

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_engine() -> (TempDir, Arc<Engine>) {
    let temp = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp.path())
        .sync_strategy(SyncStrategy::EveryWrite)
        .build();
    let engine = Arc::new(Engine::open(config).unwrap());
    (temp, engine)
}

fn product(name: &str, price_cents: u64) -> Product {
    Product {
        name: name.to_string(),
        price_cents,
        stock: 10,
    }
}

fn sorted<T>(mut docs: Vec<(String, T)>) -> Vec<(String, T)> {
    docs.sort_by(|a, b| a.0.cmp(&b.0));
    docs
}

// =============================================================================
// CRUD Tests
// =============================================================================

#[test]
fn test_save_and_find_by_id() {
    let (_temp, engine) = setup_engine();
    let products = Collection::<Product>::new(engine.clone());

    let lamp = product("lamp", 2599);
    products.save("p1", &lamp).unwrap();

    assert_eq!(products.find_by_id("p1").unwrap(), Some(lamp));
    assert_eq!(products.find_by_id("p2").unwrap(), None);

    // Stored under "<collection>:<id>"
    assert!(engine.get(b"products:p1").unwrap().is_some());
}

#[test]
fn test_update_keeps_single_entry() {
    let (_temp, engine) = setup_engine();
    let products = Collection::<Product>::new(engine);

    products.save("p1", &product("lamp", 2599)).unwrap();
    products.save("p1", &product("lamp", 1999)).unwrap();

    let all = products.find_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].0, "p1");
    assert_eq!(all[0].1.price_cents, 1999);
}

#[test]
fn test_remove() {
    let (_temp, engine) = setup_engine();
    let products = Collection::<Product>::new(engine);

    products.save("p1", &product("lamp", 2599)).unwrap();

    assert!(products.remove("p1").unwrap());
    assert_eq!(products.find_by_id("p1").unwrap(), None);
    assert!(!products.remove("p1").unwrap());
    assert!(products.find_all().unwrap().is_empty());
}

#[test]
fn test_documents_survive_restart() {
    let temp = TempDir::new().unwrap();

    {
        let engine = Arc::new(Engine::open_path(temp.path()).unwrap());
        let users = Collection::<User>::new(engine.clone());
        users
            .save(
                "u1",
                &User {
                    username: "ada".to_string(),
                    email: "ada@example.com".to_string(),
                    role: "admin".to_string(),
                },
            )
            .unwrap();
        drop(users);
        Arc::try_unwrap(engine).ok().unwrap().close().unwrap();
    }

    let engine = Arc::new(Engine::open_path(temp.path()).unwrap());
    let users = Collection::<User>::new(engine);
    let ada = users.find_by_id("u1").unwrap().unwrap();
    assert_eq!(ada.email, "ada@example.com");
}

// =============================================================================
// Query Tests
// =============================================================================

#[test]
fn test_find_where() {
    let (_temp, engine) = setup_engine();
    let products = Collection::<Product>::new(engine);

    products.save("p1", &product("pen", 150)).unwrap();
    products.save("p2", &product("lamp", 2599)).unwrap();
    products.save("p3", &product("chair", 8900)).unwrap();
    products.save("p4", &product("mug", 900)).unwrap();
    // Price change moves p3 into the range
    products.save("p3", &product("chair", 4500)).unwrap();

    let mid_range = sorted(
        products
            .find_where(|p| (500..=5000).contains(&p.price_cents))
            .unwrap(),
    );

    let ids: Vec<&str> = mid_range.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["p2", "p3", "p4"]);
}

#[test]
fn test_collections_are_isolated() {
    let (_temp, engine) = setup_engine();
    let products = Collection::<Product>::new(engine.clone());
    let users = Collection::<User>::new(engine.clone());

    products.save("1", &product("lamp", 2599)).unwrap();
    users
        .save(
            "1",
            &User {
                username: "bob".to_string(),
                email: "bob@example.com".to_string(),
                role: "user".to_string(),
            },
        )
        .unwrap();
    // Raw key outside any collection
    engine.put(b"unrelated", b"bytes").unwrap();

    assert_eq!(products.name(), "products");
    assert_eq!(users.name(), "users");
    assert_eq!(products.find_all().unwrap().len(), 1);
    assert_eq!(users.find_all().unwrap().len(), 1);
    assert_eq!(users.find_by_id("1").unwrap().unwrap().username, "bob");
    assert_eq!(products.find_by_id("1").unwrap().unwrap().name, "lamp");
}

// =============================================================================
// Encoding Tests
// =============================================================================

#[test]
fn test_encoding_carries_schema_version() {
    let bytes = encode_document(&product("lamp", 2599)).unwrap();

    assert_eq!(bytes[0], Product::SCHEMA_VERSION);
    assert_eq!(decode_document::<Product>(&bytes).unwrap(), product("lamp", 2599));
}

#[test]
fn test_schema_version_mismatch() {
    let (_temp, engine) = setup_engine();
    let v1 = Collection::<Product>::new(engine.clone());
    let v2 = Collection::<ProductV2>::new(engine);

    v1.save("p1", &product("lamp", 2599)).unwrap();

    assert!(matches!(
        v2.find_by_id("p1"),
        Err(DynaError::Serialization(_))
    ));
}

#[test]
fn test_queries_skip_undecodable_documents() {
    let (_temp, engine) = setup_engine();
    let v1 = Collection::<Product>::new(engine.clone());
    let v2 = Collection::<ProductV2>::new(engine.clone());

    v1.save("old", &product("lamp", 2599)).unwrap();
    v2.save(
        "new",
        &ProductV2 {
            name: "desk".to_string(),
            price_cents: 15000,
            stock: 2,
            tags: vec!["office".to_string()],
        },
    )
    .unwrap();
    // Not a document at all
    engine.put(b"products:junk", b"").unwrap();

    let current = v2.find_all().unwrap();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].0, "new");
    assert_eq!(current[0].1.tags, vec!["office".to_string()]);

    let legacy = v1.find_where(|p| p.price_cents > 1000).unwrap();
    assert_eq!(legacy.len(), 1);
    assert_eq!(legacy[0].0, "old");
}

#[test]
fn test_decode_empty_document() {
    let result = decode_document::<Product>(&[]);
    assert!(matches!(result, Err(DynaError::Serialization(_))));
}
