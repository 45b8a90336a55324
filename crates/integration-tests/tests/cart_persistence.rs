//! Durable cart behaviour on a real directory.

#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;
use shopfront_core::{NewCartLine, Price};
use shopfront_storefront::cart::{CartPersistence, CartStore};
use shopfront_storefront::config::StorefrontConfig;
use shopfront_storefront::state::AppState;
use shopfront_storefront::storage::{FileStore, KeyValueStore};

fn open(dir: &tempfile::TempDir) -> CartStore<FileStore> {
    CartStore::open(CartPersistence::new(FileStore::new(dir.path())))
}

fn line(id: &str, cents: i64) -> NewCartLine {
    NewCartLine::new(id, format!("Product {id}"), Price::from_cents(cents).unwrap(), "img")
}

#[test]
fn test_cart_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut cart = open(&dir);
        cart.add_item(line("A", 1000)).unwrap();
        cart.add_item(line("A", 1000)).unwrap();
        cart.add_item(line("B", 500)).unwrap();
        cart.update_quantity("B", 3).unwrap();
    }

    let cart = open(&dir);
    assert_eq!(cart.total_items(), 5);
    assert_eq!(cart.total_price(), Decimal::new(35, 0));
}

#[test]
fn test_written_file_is_plain_map() {
    let dir = tempfile::tempdir().unwrap();
    let mut cart = open(&dir);
    cart.add_item(line("A", 1050)).unwrap();

    let bytes = std::fs::read(dir.path().join("cart")).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "A": {"id": "A", "title": "Product A", "price": 10.5, "image": "img", "quantity": 1}
        })
    );
}

#[test]
fn test_legacy_envelope_is_migrated() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStore::new(dir.path());
    storage
        .put(
            "cart-storage",
            br#"{"state":{"items":{"7":{"id":7,"title":"Cocoa Tea","price":30,"image":"https://img/7","quantity":2}}},"version":0}"#,
        )
        .unwrap();

    let cart = open(&dir);
    assert_eq!(cart.get("7").unwrap().quantity, 2);
    assert_eq!(storage.get("cart-storage").unwrap(), None);
    assert!(storage.get("cart").unwrap().is_some());
    assert_eq!(open(&dir).total_items(), 2);
}

#[test]
fn test_corrupt_file_opens_empty_and_recovers() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("cart"), b"{not json").unwrap();

    let mut cart = open(&dir);
    assert!(cart.is_empty());
    cart.add_item(line("A", 100)).unwrap();
    assert_eq!(open(&dir).total_items(), 1);
}

#[test]
fn test_two_processes_last_writer_wins() {
    let dir = tempfile::tempdir().unwrap();
    let mut first = open(&dir);
    let mut second = open(&dir);

    first.add_item(line("A", 100)).unwrap();
    second.add_item(line("B", 200)).unwrap();

    let stored = open(&dir);
    assert!(stored.get("A").is_none());
    assert!(stored.get("B").is_some());
}

#[test]
fn test_app_state_cart_uses_configured_key() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().to_string_lossy().into_owned();
    let config = StorefrontConfig::from_vars(|key| match key {
        "SHOP_DATA_DIR" => Some(data_dir.clone()),
        "SHOP_CART_KEY" => Some("guest-cart".to_string()),
        _ => None,
    })
    .unwrap();
    let state = AppState::new(config).unwrap();

    state.open_cart().add_item(line("A", 100)).unwrap();

    assert!(dir.path().join("guest-cart").exists());
    assert!(!dir.path().join("cart").exists());
    assert_eq!(state.open_cart().total_items(), 1);
}
