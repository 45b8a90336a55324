//! Checkout against the mock content store.
//!
//! The cart must only be cleared once the order is accepted.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use secrecy::SecretString;
use serde_json::json;
use shopfront_core::{Email, NewCartLine, OrderId, Price};
use shopfront_integration_tests::MockContentStore;
use shopfront_storefront::api::{ApiClient, ApiError};
use shopfront_storefront::cart::{CartPersistence, CartStore};
use shopfront_storefront::checkout::{CheckoutError, Customer, PaymentSelection, place_order};
use shopfront_storefront::storage::FileStore;

fn customer() -> Customer {
    Customer::new(
        "Ada Lovelace",
        Email::parse("Ada@Example.com").unwrap(),
        "12 Frederick St, Port of Spain",
        "+1 868 555 0100",
    )
    .unwrap()
}

fn open_cart(dir: &tempfile::TempDir) -> CartStore<FileStore> {
    CartStore::open(CartPersistence::new(FileStore::new(dir.path())))
}

fn fill(cart: &mut CartStore<FileStore>) {
    let mug = NewCartLine::new("A", "Mug", Price::from_cents(1000).unwrap(), "https://img/a");
    cart.add_items(mug, 2).unwrap();
    let tea = NewCartLine::new("B", "Tea", Price::from_cents(550).unwrap(), "https://img/b");
    cart.add_item(tea).unwrap();
}

// =============================================================================
// Accepted orders
// =============================================================================

#[tokio::test]
async fn test_accepted_order_clears_cart() {
    let store = MockContentStore::start().await;
    let client = ApiClient::new(&store.api_config()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let mut cart = open_cart(&dir);
    fill(&mut cart);

    let receipt = place_order(&mut cart, &client, customer(), PaymentSelection::CashOnDelivery)
        .await
        .unwrap();

    assert_eq!(receipt.id, Some(OrderId::new("order-1")));
    assert!(cart.is_empty());
    assert!(open_cart(&dir).is_empty(), "cleared cart must be persisted");
}

#[tokio::test]
async fn test_order_body_matches_cart() {
    let store = MockContentStore::start().await;
    let client = ApiClient::new(&store.api_config()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let mut cart = open_cart(&dir);
    fill(&mut cart);

    place_order(
        &mut cart,
        &client,
        customer(),
        PaymentSelection::Online {
            transaction_id: "TX-42".to_string(),
        },
    )
    .await
    .unwrap();

    let orders = store.orders().await;
    assert_eq!(orders.len(), 1);
    let order = &orders[0];
    assert_eq!(
        order["items"],
        json!([
            {"product": "A", "title": "Mug", "quantity": 2, "price": 10},
            {"product": "B", "title": "Tea", "quantity": 1, "price": 5.5}
        ])
    );
    assert_eq!(order["total"], 25.5);
    assert_eq!(order["status"], "pending");
    assert_eq!(
        order["payment"],
        json!({"method": "online", "transactionId": "TX-42", "status": "awaiting_proof"})
    );
    assert_eq!(order["customer"]["email"], "ada@example.com");
}

#[tokio::test]
async fn test_empty_response_body_gives_default_receipt() {
    let store = MockContentStore::start().await;
    store.respond_to_orders(204, json!(null)).await;
    let client = ApiClient::new(&store.api_config()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let mut cart = open_cart(&dir);
    fill(&mut cart);

    let receipt = place_order(&mut cart, &client, customer(), PaymentSelection::CashOnDelivery)
        .await
        .unwrap();
    assert_eq!(receipt.id, None);
    assert!(cart.is_empty());
}

#[tokio::test]
async fn test_unreadable_receipt_still_clears_cart() {
    let store = MockContentStore::start().await;
    store
        .respond_to_orders(201, json!({"doc": {"id": "o9", "status": "archived"}}))
        .await;
    let client = ApiClient::new(&store.api_config()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let mut cart = open_cart(&dir);
    fill(&mut cart);

    let receipt = place_order(&mut cart, &client, customer(), PaymentSelection::CashOnDelivery)
        .await
        .unwrap();
    assert_eq!(receipt.id, None);
    assert!(cart.is_empty());
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let store = MockContentStore::start().await;
    let mut config = store.api_config();
    config.token = Some(SecretString::from("shop-token-123"));
    let client = ApiClient::new(&config).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let mut cart = open_cart(&dir);
    fill(&mut cart);

    place_order(&mut cart, &client, customer(), PaymentSelection::CashOnDelivery)
        .await
        .unwrap();

    assert_eq!(
        store.authorization_headers().await,
        vec!["Bearer shop-token-123".to_string()]
    );
}

// =============================================================================
// Failed orders
// =============================================================================

#[tokio::test]
async fn test_server_error_keeps_cart() {
    let store = MockContentStore::start().await;
    store
        .respond_to_orders(500, json!({"errors": [{"message": "database down"}]}))
        .await;
    let client = ApiClient::new(&store.api_config()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let mut cart = open_cart(&dir);
    fill(&mut cart);
    let before = cart.state().clone();

    let err = place_order(&mut cart, &client, customer(), PaymentSelection::CashOnDelivery)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CheckoutError::Submission(ApiError::Status { status: 500, .. })
    ));
    assert!(!err.is_user_error());
    assert_eq!(cart.state(), &before);
    assert_eq!(open_cart(&dir).state(), &before);
}

#[tokio::test]
async fn test_rejected_order_keeps_cart() {
    let store = MockContentStore::start().await;
    store
        .respond_to_orders(400, json!({"errors": [{"message": "phone is invalid"}]}))
        .await;
    let client = ApiClient::new(&store.api_config()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let mut cart = open_cart(&dir);
    fill(&mut cart);

    let err = place_order(&mut cart, &client, customer(), PaymentSelection::CashOnDelivery)
        .await
        .unwrap_err();

    assert!(err.is_user_error());
    assert_eq!(cart.total_items(), 3);
}

#[tokio::test]
async fn test_unreachable_store_keeps_cart() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config =
        shopfront_storefront::config::ApiConfig::with_base_url(&format!("http://{addr}/api"))
            .unwrap();
    let client = ApiClient::new(&config).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let mut cart = open_cart(&dir);
    fill(&mut cart);

    let err = place_order(&mut cart, &client, customer(), PaymentSelection::CashOnDelivery)
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::Submission(ApiError::Http(_))));
    assert_eq!(cart.total_items(), 3);
}

#[tokio::test]
async fn test_empty_cart_sends_nothing() {
    let store = MockContentStore::start().await;
    let client = ApiClient::new(&store.api_config()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let mut cart = open_cart(&dir);

    let err = place_order(&mut cart, &client, customer(), PaymentSelection::CashOnDelivery)
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::EmptyCart));
    assert_eq!(store.hits("orders").await, 0);
}

#[tokio::test]
async fn test_retry_after_failure_succeeds() {
    let store = MockContentStore::start().await;
    store.respond_to_orders(503, json!({})).await;
    let client = ApiClient::new(&store.api_config()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let mut cart = open_cart(&dir);
    fill(&mut cart);

    assert!(
        place_order(&mut cart, &client, customer(), PaymentSelection::CashOnDelivery)
            .await
            .is_err()
    );

    store
        .respond_to_orders(201, json!({"doc": {"id": 7}}))
        .await;
    let receipt = place_order(&mut cart, &client, customer(), PaymentSelection::CashOnDelivery)
        .await
        .unwrap();

    assert_eq!(receipt.id, Some(OrderId::new("7")));
    assert!(cart.is_empty());
    let orders = store.orders().await;
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0], orders[1]);
}
