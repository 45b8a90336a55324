//! Newsletter subscription against the mock content store.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use shopfront_core::Email;
use shopfront_integration_tests::MockContentStore;
use shopfront_storefront::api::ApiClient;

#[tokio::test]
async fn test_subscribe_posts_normalized_email() {
    let store = MockContentStore::start().await;
    let client = ApiClient::new(&store.api_config()).unwrap();

    client
        .subscribe(&Email::parse("  Fan@Example.COM ").unwrap())
        .await
        .unwrap();

    let subscribers = store.subscribers().await;
    assert_eq!(subscribers.len(), 1);
    assert_eq!(subscribers[0]["email"], "fan@example.com");
    let subscribed_at = subscribers[0]["subscribedAt"].as_str().unwrap();
    assert!(subscribed_at.parse::<chrono::DateTime<chrono::Utc>>().is_ok());
}
