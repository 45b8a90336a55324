//! Integration tests for Shopfront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopfront-integration-tests
//! ```
//!
//! Tests run against [`MockContentStore`], an in-process axum server that
//! speaks the content store's REST API on an ephemeral port. No external
//! services are needed.
//!
//! # Example
//!
//! ```rust,ignore
//! let store = MockContentStore::start().await;
//! store.set_products(json!([{"id": "A", "title": "Mug", "price": 10}])).await;
//!
//! let client = ApiClient::new(&store.api_config())?;
//! assert_eq!(client.list_products().await?.len(), 1);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use shopfront_storefront::config::ApiConfig;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

/// How list endpoints wrap their results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListShape {
    /// `{"docs": [...], "totalDocs": n}`
    Paginated,
    /// A bare JSON array.
    Bare,
}

#[derive(Debug)]
struct Inner {
    products: Vec<Value>,
    categories: Vec<Value>,
    list_shape: ListShape,
    order_response: (StatusCode, Value),
    orders: Vec<Value>,
    subscribers: Vec<Value>,
    authorization: Vec<String>,
    hits: HashMap<&'static str, usize>,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            products: Vec::new(),
            categories: Vec::new(),
            list_shape: ListShape::Paginated,
            order_response: (
                StatusCode::CREATED,
                json!({"message": "Order created", "doc": {"id": "order-1", "status": "pending"}}),
            ),
            orders: Vec::new(),
            subscribers: Vec::new(),
            authorization: Vec::new(),
            hits: HashMap::new(),
        }
    }
}

impl Inner {
    fn record(&mut self, route: &'static str, headers: &HeaderMap) {
        *self.hits.entry(route).or_default() += 1;
        if let Some(value) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
            self.authorization.push(value.to_string());
        }
    }

    fn list(&self, items: &[Value]) -> Value {
        match self.list_shape {
            ListShape::Paginated => json!({"docs": items, "totalDocs": items.len()}),
            ListShape::Bare => json!(items),
        }
    }
}

type Shared = Arc<Mutex<Inner>>;

/// In-process mock of the content-store REST API.
///
/// The server runs until the test's runtime shuts down.
#[derive(Debug, Clone)]
pub struct MockContentStore {
    base_url: String,
    inner: Shared,
}

impl MockContentStore {
    /// Bind to an ephemeral port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start() -> Self {
        let inner = Shared::default();
        let app = Router::new()
            .route("/api/products", get(list_products))
            .route("/api/products/{id}", get(get_product))
            .route("/api/categories", get(list_categories))
            .route("/api/orders", post(create_order))
            .route("/api/subscribers", post(create_subscriber))
            .with_state(Arc::clone(&inner));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock content store");
        let addr = listener.local_addr().expect("mock content store address");

        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{addr}/api"),
            inner,
        }
    }

    /// Client configuration pointing at this server.
    ///
    /// # Panics
    ///
    /// Never in practice; the base URL is always a valid http URL.
    #[must_use]
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig::with_base_url(&self.base_url).expect("mock base URL is valid")
    }

    pub async fn set_products(&self, products: Value) {
        self.inner.lock().await.products = as_items(products);
    }

    pub async fn set_categories(&self, categories: Value) {
        self.inner.lock().await.categories = as_items(categories);
    }

    pub async fn set_list_shape(&self, shape: ListShape) {
        self.inner.lock().await.list_shape = shape;
    }

    /// Answer order submissions with `status` and `body` from now on.
    pub async fn respond_to_orders(&self, status: u16, body: Value) {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        self.inner.lock().await.order_response = (status, body);
    }

    /// Order bodies received so far, including rejected ones.
    pub async fn orders(&self) -> Vec<Value> {
        self.inner.lock().await.orders.clone()
    }

    /// Subscription bodies received so far.
    pub async fn subscribers(&self) -> Vec<Value> {
        self.inner.lock().await.subscribers.clone()
    }

    /// `Authorization` header values received so far.
    pub async fn authorization_headers(&self) -> Vec<String> {
        self.inner.lock().await.authorization.clone()
    }

    /// Number of requests served by a route (`"products"`, `"product"`,
    /// `"categories"`, `"orders"`, `"subscribers"`).
    pub async fn hits(&self, route: &str) -> usize {
        self.inner.lock().await.hits.get(route).copied().unwrap_or(0)
    }
}

fn as_items(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        other => vec![other],
    }
}

fn id_matches(product: &Value, id: &str) -> bool {
    match product.get("id") {
        Some(Value::String(s)) => s == id,
        Some(Value::Number(n)) => n.to_string() == id,
        _ => false,
    }
}

async fn list_products(State(inner): State<Shared>, headers: HeaderMap) -> Json<Value> {
    let mut inner = inner.lock().await;
    inner.record("products", &headers);
    Json(inner.list(&inner.products))
}

async fn get_product(
    State(inner): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    let mut inner = inner.lock().await;
    inner.record("product", &headers);
    inner
        .products
        .iter()
        .find(|p| id_matches(p, &id))
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn list_categories(State(inner): State<Shared>, headers: HeaderMap) -> Json<Value> {
    let mut inner = inner.lock().await;
    inner.record("categories", &headers);
    Json(inner.list(&inner.categories))
}

async fn create_order(
    State(inner): State<Shared>,
    headers: HeaderMap,
    Json(order): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut inner = inner.lock().await;
    inner.record("orders", &headers);
    inner.orders.push(order);
    let (status, body) = inner.order_response.clone();
    (status, Json(body))
}

async fn create_subscriber(
    State(inner): State<Shared>,
    headers: HeaderMap,
    Json(subscription): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut inner = inner.lock().await;
    inner.record("subscribers", &headers);
    inner.subscribers.push(subscription.clone());
    (StatusCode::CREATED, Json(json!({"doc": subscription})))
}
