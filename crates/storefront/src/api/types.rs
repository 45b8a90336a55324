//! Content-store API types.
//!
//! The content store has been served by more than one backend, and they
//! disagree on field names and shapes. The `*Record` types accept all of them
//! and normalize into [`Product`] and [`Category`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shopfront_core::{CategoryId, Email, NewCartLine, OrderId, OrderStatus, Price, ProductId};

/// Image shown when a product has no usable image URL.
pub const PLACEHOLDER_IMAGE: &str = "https://placehold.co/600x400?text=No+Image";

/// Title used when a product has none.
pub const UNTITLED_PRODUCT: &str = "Untitled Product";

/// Category name used when a product has none.
pub const UNCATEGORIZED: &str = "Uncategorized";

// =============================================================================
// Catalog
// =============================================================================

/// A catalog product, normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ProductRecord")]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub price: Price,
    pub image: String,
    pub category: String,
    pub description: Option<String>,
    pub features: Vec<String>,
    pub stock: Option<i64>,
    pub featured: bool,
}

impl Product {
    /// Snapshot of this product for adding to the cart.
    #[must_use]
    pub fn to_cart_line(&self) -> NewCartLine {
        NewCartLine::new(
            self.id.clone(),
            self.title.clone(),
            self.price,
            self.image.clone(),
        )
    }

    /// Whether the product can be bought. Products without stock tracking
    /// are always available.
    #[must_use]
    pub fn in_stock(&self) -> bool {
        self.stock.is_none_or(|stock| stock > 0)
    }
}

/// Product as sent by any content-store backend.
#[derive(Debug, Deserialize)]
struct ProductRecord {
    id: ProductId,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    price: Option<Price>,
    #[serde(default, alias = "image_url")]
    image: Option<ImageField>,
    #[serde(default)]
    category: Option<CategoryField>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    features: Option<Vec<FeatureField>>,
    #[serde(default)]
    stock: Option<i64>,
    #[serde(default, alias = "is_featured")]
    featured: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ImageField {
    Url(String),
    Media { url: Option<String> },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CategoryField {
    Name(String),
    Object {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        title: Option<String>,
    },
    Reference(i64),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeatureField {
    Text(String),
    Object { feature: String },
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl From<ProductRecord> for Product {
    fn from(record: ProductRecord) -> Self {
        let title = non_empty(record.title)
            .or_else(|| non_empty(record.name))
            .unwrap_or_else(|| UNTITLED_PRODUCT.to_string());

        let image = match record.image {
            Some(ImageField::Url(url) | ImageField::Media { url: Some(url) })
                if url.starts_with("http") =>
            {
                url
            }
            _ => PLACEHOLDER_IMAGE.to_string(),
        };

        let category = match record.category {
            Some(CategoryField::Name(name)) => non_empty(Some(name)),
            Some(CategoryField::Object { name, title }) => {
                non_empty(name).or_else(|| non_empty(title))
            }
            Some(CategoryField::Reference(_)) | None => None,
        }
        .unwrap_or_else(|| UNCATEGORIZED.to_string());

        let features = record
            .features
            .unwrap_or_default()
            .into_iter()
            .map(|f| match f {
                FeatureField::Text(text) | FeatureField::Object { feature: text } => text,
            })
            .collect();

        Self {
            id: record.id,
            title,
            price: record.price.unwrap_or(Price::ZERO),
            image,
            category,
            description: non_empty(record.description),
            features,
            stock: record.stock,
            featured: record.featured.unwrap_or(false),
        }
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    #[serde(alias = "title")]
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A list response, either bare or wrapped in a paginated `docs` envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListResponse<T> {
    Page { docs: Vec<T> },
    Bare(Vec<T>),
}

impl<T> ListResponse<T> {
    pub(crate) fn into_items(self) -> Vec<T> {
        match self {
            Self::Page { docs } | Self::Bare(docs) => docs,
        }
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Receipt returned after an order is created.
///
/// Backends differ in what they echo back; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OrderReceipt {
    #[serde(default)]
    pub id: Option<OrderId>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Order creation response, either the bare document or `{"doc": ...}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum CreatedResponse {
    Wrapped { doc: OrderReceipt },
    Bare(OrderReceipt),
}

impl From<CreatedResponse> for OrderReceipt {
    fn from(response: CreatedResponse) -> Self {
        match response {
            CreatedResponse::Wrapped { doc } | CreatedResponse::Bare(doc) => doc,
        }
    }
}

// =============================================================================
// Newsletter
// =============================================================================

/// Newsletter subscription request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub email: Email,
    pub subscribed_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_from_content_store_document() {
        let json = r#"{
            "id": "66a1",
            "title": "Pepper Sauce",
            "price": 45.5,
            "image": {"url": "https://cdn.example.tt/pepper.jpg"},
            "category": {"name": "Condiments"},
            "features": [{"feature": "Scotch bonnet"}, {"feature": "Small batch"}]
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id, ProductId::new("66a1"));
        assert_eq!(product.title, "Pepper Sauce");
        assert_eq!(product.price, Price::from_cents(4550).unwrap());
        assert_eq!(product.image, "https://cdn.example.tt/pepper.jpg");
        assert_eq!(product.category, "Condiments");
        assert_eq!(product.features, vec!["Scotch bonnet", "Small batch"]);
        assert!(!product.featured);
    }

    #[test]
    fn test_product_from_relational_backend() {
        let json = r#"{
            "id": 12,
            "name": "Cocoa Tea",
            "price": 30,
            "image_url": "https://cdn.example.tt/cocoa.png",
            "category_id": 3,
            "stock": 0,
            "is_featured": true
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id.as_str(), "12");
        assert_eq!(product.title, "Cocoa Tea");
        assert_eq!(product.image, "https://cdn.example.tt/cocoa.png");
        assert_eq!(product.category, UNCATEGORIZED);
        assert!(product.featured);
        assert!(!product.in_stock());
    }

    #[test]
    fn test_product_defaults() {
        let product: Product =
            serde_json::from_str(r#"{"id": "x", "image": "/local/path.png", "price": null}"#)
                .unwrap();
        assert_eq!(product.title, UNTITLED_PRODUCT);
        assert_eq!(product.price, Price::ZERO);
        assert_eq!(product.image, PLACEHOLDER_IMAGE);
        assert!(product.description.is_none());
        assert!(product.features.is_empty());
        assert!(product.in_stock());
    }

    #[test]
    fn test_product_rejects_negative_price() {
        assert!(serde_json::from_str::<Product>(r#"{"id": "x", "price": -1}"#).is_err());
    }

    #[test]
    fn test_to_cart_line_snapshots_fields() {
        let product: Product = serde_json::from_str(
            r#"{"id": "A", "title": "Mug", "price": 10, "image": "https://img/u", "category": "Kitchen"}"#,
        )
        .unwrap();
        let line = product.to_cart_line();
        assert_eq!(line.id, ProductId::new("A"));
        assert_eq!(line.title, "Mug");
        assert_eq!(line.price, Price::from_cents(1000).unwrap());
        assert_eq!(line.image, "https://img/u");
    }

    #[test]
    fn test_list_response_shapes() {
        let page: ListResponse<Category> =
            serde_json::from_str(r#"{"docs": [{"id": "c1", "name": "Kitchen"}], "totalDocs": 1}"#)
                .unwrap();
        let bare: ListResponse<Category> =
            serde_json::from_str(r#"[{"id": 4, "title": "Garden", "slug": "garden"}]"#).unwrap();

        assert_eq!(page.into_items()[0].name, "Kitchen");
        let bare = bare.into_items();
        assert_eq!(bare[0].id, CategoryId::new("4"));
        assert_eq!(bare[0].slug.as_deref(), Some("garden"));
    }

    #[test]
    fn test_order_receipt_shapes() {
        let wrapped: CreatedResponse = serde_json::from_str(
            r#"{"message": "Order created", "doc": {"id": "o1", "status": "pending", "createdAt": "2026-10-16T12:00:00Z"}}"#,
        )
        .unwrap();
        let receipt = OrderReceipt::from(wrapped);
        assert_eq!(receipt.id, Some(OrderId::new("o1")));
        assert_eq!(receipt.status, Some(OrderStatus::Pending));
        assert!(receipt.created_at.is_some());

        let bare: CreatedResponse = serde_json::from_str(r#"{"id": 99}"#).unwrap();
        assert_eq!(OrderReceipt::from(bare).id, Some(OrderId::new("99")));
    }

    #[test]
    fn test_subscription_body() {
        let body = Subscription {
            email: Email::parse("Fan@Example.com").unwrap(),
            subscribed_at: "2026-10-16T12:00:00Z".parse().unwrap(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["email"], "fan@example.com");
        assert_eq!(json["subscribedAt"], "2026-10-16T12:00:00Z");
    }
}
