//! Checkout: turn the cart into an order and submit it.
//!
//! The cart is only cleared after the content store accepts the order. Any
//! failure leaves it untouched so the customer can retry.

use rust_decimal::Decimal;
use serde::Serialize;
use shopfront_core::{
    CartState, Email, OrderStatus, PaymentMethod, PaymentStatus, Price, ProductId,
};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::api::{ApiClient, ApiError, OrderReceipt};
use crate::cart::CartStore;
use crate::error::add_breadcrumb;
use crate::storage::KeyValueStore;

/// Errors that can occur while placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// There is nothing in the cart to order.
    #[error("cart is empty")]
    EmptyCart,

    /// A required customer field is missing.
    #[error("customer {0} is required")]
    MissingField(&'static str),

    /// Online payment was chosen without a transaction reference.
    #[error("a transaction id is required for online payment")]
    MissingTransactionId,

    /// The content store did not accept the order. The cart is kept.
    #[error("order submission failed: {0}")]
    Submission(#[source] ApiError),
}

impl CheckoutError {
    /// Whether the customer can fix this by changing their input.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        match self {
            Self::EmptyCart | Self::MissingField(_) | Self::MissingTransactionId => true,
            Self::Submission(err) => err.is_client_error(),
        }
    }
}

/// Shipping and contact details for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Customer {
    pub name: String,
    pub email: Email,
    pub address: String,
    pub phone: String,
}

impl Customer {
    /// Build a customer, trimming every text field.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::MissingField` if a field is blank.
    pub fn new(
        name: impl Into<String>,
        email: Email,
        address: impl Into<String>,
        phone: impl Into<String>,
    ) -> Result<Self, CheckoutError> {
        Ok(Self {
            name: required("name", name.into())?,
            email,
            address: required("address", address.into())?,
            phone: required("phone", phone.into())?,
        })
    }
}

fn required(field: &'static str, value: String) -> Result<String, CheckoutError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CheckoutError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

/// How the customer chose to pay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentSelection {
    CashOnDelivery,
    /// Paid online; staff verify the reference before shipping.
    Online { transaction_id: String },
}

impl PaymentSelection {
    /// Payment method recorded on the order.
    #[must_use]
    pub const fn method(&self) -> PaymentMethod {
        match self {
            Self::CashOnDelivery => PaymentMethod::Cod,
            Self::Online { .. } => PaymentMethod::Online,
        }
    }
}

/// One line of a submitted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItem {
    pub product: ProductId,
    pub title: String,
    pub quantity: u32,
    pub price: Price,
}

/// Payment details of a submitted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayment {
    pub method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    pub status: PaymentStatus,
}

/// Body of an order creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub items: Vec<OrderItem>,
    #[serde(with = "shopfront_core::types::price::as_number")]
    pub total: Decimal,
    pub customer: Customer,
    pub payment: OrderPayment,
    pub status: OrderStatus,
}

impl Order {
    /// Build an order from the current cart contents.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` if the cart has no lines, or
    /// `CheckoutError::MissingTransactionId` for online payment without a
    /// reference.
    pub fn from_cart(
        cart: &CartState,
        customer: Customer,
        payment: PaymentSelection,
    ) -> Result<Self, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let method = payment.method();
        let transaction_id = match payment {
            PaymentSelection::CashOnDelivery => None,
            PaymentSelection::Online { transaction_id } => {
                let reference = transaction_id.trim();
                if reference.is_empty() {
                    return Err(CheckoutError::MissingTransactionId);
                }
                Some(reference.to_string())
            }
        };

        let items = cart
            .lines()
            .map(|line| OrderItem {
                product: line.id.clone(),
                title: line.title.clone(),
                quantity: line.quantity,
                price: line.price,
            })
            .collect();

        Ok(Self {
            items,
            total: cart.total_price(),
            customer,
            payment: OrderPayment {
                method,
                transaction_id,
                status: method.initial_status(),
            },
            status: OrderStatus::Pending,
        })
    }
}

/// Submit the cart as an order and clear it once accepted.
///
/// # Errors
///
/// Returns `CheckoutError::EmptyCart` or `CheckoutError::MissingTransactionId`
/// before anything is sent, and `CheckoutError::Submission` if the content
/// store does not accept the order. In every error case the cart is unchanged.
#[instrument(skip_all, fields(payment = %payment.method()))]
pub async fn place_order<S: KeyValueStore>(
    cart: &mut CartStore<S>,
    client: &ApiClient,
    customer: Customer,
    payment: PaymentSelection,
) -> Result<OrderReceipt, CheckoutError> {
    let order = Order::from_cart(cart.state(), customer, payment)?;
    add_breadcrumb("checkout", "Submitting order", None);

    let receipt = match client.create_order(&order).await {
        Ok(receipt) => receipt,
        Err(e) => {
            let err = CheckoutError::Submission(e);
            if err.is_user_error() {
                warn!(error = %err, "Order rejected, cart kept");
            } else {
                let event_id = sentry::capture_error(&err);
                warn!(
                    error = %err,
                    sentry_event_id = %event_id,
                    "Order submission failed, cart kept"
                );
            }
            return Err(err);
        }
    };

    cart.clear();
    info!(
        order_id = ?receipt.id,
        items = order.items.len(),
        total = %order.total,
        "Order placed"
    );
    Ok(receipt)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use shopfront_core::NewCartLine;

    use super::*;

    fn customer() -> Customer {
        Customer::new(
            "Ada Lovelace",
            Email::parse("ada@example.com").unwrap(),
            "12 Frederick St, Port of Spain",
            "+1 868 555 0100",
        )
        .unwrap()
    }

    fn cart() -> CartState {
        let mut cart = CartState::new();
        let mug = NewCartLine::new("A", "Mug", Price::from_cents(1000).unwrap(), "u");
        cart.add_items(mug, 2).unwrap();
        cart.add_item(NewCartLine::new(
            "B",
            "Tea",
            Price::from_cents(550).unwrap(),
            "u",
        ))
        .unwrap();
        cart
    }

    #[test]
    fn test_customer_fields_are_required() {
        let email = Email::parse("ada@example.com").unwrap();
        let err = Customer::new("  ", email.clone(), "addr", "phone").unwrap_err();
        assert!(matches!(err, CheckoutError::MissingField("name")));
        let err = Customer::new("Ada", email, "addr", "").unwrap_err();
        assert!(matches!(err, CheckoutError::MissingField("phone")));
    }

    #[test]
    fn test_customer_fields_are_trimmed() {
        let c = Customer::new(" Ada ", Email::parse("a@b.co").unwrap(), " x ", " 1 ").unwrap();
        assert_eq!(c.name, "Ada");
        assert_eq!(c.address, "x");
        assert_eq!(c.phone, "1");
    }

    #[test]
    fn test_empty_cart_is_rejected() {
        let err = Order::from_cart(&CartState::new(), customer(), PaymentSelection::CashOnDelivery)
            .unwrap_err();
        assert!(matches!(err, CheckoutError::EmptyCart));
        assert!(err.is_user_error());
    }

    #[test]
    fn test_online_requires_transaction_id() {
        let err = Order::from_cart(
            &cart(),
            customer(),
            PaymentSelection::Online {
                transaction_id: " ".to_string(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, CheckoutError::MissingTransactionId));
    }

    #[test]
    fn test_cod_order_body() {
        let order =
            Order::from_cart(&cart(), customer(), PaymentSelection::CashOnDelivery).unwrap();
        let json = serde_json::to_value(&order).unwrap();

        assert_eq!(json["total"], 25.5);
        assert_eq!(json["status"], "pending");
        assert_eq!(json["payment"]["method"], "cod");
        assert_eq!(json["payment"]["status"], "pending_payment");
        assert!(json["payment"].get("transactionId").is_none());
        assert_eq!(json["customer"]["email"], "ada@example.com");

        let items = json["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["product"], "A");
        assert_eq!(items[0]["quantity"], 2);
        assert_eq!(items[0]["price"], 10);
        assert_eq!(items[1]["price"], 5.5);
    }

    #[test]
    fn test_online_order_body() {
        let order = Order::from_cart(
            &cart(),
            customer(),
            PaymentSelection::Online {
                transaction_id: " TX-42 ".to_string(),
            },
        )
        .unwrap();
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["payment"]["method"], "online");
        assert_eq!(json["payment"]["transactionId"], "TX-42");
        assert_eq!(json["payment"]["status"], "awaiting_proof");
    }

    #[test]
    fn test_submission_error_classification() {
        let server = CheckoutError::Submission(ApiError::Status {
            status: 500,
            message: String::new(),
        });
        assert!(!server.is_user_error());

        let rejected = CheckoutError::Submission(ApiError::Status {
            status: 400,
            message: "missing phone".to_string(),
        });
        assert!(rejected.is_user_error());
    }
}
