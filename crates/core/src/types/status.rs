//! Status enums for orders and payments.
//!
//! Wire values match the content store's order collection (`snake_case`
//! strings).

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
///
/// New orders are always submitted as `Pending`; the remaining states are
/// set by staff in the content store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Verifying,
    Paid,
    Shipped,
}

/// How the customer pays for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash on delivery.
    Cod,
    /// Online payment or bank transfer, confirmed by a transaction reference.
    Online,
}

impl PaymentMethod {
    /// Initial payment status for an order paid this way.
    #[must_use]
    pub const fn initial_status(self) -> PaymentStatus {
        match self {
            Self::Cod => PaymentStatus::PendingPayment,
            Self::Online => PaymentStatus::AwaitingProof,
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cod => write!(f, "cod"),
            Self::Online => write!(f, "online"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cod" => Ok(Self::Cod),
            "online" => Ok(Self::Online),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

/// Payment verification status recorded with an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Payment is collected on delivery.
    #[default]
    PendingPayment,
    /// Customer supplied a transaction reference that staff must verify.
    AwaitingProof,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_payment_status() {
        assert_eq!(PaymentMethod::Cod.initial_status(), PaymentStatus::PendingPayment);
        assert_eq!(PaymentMethod::Online.initial_status(), PaymentStatus::AwaitingProof);
    }

    #[test]
    fn test_wire_values() {
        assert_eq!(serde_json::to_string(&OrderStatus::Pending).unwrap(), "\"pending\"");
        assert_eq!(
            serde_json::to_string(&PaymentStatus::AwaitingProof).unwrap(),
            "\"awaiting_proof\""
        );
        assert_eq!(serde_json::to_string(&PaymentMethod::Cod).unwrap(), "\"cod\"");
    }

    #[test]
    fn test_payment_method_from_str() {
        assert_eq!("online".parse::<PaymentMethod>().unwrap(), PaymentMethod::Online);
        assert!("card".parse::<PaymentMethod>().is_err());
    }
}
