//! Checkout command.

use std::io::Write;

use shopfront_core::Email;
use shopfront_storefront::api::ApiClient;
use shopfront_storefront::cart::CartStore;
use shopfront_storefront::checkout::{Customer, PaymentSelection, place_order};
use shopfront_storefront::error::Result;
use shopfront_storefront::storage::KeyValueStore;

/// Customer and payment details collected from the command line.
#[derive(Debug)]
pub struct CheckoutRequest {
    pub name: String,
    pub email: Email,
    pub address: String,
    pub phone: String,
    pub transaction_id: Option<String>,
}

impl CheckoutRequest {
    fn payment(&self) -> PaymentSelection {
        self.transaction_id
            .clone()
            .map_or(PaymentSelection::CashOnDelivery, |transaction_id| {
                PaymentSelection::Online { transaction_id }
            })
    }
}

/// Place an order for everything in the cart.
pub async fn checkout<S: KeyValueStore>(
    cart: &mut CartStore<S>,
    api: &ApiClient,
    request: CheckoutRequest,
    out: &mut impl Write,
) -> Result<()> {
    let payment = request.payment();
    let customer = Customer::new(request.name, request.email, request.address, request.phone)?;
    let items = cart.total_items();
    let total = cart.total_price();

    let receipt = place_order(cart, api, customer, payment).await?;

    match &receipt.id {
        Some(id) => writeln!(out, "Order {id} placed")?,
        None => writeln!(out, "Order placed")?,
    }
    writeln!(out, "Items: {items}")?;
    writeln!(out, "Total: {total:.2}")?;
    Ok(())
}
