//! Cart commands.

use std::io::Write;

use shopfront_core::{NewCartLine, ProductId, QuantityUpdate};
use shopfront_storefront::api::ApiClient;
use shopfront_storefront::cart::CartStore;
use shopfront_storefront::error::{AppError, Result};
use shopfront_storefront::storage::KeyValueStore;

/// Print every line with its total, then the cart totals.
pub fn show<S: KeyValueStore>(cart: &CartStore<S>, out: &mut impl Write) -> Result<()> {
    if cart.is_empty() {
        writeln!(out, "Cart is empty")?;
        return Ok(());
    }

    for line in cart.lines() {
        writeln!(
            out,
            "{:<12} {:<32} {:>4} x {:>9} = {:>10.2}",
            line.id,
            line.title,
            line.quantity,
            line.price,
            line.line_total()
        )?;
    }
    writeln!(out, "Items: {}", cart.total_items())?;
    writeln!(out, "Total: {:.2}", cart.total_price())?;
    Ok(())
}

/// Fetch a product from the catalog and add `quantity` units of it.
pub async fn add<S: KeyValueStore>(
    cart: &mut CartStore<S>,
    api: &ApiClient,
    id: &str,
    quantity: u32,
    out: &mut impl Write,
) -> Result<()> {
    let product = api.get_product(&ProductId::new(id)).await?;
    if !product.in_stock() {
        return Err(AppError::BadRequest(format!(
            "{} is out of stock",
            product.title
        )));
    }
    add_line(cart, product.to_cart_line(), quantity, out)
}

/// Add `quantity` units of a line.
pub fn add_line<S: KeyValueStore>(
    cart: &mut CartStore<S>,
    line: NewCartLine,
    quantity: u32,
    out: &mut impl Write,
) -> Result<()> {
    let line = cart.add_items(line, quantity)?;
    writeln!(
        out,
        "Added {quantity} x {} ({} in cart)",
        line.title, line.quantity
    )?;
    Ok(())
}

pub fn remove<S: KeyValueStore>(
    cart: &mut CartStore<S>,
    id: &str,
    out: &mut impl Write,
) -> Result<()> {
    match cart.remove_item(id) {
        Some(line) => writeln!(out, "Removed {}", line.title)?,
        None => writeln!(out, "{id} is not in the cart")?,
    }
    Ok(())
}

pub fn set<S: KeyValueStore>(
    cart: &mut CartStore<S>,
    id: &str,
    quantity: i64,
    out: &mut impl Write,
) -> Result<()> {
    match cart.update_quantity(id, quantity)? {
        QuantityUpdate::Set { quantity, .. } => writeln!(out, "{id} quantity set to {quantity}")?,
        QuantityUpdate::Removed(line) => writeln!(out, "Removed {}", line.title)?,
        QuantityUpdate::Absent => writeln!(out, "{id} is not in the cart")?,
    }
    Ok(())
}

pub fn clear<S: KeyValueStore>(cart: &mut CartStore<S>, out: &mut impl Write) -> Result<()> {
    let removed = cart.clear();
    writeln!(out, "Cart cleared ({removed} lines removed)")?;
    Ok(())
}
