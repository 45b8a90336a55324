//! Catalog commands.

use std::io::Write;

use shopfront_core::ProductId;
use shopfront_storefront::api::{ApiClient, Product};
use shopfront_storefront::error::Result;

pub async fn list_products(api: &ApiClient, out: &mut impl Write) -> Result<()> {
    let products = api.list_products().await?;
    if products.is_empty() {
        writeln!(out, "No products")?;
    }
    for product in &products {
        write_summary(product, out)?;
    }
    Ok(())
}

pub async fn show_product(api: &ApiClient, id: &str, out: &mut impl Write) -> Result<()> {
    let product = api.get_product(&ProductId::new(id)).await?;
    write_summary(&product, out)?;
    writeln!(out, "Image: {}", product.image)?;
    if let Some(description) = &product.description {
        writeln!(out, "\n{description}")?;
    }
    for feature in &product.features {
        writeln!(out, "  - {feature}")?;
    }
    Ok(())
}

pub async fn list_categories(api: &ApiClient, out: &mut impl Write) -> Result<()> {
    for category in api.list_categories().await? {
        writeln!(out, "{:<12} {}", category.id, category.name)?;
    }
    Ok(())
}

fn write_summary(product: &Product, out: &mut impl Write) -> std::io::Result<()> {
    let stock = if product.in_stock() { "" } else { " (out of stock)" };
    let featured = if product.featured { " *" } else { "" };
    writeln!(
        out,
        "{:<12} {:<32} {:>9}  [{}]{featured}{stock}",
        product.id, product.title, product.price, product.category
    )
}
