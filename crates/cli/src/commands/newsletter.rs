//! Newsletter command.

use std::io::Write;

use shopfront_core::Email;
use shopfront_storefront::api::ApiClient;
use shopfront_storefront::error::Result;

pub async fn subscribe(api: &ApiClient, email: &Email, out: &mut impl Write) -> Result<()> {
    api.subscribe(email).await?;
    writeln!(out, "Subscribed {email}")?;
    Ok(())
}
