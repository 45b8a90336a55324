//! Shopfront CLI - browse the catalog, manage the cart, and check out.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! shop products list
//! shop products show 66a1
//!
//! # Manage the cart
//! shop cart add 66a1 --quantity 2
//! shop cart set 66a1 0
//! shop cart show
//!
//! # Place a cash-on-delivery order
//! shop checkout --name "Ada" --email ada@example.com --address "12 Frederick St" --phone 5550100
//! ```
//!
//! Configuration comes from the environment (see `StorefrontConfig`). The
//! cart lives in `SHOP_DATA_DIR` and survives between invocations.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use shopfront_core::{Email, Price};
use shopfront_storefront::config::StorefrontConfig;
use shopfront_storefront::error::AppError;
use shopfront_storefront::state::AppState;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "shop")]
#[command(author, version, about = "Shopfront storefront from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and change the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Browse products
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// List product categories
    Categories,
    /// Submit the cart as an order
    Checkout(CheckoutArgs),
    /// Subscribe to the newsletter
    Subscribe {
        /// Email address to subscribe
        email: Email,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart lines and totals
    Show,
    /// Add a catalog product
    Add {
        /// Product id
        id: String,

        /// Number of units to add
        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        quantity: u32,
    },
    /// Add a line without looking it up in the catalog
    AddLine {
        #[arg(long)]
        id: String,

        #[arg(long)]
        title: String,

        #[arg(long)]
        price: Price,

        #[arg(long, default_value = "")]
        image: String,

        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        quantity: u32,
    },
    /// Remove a product from the cart
    Remove {
        /// Product id
        id: String,
    },
    /// Set a product's quantity; zero or less removes it
    Set {
        /// Product id
        id: String,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List all products
    List,
    /// Show one product
    Show {
        /// Product id
        id: String,
    },
}

#[derive(Args)]
struct CheckoutArgs {
    #[arg(long)]
    name: String,

    #[arg(long)]
    email: Email,

    #[arg(long)]
    address: String,

    #[arg(long)]
    phone: String,

    /// Transaction reference for online payment; omit for cash on delivery
    #[arg(long)]
    transaction_id: Option<String>,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        tracing::Level::TRACE => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = StorefrontConfig::from_env();

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shopfront_cli=info,shopfront_storefront=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = run(cli, config).await {
        e.report();
        tracing::error!("Command failed: {}", e.user_message());
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), AppError> {
    let state = AppState::new(config)?;
    let mut out = std::io::stdout().lock();

    match cli.command {
        Commands::Cart { action } => {
            let mut cart = state.open_cart();
            match action {
                CartAction::Show => commands::cart::show(&cart, &mut out)?,
                CartAction::Add { id, quantity } => {
                    commands::cart::add(&mut cart, state.api(), &id, quantity, &mut out).await?;
                }
                CartAction::AddLine {
                    id,
                    title,
                    price,
                    image,
                    quantity,
                } => {
                    let line = shopfront_core::NewCartLine::new(id, title, price, image);
                    commands::cart::add_line(&mut cart, line, quantity, &mut out)?;
                }
                CartAction::Remove { id } => commands::cart::remove(&mut cart, &id, &mut out)?,
                CartAction::Set { id, quantity } => {
                    commands::cart::set(&mut cart, &id, quantity, &mut out)?;
                }
                CartAction::Clear => commands::cart::clear(&mut cart, &mut out)?,
            }
        }
        Commands::Products { action } => match action {
            ProductsAction::List => commands::catalog::list_products(state.api(), &mut out).await?,
            ProductsAction::Show { id } => {
                commands::catalog::show_product(state.api(), &id, &mut out).await?;
            }
        },
        Commands::Categories => commands::catalog::list_categories(state.api(), &mut out).await?,
        Commands::Checkout(args) => {
            let mut cart = state.open_cart();
            let request = commands::checkout::CheckoutRequest {
                name: args.name,
                email: args.email,
                address: args.address,
                phone: args.phone,
                transaction_id: args.transaction_id,
            };
            commands::checkout::checkout(&mut cart, state.api(), request, &mut out).await?;
        }
        Commands::Subscribe { email } => {
            commands::newsletter::subscribe(state.api(), &email, &mut out).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_set_accepts_negative_quantity() {
        let cli = Cli::try_parse_from(["shop", "cart", "set", "A", "-1"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Cart {
                action: CartAction::Set { quantity: -1, .. }
            }
        ));
    }

    #[test]
    fn test_add_rejects_zero_quantity() {
        assert!(Cli::try_parse_from(["shop", "cart", "add", "A", "--quantity", "0"]).is_err());
    }

    #[test]
    fn test_add_line_rejects_negative_price() {
        let args = [
            "shop", "cart", "add-line", "--id", "A", "--title", "Mug", "--price", "-1",
        ];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_checkout_validates_email() {
        let args = [
            "shop", "checkout", "--name", "Ada", "--email", "not-an-email", "--address", "x",
            "--phone", "1",
        ];
        assert!(Cli::try_parse_from(args).is_err());

        let args = [
            "shop", "checkout", "--name", "Ada", "--email", "Ada@Example.com", "--address", "x",
            "--phone", "1", "--transaction-id", "TX-1",
        ];
        let Commands::Checkout(checkout) = Cli::try_parse_from(args).unwrap().command else {
            panic!("expected checkout");
        };
        assert_eq!(checkout.email.as_str(), "ada@example.com");
        assert_eq!(checkout.transaction_id.as_deref(), Some("TX-1"));
    }
}
