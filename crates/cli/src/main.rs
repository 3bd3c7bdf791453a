//! Go Marketplace CLI - Inspect and edit the persisted cart.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart
//! gm-cart show
//!
//! # Add a product (quantity starts at 1)
//! gm-cart add --id p1 --title Shirt --image-url https://img/p1.png --price 10
//!
//! # Change quantities
//! gm-cart increment p1
//! gm-cart decrement p1
//!
//! # Empty the cart
//! gm-cart clear
//! ```
//!
//! # Commands
//!
//! - `show` - Print the cart
//! - `add` - Append a product
//! - `increment` / `decrement` - Change a product's quantity by one
//! - `clear` - Remove every line
//!
//! Every command prints the resulting cart, as a table or with `--json`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use go_marketplace_cart::CartConfig;
use go_marketplace_core::{NewCartItem, Price};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::cart::{CartCommand, CommandError};

#[derive(Parser)]
#[command(name = "gm-cart")]
#[command(author, version, about = "Go Marketplace cart tools")]
struct Cli {
    /// Data directory (overrides `CART_DATA_DIR`)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Print the cart as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the cart
    Show,
    /// Add a product with quantity 1
    Add {
        /// Product ID
        #[arg(long)]
        id: String,

        /// Product title
        #[arg(long)]
        title: String,

        /// Product image URL
        #[arg(long, default_value = "")]
        image_url: String,

        /// Unit price (e.g. 19.99)
        #[arg(long)]
        price: Price,
    },
    /// Increase a product's quantity by one
    Increment {
        /// Product ID
        id: String,
    },
    /// Decrease a product's quantity by one
    Decrement {
        /// Product ID
        id: String,
    },
    /// Remove every line
    Clear,
}

impl From<Commands> for CartCommand {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Show => Self::Show,
            Commands::Add {
                id,
                title,
                image_url,
                price,
            } => Self::Add(NewCartItem::new(id, title, image_url, price)),
            Commands::Increment { id } => Self::Increment(id),
            Commands::Decrement { id } => Self::Decrement(id),
            Commands::Clear => Self::Clear,
        }
    }
}

/// Initialize Sentry error tracking if `SENTRY_DSN` is set.
fn init_sentry() -> Option<sentry::ClientInitGuard> {
    let dsn = std::env::var("SENTRY_DSN").ok().filter(|v| !v.is_empty())?;

    let guard = sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Loads .env as a side effect, so do it before reading SENTRY_DSN
    let config = CartConfig::from_env();

    let _sentry_guard = init_sentry();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "go_marketplace_cart=info,gm_cart=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result = match config {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

#[allow(clippy::print_stdout)]
async fn run(cli: Cli, mut config: CartConfig) -> Result<(), CommandError> {
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    let state = commands::cart::execute(cli.command.into(), &config).await?;

    let output = if cli.json {
        let mut json = commands::render::json(&state)?;
        json.push('\n');
        json
    } else {
        commands::render::table(&state)
    };

    print!("{output}");
    Ok(())
}
