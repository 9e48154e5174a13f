//! CLI configuration

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use storefront_cart::checkout::{PaymentMethod, ShippingAddress};

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub(crate) struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "warn")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Storefront cart configuration
#[derive(Debug, Parser)]
#[command(name = "storefront-cart", about = "Storefront cart", long_about = None)]
pub(crate) struct CliConfig {
    /// Cart snapshot file
    #[arg(long, env = "CART_FILE", default_value = "alibzon-cart.json")]
    pub cart_file: PathBuf,

    /// Product catalog file
    #[arg(long, env = "CATALOG_FILE", default_value = "fixtures/catalog.yml")]
    pub catalog: PathBuf,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    #[command(subcommand)]
    pub command: Command,
}

impl CliConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub(crate) fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Add a catalog product to the cart
    Add(AddArgs),

    /// Set the quantity of a cart line; zero or less removes it
    Update(UpdateArgs),

    /// Remove a cart line
    Remove(SlotArgs),

    /// Empty the cart
    Clear,

    /// Print the cart
    Show,

    /// Print the order totals as JSON
    Totals,

    /// Place an order and print it as JSON
    Checkout(CheckoutArgs),
}

#[derive(Debug, Args)]
pub(crate) struct AddArgs {
    /// Product id
    pub product: String,

    /// Size; defaults to the product's first size
    #[arg(long)]
    pub size: Option<String>,

    /// Color; defaults to the product's first color
    #[arg(long)]
    pub color: Option<String>,

    /// Quantity to add
    #[arg(short, long, default_value_t = 1)]
    pub quantity: u32,
}

#[derive(Debug, Args)]
pub(crate) struct SlotArgs {
    /// Product id
    pub product: String,

    /// Size of the line; may be omitted when the product has a single line
    #[arg(long)]
    pub size: Option<String>,
}

#[derive(Debug, Args)]
pub(crate) struct UpdateArgs {
    #[command(flatten)]
    pub slot: SlotArgs,

    /// New quantity
    #[arg(allow_negative_numbers = true)]
    pub quantity: i64,
}

#[derive(Debug, Args)]
pub(crate) struct CheckoutArgs {
    /// Recipient name
    #[arg(long)]
    pub name: String,

    /// Contact phone number
    #[arg(long)]
    pub phone: String,

    /// Street address
    #[arg(long)]
    pub street: String,

    /// House or flat number
    #[arg(long)]
    pub house: Option<String>,

    /// Nearby landmark
    #[arg(long)]
    pub landmark: Option<String>,

    /// District
    #[arg(long)]
    pub district: String,

    /// Delivery zone
    #[arg(long)]
    pub zone: String,

    /// Area
    #[arg(long)]
    pub area: String,

    /// Payment method (bkash, nagad, card, netbanking, cod)
    #[arg(long, default_value_t = PaymentMethod::CashOnDelivery)]
    pub payment: PaymentMethod,
}

impl CheckoutArgs {
    /// Split into the shipping address and payment method.
    pub(crate) fn into_order(self) -> (ShippingAddress, PaymentMethod) {
        (
            ShippingAddress {
                name: self.name,
                phone: self.phone,
                street: self.street,
                house: self.house,
                landmark: self.landmark,
                district: self.district,
                zone: self.zone,
                area: self.area,
            },
            self.payment,
        )
    }
}
