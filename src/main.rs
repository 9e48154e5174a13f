//! Storefront Cart CLI

use std::{
    io::{self, Write},
    process::ExitCode,
};

use thiserror::Error;
use tracing::error;

use storefront_cart::{
    cart::{CartAction, CartError, CartState, CartStore},
    catalog::{Catalog, CatalogError},
    checkout::{CheckoutError, place_order},
    items::SlotKey,
    persistence::FileSnapshotStore,
    pricing::{PricingError, compute_totals},
    summary::{CartSummary, SummaryError},
};

use crate::config::{CliConfig, Command, SlotArgs};

mod config;
mod observability;

/// Errors surfaced by a CLI run.
#[derive(Debug, Error)]
enum CliError {
    /// Logging could not be set up.
    #[error(transparent)]
    Observability(#[from] observability::ObservabilityError),

    /// A cart transition was rejected.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// The catalog could not be used.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The order could not be placed.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// The cart totals could not be computed.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// The cart could not be rendered.
    #[error(transparent)]
    Summary(#[from] SummaryError),

    /// Output could not be encoded.
    #[error("failed to encode output: {0}")]
    Json(#[from] serde_json::Error),

    /// Output could not be written.
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

fn main() -> ExitCode {
    let config = match CliConfig::load() {
        Ok(config) => config,
        Err(error) => {
            // Help and version requests are reported through the same error.
            _ = error.print();

            return if error.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if let Err(error) = observability::init(&config.logging).map_err(CliError::from) {
        report(&error);

        return ExitCode::FAILURE;
    }

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!(%error, "command failed");
            report(&error);

            ExitCode::FAILURE
        }
    }
}

fn report(error: &CliError) {
    #[expect(
        clippy::print_stderr,
        reason = "errors must reach the user even when logging is filtered out"
    )]
    {
        eprintln!("Error: {error}");
    }
}

fn run(config: CliConfig) -> Result<(), CliError> {
    let mut store = CartStore::open(FileSnapshotStore::new(&config.cart_file));
    let mut out = io::stdout().lock();

    match config.command {
        Command::Add(args) => {
            let catalog = Catalog::from_path(&config.catalog)?;
            let item = catalog.line_item(
                &args.product,
                args.size.as_deref(),
                args.color.as_deref(),
                args.quantity,
            )?;

            let outcome = store.dispatch(CartAction::AddItem(item))?;

            CartSummary::new(&outcome.state)?.write_to(&mut out)?;
        }
        Command::Update(args) => {
            let slot = resolve_slot(&store.state(), &args.slot);
            let outcome = store.dispatch(CartAction::UpdateQuantity {
                slot,
                quantity: args.quantity,
            })?;

            CartSummary::new(&outcome.state)?.write_to(&mut out)?;
        }
        Command::Remove(args) => {
            let slot = resolve_slot(&store.state(), &args);
            let outcome = store.dispatch(CartAction::RemoveItem(slot))?;

            CartSummary::new(&outcome.state)?.write_to(&mut out)?;
        }
        Command::Clear => {
            let outcome = store.dispatch(CartAction::Clear)?;

            CartSummary::new(&outcome.state)?.write_to(&mut out)?;
        }
        Command::Show => {
            CartSummary::new(&store.state())?.write_to(&mut out)?;
        }
        Command::Totals => {
            let totals = compute_totals(&store.state())?;

            writeln!(out, "{}", serde_json::to_string_pretty(&totals)?)?;
        }
        Command::Checkout(args) => {
            let (address, payment) = args.into_order();
            let order = place_order(&mut store, address, payment)?;

            writeln!(out, "{}", serde_json::to_string_pretty(&order)?)?;
        }
    }

    Ok(())
}

/// Pick the slot a command refers to.
///
/// Without `--size`, a product with exactly one line in the cart refers to
/// that line; otherwise the size-less slot is meant.
fn resolve_slot(state: &CartState, args: &SlotArgs) -> SlotKey {
    if args.size.is_some() {
        return SlotKey::new(args.product.as_str(), args.size.as_deref());
    }

    let mut lines = state
        .iter()
        .filter(|item| item.product_id().as_str() == args.product);

    match (lines.next(), lines.next()) {
        (Some(only), None) => only.slot_key(),
        _ => SlotKey::new(args.product.as_str(), None),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use storefront_cart::items::LineItem;

    use super::*;

    fn slot_args(product: &str, size: Option<&str>) -> SlotArgs {
        SlotArgs {
            product: product.to_string(),
            size: size.map(str::to_string),
        }
    }

    #[test]
    fn resolve_slot_uses_single_line() -> TestResult {
        let state = CartState::new()
            .add_item(LineItem::new("A", "Shirt", Decimal::ONE, 1).with_size("M"))?;

        assert_eq!(
            resolve_slot(&state, &slot_args("A", None)),
            SlotKey::new("A", Some("M"))
        );

        Ok(())
    }

    #[test]
    fn resolve_slot_is_literal_when_ambiguous() -> TestResult {
        let state = CartState::new()
            .add_item(LineItem::new("A", "Shirt", Decimal::ONE, 1).with_size("M"))?
            .add_item(LineItem::new("A", "Shirt", Decimal::ONE, 1).with_size("L"))?;

        assert_eq!(
            resolve_slot(&state, &slot_args("A", None)),
            SlotKey::new("A", None)
        );
        assert_eq!(
            resolve_slot(&state, &slot_args("A", Some("L"))),
            SlotKey::new("A", Some("L"))
        );

        Ok(())
    }
}
