//! Summary
//!
//! Renders the cart page: one table row per line item, followed by the order
//! totals.

use std::io;

use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{Alignment, Style, Theme, object::Columns},
};
use thiserror::Error;

use crate::{
    cart::CartState,
    pricing::{PricingError, Totals, compute_totals, format_amount, vat_percent_points},
};

/// Errors that can occur when rendering a summary.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// An amount could not be formatted.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// IO error
    #[error("IO error")]
    IO,
}

/// Printable view of a cart and its totals.
#[derive(Debug)]
pub struct CartSummary<'a> {
    cart: &'a CartState,
    totals: Totals,
}

impl<'a> CartSummary<'a> {
    /// Summarise `cart`.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::TotalOverflow`] if the cart's totals do not fit
    /// in a [`Decimal`](rust_decimal::Decimal).
    pub fn new(cart: &'a CartState) -> Result<Self, PricingError> {
        Ok(Self {
            cart,
            totals: compute_totals(cart)?,
        })
    }

    /// Totals shown beneath the table.
    #[must_use]
    pub fn totals(&self) -> Totals {
        self.totals
    }

    /// Writes the summary.
    ///
    /// # Errors
    ///
    /// Returns an error if an amount cannot be formatted or the output cannot
    /// be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), SummaryError> {
        if self.cart.is_empty() {
            return writeln!(out, "Your cart is empty").map_err(|_err| SummaryError::IO);
        }

        let mut builder = Builder::default();

        builder.push_record(["Item", "Size", "Color", "Price", "Qty", "Total"]);

        for item in self.cart.iter() {
            builder.push_record([
                item.title().to_string(),
                item.size().unwrap_or_default().to_string(),
                item.color().unwrap_or_default().to_string(),
                format_amount(item.unit_price())?,
                item.quantity().to_string(),
                format_amount(
                    item.line_total()
                        .ok_or(PricingError::TotalOverflow(item.unit_price()))?,
                )?,
            ]);
        }

        write_table(&mut out, builder)?;
        write_totals(&mut out, &self.totals)?;

        Ok(())
    }
}

fn write_table(out: &mut impl io::Write, builder: Builder) -> Result<(), SummaryError> {
    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());
    let separator = HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤'));

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(1, separator);

    table.with(theme);
    table.modify(Columns::new(3..6), Alignment::right());

    writeln!(out, "\n{table}").map_err(|_err| SummaryError::IO)
}

fn write_totals(out: &mut impl io::Write, totals: &Totals) -> Result<(), SummaryError> {
    let delivery = if totals.is_free_delivery() {
        "Free".to_string()
    } else {
        format_amount(totals.delivery_fee)?
    };

    let lines = [
        (" Subtotal:".to_string(), format_amount(totals.subtotal)?),
        (
            format!(" VAT ({}%):", vat_percent_points()),
            format_amount(totals.vat)?,
        ),
        (" Delivery:".to_string(), delivery),
        (" Total:".to_string(), format_amount(totals.grand_total)?),
    ];

    let label_width = lines
        .iter()
        .map(|(label, _)| visible_width(label))
        .max()
        .unwrap_or_default();

    let value_width = lines
        .iter()
        .map(|(_, value)| visible_width(value))
        .max()
        .unwrap_or_default();

    for (label, value) in &lines {
        write_summary_line(out, label, value, label_width, value_width)?;
    }

    writeln!(out).map_err(|_err| SummaryError::IO)
}

fn write_summary_line(
    out: &mut impl io::Write,
    label: &str,
    value: &str,
    label_col_width: usize,
    value_col_width: usize,
) -> Result<(), SummaryError> {
    let label_pad = label_col_width.saturating_sub(visible_width(label));
    let value_pad = value_col_width.saturating_sub(visible_width(value));

    writeln!(
        out,
        "{:>label_pad$}{label}  {value_pad}{value}",
        "",
        value_pad = " ".repeat(value_pad)
    )
    .map_err(|_err| SummaryError::IO)
}

/// Width in characters; currency symbols are multi-byte.
fn visible_width(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use crate::items::LineItem;

    use super::*;

    fn render(cart: &CartState) -> Result<String, Box<dyn std::error::Error>> {
        let mut out = Vec::new();

        CartSummary::new(cart)?.write_to(&mut out)?;

        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn empty_cart_message() -> TestResult {
        let output = render(&CartState::new())?;

        assert_eq!(output, "Your cart is empty\n");

        Ok(())
    }

    #[test]
    fn renders_items_and_totals() -> TestResult {
        let cart = CartState::new()
            .add_item(
                LineItem::new("A", "Cotton Panjabi", Decimal::new(1500, 0), 2)
                    .with_size("L")
                    .with_color("White"),
            )?
            .add_item(LineItem::new("B", "Cap", Decimal::new(250, 0), 1))?;

        let output = render(&cart)?;

        assert!(output.contains("Cotton Panjabi"));
        assert!(output.contains("White"));
        assert!(output.contains(&format_amount(Decimal::new(3000, 0))?));
        assert!(output.contains("VAT (5%):"));
        assert!(output.contains("Delivery:"));
        assert!(output.contains("Free"));
        assert!(output.contains(&format_amount(Decimal::new(341_250, 2))?));

        Ok(())
    }

    #[test]
    fn small_cart_shows_delivery_fee() -> TestResult {
        let cart =
            CartState::new().add_item(LineItem::new("B", "Cap", Decimal::new(250, 0), 1))?;

        let summary = CartSummary::new(&cart)?;
        let output = render(&cart)?;

        assert!(!summary.totals().is_free_delivery());
        assert!(!output.contains("Free"));
        assert!(output.contains(&format_amount(Decimal::new(100, 0))?));

        Ok(())
    }

    #[test]
    fn summary_lines_are_right_aligned() -> TestResult {
        let mut out = Vec::new();

        write_summary_line(&mut out, " Total:", "12", 10, 5)?;

        assert_eq!(String::from_utf8(out)?, "    Total:     12\n");

        Ok(())
    }
}
