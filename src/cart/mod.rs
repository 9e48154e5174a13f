//! Cart
//!
//! The cart is an ordered list of line items keyed by [`SlotKey`]. Every
//! transition returns a new [`CartState`] and leaves the previous value intact,
//! so a state handed out earlier can still be read after later transitions.
//!
//! Invariants held by every `CartState`:
//!
//! - no two items share a slot;
//! - every item has a quantity of at least one;
//! - the cached item count and subtotal equal the fold over the items;
//! - the subtotal fits in a [`Decimal`].

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;

use crate::items::{LineItem, SlotKey};

pub mod actions;
pub mod snapshot;
pub mod store;

pub use actions::{CartAction, reduce};
pub use snapshot::{CartSnapshot, LoadReport, Repair, SnapshotItem};
pub use store::{CartStore, Dispatched};

/// Errors raised when a transition's input is out of contract.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CartError {
    /// Quantity must be at least one when adding an item.
    #[error("invalid quantity {0}; quantity must be at least 1")]
    InvalidQuantity(i64),

    /// Quantity does not fit in a line item.
    #[error("quantity overflow")]
    QuantityOverflow,

    /// Line item has no product identifier.
    #[error("line item is missing a product id")]
    MissingProductId,

    /// Line item has no title.
    #[error("line item is missing a title")]
    MissingTitle,

    /// Line item has no unit price.
    #[error("line item is missing a unit price")]
    MissingPrice,

    /// Unit prices cannot be negative.
    #[error("unit price {0} is negative")]
    NegativePrice(Decimal),

    /// A line total or the subtotal does not fit in a [`Decimal`].
    #[error("amount overflow")]
    AmountOverflow,
}

/// Cart state
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CartState {
    items: Vec<LineItem>,
    item_count: u64,
    subtotal: Decimal,
}

impl CartState {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a state from items that already satisfy the slot invariants,
    /// recomputing the derived values.
    fn from_items(items: Vec<LineItem>) -> Result<Self, CartError> {
        let subtotal = subtotal_of(&items).ok_or(CartError::AmountOverflow)?;

        Ok(Self {
            item_count: count_items(&items),
            items,
            subtotal,
        })
    }

    /// Builds a state from items whose subtotal is already known to fit, such
    /// as a subset of a stored cart or the output of [`snapshot::repair`].
    fn from_bounded_items(items: Vec<LineItem>) -> Self {
        let subtotal = items.iter().fold(Decimal::ZERO, |subtotal, item| {
            let line_total = item.unit_price().saturating_mul(Decimal::from(item.quantity()));

            subtotal.saturating_add(line_total)
        });

        Self {
            item_count: count_items(&items),
            items,
            subtotal,
        }
    }

    /// Line items in display order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Iterate over the line items.
    pub fn iter(&self) -> impl Iterator<Item = &LineItem> {
        self.items.iter()
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.item_count
    }

    /// Sum of unit price × quantity over all items.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.subtotal
    }

    /// Number of distinct slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up the item occupying a slot.
    #[must_use]
    pub fn get(&self, slot: &SlotKey) -> Option<&LineItem> {
        self.items.iter().find(|item| item.occupies(slot))
    }

    /// Add an item, merging into an existing slot when one matches.
    ///
    /// A merge adds the new quantity to the existing one and keeps the slot's
    /// position and the metadata captured on first add.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the item is out of contract (zero quantity,
    /// missing product id or title, negative price), if the merged quantity
    /// overflows, or if the new subtotal does not fit in a [`Decimal`]. The
    /// current state is left unchanged.
    pub fn add_item(&self, item: LineItem) -> Result<Self, CartError> {
        validate(&item)?;

        let slot = item.slot_key();
        let mut items = self.items.clone();

        if let Some(existing) = items.iter_mut().find(|existing| existing.occupies(&slot)) {
            let quantity = existing
                .quantity()
                .checked_add(item.quantity())
                .ok_or(CartError::QuantityOverflow)?;

            debug!(%slot, quantity, "merged line item");

            existing.set_quantity(quantity);
        } else {
            debug!(%slot, quantity = item.quantity(), "appended line item");

            items.push(item);
        }

        Self::from_items(items)
    }

    /// Set the quantity of a slot.
    ///
    /// A quantity of zero or less removes the slot. Updating a slot that is not
    /// in the cart returns the state unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::QuantityOverflow`] if `quantity` does not fit in a
    /// line item, or [`CartError::AmountOverflow`] if the new subtotal does not
    /// fit in a [`Decimal`].
    pub fn update_quantity(&self, slot: &SlotKey, quantity: i64) -> Result<Self, CartError> {
        if quantity <= 0 {
            return Ok(self.remove_item(slot));
        }

        let Some(position) = self.position(slot) else {
            return Ok(self.clone());
        };

        let quantity = u32::try_from(quantity).map_err(|_err| CartError::QuantityOverflow)?;
        let mut items = self.items.clone();

        if let Some(item) = items.get_mut(position) {
            item.set_quantity(quantity);
        }

        let next = Self::from_items(items)?;

        debug!(%slot, quantity, "updated line item quantity");

        Ok(next)
    }

    /// Remove a slot. Removing a slot that is not in the cart is a no-op.
    #[must_use]
    pub fn remove_item(&self, slot: &SlotKey) -> Self {
        if self.position(slot).is_none() {
            return self.clone();
        }

        debug!(%slot, "removed line item");

        Self::from_bounded_items(
            self.items
                .iter()
                .filter(|item| !item.occupies(slot))
                .cloned()
                .collect(),
        )
    }

    /// Empty the cart.
    #[must_use]
    pub fn clear(&self) -> Self {
        Self::new()
    }

    /// Build a state from a persisted snapshot, repairing anything that breaks
    /// the cart invariants.
    ///
    /// See [`snapshot::repair`] for the repair policy.
    #[must_use]
    pub fn load(snapshot: CartSnapshot) -> (Self, LoadReport) {
        let (items, report) = snapshot::repair(snapshot);

        (Self::from_bounded_items(items), report)
    }

    fn position(&self, slot: &SlotKey) -> Option<usize> {
        self.items.iter().position(|item| item.occupies(slot))
    }
}

/// Reject items that cannot be stored.
pub(crate) fn validate(item: &LineItem) -> Result<(), CartError> {
    if item.quantity() == 0 {
        return Err(CartError::InvalidQuantity(0));
    }

    if item.product_id().is_blank() {
        return Err(CartError::MissingProductId);
    }

    if item.title().trim().is_empty() {
        return Err(CartError::MissingTitle);
    }

    if item.unit_price() < Decimal::ZERO {
        return Err(CartError::NegativePrice(item.unit_price()));
    }

    if item.line_total().is_none() {
        return Err(CartError::AmountOverflow);
    }

    Ok(())
}

/// Sum of quantities over `items`.
#[must_use]
pub fn count_items(items: &[LineItem]) -> u64 {
    items.iter().map(|item| u64::from(item.quantity())).sum()
}

/// Sum of line totals over `items`, or `None` if it does not fit in a
/// [`Decimal`].
#[must_use]
pub fn subtotal_of(items: &[LineItem]) -> Option<Decimal> {
    items.iter().try_fold(Decimal::ZERO, |subtotal, item| {
        subtotal.checked_add(item.line_total()?)
    })
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn item(id: &str, size: &str, price: i64, quantity: u32) -> LineItem {
        LineItem::new(id, format!("Product {id}"), Decimal::new(price, 0), quantity).with_size(size)
    }

    #[test]
    fn new_cart_is_empty() {
        let cart = CartState::new();

        assert!(cart.is_empty());
        assert_eq!(cart.item_count(), 0);
        assert_eq!(cart.subtotal(), Decimal::ZERO);
    }

    #[test]
    fn add_appends_new_slot() -> TestResult {
        let cart = CartState::new().add_item(item("A", "M", 800, 1))?;

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.subtotal(), Decimal::new(800, 0));

        Ok(())
    }

    #[test]
    fn add_merges_matching_slot_and_keeps_first_metadata() -> TestResult {
        let cart = CartState::new()
            .add_item(item("A", "M", 800, 1))?
            .add_item(
                LineItem::new("A", "Renamed", Decimal::new(999, 0), 2)
                    .with_size("M")
                    .with_image("new.png"),
            )?;

        let merged = cart.items().first().ok_or("missing merged item")?;

        assert_eq!(cart.len(), 1);
        assert_eq!(merged.quantity(), 3);
        assert_eq!(merged.unit_price(), Decimal::new(800, 0));
        assert_eq!(merged.title(), "Product A");
        assert_eq!(merged.image(), None);
        assert_eq!(cart.subtotal(), Decimal::new(2400, 0));

        Ok(())
    }

    #[test]
    fn merge_keeps_position() -> TestResult {
        let cart = CartState::new()
            .add_item(item("A", "M", 100, 1))?
            .add_item(item("B", "M", 200, 1))?
            .add_item(item("A", "M", 100, 4))?;

        let ids: Vec<&str> = cart.iter().map(|i| i.product_id().as_str()).collect();

        assert_eq!(ids, ["A", "B"]);
        assert_eq!(cart.item_count(), 6);

        Ok(())
    }

    #[test]
    fn different_color_merges_into_first_color() -> TestResult {
        let cart = CartState::new()
            .add_item(item("A", "M", 100, 1).with_color("Red"))?
            .add_item(item("A", "M", 100, 1).with_color("Blue"))?;

        let merged = cart.items().first().ok_or("missing merged item")?;

        assert_eq!(cart.len(), 1);
        assert_eq!(merged.color(), Some("Red"));
        assert_eq!(merged.quantity(), 2);

        Ok(())
    }

    #[test]
    fn add_rejects_zero_quantity_without_changing_state() -> TestResult {
        let cart = CartState::new().add_item(item("A", "M", 100, 1))?;

        let result = cart.add_item(item("A", "M", 100, 0));

        assert_eq!(result, Err(CartError::InvalidQuantity(0)));
        assert_eq!(cart.item_count(), 1);

        Ok(())
    }

    #[test]
    fn add_rejects_malformed_items() {
        let cart = CartState::new();

        assert_eq!(
            cart.add_item(LineItem::new("", "Title", Decimal::ONE, 1)),
            Err(CartError::MissingProductId)
        );
        assert_eq!(
            cart.add_item(LineItem::new("A", " ", Decimal::ONE, 1)),
            Err(CartError::MissingTitle)
        );
        assert_eq!(
            cart.add_item(LineItem::new("A", "Title", Decimal::NEGATIVE_ONE, 1)),
            Err(CartError::NegativePrice(Decimal::NEGATIVE_ONE))
        );
    }

    #[test]
    fn add_accepts_free_items() -> TestResult {
        let cart = CartState::new().add_item(LineItem::new("A", "Sticker", Decimal::ZERO, 2))?;

        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.subtotal(), Decimal::ZERO);

        Ok(())
    }

    #[test]
    fn add_reports_quantity_overflow() -> TestResult {
        let cart = CartState::new().add_item(item("A", "M", 1, u32::MAX))?;

        assert_eq!(
            cart.add_item(item("A", "M", 1, 1)),
            Err(CartError::QuantityOverflow)
        );

        Ok(())
    }

    #[test]
    fn add_rejects_line_total_past_decimal_max() {
        let cart = CartState::new();

        let result = cart.add_item(LineItem::new("A", "Big", Decimal::MAX, 2));

        assert_eq!(result, Err(CartError::AmountOverflow));
        assert!(cart.is_empty());
    }

    #[test]
    fn add_rejects_subtotal_past_decimal_max() -> TestResult {
        let price = Decimal::from_i128_with_scale(10_i128.pow(28), 0);
        let cart = CartState::new()
            .add_item(LineItem::new("A", "Big", price, 4))?
            .add_item(LineItem::new("B", "Big", price, 3))?;

        let appended = cart.add_item(LineItem::new("C", "Big", price, 1));
        let merged = cart.add_item(LineItem::new("A", "Big", price, 1));

        assert_eq!(appended, Err(CartError::AmountOverflow));
        assert_eq!(merged, Err(CartError::AmountOverflow));
        assert_eq!(cart.item_count(), 7);
        assert_eq!(subtotal_of(cart.items()), Some(cart.subtotal()));

        Ok(())
    }

    #[test]
    fn update_rejects_subtotal_past_decimal_max() -> TestResult {
        let slot = SlotKey::new("A", None);
        let cart = CartState::new().add_item(LineItem::new("A", "Big", Decimal::MAX, 1))?;

        let result = cart.update_quantity(&slot, 2);

        assert_eq!(result, Err(CartError::AmountOverflow));
        assert_eq!(cart.get(&slot).map(LineItem::quantity), Some(1));

        Ok(())
    }

    #[test]
    fn update_sets_absolute_quantity() -> TestResult {
        let cart = CartState::new()
            .add_item(item("A", "M", 100, 3))?
            .update_quantity(&SlotKey::new("A", Some("M")), 5)?;

        assert_eq!(cart.item_count(), 5);
        assert_eq!(cart.subtotal(), Decimal::new(500, 0));

        Ok(())
    }

    #[test]
    fn update_to_zero_matches_remove() -> TestResult {
        let slot = SlotKey::new("A", Some("M"));
        let cart = CartState::new()
            .add_item(item("A", "M", 100, 3))?
            .add_item(item("B", "L", 50, 1))?;

        assert_eq!(cart.update_quantity(&slot, 0)?, cart.remove_item(&slot));
        assert_eq!(cart.update_quantity(&slot, -4)?, cart.remove_item(&slot));

        Ok(())
    }

    #[test]
    fn update_missing_slot_is_noop() -> TestResult {
        let cart = CartState::new().add_item(item("A", "M", 100, 3))?;

        let updated = cart.update_quantity(&SlotKey::new("A", Some("L")), 7)?;

        assert_eq!(updated, cart);

        Ok(())
    }

    #[test]
    fn update_rejects_oversized_quantity() -> TestResult {
        let cart = CartState::new().add_item(item("A", "M", 100, 3))?;

        let result = cart.update_quantity(&SlotKey::new("A", Some("M")), i64::from(u32::MAX) + 1);

        assert_eq!(result, Err(CartError::QuantityOverflow));

        Ok(())
    }

    #[test]
    fn remove_is_idempotent_and_keeps_order() -> TestResult {
        let slot = SlotKey::new("B", Some("M"));
        let cart = CartState::new()
            .add_item(item("A", "M", 1, 1))?
            .add_item(item("B", "M", 2, 1))?
            .add_item(item("C", "M", 3, 1))?;

        let once = cart.remove_item(&slot);
        let twice = once.remove_item(&slot);

        let ids: Vec<&str> = twice.iter().map(|i| i.product_id().as_str()).collect();

        assert_eq!(once, twice);
        assert_eq!(ids, ["A", "C"]);
        assert_eq!(twice.subtotal(), Decimal::new(4, 0));

        Ok(())
    }

    #[test]
    fn clear_empties_everything() -> TestResult {
        let cart = CartState::new()
            .add_item(item("A", "M", 100, 3))?
            .clear();

        assert!(cart.is_empty());
        assert_eq!(cart.item_count(), 0);
        assert_eq!(cart.subtotal(), Decimal::ZERO);

        Ok(())
    }

    #[test]
    fn transitions_leave_previous_state_untouched() -> TestResult {
        let before = CartState::new().add_item(item("A", "M", 100, 1))?;
        let after = before.add_item(item("A", "M", 100, 1))?;

        assert_eq!(before.item_count(), 1);
        assert_eq!(after.item_count(), 2);

        Ok(())
    }
}
