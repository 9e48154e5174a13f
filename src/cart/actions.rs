//! Cart actions

use crate::{
    cart::{CartError, CartState, CartSnapshot},
    items::{LineItem, SlotKey},
};

/// A single cart transition.
#[derive(Clone, Debug, PartialEq)]
pub enum CartAction {
    /// Add an item, merging into its slot if present.
    AddItem(LineItem),

    /// Set the quantity of a slot; zero or less removes it.
    UpdateQuantity {
        /// Slot to update.
        slot: SlotKey,
        /// New absolute quantity.
        quantity: i64,
    },

    /// Remove a slot.
    RemoveItem(SlotKey),

    /// Empty the cart.
    Clear,

    /// Replace the cart with a persisted snapshot, repairing invariants.
    LoadState(CartSnapshot),
}

impl CartAction {
    /// Short name of the action, for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            CartAction::AddItem(_) => "add_item",
            CartAction::UpdateQuantity { .. } => "update_quantity",
            CartAction::RemoveItem(_) => "remove_item",
            CartAction::Clear => "clear",
            CartAction::LoadState(_) => "load_state",
        }
    }
}

/// Apply `action` to `state`, returning the next state.
///
/// `state` is never modified. Repairs made by [`CartAction::LoadState`] are
/// logged; use [`CartState::load`] directly to inspect them.
///
/// # Errors
///
/// Returns a [`CartError`] if an [`CartAction::AddItem`] or
/// [`CartAction::UpdateQuantity`] input is out of contract.
pub fn reduce(state: &CartState, action: CartAction) -> Result<CartState, CartError> {
    match action {
        CartAction::AddItem(item) => state.add_item(item),
        CartAction::UpdateQuantity { slot, quantity } => state.update_quantity(&slot, quantity),
        CartAction::RemoveItem(slot) => Ok(state.remove_item(&slot)),
        CartAction::Clear => Ok(state.clear()),
        CartAction::LoadState(snapshot) => Ok(CartState::load(snapshot).0),
    }
}
