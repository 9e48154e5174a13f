//! Cart store

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    cart::{CartAction, CartError, CartSnapshot, CartState, LoadReport, reduce},
    persistence::{PersistenceError, SnapshotStore},
};

/// Outcome of a successful dispatch.
#[derive(Debug)]
pub struct Dispatched {
    /// The state after the transition.
    pub state: Arc<CartState>,

    /// Set when the transition applied but its snapshot could not be saved.
    pub warning: Option<PersistenceError>,
}

/// Owns the current cart state and its persistence bridge.
///
/// The snapshot is read once in [`CartStore::open`]. Each transition that
/// changes the cart is then written back; a failed write is reported but never
/// undoes the transition.
#[derive(Debug)]
pub struct CartStore {
    state: Arc<CartState>,
    bridge: Box<dyn SnapshotStore>,
    hydration: LoadReport,
    hydration_warning: Option<PersistenceError>,
}

impl CartStore {
    /// Open a store, hydrating from `bridge`.
    ///
    /// An unreadable snapshot is logged and the cart starts empty. A snapshot
    /// that needed repairs is written back in its repaired form; if that write
    /// fails, the error is kept in [`CartStore::hydration_warning`].
    pub fn open(bridge: impl SnapshotStore + 'static) -> Self {
        let snapshot = bridge.load().unwrap_or_else(|error| {
            warn!(%error, "failed to load cart snapshot, starting with an empty cart");
            None
        });

        let (state, hydration) = snapshot.map(CartState::load).unwrap_or_default();

        info!(
            slots = state.len(),
            item_count = state.item_count(),
            repairs = hydration.repairs().len(),
            "hydrated cart"
        );

        let mut store = Self {
            state: Arc::new(state),
            bridge: Box::new(bridge),
            hydration,
            hydration_warning: None,
        };

        if !store.hydration.is_clean() {
            store.hydration_warning = store.persist().err();
        }

        store
    }

    /// The current state.
    #[must_use]
    pub fn state(&self) -> Arc<CartState> {
        Arc::clone(&self.state)
    }

    /// Repairs applied while hydrating.
    #[must_use]
    pub fn hydration_report(&self) -> &LoadReport {
        &self.hydration
    }

    /// Set when the repaired hydration could not be written back.
    #[must_use]
    pub fn hydration_warning(&self) -> Option<&PersistenceError> {
        self.hydration_warning.as_ref()
    }

    /// The persistence bridge.
    #[must_use]
    pub fn bridge(&self) -> &dyn SnapshotStore {
        self.bridge.as_ref()
    }

    /// Apply one action.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the action's input is out of contract; the
    /// current state is kept and nothing is persisted.
    pub fn dispatch(&mut self, action: CartAction) -> Result<Dispatched, CartError> {
        let name = action.name();
        let next = reduce(&self.state, action)?;

        if next == *self.state {
            debug!(action = name, "cart unchanged");

            return Ok(Dispatched {
                state: self.state(),
                warning: None,
            });
        }

        debug!(
            action = name,
            item_count = next.item_count(),
            subtotal = %next.subtotal(),
            "cart updated"
        );

        Ok(self.replace(next))
    }

    /// Forget the cart at the end of a session.
    pub fn logout(&mut self) -> Dispatched {
        info!("clearing cart on logout");

        self.replace(CartState::new())
    }

    fn replace(&mut self, next: CartState) -> Dispatched {
        self.state = Arc::new(next);

        Dispatched {
            state: self.state(),
            warning: self.persist().err(),
        }
    }

    fn persist(&mut self) -> Result<(), PersistenceError> {
        let snapshot = CartSnapshot::from(self.state.as_ref());

        self.bridge
            .save(&snapshot)
            .inspect_err(|error| warn!(%error, "failed to persist cart snapshot"))
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use rust_decimal::Decimal;
    use testresult::TestResult;

    use crate::{
        cart::{Repair, SnapshotItem},
        items::{LineItem, ProductId, SlotKey},
        persistence::MemorySnapshotStore,
    };

    use super::*;

    #[derive(Debug)]
    struct FailingStore;

    impl SnapshotStore for FailingStore {
        fn load(&self) -> Result<Option<CartSnapshot>, PersistenceError> {
            Err(io::Error::other("slot unavailable").into())
        }

        fn save(&mut self, _snapshot: &CartSnapshot) -> Result<(), PersistenceError> {
            Err(io::Error::other("disk full").into())
        }
    }

    /// Serves a fixed snapshot and refuses every save.
    #[derive(Debug)]
    struct ReadOnlyStore(CartSnapshot);

    impl SnapshotStore for ReadOnlyStore {
        fn load(&self) -> Result<Option<CartSnapshot>, PersistenceError> {
            Ok(Some(self.0.clone()))
        }

        fn save(&mut self, _snapshot: &CartSnapshot) -> Result<(), PersistenceError> {
            Err(io::Error::other("read-only slot").into())
        }
    }

    fn snapshot_item(id: &str, unit_price: Decimal, quantity: i64) -> SnapshotItem {
        SnapshotItem {
            product_id: ProductId::new(id),
            title: "Shirt".to_string(),
            unit_price: Some(unit_price),
            quantity,
            ..SnapshotItem::default()
        }
    }

    fn shirt(quantity: u32) -> CartAction {
        CartAction::AddItem(
            LineItem::new("A", "Shirt", Decimal::new(800, 0), quantity).with_size("M"),
        )
    }

    #[test]
    fn opens_empty_without_snapshot() {
        let store = CartStore::open(MemorySnapshotStore::new());

        assert!(store.state().is_empty());
        assert!(store.hydration_report().is_clean());
    }

    #[test]
    fn hydrates_from_snapshot() -> TestResult {
        let source = CartState::new()
            .add_item(LineItem::new("A", "Shirt", Decimal::new(800, 0), 2).with_size("M"))?;

        let store = CartStore::open(MemorySnapshotStore::with_snapshot(CartSnapshot::from(
            &source,
        )));

        assert_eq!(*store.state(), source);

        Ok(())
    }

    #[test]
    fn persists_after_each_transition() -> TestResult {
        let mut store = CartStore::open(MemorySnapshotStore::new());

        store.dispatch(shirt(1))?;
        store.dispatch(shirt(2))?;

        let saved = store.bridge().load()?.ok_or("nothing persisted")?;

        assert_eq!(CartState::load(saved).0, *store.state());
        assert_eq!(store.state().item_count(), 3);

        Ok(())
    }

    #[test]
    fn rejected_action_keeps_state_and_skips_save() -> TestResult {
        let mut store = CartStore::open(MemorySnapshotStore::new());

        store.dispatch(shirt(1))?;

        let before = store.bridge().load()?;
        let result = store.dispatch(shirt(0));

        assert!(matches!(result, Err(CartError::InvalidQuantity(0))));
        assert_eq!(store.state().item_count(), 1);
        assert_eq!(store.bridge().load()?, before);

        Ok(())
    }

    #[test]
    fn save_failure_does_not_roll_back() -> TestResult {
        let mut store = CartStore::open(FailingStore);

        let outcome = store.dispatch(shirt(2))?;

        assert!(matches!(outcome.warning, Some(PersistenceError::Io(_))));
        assert_eq!(outcome.state.item_count(), 2);
        assert_eq!(store.state().item_count(), 2);

        Ok(())
    }

    #[test]
    fn earlier_states_remain_readable() -> TestResult {
        let mut store = CartStore::open(MemorySnapshotStore::new());

        let first = store.dispatch(shirt(1))?.state;
        let second = store.dispatch(shirt(1))?.state;

        assert_eq!(first.item_count(), 1);
        assert_eq!(second.item_count(), 2);

        Ok(())
    }

    #[test]
    fn noop_dispatch_skips_save() -> TestResult {
        let mut store = CartStore::open(MemorySnapshotStore::new());

        let outcome = store.dispatch(CartAction::RemoveItem(SlotKey::new("A", None)))?;

        assert!(outcome.warning.is_none());
        assert!(store.bridge().load()?.is_none());

        Ok(())
    }

    #[test]
    fn repaired_hydration_is_written_back() -> TestResult {
        let bad = CartSnapshot {
            items: vec![snapshot_item("A", Decimal::new(800, 0), 0)],
            ..CartSnapshot::default()
        };

        let store = CartStore::open(MemorySnapshotStore::with_snapshot(bad));

        assert!(matches!(
            store.hydration_report().repairs(),
            [Repair::DroppedNonPositiveQuantity { quantity: 0, .. }]
        ));
        assert!(store.hydration_warning().is_none());

        let saved = store.bridge().load()?.ok_or("nothing persisted")?;

        assert!(saved.items.is_empty());

        Ok(())
    }

    #[test]
    fn failed_write_back_is_kept_as_warning() {
        let bad = CartSnapshot {
            items: vec![
                snapshot_item("A", Decimal::new(800, 0), 2),
                snapshot_item("B", Decimal::new(800, 0), -1),
            ],
            ..CartSnapshot::default()
        };

        let store = CartStore::open(ReadOnlyStore(bad));

        assert_eq!(store.state().item_count(), 2);
        assert!(matches!(
            store.hydration_warning(),
            Some(PersistenceError::Io(_))
        ));
    }

    #[test]
    fn clean_hydration_skips_write_back() -> TestResult {
        let source = CartState::new()
            .add_item(LineItem::new("A", "Shirt", Decimal::new(800, 0), 1).with_size("M"))?;

        let store = CartStore::open(ReadOnlyStore(CartSnapshot::from(&source)));

        assert!(store.hydration_report().is_clean());
        assert!(store.hydration_warning().is_none());

        Ok(())
    }

    #[test]
    fn oversized_snapshot_hydrates_without_the_offending_item() -> TestResult {
        let huge = Decimal::from_str_exact("10000000000000000000000000000")?;
        let bad = CartSnapshot {
            items: vec![
                snapshot_item("A", Decimal::new(800, 0), 1),
                snapshot_item("B", huge, 10),
            ],
            ..CartSnapshot::default()
        };

        let store = CartStore::open(MemorySnapshotStore::with_snapshot(bad));

        assert_eq!(store.state().len(), 1);
        assert_eq!(store.state().subtotal(), Decimal::new(800, 0));
        assert!(matches!(
            store.hydration_report().repairs(),
            [Repair::DroppedInvalidItem {
                index: 1,
                reason: CartError::AmountOverflow,
            }]
        ));

        let saved = store.bridge().load()?.ok_or("nothing persisted")?;

        assert_eq!(saved.items.len(), 1);

        Ok(())
    }

    #[test]
    fn logout_clears_and_persists() -> TestResult {
        let mut store = CartStore::open(MemorySnapshotStore::new());

        store.dispatch(shirt(3))?;

        let outcome = store.logout();

        assert!(outcome.state.is_empty());
        assert_eq!(
            store.bridge().load()?.map(|snapshot| snapshot.items.len()),
            Some(0)
        );

        Ok(())
    }
}
