//! Cart snapshots
//!
//! A snapshot is the serialized form of a cart held by the persistence bridge.
//! Snapshots are untrusted input: quantities are read as signed integers and
//! every field may be missing, so that [`repair`] can decide what survives.

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::warn;

use crate::{
    cart::{CartError, CartState, validate},
    items::{LineItem, ProductId, SlotKey},
};

/// Serialized cart.
///
/// `item_count` and `subtotal` are written for readability only; they are
/// ignored on load and recomputed from `items`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CartSnapshot {
    /// Line items in display order.
    #[serde(default)]
    pub items: Vec<SnapshotItem>,

    /// Cached item count.
    #[serde(default, alias = "itemCount", skip_serializing_if = "Option::is_none")]
    pub item_count: Option<u64>,

    /// Cached subtotal.
    #[serde(default, alias = "total", skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<Decimal>,
}

/// Serialized line item.
///
/// Accepts the `id` and `price` keys written by the storefront's local-storage
/// cart slot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotItem {
    /// Product identifier.
    #[serde(default, alias = "id")]
    pub product_id: ProductId,

    /// Title captured at add-time.
    #[serde(default)]
    pub title: String,

    /// Image captured at add-time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Unit price captured at add-time.
    #[serde(default, alias = "price")]
    pub unit_price: Option<Decimal>,

    /// Size variant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    /// Color attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// Quantity; anything below one is dropped on load.
    #[serde(default)]
    pub quantity: i64,
}

impl From<&LineItem> for SnapshotItem {
    fn from(item: &LineItem) -> Self {
        Self {
            product_id: item.product_id().clone(),
            title: item.title().to_string(),
            image: item.image().map(str::to_string),
            unit_price: Some(item.unit_price()),
            size: item.size().map(str::to_string),
            color: item.color().map(str::to_string),
            quantity: i64::from(item.quantity()),
        }
    }
}

impl From<&CartState> for CartSnapshot {
    fn from(state: &CartState) -> Self {
        Self {
            items: state.iter().map(SnapshotItem::from).collect(),
            item_count: Some(state.item_count()),
            subtotal: Some(state.subtotal()),
        }
    }
}

/// One change made while loading a snapshot.
#[derive(Clone, Debug, PartialEq)]
pub enum Repair {
    /// An item with a quantity below one was dropped.
    DroppedNonPositiveQuantity {
        /// Slot of the dropped item.
        slot: SlotKey,
        /// Quantity found in the snapshot.
        quantity: i64,
    },

    /// An item that could not be stored was dropped.
    DroppedInvalidItem {
        /// Position of the item in the snapshot.
        index: usize,
        /// Why the item was rejected.
        reason: CartError,
    },

    /// A later item with an already-seen slot was merged into the first one.
    MergedDuplicate {
        /// Slot that appeared more than once.
        slot: SlotKey,
        /// Quantity of the merged slot after the merge.
        quantity: u32,
    },
}

/// Summary of the repairs applied while loading a snapshot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadReport {
    repairs: SmallVec<[Repair; 4]>,
}

impl LoadReport {
    /// Whether the snapshot loaded without any repair.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.repairs.is_empty()
    }

    /// Repairs in the order they were applied.
    #[must_use]
    pub fn repairs(&self) -> &[Repair] {
        &self.repairs
    }

    fn push(&mut self, repair: Repair) {
        warn!(?repair, "repaired cart snapshot");

        self.repairs.push(repair);
    }
}

/// Turn a snapshot into items that satisfy the cart invariants.
///
/// The policy never rejects a snapshot as a whole:
///
/// 1. items with a quantity below one are dropped;
/// 2. items with a blank product id or title, a missing or negative price, or a
///    quantity above `u32::MAX` are dropped;
/// 3. items repeating an earlier slot are merged into the first occurrence,
///    summing quantities (saturating) and keeping the first item's metadata;
/// 4. an item, or a merge, that would push the subtotal past [`Decimal::MAX`]
///    is dropped and earlier items are kept.
pub fn repair(snapshot: CartSnapshot) -> (Vec<LineItem>, LoadReport) {
    let mut report = LoadReport::default();
    let mut items: Vec<LineItem> = Vec::with_capacity(snapshot.items.len());
    let mut positions: FxHashMap<SlotKey, usize> = FxHashMap::default();
    let mut subtotal = Decimal::ZERO;

    for (index, raw) in snapshot.items.into_iter().enumerate() {
        let item = match raw.into_line_item(index) {
            Ok(item) => item,
            Err(repair) => {
                report.push(repair);
                continue;
            }
        };

        let slot = item.slot_key();

        if let Some(&position) = positions.get(&slot) {
            if let Some(existing) = items.get_mut(position) {
                let quantity = existing.quantity().saturating_add(item.quantity());
                let added = Decimal::from(quantity.saturating_sub(existing.quantity()));

                let Some(next) = existing
                    .unit_price()
                    .checked_mul(added)
                    .and_then(|extra| subtotal.checked_add(extra))
                else {
                    report.push(Repair::DroppedInvalidItem {
                        index,
                        reason: CartError::AmountOverflow,
                    });
                    continue;
                };

                subtotal = next;
                existing.set_quantity(quantity);

                report.push(Repair::MergedDuplicate { slot, quantity });
            }
        } else {
            let Some(next) = item
                .line_total()
                .and_then(|total| subtotal.checked_add(total))
            else {
                report.push(Repair::DroppedInvalidItem {
                    index,
                    reason: CartError::AmountOverflow,
                });
                continue;
            };

            subtotal = next;
            positions.insert(slot, items.len());
            items.push(item);
        }
    }

    (items, report)
}

impl SnapshotItem {
    fn into_line_item(self, index: usize) -> Result<LineItem, Repair> {
        let invalid = |reason| Repair::DroppedInvalidItem { index, reason };

        if self.quantity <= 0 {
            return Err(Repair::DroppedNonPositiveQuantity {
                slot: SlotKey::new(self.product_id, self.size.as_deref()),
                quantity: self.quantity,
            });
        }

        let quantity =
            u32::try_from(self.quantity).map_err(|_err| invalid(CartError::QuantityOverflow))?;
        let unit_price = self
            .unit_price
            .ok_or_else(|| invalid(CartError::MissingPrice))?;

        let item = LineItem::new(self.product_id, self.title, unit_price, quantity).with_variants(
            self.image,
            self.size,
            self.color,
        );

        validate(&item).map_err(invalid)?;

        Ok(item)
    }
}
