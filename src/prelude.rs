//! Storefront cart prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{
        CartAction, CartError, CartSnapshot, CartState, CartStore, Dispatched, LoadReport, Repair,
        SnapshotItem, reduce,
    },
    catalog::{Catalog, CatalogError, Product},
    checkout::{
        CheckoutError, OrderDraft, OrderItem, PaymentMethod, ShippingAddress, place_order,
    },
    items::{LineItem, ProductId, SlotKey},
    persistence::{FileSnapshotStore, MemorySnapshotStore, PersistenceError, SnapshotStore},
    pricing::{PricingError, Totals, compute_totals, format_amount},
    summary::{CartSummary, SummaryError},
};
