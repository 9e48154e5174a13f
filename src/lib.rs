//! Storefront Cart
//!
//! Client-side shopping cart engine for the storefront: a cart store with
//! slot-based merge rules, order pricing with VAT and delivery, snapshot
//! persistence, catalog selection, checkout and a printable cart summary.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod items;
pub mod persistence;
pub mod prelude;
pub mod pricing;
pub mod summary;
