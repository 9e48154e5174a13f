//! Checkout
//!
//! Turns a priced cart into the order payload the storefront submits, then
//! empties the cart.

use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::{
    cart::{CartAction, CartError, CartState, CartStore},
    items::{LineItem, ProductId},
    pricing::{PricingError, compute_totals},
};

/// Errors that can occur while placing an order.
#[derive(Debug, Error, PartialEq)]
pub enum CheckoutError {
    /// There is nothing to order.
    #[error("cannot check out an empty cart")]
    EmptyCart,

    /// A required shipping address field is blank.
    #[error("shipping address is missing {0}")]
    MissingAddressField(&'static str),

    /// The payment method is not offered.
    #[error("unknown payment method: {0}")]
    UnknownPaymentMethod(String),

    /// Clearing the cart failed.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// The order totals could not be computed.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// Where an order is delivered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    /// Recipient name
    pub name: String,

    /// Contact phone number
    pub phone: String,

    /// Street address
    pub street: String,

    /// House or flat number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub house: Option<String>,

    /// Nearby landmark
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmark: Option<String>,

    /// District
    pub district: String,

    /// Delivery zone within the district
    pub zone: String,

    /// Area within the zone
    pub area: String,
}

impl ShippingAddress {
    /// Check that every required field is filled in.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::MissingAddressField`] naming the first blank
    /// required field.
    pub fn validate(&self) -> Result<(), CheckoutError> {
        let required = [
            ("name", &self.name),
            ("phone", &self.phone),
            ("street", &self.street),
            ("district", &self.district),
            ("zone", &self.zone),
            ("area", &self.area),
        ];

        match required.into_iter().find(|(_, value)| value.trim().is_empty()) {
            Some((field, _)) => Err(CheckoutError::MissingAddressField(field)),
            None => Ok(()),
        }
    }
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// `bKash` mobile wallet
    Bkash,

    /// Nagad mobile wallet
    Nagad,

    /// Debit or credit card
    Card,

    /// Internet banking
    #[serde(rename = "netbanking")]
    NetBanking,

    /// Cash on delivery
    #[default]
    #[serde(rename = "cod")]
    CashOnDelivery,
}

impl PaymentMethod {
    /// Wire name of the method.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Bkash => "bkash",
            PaymentMethod::Nagad => "nagad",
            PaymentMethod::Card => "card",
            PaymentMethod::NetBanking => "netbanking",
            PaymentMethod::CashOnDelivery => "cod",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = CheckoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bkash" => Ok(PaymentMethod::Bkash),
            "nagad" => Ok(PaymentMethod::Nagad),
            "card" => Ok(PaymentMethod::Card),
            "netbanking" => Ok(PaymentMethod::NetBanking),
            "cod" => Ok(PaymentMethod::CashOnDelivery),
            _ => Err(CheckoutError::UnknownPaymentMethod(s.to_string())),
        }
    }
}

/// One ordered line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderItem {
    /// Product identifier
    pub product: ProductId,

    /// Title captured when the item was added
    pub title: String,

    /// Unit price captured when the item was added
    pub price: Decimal,

    /// Ordered quantity
    pub quantity: u32,

    /// Size variant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    /// Color attribute
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// Display image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl From<&LineItem> for OrderItem {
    fn from(item: &LineItem) -> Self {
        Self {
            product: item.product_id().clone(),
            title: item.title().to_string(),
            price: item.unit_price(),
            quantity: item.quantity(),
            size: item.size().map(str::to_string),
            color: item.color().map(str::to_string),
            image: item.image().map(str::to_string),
        }
    }
}

/// Order payload ready to submit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    /// Ordered lines, in cart order
    pub order_items: Vec<OrderItem>,

    /// Delivery address
    pub shipping_address: ShippingAddress,

    /// Chosen payment method
    pub payment_method: PaymentMethod,

    /// Subtotal of the ordered lines
    pub items_price: Decimal,

    /// VAT on the subtotal
    pub tax_price: Decimal,

    /// Delivery fee
    pub shipping_price: Decimal,

    /// Amount due
    pub total_price: Decimal,
}

impl OrderDraft {
    /// Build an order from the current cart.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] for an empty cart,
    /// [`CheckoutError::MissingAddressField`] for an incomplete address, or
    /// [`CheckoutError::Pricing`] if the totals overflow.
    pub fn from_cart(
        cart: &CartState,
        shipping_address: ShippingAddress,
        payment_method: PaymentMethod,
    ) -> Result<Self, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        shipping_address.validate()?;

        let totals = compute_totals(cart)?;

        Ok(Self {
            order_items: cart.iter().map(OrderItem::from).collect(),
            shipping_address,
            payment_method,
            items_price: totals.subtotal,
            tax_price: totals.vat,
            shipping_price: totals.delivery_fee,
            total_price: totals.grand_total,
        })
    }
}

/// Place an order for the store's cart and empty it.
///
/// The cart is only cleared once the draft has been built.
///
/// # Errors
///
/// Returns a [`CheckoutError`] if the draft cannot be built; the cart is left
/// untouched.
pub fn place_order(
    store: &mut CartStore,
    shipping_address: ShippingAddress,
    payment_method: PaymentMethod,
) -> Result<OrderDraft, CheckoutError> {
    let order = OrderDraft::from_cart(&store.state(), shipping_address, payment_method)?;

    store.dispatch(CartAction::Clear)?;

    info!(
        items = order.order_items.len(),
        total = %order.total_price,
        payment = %order.payment_method,
        "placed order"
    );

    Ok(order)
}
