//! Items

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Opaque catalog product identifier.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Creates a new product identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is blank.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The identity bucket a line item occupies in a cart.
///
/// Two line items are the same slot when their product and size match. Color is
/// not part of the key: items differing only by color merge into one slot.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SlotKey {
    product_id: ProductId,
    size: Option<String>,
}

impl SlotKey {
    /// Creates a slot key. An empty size is treated as no size.
    pub fn new(product_id: impl Into<ProductId>, size: Option<&str>) -> Self {
        Self {
            product_id: product_id.into(),
            size: normalize_variant(size.map(str::to_string)),
        }
    }

    /// Product part of the key.
    #[must_use]
    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    /// Size part of the key.
    #[must_use]
    pub fn size(&self) -> Option<&str> {
        self.size.as_deref()
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.size {
            Some(size) => write!(f, "{}/{size}", self.product_id),
            None => write!(f, "{}", self.product_id),
        }
    }
}

/// One product + variant entry in the cart.
///
/// Display metadata and unit price are captured when the item is built and are
/// never refreshed from the catalog afterwards.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LineItem {
    product_id: ProductId,
    title: String,
    image: Option<String>,
    unit_price: Decimal,
    size: Option<String>,
    color: Option<String>,
    quantity: u32,
}

impl LineItem {
    /// Creates a line item without variant attributes or image.
    pub fn new(
        product_id: impl Into<ProductId>,
        title: impl Into<String>,
        unit_price: Decimal,
        quantity: u32,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            title: title.into(),
            image: None,
            unit_price,
            size: None,
            color: None,
            quantity,
        }
    }

    /// Sets the size variant. An empty size is treated as no size.
    #[must_use]
    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = normalize_variant(Some(size.into()));
        self
    }

    /// Sets the color attribute. An empty color is treated as no color.
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = normalize_variant(Some(color.into()));
        self
    }

    /// Sets the display image.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = normalize_variant(Some(image.into()));
        self
    }

    pub(crate) fn with_variants(
        mut self,
        image: Option<String>,
        size: Option<String>,
        color: Option<String>,
    ) -> Self {
        self.image = normalize_variant(image);
        self.size = normalize_variant(size);
        self.color = normalize_variant(color);
        self
    }

    /// The slot this item occupies.
    #[must_use]
    pub fn slot_key(&self) -> SlotKey {
        SlotKey {
            product_id: self.product_id.clone(),
            size: self.size.clone(),
        }
    }

    /// Whether this item occupies the given slot.
    #[must_use]
    pub fn occupies(&self, slot: &SlotKey) -> bool {
        self.product_id == slot.product_id && self.size == slot.size
    }

    /// Returns the product identifier.
    #[must_use]
    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    /// Returns the title captured at add-time.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the image captured at add-time.
    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    /// Returns the unit price captured at add-time.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    /// Returns the size variant.
    #[must_use]
    pub fn size(&self) -> Option<&str> {
        self.size.as_deref()
    }

    /// Returns the color attribute.
    #[must_use]
    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    /// Returns the quantity.
    #[must_use]
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Unit price multiplied by quantity, or `None` if the product overflows
    /// [`Decimal`].
    #[must_use]
    pub fn line_total(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }

    pub(crate) fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
    }
}

/// Empty variant strings come from catalog entries without a selection.
fn normalize_variant(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
