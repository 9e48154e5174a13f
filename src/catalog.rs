//! Catalog
//!
//! Product records as the storefront lists them, loaded from YAML. The catalog
//! turns a product selection into a [`LineItem`], capturing the title, image and
//! price at that moment.

use std::{fs, path::Path};

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use rusty_money::iso::{self, Currency};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::{
    cart::{CartError, validate},
    items::{LineItem, ProductId},
};

/// Catalog Errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// IO error reading the catalog file
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Prices must be in the storefront currency
    #[error("Unsupported currency code: {0}")]
    UnknownCurrency(String),

    /// Product not found
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// The product is not offered in the requested size
    #[error("Product {product} is not available in size {size}")]
    SizeUnavailable {
        /// Product identifier
        product: String,
        /// Requested size
        size: String,
    },

    /// The product is not offered in the requested color
    #[error("Product {product} is not available in color {color}")]
    ColorUnavailable {
        /// Product identifier
        product: String,
        /// Requested color
        color: String,
    },

    /// The product has no stock left
    #[error("Product {0} is out of stock")]
    OutOfStock(String),

    /// More units were requested than the product has in stock
    #[error("Product {product} has only {available} in stock, {requested} requested")]
    InsufficientStock {
        /// Product identifier
        product: String,
        /// Requested quantity
        requested: u32,
        /// Units in stock
        available: u32,
    },

    /// The resulting line item was rejected
    #[error(transparent)]
    Cart(#[from] CartError),
}

/// Wrapper for products in YAML
#[derive(Debug, Deserialize)]
struct CatalogFixture {
    /// Map of product id -> product fixture
    products: FxHashMap<String, ProductFixture>,
}

/// Product Fixture
#[derive(Debug, Deserialize)]
struct ProductFixture {
    title: String,

    /// Product price (e.g., "1500 BDT")
    price: String,

    #[serde(default)]
    image: Option<String>,

    #[serde(default)]
    sizes: Vec<String>,

    #[serde(default)]
    colors: Vec<String>,

    /// Units in stock; unlimited when absent
    #[serde(default)]
    stock: Option<u32>,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    /// Product identifier
    pub id: ProductId,

    /// Display title
    pub title: String,

    /// Display image
    pub image: Option<String>,

    /// Unit price in whole currency units
    pub price: Decimal,

    /// Offered sizes, first is the default selection
    pub sizes: Vec<String>,

    /// Offered colors, first is the default selection
    pub colors: Vec<String>,

    /// Units in stock; unlimited when absent
    pub stock: Option<u32>,
}

impl Product {
    /// Whether the product can be added to a cart.
    #[must_use]
    pub fn in_stock(&self) -> bool {
        self.stock.is_none_or(|stock| stock > 0)
    }

    fn select<'a>(
        offered: &'a [String],
        requested: Option<&'a str>,
    ) -> Result<Option<&'a str>, &'a str> {
        match requested.filter(|value| !value.trim().is_empty()) {
            Some(value) if offered.iter().any(|option| option == value) => Ok(Some(value)),
            Some(value) => Err(value),
            None => Ok(offered.first().map(String::as_str)),
        }
    }
}

/// Product catalog keyed by product id.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    products: FxHashMap<ProductId, Product>,
}

impl Catalog {
    /// Load a catalog from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if a price is
    /// malformed or not in the storefront currency.
    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path)?;
        let catalog = Self::from_yaml(&contents)?;

        debug!(
            path = %path.display(),
            products = catalog.len(),
            "loaded catalog"
        );

        Ok(catalog)
    }

    /// Parse a catalog from YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid, or if a price is malformed or
    /// not in the storefront currency.
    pub fn from_yaml(yaml: &str) -> Result<Self, CatalogError> {
        let fixture: CatalogFixture = serde_norway::from_str(yaml)?;

        let products = fixture
            .products
            .into_iter()
            .map(|(id, product)| {
                let (price, _currency) = parse_price(&product.price)?;
                let id = ProductId::new(id);

                Ok((
                    id.clone(),
                    Product {
                        id,
                        title: product.title,
                        image: product.image,
                        price,
                        sizes: product.sizes,
                        colors: product.colors,
                        stock: product.stock,
                    },
                ))
            })
            .collect::<Result<_, CatalogError>>()?;

        Ok(Self { products })
    }

    /// Look up a product.
    #[must_use]
    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.get(&ProductId::new(id))
    }

    /// Products ordered by id.
    pub fn products(&self) -> impl Iterator<Item = &Product> {
        let mut products: Vec<&Product> = self.products.values().collect();
        products.sort_by(|a, b| a.id.cmp(&b.id));

        products.into_iter()
    }

    /// Number of products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog has no products.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Build a line item for a product selection.
    ///
    /// Without an explicit size the product's first size is selected, and
    /// likewise for color. Products without sizes produce items without a size.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is unknown or out of stock, if
    /// `quantity` exceeds the units in stock, if the requested size or color is
    /// not offered, or if the resulting line item would be rejected by the
    /// cart.
    pub fn line_item(
        &self,
        product_id: &str,
        size: Option<&str>,
        color: Option<&str>,
        quantity: u32,
    ) -> Result<LineItem, CatalogError> {
        let product = self
            .product(product_id)
            .ok_or_else(|| CatalogError::ProductNotFound(product_id.to_string()))?;

        if !product.in_stock() {
            return Err(CatalogError::OutOfStock(product_id.to_string()));
        }

        if let Some(available) = product.stock.filter(|&stock| quantity > stock) {
            return Err(CatalogError::InsufficientStock {
                product: product_id.to_string(),
                requested: quantity,
                available,
            });
        }

        let size = Product::select(&product.sizes, size).map_err(|size| {
            CatalogError::SizeUnavailable {
                product: product_id.to_string(),
                size: size.to_string(),
            }
        })?;

        let color = Product::select(&product.colors, color).map_err(|color| {
            CatalogError::ColorUnavailable {
                product: product_id.to_string(),
                color: color.to_string(),
            }
        })?;

        let item = LineItem::new(
            product.id.clone(),
            product.title.clone(),
            product.price,
            quantity,
        )
        .with_variants(
            product.image.clone(),
            size.map(str::to_string),
            color.map(str::to_string),
        );

        validate(&item)?;

        Ok(item)
    }
}

/// Parse price string (e.g., "1500 BDT") into an amount and currency
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY", if
/// the amount is not a non-negative decimal, or if the currency is not the
/// storefront currency.
pub fn parse_price(s: &str) -> Result<(Decimal, &'static Currency), CatalogError> {
    let parts: Vec<&str> = s.split_whitespace().collect();

    let [amount, code] = parts.as_slice() else {
        return Err(CatalogError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let amount = amount
        .parse::<Decimal>()
        .map_err(|_err| CatalogError::InvalidPrice(s.to_string()))?;

    if amount.is_sign_negative() {
        return Err(CatalogError::InvalidPrice(s.to_string()));
    }

    let currency = match *code {
        "BDT" => iso::BDT,
        other => return Err(CatalogError::UnknownCurrency(other.to_string())),
    };

    Ok((amount, currency))
}
