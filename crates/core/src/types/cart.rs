//! The shopping cart sequence.
//!
//! A [`Cart`] is an ordered list of [`CartItem`]s in the order products were
//! first added. Two invariants hold for every cart constructed through this
//! module:
//!
//! - no two items share a product id
//! - every item has an amount of at least one
//!
//! Transitions never mutate in place. Each returns the candidate cart, which
//! lets the cart store persist it before swapping it in.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Price, Product, ProductId};

/// Errors produced by cart transitions and cart decoding.
#[derive(Debug, Error)]
pub enum CartDataError {
    /// Stored payload is not a JSON list of cart items.
    #[error("malformed cart payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The same product appears twice.
    #[error("product {0} appears more than once")]
    DuplicateItem(ProductId),

    /// An item would hold zero units.
    #[error("product {0} has a zero amount")]
    ZeroAmount(ProductId),

    /// The product is not in the cart.
    #[error("product {0} is not in the cart")]
    MissingItem(ProductId),
}

/// A product held in the cart together with its quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(flatten)]
    pub product: Product,
    pub amount: u32,
}

impl CartItem {
    /// Product id of this line.
    #[must_use]
    pub const fn id(&self) -> ProductId {
        self.product.id
    }

    /// Unit price times amount.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price.times(self.amount)
    }
}

/// Ordered cart contents with unique product ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from items, checking the invariants.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateItem` or `ZeroAmount` if `items` violates them.
    pub fn from_items(items: Vec<CartItem>) -> Result<Self, CartDataError> {
        for (index, item) in items.iter().enumerate() {
            if item.amount == 0 {
                return Err(CartDataError::ZeroAmount(item.id()));
            }
            if items.iter().take(index).any(|prior| prior.id() == item.id()) {
                return Err(CartDataError::DuplicateItem(item.id()));
            }
        }
        Ok(Self { items })
    }

    /// Decode a persisted cart.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON, mismatched types, or invariant violations.
    pub fn from_json(payload: &str) -> Result<Self, CartDataError> {
        let items: Vec<CartItem> = serde_json::from_str(payload)?;
        Self::from_items(items)
    }

    /// Encode the whole cart for persistence.
    ///
    /// # Errors
    ///
    /// Returns an error only if serialization itself fails.
    pub fn to_json(&self) -> Result<String, CartDataError> {
        Ok(serde_json::to_string(&self.items)?)
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.get(id).is_some()
    }

    /// Units of `id` held in the cart, zero if absent.
    #[must_use]
    pub fn amount_of(&self, id: ProductId) -> u32 {
        self.get(id).map_or(0, |item| item.amount)
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn total_units(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.amount)).sum()
    }

    /// Cart with `product` appended at amount one.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateItem` if the product is already present.
    pub fn with_added(&self, product: Product) -> Result<Self, CartDataError> {
        if self.contains(product.id) {
            return Err(CartDataError::DuplicateItem(product.id));
        }
        let mut items = self.items.clone();
        items.push(CartItem { product, amount: 1 });
        Ok(Self { items })
    }

    /// Cart with the amount of `id` set to exactly `amount`.
    ///
    /// # Errors
    ///
    /// Returns `ZeroAmount` for `amount == 0` and `MissingItem` if `id` is absent.
    pub fn with_amount(&self, id: ProductId, amount: u32) -> Result<Self, CartDataError> {
        if amount == 0 {
            return Err(CartDataError::ZeroAmount(id));
        }
        if !self.contains(id) {
            return Err(CartDataError::MissingItem(id));
        }
        let items = self
            .items
            .iter()
            .map(|item| {
                if item.id() == id {
                    CartItem {
                        product: item.product.clone(),
                        amount,
                    }
                } else {
                    item.clone()
                }
            })
            .collect();
        Ok(Self { items })
    }

    /// Cart without `id`, remaining items in their original order.
    ///
    /// # Errors
    ///
    /// Returns `MissingItem` if `id` is absent.
    pub fn without(&self, id: ProductId) -> Result<Self, CartDataError> {
        if !self.contains(id) {
            return Err(CartDataError::MissingItem(id));
        }
        let items = self
            .items
            .iter()
            .filter(|item| item.id() != id)
            .cloned()
            .collect();
        Ok(Self { items })
    }
}

impl<'de> Deserialize<'de> for Cart {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = Vec::<CartItem>::deserialize(deserializer)?;
        Self::from_items(items).map_err(serde::de::Error::custom)
    }
}
