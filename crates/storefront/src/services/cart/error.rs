//! Cart store error types.

use rocketshoes_core::{CartDataError, ProductId};
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::storage::StorageError;

/// Shown when the requested quantity exceeds live stock.
pub const OUT_OF_STOCK_MESSAGE: &str = "Requested quantity is out of stock";

/// The cart operation an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartOperation {
    Add,
    Remove,
    Update,
}

impl CartOperation {
    /// Generic failure text for this operation.
    #[must_use]
    pub const fn failure_message(self) -> &'static str {
        match self {
            Self::Add => "Failed to add product",
            Self::Remove => "Failed to remove product",
            Self::Update => "Failed to update product amount",
        }
    }

    /// Breadcrumb text recorded after a successful change.
    #[must_use]
    pub const fn breadcrumb(self) -> &'static str {
        match self {
            Self::Add => "Added product to cart",
            Self::Remove => "Removed product from cart",
            Self::Update => "Changed product amount",
        }
    }
}

/// Errors that can occur during cart operations.
///
/// These never leave the cart store; they are turned into notifications.
#[derive(Debug, Error)]
pub enum CartError {
    /// Requested amount is below one.
    #[error("invalid amount: {0}")]
    InvalidAmount(i64),

    /// Not enough units in stock.
    #[error("requested {requested} of product {id} but only {available} in stock")]
    StockExhausted {
        id: ProductId,
        requested: u64,
        available: u32,
    },

    /// Product is not in the cart.
    #[error("product {0} is not in the cart")]
    NotInCart(ProductId),

    /// Product/stock service failed.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Cart could not be persisted.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Cart transition or encoding failed.
    #[error("cart data error: {0}")]
    Data(#[from] CartDataError),
}

impl CartError {
    /// Message shown to the user when `operation` fails with this error.
    ///
    /// Only stock exhaustion gets a specific message; every other cause is
    /// reported with the operation's generic failure text.
    #[must_use]
    pub const fn user_message(&self, operation: CartOperation) -> &'static str {
        match (operation, self) {
            (CartOperation::Add | CartOperation::Update, Self::StockExhausted { .. }) => {
                OUT_OF_STOCK_MESSAGE
            }
            _ => operation.failure_message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_exhausted_message() {
        let err = CartError::StockExhausted {
            id: ProductId::new(1),
            requested: 3,
            available: 2,
        };
        assert_eq!(err.user_message(CartOperation::Add), OUT_OF_STOCK_MESSAGE);
        assert_eq!(err.user_message(CartOperation::Update), OUT_OF_STOCK_MESSAGE);
        assert_eq!(
            err.to_string(),
            "requested 3 of product 1 but only 2 in stock"
        );
    }

    #[test]
    fn test_remote_failures_are_generic() {
        let err = CartError::Catalog(CatalogError::NotFound("/products/9".to_string()));
        assert_eq!(err.user_message(CartOperation::Add), "Failed to add product");
        assert_eq!(
            err.user_message(CartOperation::Update),
            "Failed to update product amount"
        );
    }

    #[test]
    fn test_remove_failures_are_generic() {
        let err = CartError::NotInCart(ProductId::new(4));
        assert_eq!(
            err.user_message(CartOperation::Remove),
            "Failed to remove product"
        );
    }
}
