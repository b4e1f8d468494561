//! Product/stock service access.
//!
//! # Architecture
//!
//! - [`CatalogService`] is the narrow seam the cart store depends on
//! - [`CatalogClient`] implements it over HTTP with `reqwest`
//! - Product records are cached in memory via `moka`; stock never is
//!
//! # Endpoints
//!
//! ```text
//! GET {base}/products        - Product listing
//! GET {base}/products/{id}   - Single product
//! GET {base}/stock/{id}      - Current stock { id, amount }
//! ```

mod cache;
mod client;

use std::future::Future;
use std::sync::Arc;

pub use client::CatalogClient;

use rocketshoes_core::{Product, ProductId, Stock};
use thiserror::Error;

/// Errors that can occur when talking to the product/stock service.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Service returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Response body could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The service answered for a different product than requested.
    #[error("Requested product {requested} but service returned {returned}")]
    Mismatch {
        requested: ProductId,
        returned: ProductId,
    },
}

/// Read-only access to catalog products and live stock.
pub trait CatalogService: Send + Sync {
    /// Fetch a single product.
    fn fetch_product(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<Product, CatalogError>> + Send;

    /// Fetch the current stock for a product. Implementations must not cache.
    fn fetch_stock(&self, id: ProductId)
    -> impl Future<Output = Result<Stock, CatalogError>> + Send;

    /// Fetch the full product listing.
    fn list_products(&self) -> impl Future<Output = Result<Vec<Product>, CatalogError>> + Send;
}

impl<T: CatalogService> CatalogService for Arc<T> {
    fn fetch_product(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<Product, CatalogError>> + Send {
        (**self).fetch_product(id)
    }

    fn fetch_stock(&self, id: ProductId)
    -> impl Future<Output = Result<Stock, CatalogError>> + Send {
        (**self).fetch_stock(id)
    }

    fn list_products(&self) -> impl Future<Output = Result<Vec<Product>, CatalogError>> + Send {
        (**self).list_products()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_error_display() {
        let err = CatalogError::NotFound("/stock/9".to_string());
        assert_eq!(err.to_string(), "Not found: /stock/9");

        let err = CatalogError::Api {
            status: 503,
            message: "maintenance".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 503 - maintenance");

        let err = CatalogError::Mismatch {
            requested: ProductId::new(1),
            returned: ProductId::new(2),
        };
        assert_eq!(
            err.to_string(),
            "Requested product 1 but service returned 2"
        );
    }
}
