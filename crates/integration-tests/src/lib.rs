//! Integration tests for RocketShoes.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p rocketshoes-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_store` - Cart store against the HTTP catalog client and sled
//! - `storefront_routes` - Storefront pages and form posts
//!
//! Every test talks to a [`FakeCatalog`]: an in-process product/stock
//! service bound to an ephemeral port.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use rocketshoes_core::{Price, Product, ProductId, Stock};
use rocketshoes_storefront::catalog::{CatalogClient, CatalogError};
use rocketshoes_storefront::config::{ConfigError, StorefrontConfig};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Products every seeded fake catalog serves: `(id, title, cents, stock)`.
pub const SEED_PRODUCTS: &[(u32, &str, u32, u32)] = &[
    (1, "Tênis de Caminhada Leve Confortável", 17990, 3),
    (2, "Tênis VR Caminhada Confortável Detalhes Couro Masculino", 13990, 5),
    (3, "Tênis Adidas Duramo Lite 2.0", 21990, 1),
    (4, "Tênis Olympikus Esportivo", 9990, 0),
];

#[derive(Default)]
struct Inventory {
    products: Vec<Product>,
    stock: HashMap<ProductId, u32>,
}

#[derive(Clone, Default)]
struct FakeState {
    inventory: Arc<Mutex<Inventory>>,
    stock_requests: Arc<AtomicUsize>,
    product_requests: Arc<AtomicUsize>,
}

impl FakeState {
    fn inventory(&self) -> MutexGuard<'_, Inventory> {
        self.inventory.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// In-process product/stock service.
///
/// Serves `/products`, `/products/{id}` and `/stock/{id}`. The server task is
/// aborted on drop.
pub struct FakeCatalog {
    addr: SocketAddr,
    state: FakeState,
    task: JoinHandle<()>,
}

impl FakeCatalog {
    /// Start an empty fake catalog on an ephemeral port.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        let state = FakeState::default();
        let app = Router::new()
            .route("/products", get(list_products))
            .route("/products/{id}", get(product))
            .route("/stock/{id}", get(stock))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self { addr, state, task })
    }

    /// Start a fake catalog serving [`SEED_PRODUCTS`].
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn seeded() -> std::io::Result<Self> {
        let catalog = Self::start().await?;
        for &(id, title, cents, stock) in SEED_PRODUCTS {
            catalog.add_product(id, title, cents, stock);
        }
        Ok(catalog)
    }

    /// Register a product with its stock.
    pub fn add_product(&self, id: u32, title: &str, cents: u32, stock: u32) -> Product {
        let product = Product {
            id: ProductId::new(id),
            title: title.to_string(),
            price: Price::from_cents(cents),
            image: format!(
                "https://rocketseat-cdn.s3-sa-east-1.amazonaws.com/modulo-redux/tenis{id}.jpg"
            ),
        };

        let mut inventory = self.state.inventory();
        inventory.products.retain(|p| p.id != product.id);
        inventory.products.push(product.clone());
        inventory.stock.insert(product.id, stock);
        product
    }

    /// Change the stock the service reports for a product.
    pub fn set_stock(&self, id: u32, amount: u32) {
        self.state.inventory().stock.insert(ProductId::new(id), amount);
    }

    /// Number of `/stock/{id}` requests served so far.
    #[must_use]
    pub fn stock_requests(&self) -> usize {
        self.state.stock_requests.load(Ordering::SeqCst)
    }

    /// Number of `/products/{id}` requests served so far.
    #[must_use]
    pub fn product_requests(&self) -> usize {
        self.state.product_requests.load(Ordering::SeqCst)
    }

    /// Base URL of the running service.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Storefront configuration pointing at this service.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is rejected.
    pub fn config(&self) -> Result<StorefrontConfig, ConfigError> {
        let base_url = self.base_url();
        StorefrontConfig::from_source(&|key| match key {
            "CATALOG_API_URL" => Some(base_url.clone()),
            "CATALOG_TIMEOUT_SECS" => Some("5".to_string()),
            _ => None,
        })
    }

    /// A catalog client talking to this service.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be built.
    pub fn client(&self) -> Result<CatalogClient, CatalogError> {
        let config = self
            .config()
            .map_err(|e| CatalogError::Parse(e.to_string()))?;
        CatalogClient::new(&config.catalog)
    }
}

impl Drop for FakeCatalog {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn list_products(State(state): State<FakeState>) -> Json<Vec<Product>> {
    Json(state.inventory().products.clone())
}

async fn product(
    State(state): State<FakeState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>, StatusCode> {
    state.product_requests.fetch_add(1, Ordering::SeqCst);
    state
        .inventory()
        .products
        .iter()
        .find(|p| p.id == id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn stock(
    State(state): State<FakeState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Stock>, StatusCode> {
    state.stock_requests.fetch_add(1, Ordering::SeqCst);
    state
        .inventory()
        .stock
        .get(&id)
        .map(|&amount| Json(Stock { id, amount }))
        .ok_or(StatusCode::NOT_FOUND)
}
