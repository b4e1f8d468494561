//! Application state shared across handlers.

use std::sync::Arc;

use crate::catalog::CatalogClient;
use crate::config::StorefrontConfig;
use crate::error::AppError;
use crate::notify::NotificationQueue;
use crate::services::cart::CartStore;
use crate::storage::{KeyValueStore, SledStore};

/// The cart store as wired in the running storefront.
pub type StorefrontCart = CartStore<CatalogClient, Arc<dyn KeyValueStore>, Arc<NotificationQueue>>;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and gives handlers access to
/// the single cart store and the pending notifications.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cart: StorefrontCart,
    notifications: Arc<NotificationQueue>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `catalog` - Product/stock service client
    /// * `storage` - Durable store the cart is restored from and saved to
    #[must_use]
    pub fn new(catalog: CatalogClient, storage: Arc<dyn KeyValueStore>) -> Self {
        let notifications = Arc::new(NotificationQueue::new());
        let cart = CartStore::load(catalog, storage, Arc::clone(&notifications));

        Self {
            inner: Arc::new(AppStateInner {
                cart,
                notifications,
            }),
        }
    }

    /// Build the state from configuration, opening the cart database.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog client cannot be built or the cart
    /// database cannot be opened.
    pub fn from_config(config: &StorefrontConfig) -> Result<Self, AppError> {
        let catalog = CatalogClient::new(&config.catalog)?;
        let storage = SledStore::open(&config.cart_storage_path)?;
        tracing::info!(path = %config.cart_storage_path.display(), "Cart database opened");

        Ok(Self::new(catalog, Arc::new(storage)))
    }

    /// Get a reference to the cart store.
    #[must_use]
    pub fn cart(&self) -> &StorefrontCart {
        &self.inner.cart
    }

    /// Get a reference to the product/stock service client.
    #[must_use]
    pub fn catalog(&self) -> &CatalogClient {
        self.inner.cart.catalog()
    }

    /// Get a reference to the pending user notifications.
    #[must_use]
    pub fn notifications(&self) -> &NotificationQueue {
        &self.inner.notifications
    }
}
