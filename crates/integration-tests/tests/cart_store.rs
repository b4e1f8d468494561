//! Integration tests for the cart store.
//!
//! These drive `CartStore` through the real HTTP catalog client and a
//! temporary sled database, with a fake product/stock service behind them.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use rocketshoes_core::{Cart, ProductId};
use rocketshoes_integration_tests::FakeCatalog;
use rocketshoes_storefront::catalog::CatalogClient;
use rocketshoes_storefront::notify::{NotificationLevel, NotificationQueue};
use rocketshoes_storefront::services::cart::{CartStore, OUT_OF_STOCK_MESSAGE};
use rocketshoes_storefront::storage::{CART_STORAGE_KEY, KeyValueStore, SledStore};

type Store = CartStore<CatalogClient, Arc<SledStore>, Arc<NotificationQueue>>;

struct Harness {
    catalog: FakeCatalog,
    storage: Arc<SledStore>,
    notifications: Arc<NotificationQueue>,
    store: Store,
}

impl Harness {
    async fn new() -> Self {
        let catalog = FakeCatalog::seeded().await.unwrap();
        let storage = Arc::new(SledStore::temporary().unwrap());
        let notifications = Arc::new(NotificationQueue::new());
        let store = CartStore::load(
            catalog.client().unwrap(),
            Arc::clone(&storage),
            Arc::clone(&notifications),
        );

        Self {
            catalog,
            storage,
            notifications,
            store,
        }
    }

    /// A second store over the same database, as after a restart.
    fn reload(&self) -> Store {
        CartStore::load(
            self.catalog.client().unwrap(),
            Arc::clone(&self.storage),
            Arc::new(NotificationQueue::new()),
        )
    }

    fn saved_cart(&self) -> Option<Cart> {
        self.storage
            .get(CART_STORAGE_KEY)
            .unwrap()
            .map(|payload| Cart::from_json(&payload).unwrap())
    }

    fn error_messages(&self) -> Vec<String> {
        self.notifications
            .drain()
            .into_iter()
            .filter(|n| n.level == NotificationLevel::Error)
            .map(|n| n.message)
            .collect()
    }
}

fn id(raw: u32) -> ProductId {
    ProductId::new(raw)
}

// =============================================================================
// addProduct
// =============================================================================

#[tokio::test]
async fn test_add_new_product_is_saved() {
    let h = Harness::new().await;

    assert!(h.store.add_product(id(2)).await);

    let cart = h.store.cart().await;
    assert_eq!(cart.len(), 1);
    assert_eq!(cart.amount_of(id(2)), 1);
    assert_eq!(
        cart.items()[0].product.title,
        "Tênis VR Caminhada Confortável Detalhes Couro Masculino"
    );
    assert_eq!(h.saved_cart(), Some(cart));
    assert!(h.error_messages().is_empty());
}

#[tokio::test]
async fn test_add_until_stock_runs_out() {
    let h = Harness::new().await;

    for _ in 0..3 {
        assert!(h.store.add_product(id(1)).await);
    }
    assert!(!h.store.add_product(id(1)).await);

    assert_eq!(h.store.cart().await.amount_of(id(1)), 3);
    assert_eq!(h.saved_cart().unwrap().amount_of(id(1)), 3);
    assert_eq!(h.error_messages(), vec![OUT_OF_STOCK_MESSAGE.to_string()]);
}

#[tokio::test]
async fn test_add_reads_live_stock_every_time() {
    let h = Harness::new().await;

    assert!(h.store.add_product(id(3)).await);
    assert!(!h.store.add_product(id(3)).await);

    h.catalog.set_stock(3, 2);
    assert!(h.store.add_product(id(3)).await);
    assert_eq!(h.store.cart().await.amount_of(id(3)), 2);

    assert_eq!(h.catalog.stock_requests(), 3);
    assert_eq!(h.catalog.product_requests(), 1);
}

#[tokio::test]
async fn test_add_product_with_no_stock() {
    let h = Harness::new().await;

    assert!(!h.store.add_product(id(4)).await);

    assert!(h.store.cart().await.is_empty());
    assert_eq!(h.saved_cart(), None);
    assert_eq!(h.error_messages(), vec![OUT_OF_STOCK_MESSAGE.to_string()]);
}

#[tokio::test]
async fn test_add_unknown_product() {
    let h = Harness::new().await;

    assert!(!h.store.add_product(id(99)).await);

    assert!(h.store.cart().await.is_empty());
    assert_eq!(h.error_messages(), vec!["Failed to add product".to_string()]);
}

#[tokio::test]
async fn test_added_products_keep_insertion_order() {
    let h = Harness::new().await;

    assert!(h.store.add_product(id(2)).await);
    assert!(h.store.add_product(id(1)).await);
    assert!(h.store.add_product(id(2)).await);

    let cart = h.store.cart().await;
    let ids: Vec<u32> = cart.items().iter().map(|i| i.id().as_u32()).collect();
    assert_eq!(ids, vec![2, 1]);
    assert_eq!(cart.amount_of(id(2)), 2);
}

// =============================================================================
// removeProduct
// =============================================================================

#[tokio::test]
async fn test_remove_product() {
    let h = Harness::new().await;
    assert!(h.store.add_product(id(1)).await);
    assert!(h.store.add_product(id(2)).await);

    assert!(h.store.remove_product(id(1)).await);

    let cart = h.store.cart().await;
    assert!(!cart.contains(id(1)));
    assert!(cart.contains(id(2)));
    assert_eq!(h.saved_cart(), Some(cart));
}

#[tokio::test]
async fn test_remove_missing_product() {
    let h = Harness::new().await;
    assert!(h.store.add_product(id(2)).await);
    let stock_requests = h.catalog.stock_requests();

    assert!(!h.store.remove_product(id(1)).await);

    assert_eq!(h.store.cart().await.len(), 1);
    assert_eq!(h.catalog.stock_requests(), stock_requests);
    assert_eq!(
        h.error_messages(),
        vec!["Failed to remove product".to_string()]
    );
}

// =============================================================================
// updateProductAmount
// =============================================================================

#[tokio::test]
async fn test_update_within_stock() {
    let h = Harness::new().await;
    assert!(h.store.add_product(id(2)).await);

    assert!(h.store.update_product_amount(id(2), 5).await);
    assert_eq!(h.store.cart().await.amount_of(id(2)), 5);

    assert!(h.store.update_product_amount(id(2), 1).await);
    assert_eq!(h.saved_cart().unwrap().amount_of(id(2)), 1);
}

#[tokio::test]
async fn test_update_beyond_stock() {
    let h = Harness::new().await;
    assert!(h.store.add_product(id(2)).await);

    assert!(!h.store.update_product_amount(id(2), 6).await);

    assert_eq!(h.store.cart().await.amount_of(id(2)), 1);
    assert_eq!(h.error_messages(), vec![OUT_OF_STOCK_MESSAGE.to_string()]);
}

#[tokio::test]
async fn test_update_to_zero_skips_stock_request() {
    let h = Harness::new().await;
    assert!(h.store.add_product(id(2)).await);
    let stock_requests = h.catalog.stock_requests();

    assert!(!h.store.update_product_amount(id(2), 0).await);
    assert!(!h.store.update_product_amount(id(2), -3).await);

    assert_eq!(h.store.cart().await.amount_of(id(2)), 1);
    assert_eq!(h.catalog.stock_requests(), stock_requests);
}

#[tokio::test]
async fn test_update_product_not_in_cart() {
    let h = Harness::new().await;

    assert!(!h.store.update_product_amount(id(2), 2).await);

    assert!(h.store.cart().await.is_empty());
    assert_eq!(
        h.error_messages(),
        vec!["Failed to update product amount".to_string()]
    );
}

// =============================================================================
// Persistence
// =============================================================================

#[tokio::test]
async fn test_cart_survives_reload() {
    let h = Harness::new().await;
    assert!(h.store.add_product(id(1)).await);
    assert!(h.store.add_product(id(2)).await);
    assert!(h.store.update_product_amount(id(2), 4).await);

    let reloaded = h.reload();

    assert_eq!(reloaded.cart().await, h.store.cart().await);
    assert_eq!(reloaded.cart().await.total_units(), 5);
}

#[tokio::test]
async fn test_malformed_saved_cart_starts_empty() {
    let h = Harness::new().await;
    h.storage.set(CART_STORAGE_KEY, "{not json").unwrap();

    let reloaded = h.reload();

    assert!(reloaded.cart().await.is_empty());
}

#[tokio::test]
async fn test_concurrent_adds_respect_stock() {
    let h = Arc::new(Harness::new().await);

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let h = Arc::clone(&h);
            tokio::spawn(async move { h.store.add_product(id(1)).await })
        })
        .collect();

    let mut applied = 0;
    for handle in handles {
        if handle.await.unwrap() {
            applied += 1;
        }
    }

    assert_eq!(applied, 3);
    assert_eq!(h.store.cart().await.amount_of(id(1)), 3);
    assert_eq!(h.error_messages().len(), 3);
}
