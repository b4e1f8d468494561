//! Cart store: the authoritative cart and its validated operations.
//!
//! # Behavior
//!
//! - `add_product` appends a new product at amount one, or increments an
//!   existing line by one, as long as live stock allows it
//! - `remove_product` drops a line, keeping the order of the rest
//! - `update_product_amount` sets a line to an absolute amount within stock
//!
//! Failures never propagate to the caller. Each is reported exactly once
//! through the [`Notifier`] and leaves the cart unchanged. The returned `bool`
//! only says whether the cart changed.
//!
//! # Consistency
//!
//! Mutations take a `tokio::sync::Mutex` that is held for the whole
//! operation, including the stock request, so concurrent callers are applied
//! one after another. The cart itself sits behind a `RwLock` that is only
//! write-locked for the final swap, so readers never wait on the catalog.
//! The candidate cart is written to storage before it replaces the
//! in-memory cart.

mod error;

pub use error::{CartError, CartOperation, OUT_OF_STOCK_MESSAGE};

use rocketshoes_core::{Cart, ProductId};
use tokio::sync::{Mutex, RwLock};
use tracing::instrument;

use crate::catalog::CatalogService;
use crate::error::add_breadcrumb;
use crate::notify::Notifier;
use crate::storage::{CART_STORAGE_KEY, KeyValueStore};

/// Owns the cart and mediates every change to it.
pub struct CartStore<C, S, N> {
    catalog: C,
    storage: S,
    notifier: N,
    /// Held by one mutation at a time.
    mutation: Mutex<()>,
    cart: RwLock<Cart>,
}

impl<C, S, N> CartStore<C, S, N>
where
    C: CatalogService,
    S: KeyValueStore,
    N: Notifier,
{
    /// Create the store, restoring the cart saved in `storage`.
    ///
    /// A saved cart that cannot be read or decoded yields an empty cart.
    pub fn load(catalog: C, storage: S, notifier: N) -> Self {
        let cart = restore(&storage);
        tracing::info!(items = cart.len(), "Cart restored");

        Self {
            catalog,
            storage,
            notifier,
            mutation: Mutex::new(()),
            cart: RwLock::new(cart),
        }
    }

    /// Snapshot of the current cart.
    ///
    /// Does not wait for an in-flight mutation's stock request.
    pub async fn cart(&self) -> Cart {
        self.cart.read().await.clone()
    }

    /// The catalog used for stock checks.
    pub const fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Add one unit of a product.
    ///
    /// Returns `true` if the cart changed.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn add_product(&self, id: ProductId) -> bool {
        let _mutation = self.mutation.lock().await;
        let cart = self.cart().await;
        let result = self.try_add(&cart, id).await;
        self.settle(CartOperation::Add, id, result).await
    }

    /// Remove a product's line.
    ///
    /// Returns `true` if the cart changed.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn remove_product(&self, id: ProductId) -> bool {
        let _mutation = self.mutation.lock().await;
        let cart = self.cart().await;
        let result = if cart.contains(id) {
            cart.without(id).map_err(CartError::from)
        } else {
            Err(CartError::NotInCart(id))
        };
        self.settle(CartOperation::Remove, id, result).await
    }

    /// Set a product's amount to exactly `amount`.
    ///
    /// Returns `true` if the cart changed.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn update_product_amount(&self, id: ProductId, amount: i64) -> bool {
        let _mutation = self.mutation.lock().await;
        let cart = self.cart().await;
        let result = self.try_update(&cart, id, amount).await;
        self.settle(CartOperation::Update, id, result).await
    }

    async fn try_add(&self, cart: &Cart, id: ProductId) -> Result<Cart, CartError> {
        if let Some(current) = cart.get(id).map(|item| item.amount) {
            let stock = self.catalog.fetch_stock(id).await?;
            if stock.amount <= current {
                return Err(CartError::StockExhausted {
                    id,
                    requested: u64::from(current) + 1,
                    available: stock.amount,
                });
            }
            return Ok(cart.with_amount(id, current + 1)?);
        }

        let product = self.catalog.fetch_product(id).await?;
        let stock = self.catalog.fetch_stock(id).await?;
        if stock.amount == 0 {
            return Err(CartError::StockExhausted {
                id,
                requested: 1,
                available: 0,
            });
        }
        Ok(cart.with_added(product)?)
    }

    async fn try_update(
        &self,
        cart: &Cart,
        id: ProductId,
        amount: i64,
    ) -> Result<Cart, CartError> {
        if amount < 1 {
            return Err(CartError::InvalidAmount(amount));
        }

        let stock = self.catalog.fetch_stock(id).await?;
        if amount > i64::from(stock.amount) {
            return Err(CartError::StockExhausted {
                id,
                requested: amount.unsigned_abs(),
                available: stock.amount,
            });
        }

        if !cart.contains(id) {
            return Err(CartError::NotInCart(id));
        }

        let amount = u32::try_from(amount).map_err(|_| CartError::InvalidAmount(amount))?;
        Ok(cart.with_amount(id, amount)?)
    }

    /// Persist and commit a successful transition, or report the failure.
    async fn settle(
        &self,
        operation: CartOperation,
        id: ProductId,
        result: Result<Cart, CartError>,
    ) -> bool {
        match result.and_then(|next| self.persist(&next).map(|()| next)) {
            Ok(next) => {
                tracing::info!(
                    ?operation,
                    items = next.len(),
                    units = next.total_units(),
                    "Cart updated"
                );
                *self.cart.write().await = next;
                add_breadcrumb(
                    "cart",
                    operation.breadcrumb(),
                    Some(&[("product_id", id.to_string().as_str())]),
                );
                true
            }
            Err(err) => {
                tracing::warn!(?operation, error = %err, "Cart operation rejected");
                self.notifier.notify_error(err.user_message(operation));
                false
            }
        }
    }

    fn persist(&self, cart: &Cart) -> Result<(), CartError> {
        let payload = cart.to_json()?;
        self.storage.set(CART_STORAGE_KEY, &payload)?;
        Ok(())
    }
}

/// Read the saved cart once, falling back to an empty cart.
fn restore<S: KeyValueStore>(storage: &S) -> Cart {
    match storage.get(CART_STORAGE_KEY) {
        Ok(Some(payload)) => Cart::from_json(&payload).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Discarding malformed saved cart");
            Cart::new()
        }),
        Ok(None) => Cart::new(),
        Err(e) => {
            tracing::warn!(error = %e, "Could not read saved cart");
            Cart::new()
        }
    }
}
