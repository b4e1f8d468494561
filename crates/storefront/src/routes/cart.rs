//! Cart route handlers.
//!
//! Cart changes are plain form posts answered with a redirect. Rejected
//! changes surface as notifications on the page the browser lands on.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::State,
    response::{IntoResponse, Redirect},
};
use rocketshoes_core::{Cart, CartItem, Price, ProductId};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::notify::{Notification, Notifier};
use crate::state::AppState;

/// Cart item display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub id: u32,
    pub title: String,
    pub image: String,
    pub amount: u32,
    pub price: String,
    pub line_price: String,
    /// Amount posted by the "-" button.
    pub decrement_amount: i64,
    /// Amount posted by the "+" button.
    pub increment_amount: i64,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: usize,
}

impl From<&CartItem> for CartItemView {
    fn from(item: &CartItem) -> Self {
        Self {
            id: item.id().as_u32(),
            title: item.product.title.clone(),
            image: item.product.image.clone(),
            amount: item.amount,
            price: item.product.price.display(),
            line_price: item.line_total().display(),
            decrement_amount: i64::from(item.amount) - 1,
            increment_amount: i64::from(item.amount) + 1,
        }
    }
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.items().iter().map(CartItemView::from).collect(),
            subtotal: cart.subtotal().display(),
            item_count: cart.len(),
        }
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    /// Local path to return to after adding.
    pub return_to: Option<String>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: ProductId,
    pub amount: i64,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: ProductId,
}

/// Header badge payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct CartCount {
    pub count: usize,
}

/// JSON view of the cart.
#[derive(Debug, Serialize)]
pub struct CartSummary {
    pub items: Vec<CartItem>,
    pub subtotal: Price,
    pub units: u64,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
    pub cart_size: usize,
    pub notifications: Vec<Notification>,
}

/// Shown after a product is added.
pub const ADDED_MESSAGE: &str = "Product added to cart";

/// Only follow redirects to local paths.
fn safe_return_path(return_to: Option<&str>) -> &str {
    match return_to {
        Some(path) if is_local_path(path) => path,
        _ => "/",
    }
}

/// `/path` but not `//host` or `/\host`, which browsers treat as
/// protocol-relative.
fn is_local_path(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.first() == Some(&b'/')
        && !matches!(bytes.get(1), Some(b'/' | b'\\'))
        && !path.chars().any(char::is_control)
}

/// Display cart page.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> impl IntoResponse {
    let cart = state.cart().cart().await;

    CartShowTemplate {
        cart: CartView::from(&cart),
        cart_size: cart.len(),
        notifications: state.notifications().drain(),
    }
}

/// Add one unit of a product, then go back to where the form was posted from.
#[instrument(skip(state))]
pub async fn add(State(state): State<AppState>, Form(form): Form<AddToCartForm>) -> Redirect {
    if state.cart().add_product(form.product_id).await {
        state.notifications().notify_success(ADDED_MESSAGE);
    }
    Redirect::to(safe_return_path(form.return_to.as_deref()))
}

/// Set a product's amount.
#[instrument(skip(state))]
pub async fn update(State(state): State<AppState>, Form(form): Form<UpdateCartForm>) -> Redirect {
    state
        .cart()
        .update_product_amount(form.product_id, form.amount)
        .await;
    Redirect::to("/cart")
}

/// Remove a product from the cart.
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    Form(form): Form<RemoveFromCartForm>,
) -> Redirect {
    state.cart().remove_product(form.product_id).await;
    Redirect::to("/cart")
}

/// Number of distinct products in the cart (header badge).
#[instrument(skip(state))]
pub async fn count(State(state): State<AppState>) -> Json<CartCount> {
    Json(CartCount {
        count: state.cart().cart().await.len(),
    })
}

/// Cart contents as JSON.
#[instrument(skip(state))]
pub async fn summary(State(state): State<AppState>) -> Json<CartSummary> {
    let cart = state.cart().cart().await;
    Json(CartSummary {
        subtotal: cart.subtotal(),
        units: cart.total_units(),
        items: cart.items().to_vec(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rocketshoes_core::Product;

    use super::*;

    #[test]
    fn test_safe_return_path() {
        assert_eq!(safe_return_path(Some("/")), "/");
        assert_eq!(safe_return_path(Some("/cart")), "/cart");
        assert_eq!(safe_return_path(Some("//evil.example")), "/");
        assert_eq!(safe_return_path(Some("/\\evil.example")), "/");
        assert_eq!(safe_return_path(Some("/cart\r\nSet-Cookie: x=1")), "/");
        assert_eq!(safe_return_path(Some("")), "/");
        assert_eq!(safe_return_path(Some("https://evil.example")), "/");
        assert_eq!(safe_return_path(None), "/");
    }

    #[test]
    fn test_cart_view_from_cart() {
        let cart = Cart::new()
            .with_added(Product {
                id: ProductId::new(2),
                title: "Tênis VR Caminhada".to_string(),
                price: Price::from_cents(13990),
                image: "https://img.rocketshoes.dev/2.jpg".to_string(),
            })
            .unwrap()
            .with_amount(ProductId::new(2), 3)
            .unwrap();

        let view = CartView::from(&cart);
        assert_eq!(view.item_count, 1);
        assert_eq!(view.subtotal, "$419.70");

        let item = &view.items[0];
        assert_eq!(item.price, "$139.90");
        assert_eq!(item.line_price, "$419.70");
        assert_eq!(item.decrement_amount, 2);
        assert_eq!(item.increment_amount, 4);
    }
}
