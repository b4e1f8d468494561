//! Home page route handler: the product catalog.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use rocketshoes_core::{Cart, Product};
use tracing::instrument;

use crate::catalog::CatalogService;
use crate::error::Result;
use crate::notify::Notification;
use crate::state::AppState;

/// Product card display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: u32,
    pub title: String,
    pub price: String,
    pub image: String,
    /// Units of this product already in the cart.
    pub in_cart: u32,
}

impl ProductView {
    fn new(product: &Product, cart: &Cart) -> Self {
        Self {
            id: product.id.as_u32(),
            title: product.title.clone(),
            price: product.price.display(),
            image: product.image.clone(),
            in_cart: cart.amount_of(product.id),
        }
    }
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub products: Vec<ProductView>,
    pub cart_size: usize,
    pub notifications: Vec<Notification>,
}

/// Display the catalog.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> Result<HomeTemplate> {
    let products = state.catalog().list_products().await?;
    let cart = state.cart().cart().await;

    Ok(HomeTemplate {
        products: products
            .iter()
            .map(|product| ProductView::new(product, &cart))
            .collect(),
        cart_size: cart.len(),
        notifications: state.notifications().drain(),
    })
}
