//! Thin HTTP surface over the application services.
//!
//! Handlers parse, delegate and serialize; every rule worth testing lives in
//! the services. Caller identity arrives as forwarded headers from the
//! gateway that terminates authentication.

pub mod auth;
pub mod favorites;
pub mod forms;
pub mod products;
pub mod promos;

use axum::Router;
use axum::routing::{get, post};

use crate::application::catalog::CatalogService;
use crate::application::error::AppError;
use crate::application::favorites::FavoriteService;
use crate::application::promos::PromoService;
use crate::domain::types::Caller;

#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogService,
    pub promos: PromoService,
    pub favorites: FavoriteService,
}

pub(crate) fn require_admin(caller: Caller) -> Result<(), AppError> {
    match caller {
        Caller::User { role, .. } if role.is_admin() => Ok(()),
        Caller::User { .. } => Err(AppError::Forbidden),
        Caller::Anonymous => Err(AppError::Unauthorized),
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/products", get(products::list).post(products::create))
        .route("/products/search", get(products::search))
        .route(
            "/products/{id}",
            get(products::get)
                .put(products::update)
                .delete(products::delete),
        )
        .route("/products/{id}/favorite", post(favorites::toggle))
        .route("/products/{id}/favorites/count", get(favorites::count))
        .route("/favorites", get(favorites::list))
        .route("/promos", get(promos::list).post(promos::create))
        .route("/promos/active", get(promos::list_active))
        .route(
            "/promos/{id}",
            get(promos::get).put(promos::update).delete(promos::delete),
        )
        .with_state(state)
}
