use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;

use crate::application::error::AppError;
use crate::application::repos::ToggleOutcome;
use crate::domain::entities::FavoriteRecord;
use crate::domain::types::Caller;

use super::AppState;

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    favorite: Option<FavoriteRecord>,
}

pub async fn toggle(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
    caller: Caller,
) -> Result<Json<ToggleResponse>, AppError> {
    let user_id = caller.user_id().ok_or(AppError::Unauthorized)?;

    let response = match state.favorites.toggle(user_id, product_id).await? {
        ToggleOutcome::Added(favorite) => ToggleResponse {
            status: "added",
            favorite: Some(favorite),
        },
        ToggleOutcome::Removed => ToggleResponse {
            status: "removed",
            favorite: None,
        },
    };
    Ok(Json(response))
}

#[derive(Debug, Serialize)]
pub struct FavoritesCount {
    favorites_count: i64,
}

pub async fn count(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> Result<Json<FavoritesCount>, AppError> {
    Ok(Json(FavoritesCount {
        favorites_count: state.favorites.count_for_product(product_id).await?,
    }))
}

pub async fn list(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<FavoriteRecord>>, AppError> {
    let user_id = caller.user_id().ok_or(AppError::Unauthorized)?;
    Ok(Json(state.favorites.list_for_user(user_id).await?))
}
