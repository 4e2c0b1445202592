use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;

use crate::application::error::AppError;
use crate::domain::entities::{PromoDetail, PromoRecord};
use crate::domain::types::Caller;

use super::forms::UploadForm;
use super::{AppState, require_admin};

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<PromoDetail>>, AppError> {
    Ok(Json(state.promos.list_promos().await?))
}

pub async fn list_active(
    State(state): State<AppState>,
) -> Result<Json<Vec<PromoDetail>>, AppError> {
    Ok(Json(state.promos.list_active().await?))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PromoDetail>, AppError> {
    Ok(Json(state.promos.get_promo(id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    caller: Caller,
    multipart: Multipart,
) -> Result<(StatusCode, Json<PromoRecord>), AppError> {
    require_admin(caller)?;

    let mut form = UploadForm::read(multipart).await?;
    let product_id: i64 = form.parsed("product_id")?;
    let discount: f64 = form.parsed("discount")?;
    let image = form.require_image()?;

    let record = state.promos.create_promo(product_id, discount, image).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    caller: Caller,
    multipart: Multipart,
) -> Result<Json<PromoRecord>, AppError> {
    require_admin(caller)?;

    let mut form = UploadForm::read(multipart).await?;
    let discount: f64 = form.parsed("discount")?;
    let is_active: bool = form.parsed("is_active")?;
    let image = form.take_image();

    Ok(Json(
        state.promos.update_promo(id, discount, is_active, image).await?,
    ))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    caller: Caller,
) -> Result<StatusCode, AppError> {
    require_admin(caller)?;
    state.promos.delete_promo(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
