use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;

use crate::application::catalog::{ProductDetail, ProductInput};
use crate::application::error::AppError;
use crate::application::search::ProductDocument;
use crate::domain::entities::{ProductListEntry, ProductRecord};
use crate::domain::types::Caller;

use super::forms::UploadForm;
use super::{AppState, require_admin};

pub async fn list(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductListEntry>>, AppError> {
    Ok(Json(state.catalog.list_products().await?))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    caller: Caller,
) -> Result<Json<ProductDetail>, AppError> {
    Ok(Json(state.catalog.get_product(id, caller).await?))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    q: String,
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<ProductDocument>>, AppError> {
    Ok(Json(state.catalog.search(&params.q).await?))
}

fn input_from_form(form: &UploadForm) -> Result<ProductInput, AppError> {
    Ok(ProductInput {
        name: form.text("name")?.to_string(),
        description: form.text("description")?.to_string(),
        price: form.parsed("price")?,
        size: form.parsed("size")?,
        stock: form.parsed("stock")?,
    })
}

pub async fn create(
    State(state): State<AppState>,
    caller: Caller,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ProductRecord>), AppError> {
    require_admin(caller)?;

    let mut form = UploadForm::read(multipart).await?;
    let input = input_from_form(&form)?;
    let image = form.require_image()?;

    let record = state.catalog.create_product(input, image).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    caller: Caller,
    multipart: Multipart,
) -> Result<Json<ProductRecord>, AppError> {
    require_admin(caller)?;

    let mut form = UploadForm::read(multipart).await?;
    let input = input_from_form(&form)?;
    let image = form.take_image();

    Ok(Json(state.catalog.update_product(id, input, image).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    caller: Caller,
) -> Result<StatusCode, AppError> {
    require_admin(caller)?;
    state.catalog.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
