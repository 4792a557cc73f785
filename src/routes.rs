use std::{fmt::Display, sync::Arc};

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Json, Path, State,
    },
    http::{header, HeaderMap, HeaderValue, StatusCode},
};
use serde_json::{json, Value};
use tracing::{event, Level};

use crate::{
    domain::Product,
    dtos::{ApiError, ProductPatch},
    error::RepositoryError,
    state::AppState,
};

type ApiResult<T> = Result<T, (StatusCode, Json<Value>)>;

pub async fn get_all_products(
    State(state): State<Arc<AppState>>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let products = state.product_repository.read_all().await.map_err(error_response)?;
    Ok((StatusCode::OK, Json(json!(products))))
}

pub async fn get_product(
    id: Result<Path<i32>, PathRejection>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Path(id) = extracted(id)?;
    let product = state.product_repository.read(id).await.map_err(error_response)?;
    Ok((StatusCode::OK, Json(json!(product))))
}

pub async fn put_product(
    id: Result<Path<i32>, PathRejection>,
    State(state): State<Arc<AppState>>,
    product: Result<Json<Product>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = extracted(id)?;
    let Json(product) = extracted(product)?;

    state
        .product_repository
        .update(id, product)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_product(
    State(state): State<Arc<AppState>>,
    product: Result<Json<Product>, JsonRejection>,
) -> ApiResult<(StatusCode, HeaderMap, Json<Value>)> {
    let Json(product) = extracted(product)?;
    let created = state.product_repository.create(product).await.map_err(error_response)?;

    let mut headers = HeaderMap::new();
    let location = format!("/api/Products/{}", created.product_id);
    if let Ok(value) = HeaderValue::from_str(&location) {
        headers.insert(header::LOCATION, value);
    }
    Ok((StatusCode::CREATED, headers, Json(json!(created))))
}

pub async fn delete_product(
    id: Result<Path<i32>, PathRejection>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Path(id) = extracted(id)?;
    let removed = state.product_repository.delete(id).await.map_err(error_response)?;
    Ok((StatusCode::OK, Json(json!(removed))))
}

pub async fn patch_product(
    id: Result<Path<i32>, PathRejection>,
    State(state): State<Arc<AppState>>,
    patch: Result<Json<ProductPatch>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Path(id) = extracted(id)?;
    let Json(patch) = extracted(patch)?;

    let product = state
        .product_repository
        .patch(id, patch)
        .await
        .map_err(error_response)?;
    Ok((StatusCode::OK, Json(json!(product))))
}

/// Extractor rejections answer with the same `ApiError` body as every other
/// failure instead of axum's plain text.
fn extracted<T, E: Display>(result: Result<T, E>) -> ApiResult<T> {
    result.map_err(|rejection| error_response(RepositoryError::Invalid(rejection.to_string())))
}

fn error_response(error: RepositoryError) -> (StatusCode, Json<Value>) {
    let status = match &error {
        RepositoryError::NotFound(_) => StatusCode::NOT_FOUND,
        RepositoryError::Invalid(_) => StatusCode::BAD_REQUEST,
        RepositoryError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    event!(Level::INFO, "Request rejected with {}: {}", status, error);
    (status, Json(json!(ApiError { error: error.to_string() })))
}
