//! Catalog administration: `/api/catalog/{category}`.
//!
//! Everyone signed in can read; writes are admin only (checked in the
//! repository).

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use daftar_core::service::CatalogEntry;
use daftar_core::CatalogInput;

use super::{parse_category, ActiveRequest};
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::AppState;

/// `GET /api/catalog/{category}`
pub async fn list(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(category): Path<String>,
) -> ApiResult<Json<Vec<CatalogEntry>>> {
    let category = parse_category(&category)?;
    Ok(Json(state.db.catalog().list(category).await?))
}

/// `GET /api/catalog/{category}/{id}`
pub async fn get(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path((category, id)): Path<(String, i64)>,
) -> ApiResult<Json<CatalogEntry>> {
    let category = parse_category(&category)?;
    Ok(Json(state.db.catalog().get(category, id).await?))
}

/// `POST /api/catalog/{category}`
pub async fn create(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(category): Path<String>,
    Json(input): Json<CatalogInput>,
) -> ApiResult<(StatusCode, Json<CatalogEntry>)> {
    let category = parse_category(&category)?;
    let entry = state.db.catalog().create(&auth.actor, category, &input).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// `PUT /api/catalog/{category}/{id}`
pub async fn update(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path((category, id)): Path<(String, i64)>,
    Json(input): Json<CatalogInput>,
) -> ApiResult<Json<CatalogEntry>> {
    let category = parse_category(&category)?;
    let entry = state
        .db
        .catalog()
        .update(&auth.actor, category, id, &input)
        .await?;
    Ok(Json(entry))
}

/// `PUT /api/catalog/{category}/{id}/active`
pub async fn set_active(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path((category, id)): Path<(String, i64)>,
    Json(req): Json<ActiveRequest>,
) -> ApiResult<Json<CatalogEntry>> {
    let category = parse_category(&category)?;
    let entry = state
        .db
        .catalog()
        .set_active(&auth.actor, category, id, req.is_active)
        .await?;
    Ok(Json(entry))
}

/// `DELETE /api/catalog/{category}/{id}`
pub async fn delete(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path((category, id)): Path<(String, i64)>,
) -> ApiResult<StatusCode> {
    let category = parse_category(&category)?;
    state.db.catalog().delete(&auth.actor, category, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
