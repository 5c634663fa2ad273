//! Person endpoints: CRUD, activation, and the picker search.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use daftar_core::{Person, PersonInput, PersonSearchResult, PERSON_SEARCH_MIN_CHARS};
use serde::{Deserialize, Serialize};

use super::{ActiveRequest, ListQuery};
use crate::auth::{authenticate, AuthUser};
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<PersonSearchResult>,
}

/// `GET /api/persons/search?q=...`
///
/// Queries shorter than two characters return an empty list without
/// touching authentication or the database.
pub async fn search(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<SearchResponse>> {
    let q = query.q.unwrap_or_default();
    if q.trim().chars().count() < PERSON_SEARCH_MIN_CHARS {
        return Ok(Json(SearchResponse {
            results: Vec::new(),
        }));
    }

    authenticate(&state, &headers).await?;

    let results = state.db.persons().search(&q).await?;
    Ok(Json(SearchResponse { results }))
}

/// `GET /api/persons`
pub async fn list(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Person>>> {
    Ok(Json(state.db.persons().list(query.include_inactive).await?))
}

/// `GET /api/persons/{id}`
pub async fn get(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Person>> {
    Ok(Json(state.db.persons().get(id).await?))
}

/// `POST /api/persons`
pub async fn create(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Json(input): Json<PersonInput>,
) -> ApiResult<(StatusCode, Json<Person>)> {
    let person = state.db.persons().create(&input).await?;
    Ok((StatusCode::CREATED, Json(person)))
}

/// `PUT /api/persons/{id}`
pub async fn update(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(id): Path<i64>,
    Json(input): Json<PersonInput>,
) -> ApiResult<Json<Person>> {
    Ok(Json(state.db.persons().update(id, &input).await?))
}

/// `PUT /api/persons/{id}/active`
pub async fn set_active(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<ActiveRequest>,
) -> ApiResult<Json<Person>> {
    let person = state
        .db
        .persons()
        .set_active(&auth.actor, id, req.is_active)
        .await?;
    Ok(Json(person))
}
