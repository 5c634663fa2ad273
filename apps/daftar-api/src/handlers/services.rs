//! Service picker endpoint used by the invoice forms.
//!
//! `GET /api/services?service_type=legal` returns the active entries of one
//! catalog as `{id, name}` pairs.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use daftar_core::service::ServiceChoice;
use daftar_core::Category;
use serde::{Deserialize, Serialize};

use crate::auth::authenticate;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ServicesQuery {
    pub service_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ServicesResponse {
    pub success: bool,
    pub services: Vec<ServiceChoice>,
}

/// `GET /api/services`
///
/// The parameter is checked before the caller is authenticated.
pub async fn list_services(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ServicesQuery>,
) -> ApiResult<Json<ServicesResponse>> {
    let raw = query
        .service_type
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request("service_type is required"))?;

    authenticate(&state, &headers).await?;

    let category: Category = raw
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid service_type"))?;

    let services = state.db.catalog().list_choices(category).await?;
    Ok(Json(ServicesResponse {
        success: true,
        services,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{add_service, add_user, bearer, test_state};
    use axum::http::StatusCode;
    use daftar_core::Role;

    fn query(service_type: Option<&str>) -> Query<ServicesQuery> {
        Query(ServicesQuery {
            service_type: service_type.map(str::to_string),
        })
    }

    #[tokio::test]
    async fn test_missing_type_is_checked_before_auth() {
        let state = test_state().await;

        let err = list_services(State(state), HeaderMap::new(), query(None))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "service_type is required");
    }

    #[tokio::test]
    async fn test_requires_authentication() {
        let state = test_state().await;

        let err = list_services(State(state), HeaderMap::new(), query(Some("legal")))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.message, "Authentication required");
    }

    #[tokio::test]
    async fn test_invalid_type() {
        let state = test_state().await;
        let user = add_user(&state, "ali", Role::User).await;
        let headers = bearer(&state, &user);

        let err = list_services(State(state), headers, query(Some("travel")))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Invalid service_type");
    }

    #[tokio::test]
    async fn test_lists_active_choices() {
        let state = test_state().await;
        let admin = add_user(&state, "boss", Role::Admin).await;
        let user = add_user(&state, "ali", Role::User).await;
        let id = add_service(&state, &admin, Category::Legal, "Contract review").await;

        let Json(resp) = list_services(State(state.clone()), bearer(&state, &user), query(Some("legal")))
            .await
            .unwrap();

        assert!(resp.success);
        assert_eq!(
            resp.services,
            vec![ServiceChoice {
                id,
                name: "Contract review".to_string()
            }]
        );
    }
}
