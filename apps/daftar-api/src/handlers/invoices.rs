//! Sales and purchase invoices: `/api/invoices/{sales|purchase}`.
//!
//! Requests carry the service as three flat fields, the way the invoice
//! forms submit them:
//!
//! ```text
//! service_category  service_id  other_service_title   →  ServiceRef
//! ----------------  ----------  -------------------      ----------
//! "legal"           12          -                        Legal(12)
//! "other" / absent  -           "Notary fee"             Other("Notary fee")
//! "loan"            -           "Bridge loan"            Other("Bridge loan")
//! ```
//!
//! Responses add the resolved `service_name`, so a deleted catalog entry
//! still renders.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use daftar_core::{Invoice, InvoiceInput, Money, ServiceRef, SettlementType};
use serde::{Deserialize, Serialize};

use super::parse_invoice_kind;
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceRequest {
    pub person_id: i64,
    pub invoice_date: NaiveDate,
    pub service_category: Option<String>,
    pub service_id: Option<i64>,
    pub other_service_title: Option<String>,
    pub price: Money,
    pub settlement_type: SettlementType,
    pub description: Option<String>,
}

impl InvoiceRequest {
    fn into_input(self) -> ApiResult<InvoiceInput> {
        let service = ServiceRef::from_parts(
            self.service_category.as_deref(),
            self.service_id,
            self.other_service_title.as_deref(),
        )?;
        Ok(InvoiceInput {
            person_id: self.person_id,
            invoice_date: self.invoice_date,
            service,
            price: self.price,
            settlement_type: self.settlement_type,
            description: self.description,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct InvoiceView {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub service_name: String,
}

async fn view(state: &AppState, invoice: Invoice) -> ApiResult<InvoiceView> {
    let service_name = state
        .db
        .catalog()
        .resolve(&invoice.service)
        .await?
        .display_name();
    Ok(InvoiceView {
        invoice,
        service_name,
    })
}

/// `GET /api/invoices/{kind}`
pub async fn list(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(kind): Path<String>,
) -> ApiResult<Json<Vec<InvoiceView>>> {
    let kind = parse_invoice_kind(&kind)?;
    let invoices = state.db.invoices().list(&auth.actor, kind).await?;

    let mut views = Vec::with_capacity(invoices.len());
    for invoice in invoices {
        views.push(view(&state, invoice).await?);
    }
    Ok(Json(views))
}

/// `GET /api/invoices/{kind}/{id}`
pub async fn get(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path((kind, id)): Path<(String, i64)>,
) -> ApiResult<Json<InvoiceView>> {
    let kind = parse_invoice_kind(&kind)?;
    let invoice = state.db.invoices().get(&auth.actor, kind, id).await?;
    Ok(Json(view(&state, invoice).await?))
}

/// `POST /api/invoices/{kind}`
pub async fn create(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(kind): Path<String>,
    Json(req): Json<InvoiceRequest>,
) -> ApiResult<(StatusCode, Json<InvoiceView>)> {
    let kind = parse_invoice_kind(&kind)?;
    let input = req.into_input()?;
    let invoice = state.db.invoices().create(&auth.actor, kind, &input).await?;
    Ok((StatusCode::CREATED, Json(view(&state, invoice).await?)))
}

/// `PUT /api/invoices/{kind}/{id}`
pub async fn update(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path((kind, id)): Path<(String, i64)>,
    Json(req): Json<InvoiceRequest>,
) -> ApiResult<Json<InvoiceView>> {
    let kind = parse_invoice_kind(&kind)?;
    let input = req.into_input()?;
    let invoice = state
        .db
        .invoices()
        .update(&auth.actor, kind, id, &input)
        .await?;
    Ok(Json(view(&state, invoice).await?))
}

/// `DELETE /api/invoices/{kind}/{id}`
pub async fn delete(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path((kind, id)): Path<(String, i64)>,
) -> ApiResult<StatusCode> {
    let kind = parse_invoice_kind(&kind)?;
    state.db.invoices().delete(&auth.actor, kind, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{add_service, add_user, auth_user, person_input, test_state};
    use daftar_core::{Category, Role};

    fn request(person_id: i64, category: Option<&str>, id: Option<i64>, title: Option<&str>) -> InvoiceRequest {
        InvoiceRequest {
            person_id,
            invoice_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            service_category: category.map(str::to_string),
            service_id: id,
            other_service_title: title.map(str::to_string),
            price: Money::from_major(1500),
            settlement_type: SettlementType::Cash,
            description: None,
        }
    }

    #[tokio::test]
    async fn test_create_numbers_and_names_service() {
        let state = test_state().await;
        let admin = add_user(&state, "boss", Role::Admin).await;
        let user = add_user(&state, "ali", Role::User).await;
        let service_id = add_service(&state, &admin, Category::Legal, "Contract review").await;
        let person = state
            .db
            .persons()
            .create(&person_input("Sara", "Karimi", "0012345678"))
            .await
            .unwrap();

        let (status, Json(first)) = create(
            State(state.clone()),
            auth_user(&user),
            Path("sales".to_string()),
            Json(request(person.id, Some("legal"), Some(service_id), None)),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(first.invoice.invoice_number, 1000);
        assert_eq!(first.service_name, "Contract review");

        let (_, Json(second)) = create(
            State(state),
            auth_user(&user),
            Path("sales".to_string()),
            Json(request(person.id, None, None, Some("Notary fee"))),
        )
        .await
        .unwrap();
        assert_eq!(second.invoice.invoice_number, 1001);
        assert_eq!(second.invoice.service, ServiceRef::Other("Notary fee".to_string()));
        assert_eq!(second.service_name, "Notary fee");
    }

    #[tokio::test]
    async fn test_missing_title_is_400() {
        let state = test_state().await;
        let user = add_user(&state, "ali", Role::User).await;

        let err = create(
            State(state),
            auth_user(&user),
            Path("purchase".to_string()),
            Json(request(1, Some("other"), None, Some("  "))),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_other_users_invoice_is_hidden() {
        let state = test_state().await;
        let owner = add_user(&state, "ali", Role::User).await;
        let other = add_user(&state, "reza", Role::User).await;
        let person = state
            .db
            .persons()
            .create(&person_input("Sara", "Karimi", "0012345678"))
            .await
            .unwrap();

        let (_, Json(created)) = create(
            State(state.clone()),
            auth_user(&owner),
            Path("sales".to_string()),
            Json(request(person.id, None, None, Some("Notary fee"))),
        )
        .await
        .unwrap();

        let Json(visible) = list(State(state.clone()), auth_user(&other), Path("sales".to_string()))
            .await
            .unwrap();
        assert!(visible.is_empty());

        let err = get(
            State(state),
            auth_user(&other),
            Path(("sales".to_string(), created.invoice.id)),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_delete_is_admin_only() {
        let state = test_state().await;
        let owner = add_user(&state, "ali", Role::User).await;
        let admin = add_user(&state, "boss", Role::Admin).await;
        let person = state
            .db
            .persons()
            .create(&person_input("Sara", "Karimi", "0012345678"))
            .await
            .unwrap();

        let (_, Json(created)) = create(
            State(state.clone()),
            auth_user(&owner),
            Path("sales".to_string()),
            Json(request(person.id, None, None, Some("Notary fee"))),
        )
        .await
        .unwrap();
        let path = ("sales".to_string(), created.invoice.id);

        let err = delete(State(state.clone()), auth_user(&owner), Path(path.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);

        let status = delete(State(state), auth_user(&admin), Path(path)).await.unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
}
