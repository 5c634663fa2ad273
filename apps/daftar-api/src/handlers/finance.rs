//! Expense and income ledgers plus payroll.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use daftar_core::{LedgerEntry, LedgerEntryInput, Salary, SalaryInput};
use serde::Deserialize;

use super::parse_entry_kind;
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::AppState;

// =============================================================================
// Expense / Income
// =============================================================================

/// `GET /api/finance/{ledger}`
pub async fn list_entries(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(ledger): Path<String>,
) -> ApiResult<Json<Vec<LedgerEntry>>> {
    let kind = parse_entry_kind(&ledger)?;
    Ok(Json(state.db.finance().list_entries(&auth.actor, kind).await?))
}

/// `GET /api/finance/{ledger}/{id}`
pub async fn get_entry(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path((ledger, id)): Path<(String, i64)>,
) -> ApiResult<Json<LedgerEntry>> {
    let kind = parse_entry_kind(&ledger)?;
    Ok(Json(state.db.finance().get_entry(&auth.actor, kind, id).await?))
}

/// `POST /api/finance/{ledger}`
pub async fn create_entry(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(ledger): Path<String>,
    Json(input): Json<LedgerEntryInput>,
) -> ApiResult<(StatusCode, Json<LedgerEntry>)> {
    let kind = parse_entry_kind(&ledger)?;
    let entry = state.db.finance().create_entry(&auth.actor, kind, &input).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// `PUT /api/finance/{ledger}/{id}`
pub async fn update_entry(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path((ledger, id)): Path<(String, i64)>,
    Json(input): Json<LedgerEntryInput>,
) -> ApiResult<Json<LedgerEntry>> {
    let kind = parse_entry_kind(&ledger)?;
    let entry = state
        .db
        .finance()
        .update_entry(&auth.actor, kind, id, &input)
        .await?;
    Ok(Json(entry))
}

/// `DELETE /api/finance/{ledger}/{id}`
pub async fn delete_entry(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path((ledger, id)): Path<(String, i64)>,
) -> ApiResult<StatusCode> {
    let kind = parse_entry_kind(&ledger)?;
    state.db.finance().delete_entry(&auth.actor, kind, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Salaries
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct SalaryQuery {
    pub employee_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PaidRequest {
    pub is_paid: bool,
}

/// `GET /api/finance/salaries`
pub async fn list_salaries(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<SalaryQuery>,
) -> ApiResult<Json<Vec<Salary>>> {
    let salaries = state
        .db
        .finance()
        .list_salaries(&auth.actor, query.employee_id)
        .await?;
    Ok(Json(salaries))
}

/// `GET /api/finance/salaries/{id}`
pub async fn get_salary(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Salary>> {
    Ok(Json(state.db.finance().get_salary(&auth.actor, id).await?))
}

/// `POST /api/finance/salaries`
pub async fn create_salary(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(input): Json<SalaryInput>,
) -> ApiResult<(StatusCode, Json<Salary>)> {
    let salary = state.db.finance().create_salary(&auth.actor, &input).await?;
    Ok((StatusCode::CREATED, Json(salary)))
}

/// `PUT /api/finance/salaries/{id}/paid`
pub async fn set_paid(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<PaidRequest>,
) -> ApiResult<Json<Salary>> {
    Ok(Json(
        state.db.finance().set_paid(&auth.actor, id, req.is_paid).await?,
    ))
}

/// `DELETE /api/finance/salaries/{id}`
pub async fn delete_salary(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.db.finance().delete_salary(&auth.actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{add_user, auth_user, test_state};
    use chrono::NaiveDate;
    use daftar_core::{Money, Role};

    fn entry(subject: &str) -> LedgerEntryInput {
        LedgerEntryInput {
            amount: Money::from_major(250),
            subject: subject.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_ledgers_number_independently() {
        let state = test_state().await;
        let user = add_user(&state, "ali", Role::User).await;

        let (_, Json(expense)) = create_entry(
            State(state.clone()),
            auth_user(&user),
            Path("expenses".to_string()),
            Json(entry("Office rent")),
        )
        .await
        .unwrap();
        let (_, Json(income)) = create_entry(
            State(state),
            auth_user(&user),
            Path("incomes".to_string()),
            Json(entry("Consulting")),
        )
        .await
        .unwrap();

        assert_eq!(expense.invoice_number, 1000);
        assert_eq!(income.invoice_number, 1000);
    }

    #[tokio::test]
    async fn test_unknown_ledger_is_404() {
        let state = test_state().await;
        let user = add_user(&state, "ali", Role::User).await;

        let err = list_entries(State(state), auth_user(&user), Path("bonuses".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_salaries_are_admin_managed() {
        let state = test_state().await;
        let admin = add_user(&state, "boss", Role::Admin).await;
        let user = add_user(&state, "ali", Role::User).await;
        let input = SalaryInput {
            employee_id: user.id,
            date: NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(),
            amount: Money::from_major(3000),
            is_paid: false,
            description: None,
        };

        let err = create_salary(State(state.clone()), auth_user(&user), Json(input.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);

        let (_, Json(salary)) = create_salary(State(state.clone()), auth_user(&admin), Json(input))
            .await
            .unwrap();
        let Json(paid) = set_paid(
            State(state.clone()),
            auth_user(&admin),
            Path(salary.id),
            Json(PaidRequest { is_paid: true }),
        )
        .await
        .unwrap();
        assert!(paid.is_paid);

        let Json(own) = list_salaries(
            State(state),
            auth_user(&user),
            Query(SalaryQuery::default()),
        )
        .await
        .unwrap();
        assert_eq!(own.len(), 1);
    }
}
