//! HTTP handlers, one module per resource.
//!
//! Handlers stay thin: parse the request, resolve the caller, call one
//! repository method, shape the JSON. Ownership scoping and capability
//! checks live in the repositories.

pub mod auth;
pub mod catalog;
pub mod finance;
pub mod health;
pub mod invoices;
pub mod persons;
pub mod reports;
pub mod services;
pub mod users;

use daftar_core::{Category, EntryKind, InvoiceKind};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};

/// Body of the activate/deactivate endpoints.
#[derive(Debug, Deserialize)]
pub struct ActiveRequest {
    pub is_active: bool,
}

/// Query string of list endpoints that can include inactive rows.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

pub(crate) fn parse_category(raw: &str) -> ApiResult<Category> {
    raw.parse()
        .map_err(|_| ApiError::not_found(format!("Unknown service category: {}", raw)))
}

pub(crate) fn parse_invoice_kind(raw: &str) -> ApiResult<InvoiceKind> {
    match raw {
        "sales" => Ok(InvoiceKind::Sales),
        "purchase" => Ok(InvoiceKind::Purchase),
        _ => Err(ApiError::not_found(format!("Unknown invoice ledger: {}", raw))),
    }
}

pub(crate) fn parse_entry_kind(raw: &str) -> ApiResult<EntryKind> {
    match raw {
        "expenses" => Ok(EntryKind::Expense),
        "incomes" => Ok(EntryKind::Income),
        _ => Err(ApiError::not_found(format!("Unknown finance ledger: {}", raw))),
    }
}
