//! # Daftar API
//!
//! JSON-over-HTTP back office server.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Daftar API                                    │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  auth          │  │  persons       │  │  invoices                  ││
//! │  │                │  │                │  │                            ││
//! │  │ • login        │  │ • CRUD         │  │ • sales / purchase         ││
//! │  │ • me           │  │ • search       │  │ • numbered from 1000       ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  catalog       │  │  finance       │  │  reports                   ││
//! │  │  services      │  │                │  │                            ││
//! │  │ • 5 catalogs   │  │ • expense      │  │ • customer                 ││
//! │  │ • picker       │  │ • income       │  │ • employee                 ││
//! │  │                │  │ • salaries     │  │ • financial                ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │   Bearer JWT ──► AuthUser { actor } ──► daftar-db repositories          │
//! │                                               │                         │
//! │                                               ▼                         │
//! │                                            SQLite                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config`]: defaults, then `daftar.toml`, then `DAFTAR_*` variables.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;
use daftar_db::{Database, DbConfig, DbResult};

pub use auth::JwtManager;
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};

use handlers::{auth as login, catalog, finance, health, invoices, persons, reports, services, users};

/// Shared application state.
pub struct AppState {
    pub db: Database,
    pub jwt: JwtManager,
    pub config: ApiConfig,
}

impl AppState {
    /// Opens the database (running migrations) and builds the token manager.
    pub async fn from_config(config: ApiConfig) -> DbResult<Self> {
        let db = Database::new(
            DbConfig::new(&config.database_path).max_connections(config.max_connections),
        )
        .await?;
        let jwt = JwtManager::new(config.jwt_secret.clone(), config.jwt_lifetime_secs);

        Ok(AppState { db, jwt, config })
    }
}

/// Builds the HTTP router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        // Auth
        .route("/api/auth/login", post(login::login))
        .route("/api/auth/me", get(login::me))
        // Service picker
        .route("/api/services", get(services::list_services))
        // Persons
        .route("/api/persons/search", get(persons::search))
        .route("/api/persons", get(persons::list).post(persons::create))
        .route("/api/persons/{id}", get(persons::get).put(persons::update))
        .route("/api/persons/{id}/active", put(persons::set_active))
        // Catalogs
        .route(
            "/api/catalog/{category}",
            get(catalog::list).post(catalog::create),
        )
        .route(
            "/api/catalog/{category}/{id}",
            get(catalog::get).put(catalog::update).delete(catalog::delete),
        )
        .route("/api/catalog/{category}/{id}/active", put(catalog::set_active))
        // Invoices
        .route(
            "/api/invoices/{kind}",
            get(invoices::list).post(invoices::create),
        )
        .route(
            "/api/invoices/{kind}/{id}",
            get(invoices::get).put(invoices::update).delete(invoices::delete),
        )
        // Payroll
        .route(
            "/api/finance/salaries",
            get(finance::list_salaries).post(finance::create_salary),
        )
        .route(
            "/api/finance/salaries/{id}",
            get(finance::get_salary).delete(finance::delete_salary),
        )
        .route("/api/finance/salaries/{id}/paid", put(finance::set_paid))
        // Expense / income
        .route(
            "/api/finance/{ledger}",
            get(finance::list_entries).post(finance::create_entry),
        )
        .route(
            "/api/finance/{ledger}/{id}",
            get(finance::get_entry)
                .put(finance::update_entry)
                .delete(finance::delete_entry),
        )
        // Users
        .route("/api/users", get(users::list).post(users::create))
        .route("/api/users/{id}", get(users::get).put(users::update_profile))
        .route("/api/users/{id}/role", put(users::set_role))
        .route("/api/users/{id}/password", put(users::change_password))
        // Reports
        .route(
            "/api/reports/customer",
            get(reports::list_customer).post(reports::create_customer),
        )
        .route("/api/reports/customer/{id}", get(reports::get_customer))
        .route(
            "/api/reports/employee",
            get(reports::list_employee).post(reports::create_employee),
        )
        .route("/api/reports/employee/{id}", get(reports::get_employee))
        .route(
            "/api/reports/financial",
            get(reports::list_financial).post(reports::create_financial),
        )
        .route("/api/reports/financial/{id}", get(reports::get_financial))
        .with_state(state)
}
