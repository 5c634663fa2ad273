//! # daftar-db: Database Layer for Daftar
//!
//! This crate provides database access for the Daftar back office.
//! It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Daftar Data Flow                                 │
//! │                                                                         │
//! │  HTTP handler (POST /api/invoices/sales)                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     daftar-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ UserRepo      │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ PersonRepo    │    │ 001_initial  │  │   │
//! │  │   │ WAL, FKs on   │    │ CatalogRepo   │    │   _schema    │  │   │
//! │  │   │ busy_timeout  │    │ InvoiceRepo   │    │              │  │   │
//! │  │   │               │    │ FinanceRepo   │    │              │  │   │
//! │  │   │               │    │ ReportRepo    │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (daftar.db)                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`password`] - Staff password hashing
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use daftar_db::{Database, DbConfig};
//! use daftar_core::{Actor, InvoiceKind};
//!
//! let db = Database::new(DbConfig::new("path/to/daftar.db")).await?;
//!
//! let actor = Actor::admin(1);
//! let invoices = db.invoices().list(&actor, InvoiceKind::Sales).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod password;
pub mod pool;
pub mod repository;

#[cfg(test)]
mod test_support;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::catalog::CatalogRepository;
pub use repository::finance::FinanceRepository;
pub use repository::invoice::InvoiceRepository;
pub use repository::person::PersonRepository;
pub use repository::report::ReportRepository;
pub use repository::user::UserRepository;
