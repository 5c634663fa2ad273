//! # daftar-core: Pure Business Logic for Daftar
//!
//! This crate holds the rules of the back office as plain data and pure
//! functions. It never touches the database or the network.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Daftar Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 daftar-api (axum JSON handlers)                 │   │
//! │  │    login, persons, catalog, invoices, finance, reports          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ daftar-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐          │   │
//! │  │   │  types   │ │ service  │ │numbering │ │  access  │          │   │
//! │  │   │ Person   │ │ServiceRef│ │ Ledger   │ │  Actor   │          │   │
//! │  │   │ Invoice  │ │ Category │ │ floor    │ │  Caps    │          │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘          │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐                       │   │
//! │  │   │  money   │ │validation│ │  report  │                       │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘                       │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    daftar-db (Database Layer)                   │   │
//! │  │          SQLite queries, migrations, repositories               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records (User, Person, Invoice, LedgerEntry, Salary)
//! - [`service`] - Polymorphic service references and catalog entries
//! - [`numbering`] - Ledgers and invoice number rules
//! - [`access`] - Actor and role capabilities
//! - [`report`] - Report specifications, line ordering, totals
//! - [`money`] - Integer money type
//! - [`validation`] - Field and record validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use daftar_core::service::{ResolvedService, ServiceRef};
//!
//! let service = ServiceRef::from_parts(Some("legal"), Some(12), None).unwrap();
//! assert_eq!(service, ServiceRef::Legal(12));
//!
//! // The catalog row is gone: the invoice still renders.
//! let resolved = ResolvedService::resolve(&service, None);
//! assert_eq!(resolved.display_name(), "Deleted service (#12)");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod access;
pub mod error;
pub mod money;
pub mod numbering;
pub mod report;
pub mod service;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use access::{Actor, Capabilities};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use numbering::Ledger;
pub use service::{Category, ResolvedService, ServiceRef};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// First invoice number of an empty ledger.
pub const INVOICE_NUMBER_FLOOR: i64 = 1000;

/// Person search ignores queries shorter than this.
pub const PERSON_SEARCH_MIN_CHARS: usize = 2;

/// Maximum rows returned by person search.
pub const PERSON_SEARCH_LIMIT: i64 = 10;
