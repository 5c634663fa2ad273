//! # Repository Module
//!
//! Database repository implementations for Daftar.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.invoices().create(&actor, InvoiceKind::Sales, &input)      │
//! │       ▼                                                                 │
//! │  InvoiceRepository                                                     │
//! │  ├── validate (daftar-core)                                            │
//! │  ├── capability check (Actor)                                          │
//! │  ├── BEGIN → sequence::allocate → checks → INSERT → COMMIT             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every method that acts on behalf of a caller takes an [`Actor`] and
//! enforces ownership scoping itself, so handlers cannot forget it.
//!
//! ## Available Repositories
//!
//! - [`UserRepository`] - Staff accounts, login, roles
//! - [`PersonRepository`] - Customers and picker search
//! - [`CatalogRepository`] - The five service catalogs, service resolution
//! - [`InvoiceRepository`] - Sales and purchase invoices
//! - [`FinanceRepository`] - Expense/income ledgers, salaries
//! - [`ReportRepository`] - Saved reports and report generation
//!
//! [`Actor`]: daftar_core::Actor
//! [`UserRepository`]: user::UserRepository
//! [`PersonRepository`]: person::PersonRepository
//! [`CatalogRepository`]: catalog::CatalogRepository
//! [`InvoiceRepository`]: invoice::InvoiceRepository
//! [`FinanceRepository`]: finance::FinanceRepository
//! [`ReportRepository`]: report::ReportRepository

pub mod catalog;
pub mod finance;
pub mod invoice;
pub mod person;
pub mod report;
pub mod sequence;
pub mod user;
