//! # Domain Types
//!
//! Core domain types used throughout Daftar.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      User       │   │     Person      │   │    Invoice      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  username       │   │  national_id    │   │  invoice_number │       │
//! │  │  role           │   │  phone_number   │   │  person_id (FK) │       │
//! │  │  current_status │   │  is_active      │   │  service (Ref)  │       │
//! │  └─────────────────┘   └─────────────────┘   │  price (Money)  │       │
//! │                                              └─────────────────┘       │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  LedgerEntry    │   │     Salary      │   │ SettlementType  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  expense/income │   │  employee_id    │   │  Cash           │       │
//! │  │  invoice_number │   │  is_paid        │   │  Conditional    │       │
//! │  │  subject        │   │  (no number)    │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every record has an integer `id`. Invoices additionally carry an
//! `invoice_number` allocated from their ledger's sequence; it never changes.
//!
//! `*Input` structs are what callers submit for create and update. Updates
//! replace every editable field.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::service::ServiceRef;

// =============================================================================
// Role & Employment Status
// =============================================================================

/// Staff role. Admins see and change everything; users only their own records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

/// Employment status of a staff member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentStatus {
    Active,
    Inactive,
    OnLeave,
    Terminated,
}

impl Default for EmploymentStatus {
    fn default() -> Self {
        EmploymentStatus::Active
    }
}

// =============================================================================
// User
// =============================================================================

/// A staff account. The password hash never leaves the database layer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub national_id: Option<String>,
    pub address: Option<String>,
    pub position: Option<String>,
    #[ts(as = "Option<String>")]
    pub hire_date: Option<NaiveDate>,
    pub bank_account_number: Option<String>,
    pub role: Role,
    pub current_status: EmploymentStatus,
    /// Inactive accounts cannot log in.
    pub is_active: bool,
    pub bio: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// "First Last" when both names are set, otherwise the username.
    pub fn display_name(&self) -> String {
        display_name(&self.first_name, &self.last_name, &self.username)
    }
}

/// Shared display-name rule for staff, usable on partial rows.
pub fn display_name(first_name: &str, last_name: &str, username: &str) -> String {
    let first = first_name.trim();
    let last = last_name.trim();
    if !first.is_empty() && !last.is_empty() {
        format!("{} {}", first, last)
    } else {
        username.to_string()
    }
}

/// Editable profile fields of a staff account.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserProfile {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub national_id: Option<String>,
    pub address: Option<String>,
    pub position: Option<String>,
    #[ts(as = "Option<String>")]
    pub hire_date: Option<NaiveDate>,
    pub bank_account_number: Option<String>,
    pub bio: Option<String>,
}

/// Data for creating a staff account.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewUser {
    pub username: String,
    /// Plain-text password; hashed before storage.
    pub password: String,
    #[serde(default)]
    pub role: Role,
    #[serde(flatten)]
    pub profile: UserProfile,
}

// =============================================================================
// Person
// =============================================================================

/// A customer or counterparty. Never hard-deleted.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Person {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub phone_number_optional: Option<String>,
    /// Exactly 10 digits, unique.
    pub national_id: String,
    pub address: String,
    pub description: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Person {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Search result text: `"First Last (NationalID)"`.
    pub fn search_text(&self) -> String {
        format!("{} {} ({})", self.first_name, self.last_name, self.national_id)
    }
}

/// Fields submitted when creating or updating a Person.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PersonInput {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub phone_number_optional: Option<String>,
    pub national_id: String,
    pub address: String,
    pub description: Option<String>,
}

/// One row of the person picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PersonSearchResult {
    pub id: i64,
    pub text: String,
}

// =============================================================================
// Sales & Purchase Invoices
// =============================================================================

/// Payment terms of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum SettlementType {
    Cash,
    /// Deferred payment.
    Conditional,
}

impl SettlementType {
    pub const fn label(&self) -> &'static str {
        match self {
            SettlementType::Cash => "Cash",
            SettlementType::Conditional => "Conditional",
        }
    }
}

/// Which invoice ledger a sales/purchase invoice belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceKind {
    Sales,
    Purchase,
}

impl InvoiceKind {
    pub const fn label(&self) -> &'static str {
        match self {
            InvoiceKind::Sales => "Sales invoice",
            InvoiceKind::Purchase => "Purchase invoice",
        }
    }

    /// The role the linked Person plays: buyer or vendor.
    pub const fn counterparty(&self) -> &'static str {
        match self {
            InvoiceKind::Sales => "buyer",
            InvoiceKind::Purchase => "vendor",
        }
    }
}

/// A sales or purchase invoice.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Invoice {
    pub id: i64,
    pub kind: InvoiceKind,
    pub invoice_number: i64,
    /// Buyer (sales) or vendor (purchase).
    pub person_id: i64,
    /// Empty for seeded or imported rows.
    pub created_by: Option<i64>,
    #[ts(as = "String")]
    pub invoice_date: NaiveDate,
    pub service: ServiceRef,
    pub price: Money,
    pub settlement_type: SettlementType,
    pub description: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Fields submitted when creating or updating an invoice.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceInput {
    pub person_id: i64,
    #[ts(as = "String")]
    pub invoice_date: NaiveDate,
    pub service: ServiceRef,
    pub price: Money,
    pub settlement_type: SettlementType,
    pub description: Option<String>,
}

// =============================================================================
// Expense & Income Ledgers
// =============================================================================

/// Expense or income.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Expense,
    Income,
}

/// A numbered expense or income record.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LedgerEntry {
    pub id: i64,
    pub kind: EntryKind,
    pub invoice_number: i64,
    pub amount: Money,
    /// What the money was for.
    pub subject: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub description: Option<String>,
    pub created_by: Option<i64>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LedgerEntryInput {
    pub amount: Money,
    pub subject: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub description: Option<String>,
}

// =============================================================================
// Salary
// =============================================================================

/// A payroll record. Salaries are not numbered.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Salary {
    pub id: i64,
    pub employee_id: i64,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub amount: Money,
    pub is_paid: bool,
    pub description: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalaryInput {
    pub employee_id: i64,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub amount: Money,
    #[serde(default)]
    pub is_paid: bool,
    pub description: Option<String>,
}

// =============================================================================
// Catalog Input
// =============================================================================

/// Fields submitted for a catalog entry.
///
/// Loan entries use `bank_name`, `plan_name`, `max_repayment_months` and
/// `max_plan_amount`; every other category uses `name`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CatalogInput {
    pub name: Option<String>,
    pub bank_name: Option<String>,
    pub plan_name: Option<String>,
    pub max_repayment_months: Option<i64>,
    pub max_plan_amount: Option<Money>,
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_falls_back_to_username() {
        assert_eq!(display_name("Sara", "Ahmadi", "sara"), "Sara Ahmadi");
        assert_eq!(display_name("Sara", "", "sara"), "sara");
        assert_eq!(display_name("  ", "Ahmadi", "s.ahmadi"), "s.ahmadi");
    }

    #[test]
    fn test_person_search_text() {
        let now = Utc::now();
        let person = Person {
            id: 1,
            first_name: "Ali".to_string(),
            last_name: "Rezaei".to_string(),
            phone_number: "09121234567".to_string(),
            phone_number_optional: None,
            national_id: "0012345678".to_string(),
            address: "Tehran".to_string(),
            description: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(person.search_text(), "Ali Rezaei (0012345678)");
        assert_eq!(person.full_name(), "Ali Rezaei");
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(
            serde_json::to_string(&EmploymentStatus::OnLeave).unwrap(),
            "\"on_leave\""
        );
        assert_eq!(
            serde_json::to_string(&SettlementType::Conditional).unwrap(),
            "\"conditional\""
        );
    }

    #[test]
    fn test_new_user_flattens_profile() {
        let json = r#"{
            "username": "reza",
            "password": "secret-pass",
            "first_name": "Reza",
            "last_name": "Karimi"
        }"#;
        let user: NewUser = serde_json::from_str(json).unwrap();
        assert_eq!(user.role, Role::User);
        assert_eq!(user.profile.first_name, "Reza");
        assert!(user.profile.email.is_none());
    }

    #[test]
    fn test_catalog_input_defaults_active() {
        let input: CatalogInput = serde_json::from_str(r#"{"name":"Notary"}"#).unwrap();
        assert!(input.is_active);
    }
}
