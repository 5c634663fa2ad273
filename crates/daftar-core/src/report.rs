//! # Reports
//!
//! Saved report specifications and the pure parts of report generation:
//! filter resolution, line ordering and totals. Queries live in daftar-db.
//!
//! ## Customer Report Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CustomerReportSpec                                                     │
//! │   ├── customer?          ─┐                                             │
//! │   ├── category? + id?     │                                             │
//! │   ├── invoice_type        ├──► SQL WHERE over sales ∪ purchase          │
//! │   ├── settlement_type     │    (+ created_by = actor for non-admins)   │
//! │   ├── DateWindow          │                                             │
//! │   └── filter_user?       ─┘                                             │
//! │                    │                                                     │
//! │                    ▼                                                     │
//! │  Vec<ReportLine>  ──sort (date desc, number desc)──► CustomerReport     │
//! │                                                     { lines,            │
//! │                                                       total_count,      │
//! │                                                       total_price }     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reports are never edited. Reading a report reruns its query.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use ts_rs::TS;

use crate::access::Actor;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::service::Category;
use crate::types::{InvoiceKind, Salary, SettlementType};
use crate::validation::{validate_date_range, ValidationResult};

/// Creator column placeholder when an invoice has no creator.
pub const NO_CREATOR: &str = "-";

// =============================================================================
// Filters
// =============================================================================

/// Which invoice ledgers a customer report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceTypeFilter {
    #[default]
    All,
    Sales,
    Purchase,
}

impl InvoiceTypeFilter {
    pub fn includes(&self, kind: InvoiceKind) -> bool {
        match self {
            InvoiceTypeFilter::All => true,
            InvoiceTypeFilter::Sales => kind == InvoiceKind::Sales,
            InvoiceTypeFilter::Purchase => kind == InvoiceKind::Purchase,
        }
    }
}

/// Settlement filter of a customer report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum SettlementFilter {
    #[default]
    All,
    Cash,
    Conditional,
}

impl SettlementFilter {
    /// The single settlement type to match, or `None` for all.
    pub fn settlement(&self) -> Option<SettlementType> {
        match self {
            SettlementFilter::All => None,
            SettlementFilter::Cash => Some(SettlementType::Cash),
            SettlementFilter::Conditional => Some(SettlementType::Conditional),
        }
    }
}

/// Resolved date restriction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateWindow {
    Any,
    On(NaiveDate),
    Between(NaiveDate, NaiveDate),
}

impl DateWindow {
    /// Resolves the three optional date inputs.
    ///
    /// A single date wins over a range. A range needs both ends, in order.
    pub fn from_parts(
        single_date: Option<NaiveDate>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> ValidationResult<Self> {
        match (single_date, start_date, end_date) {
            (Some(day), _, _) => Ok(DateWindow::On(day)),
            (None, Some(start), Some(end)) => {
                validate_date_range(start, end)?;
                Ok(DateWindow::Between(start, end))
            }
            (None, Some(_), None) => Err(ValidationError::required("end_date")),
            (None, None, Some(_)) => Err(ValidationError::required("start_date")),
            (None, None, None) => Ok(DateWindow::Any),
        }
    }

    /// Inclusive `(from, to)` bounds, `None` when unrestricted.
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        match *self {
            DateWindow::Any => None,
            DateWindow::On(day) => Some((day, day)),
            DateWindow::Between(start, end) => Some((start, end)),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        match self.bounds() {
            None => true,
            Some((from, to)) => from <= date && date <= to,
        }
    }
}

// =============================================================================
// Customer Report
// =============================================================================

/// Filters of a customer (ledger) report.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerReportSpec {
    pub customer_id: Option<i64>,
    pub service_category: Option<Category>,
    /// Only meaningful together with `service_category`.
    pub service_id: Option<i64>,
    #[serde(default)]
    pub invoice_type: InvoiceTypeFilter,
    #[serde(default)]
    pub settlement_type: SettlementFilter,
    #[ts(as = "Option<String>")]
    pub start_date: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub end_date: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub single_date: Option<NaiveDate>,
    /// Restrict to invoices created by this user.
    pub filter_user: Option<i64>,
}

impl CustomerReportSpec {
    pub fn validate(&self) -> ValidationResult<()> {
        if self.service_id.is_some() && self.service_category.is_none() {
            return Err(ValidationError::required("service_category"));
        }
        if matches!(self.service_id, Some(id) if id <= 0) {
            return Err(ValidationError::MustBePositive {
                field: "service_id".to_string(),
            });
        }
        self.date_window().map(|_| ())
    }

    pub fn date_window(&self) -> ValidationResult<DateWindow> {
        DateWindow::from_parts(self.single_date, self.start_date, self.end_date)
    }
}

/// One normalized invoice row of a customer report.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReportLine {
    pub kind: InvoiceKind,
    pub type_label: String,
    pub invoice_id: i64,
    pub invoice_number: i64,
    #[ts(as = "String")]
    pub invoice_date: NaiveDate,
    pub person_id: i64,
    pub first_name: String,
    pub last_name: String,
    /// Category label, or "Other" for freeform services.
    pub category_label: String,
    pub service_name: String,
    pub settlement_label: String,
    pub created_by: Option<i64>,
    /// Creator display name, or `"-"`.
    pub creator_name: String,
    pub price: Money,
}

/// Category column text for a stored category name.
pub fn category_label(stored: &str) -> String {
    stored
        .parse::<Category>()
        .map(|c| c.label().to_string())
        .unwrap_or_else(|_| "Other".to_string())
}

/// Sorts lines by date descending, then invoice number descending.
pub fn sort_lines(lines: &mut [ReportLine]) {
    lines.sort_by_key(|l| (Reverse(l.invoice_date), Reverse(l.invoice_number), l.kind as u8));
}

/// The computed result of a customer report.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerReport {
    pub lines: Vec<ReportLine>,
    pub total_count: usize,
    pub total_price: Money,
}

impl CustomerReport {
    /// Orders the lines and computes the trailing totals.
    pub fn from_lines(mut lines: Vec<ReportLine>) -> Self {
        sort_lines(&mut lines);
        let total_price = lines.iter().map(|l| l.price).sum();
        CustomerReport {
            total_count: lines.len(),
            total_price,
            lines,
        }
    }
}

// =============================================================================
// Employee & Financial Reports
// =============================================================================

/// Inclusive date range of an employee or financial report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DateRange {
    #[ts(as = "String")]
    pub start_date: NaiveDate,
    #[ts(as = "String")]
    pub end_date: NaiveDate,
}

impl DateRange {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> ValidationResult<Self> {
        validate_date_range(start_date, end_date)?;
        Ok(DateRange { start_date, end_date })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EmployeeReportSpec {
    pub employee_id: i64,
    #[serde(flatten)]
    pub range: DateRange,
}

/// Activity of one employee in a date range.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EmployeeReport {
    pub employee_id: i64,
    pub employee_name: String,
    pub range: DateRange,
    pub sales_count: i64,
    pub sales_total: Money,
    pub purchase_count: i64,
    pub purchase_total: Money,
    pub salaries: Vec<Salary>,
    pub paid_count: i64,
    pub paid_total: Money,
    pub unpaid_count: i64,
    pub unpaid_total: Money,
    /// Sales plus purchase invoices created.
    pub total_activity: i64,
}

/// Paid/unpaid split of a salary list: `(paid_count, paid_total, unpaid_count, unpaid_total)`.
pub fn salary_totals(salaries: &[Salary]) -> (i64, Money, i64, Money) {
    salaries.iter().fold(
        (0, Money::zero(), 0, Money::zero()),
        |(pc, pt, uc, ut), s| {
            if s.is_paid {
                (pc + 1, pt + s.amount, uc, ut)
            } else {
                (pc, pt, uc + 1, ut + s.amount)
            }
        },
    )
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FinancialReportSpec {
    #[serde(flatten)]
    pub range: DateRange,
}

/// Sales income against purchase expenses in a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FinancialSummary {
    pub range: DateRange,
    pub sales_count: i64,
    /// Sum of sales prices.
    pub total_income: Money,
    pub purchase_count: i64,
    /// Sum of purchase prices.
    pub total_expenses: Money,
    pub net: Money,
}

impl FinancialSummary {
    pub fn new(
        range: DateRange,
        sales_count: i64,
        total_income: Money,
        purchase_count: i64,
        total_expenses: Money,
    ) -> Self {
        FinancialSummary {
            range,
            sales_count,
            total_income,
            purchase_count,
            total_expenses,
            net: total_income - total_expenses,
        }
    }
}

// =============================================================================
// Saved Reports
// =============================================================================

/// Which report family a saved report belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Customer,
    Employee,
    Financial,
}

/// A stored report specification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedReport<S> {
    pub id: i64,
    pub kind: ReportKind,
    pub spec: S,
    pub generated_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl<S> SavedReport<S> {
    /// Non-admins may only open reports they generated.
    pub fn ensure_readable(&self, actor: &Actor) -> CoreResult<()> {
        if actor.is_admin() || self.generated_by == Some(actor.user_id) {
            Ok(())
        } else {
            Err(CoreError::denied("open a report generated by another user"))
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
