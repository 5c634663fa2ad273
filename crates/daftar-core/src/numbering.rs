//! # Invoice Numbering
//!
//! Four independent ledgers each hand out sequential invoice numbers.
//!
//! ## Allocation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  invoice_sequences                                                      │
//! │  ┌──────────┬────────────┐                                              │
//! │  │ name     │ last_value │     first allocation:                        │
//! │  ├──────────┼────────────┤       max(MAX(existing), 999) + 1            │
//! │  │ sales    │ 1042       │     later allocations:                       │
//! │  │ purchase │ 1007       │       max(last_value, MAX(existing)) + 1     │
//! │  │ expense  │ 1000       │                                              │
//! │  │ income   │ 1013       │     One upsert, inside the insert's          │
//! │  └──────────┴────────────┘     transaction. Deleted numbers stay used. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! The allocation itself is one SQL upsert in daftar-db; the floor is
//! [`INVOICE_NUMBER_FLOOR`](crate::INVOICE_NUMBER_FLOOR). Salaries are not numbered.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::{EntryKind, InvoiceKind};

/// A numbered record stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Ledger {
    Sales,
    Purchase,
    Expense,
    Income,
}

impl Ledger {
    pub const ALL: [Ledger; 4] = [Ledger::Sales, Ledger::Purchase, Ledger::Expense, Ledger::Income];

    /// Key of this ledger's row in `invoice_sequences`.
    pub const fn sequence_name(&self) -> &'static str {
        match self {
            Ledger::Sales => "sales",
            Ledger::Purchase => "purchase",
            Ledger::Expense => "expense",
            Ledger::Income => "income",
        }
    }

    /// Table whose `invoice_number` column this ledger numbers.
    pub const fn table(&self) -> &'static str {
        match self {
            Ledger::Sales => "sales_invoices",
            Ledger::Purchase => "purchase_invoices",
            Ledger::Expense => "expense_invoices",
            Ledger::Income => "income_invoices",
        }
    }
}

impl From<InvoiceKind> for Ledger {
    fn from(kind: InvoiceKind) -> Self {
        match kind {
            InvoiceKind::Sales => Ledger::Sales,
            InvoiceKind::Purchase => Ledger::Purchase,
        }
    }
}

impl From<EntryKind> for Ledger {
    fn from(kind: EntryKind) -> Self {
        match kind {
            EntryKind::Expense => Ledger::Expense,
            EntryKind::Income => Ledger::Income,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_names_are_distinct() {
        let mut names: Vec<_> = Ledger::ALL.iter().map(|l| l.sequence_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 4);
        assert_eq!(Ledger::from(InvoiceKind::Purchase).table(), "purchase_invoices");
        assert_eq!(Ledger::from(EntryKind::Income), Ledger::Income);
    }
}
