//! # Service References
//!
//! An invoice points at exactly one entry in one of five independently keyed
//! service catalogs, or carries a free-text title instead.
//!
//! ## Reference Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ServiceRef                           Catalog table                    │
//! │  ──────────                           ─────────────                    │
//! │  Legal(7)         ──────────────────► legal_services.id = 7            │
//! │  Commercial(3)    ──────────────────► commercial_services.id = 3       │
//! │  Leasing(12)      ──────────────────► leasing_services.id = 12         │
//! │  Loan(5)          ──────────────────► loan_services.id = 5             │
//! │  Registration(1)  ──────────────────► registration_services.id = 1     │
//! │  Other("Notary")  ──► no table, the title is the display name          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Resolution
//! ```text
//! Other(title)                 → Freeform(title)       ("Unspecified" if blank)
//! Catalog ref, row present     → Found { name, is_active }
//! Catalog ref, row deleted     → Deleted { id }        ("Deleted service (#id)")
//! ```
//! A missing row is never an error: historical invoices stay readable after
//! the catalog entry is removed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

/// Display name used when a freeform reference has no title.
pub const UNSPECIFIED_SERVICE: &str = "Unspecified";

// =============================================================================
// Category
// =============================================================================

/// One of the five service catalogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Commercial,
    Registration,
    Legal,
    Leasing,
    Loan,
}

impl Category {
    /// All categories in the order they are offered to users.
    pub const ALL: [Category; 5] = [
        Category::Commercial,
        Category::Registration,
        Category::Legal,
        Category::Leasing,
        Category::Loan,
    ];

    /// The stored / wire name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Category::Commercial => "commercial",
            Category::Registration => "registration",
            Category::Legal => "legal",
            Category::Leasing => "leasing",
            Category::Loan => "loan",
        }
    }

    /// Human-readable label used in report rows.
    pub const fn label(&self) -> &'static str {
        match self {
            Category::Commercial => "Commercial services",
            Category::Registration => "Registration services",
            Category::Legal => "Legal services",
            Category::Leasing => "Leasing services",
            Category::Loan => "Loan services",
        }
    }

    /// The catalog table holding entries of this category.
    pub const fn table(&self) -> &'static str {
        match self {
            Category::Commercial => "commercial_services",
            Category::Registration => "registration_services",
            Category::Legal => "legal_services",
            Category::Leasing => "leasing_services",
            Category::Loan => "loan_services",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    /// Parses a category name. Unknown values are rejected, never coerced.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "commercial" => Ok(Category::Commercial),
            "registration" => Ok(Category::Registration),
            "legal" => Ok(Category::Legal),
            "leasing" => Ok(Category::Leasing),
            "loan" => Ok(Category::Loan),
            _ => Err(ValidationError::NotAllowed {
                field: "service_category".to_string(),
                allowed: Category::ALL.iter().map(|c| c.as_str().to_string()).collect(),
            }),
        }
    }
}

// =============================================================================
// Service Reference
// =============================================================================

/// The polymorphic service reference carried by sales and purchase invoices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "category", content = "value", rename_all = "lowercase")]
pub enum ServiceRef {
    Commercial(i64),
    Registration(i64),
    Legal(i64),
    Leasing(i64),
    Loan(i64),
    /// No catalog entry; the title is shown as the service name.
    Other(String),
}

/// Column triple used to persist a [`ServiceRef`].
///
/// `service_category` is the category name or `"other"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredServiceRef {
    pub service_category: String,
    pub service_id: Option<i64>,
    pub other_service_title: Option<String>,
}

/// Stored category marker for freeform references.
pub const OTHER_CATEGORY: &str = "other";

impl ServiceRef {
    /// Builds a catalog reference, rejecting non-positive ids.
    pub fn catalog(category: Category, id: i64) -> Result<Self, ValidationError> {
        if id <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "service_id".to_string(),
            });
        }
        Ok(match category {
            Category::Commercial => ServiceRef::Commercial(id),
            Category::Registration => ServiceRef::Registration(id),
            Category::Legal => ServiceRef::Legal(id),
            Category::Leasing => ServiceRef::Leasing(id),
            Category::Loan => ServiceRef::Loan(id),
        })
    }

    /// Builds a reference from untyped request fields.
    ///
    /// ## Rules
    /// - `category` absent or `"other"`: freeform, title required
    /// - known category with an id: catalog reference
    /// - known category without an id: freeform with that title (required)
    /// - unknown category: `NotAllowed`
    pub fn from_parts(
        category: Option<&str>,
        id: Option<i64>,
        title: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let title = title.map(str::trim).filter(|t| !t.is_empty());
        match category.map(str::trim).filter(|c| !c.is_empty()) {
            None | Some(OTHER_CATEGORY) => title
                .map(|t| ServiceRef::Other(t.to_string()))
                .ok_or_else(|| ValidationError::required("other_service_title")),
            Some(name) => {
                let category: Category = name.parse()?;
                match (id, title) {
                    (Some(id), _) => ServiceRef::catalog(category, id),
                    (None, Some(t)) => Ok(ServiceRef::Other(t.to_string())),
                    (None, None) => Err(ValidationError::required("service_id")),
                }
            }
        }
    }

    /// The catalog this reference points into, if any.
    pub fn category(&self) -> Option<Category> {
        self.catalog_key().map(|(c, _)| c)
    }

    /// `(category, id)` for catalog references.
    pub fn catalog_key(&self) -> Option<(Category, i64)> {
        match self {
            ServiceRef::Commercial(id) => Some((Category::Commercial, *id)),
            ServiceRef::Registration(id) => Some((Category::Registration, *id)),
            ServiceRef::Legal(id) => Some((Category::Legal, *id)),
            ServiceRef::Leasing(id) => Some((Category::Leasing, *id)),
            ServiceRef::Loan(id) => Some((Category::Loan, *id)),
            ServiceRef::Other(_) => None,
        }
    }

    /// Splits into the three persisted columns.
    pub fn to_stored(&self) -> StoredServiceRef {
        match (self, self.catalog_key()) {
            (_, Some((category, id))) => StoredServiceRef {
                service_category: category.as_str().to_string(),
                service_id: Some(id),
                other_service_title: None,
            },
            (ServiceRef::Other(title), None) => StoredServiceRef {
                service_category: OTHER_CATEGORY.to_string(),
                service_id: None,
                other_service_title: Some(title.clone()),
            },
            (_, None) => StoredServiceRef {
                service_category: OTHER_CATEGORY.to_string(),
                service_id: None,
                other_service_title: None,
            },
        }
    }

    /// Rebuilds a reference from persisted columns.
    pub fn from_stored(stored: &StoredServiceRef) -> Result<Self, ValidationError> {
        if stored.service_category == OTHER_CATEGORY {
            return Ok(ServiceRef::Other(
                stored.other_service_title.clone().unwrap_or_default(),
            ));
        }
        let category: Category = stored.service_category.parse()?;
        let id = stored
            .service_id
            .ok_or_else(|| ValidationError::required("service_id"))?;
        ServiceRef::catalog(category, id)
    }
}

// =============================================================================
// Catalog Entries
// =============================================================================

/// An entry of the legal, commercial, leasing or registration catalog.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NamedService {
    pub id: i64,
    pub category: Category,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// An entry of the loan catalog.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LoanService {
    pub id: i64,
    pub bank_name: String,
    pub plan_name: String,
    /// Longest repayment term offered, in months.
    pub max_repayment_months: i64,
    pub max_plan_amount: Money,
    pub description: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Display name of a loan plan: `"bank - plan"`.
pub fn loan_display_name(bank_name: &str, plan_name: &str) -> String {
    format!("{} - {}", bank_name, plan_name)
}

impl LoanService {
    pub fn display_name(&self) -> String {
        loan_display_name(&self.bank_name, &self.plan_name)
    }
}

/// Any catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CatalogEntry {
    Named(NamedService),
    Loan(LoanService),
}

impl CatalogEntry {
    pub fn id(&self) -> i64 {
        match self {
            CatalogEntry::Named(s) => s.id,
            CatalogEntry::Loan(s) => s.id,
        }
    }

    pub fn category(&self) -> Category {
        match self {
            CatalogEntry::Named(s) => s.category,
            CatalogEntry::Loan(_) => Category::Loan,
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            CatalogEntry::Named(s) => s.name.clone(),
            CatalogEntry::Loan(s) => s.display_name(),
        }
    }

    pub fn is_active(&self) -> bool {
        match self {
            CatalogEntry::Named(s) => s.is_active,
            CatalogEntry::Loan(s) => s.is_active,
        }
    }
}

/// One row of a service picker: `{id, name}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ServiceChoice {
    pub id: i64,
    pub name: String,
}

// =============================================================================
// Resolution
// =============================================================================

/// Result of resolving a [`ServiceRef`] against the catalogs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResolvedService {
    /// The referenced row exists.
    Found {
        category: Category,
        id: i64,
        name: String,
        is_active: bool,
    },
    /// The referenced row was removed from its catalog.
    Deleted { category: Category, id: i64 },
    /// Freeform title, no catalog involved.
    Freeform { title: String },
}

impl ResolvedService {
    /// Resolves a reference given the looked-up catalog row (if any).
    ///
    /// `lookup` is only consulted for catalog references.
    pub fn resolve(service: &ServiceRef, lookup: Option<&CatalogEntry>) -> Self {
        match service.catalog_key() {
            None => {
                let title = match service {
                    ServiceRef::Other(t) => t.clone(),
                    _ => String::new(),
                };
                ResolvedService::Freeform { title }
            }
            Some((category, id)) => match lookup {
                Some(entry) if entry.category() == category && entry.id() == id => {
                    ResolvedService::Found {
                        category,
                        id,
                        name: entry.display_name(),
                        is_active: entry.is_active(),
                    }
                }
                _ => ResolvedService::Deleted { category, id },
            },
        }
    }

    /// The name shown wherever the invoice is listed.
    pub fn display_name(&self) -> String {
        match self {
            ResolvedService::Found { name, .. } => name.clone(),
            ResolvedService::Deleted { id, .. } => format!("Deleted service (#{})", id),
            ResolvedService::Freeform { title } if title.trim().is_empty() => {
                UNSPECIFIED_SERVICE.to_string()
            }
            ResolvedService::Freeform { title } => title.clone(),
        }
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, ResolvedService::Deleted { .. })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn named(category: Category, id: i64, name: &str, is_active: bool) -> CatalogEntry {
        let now = Utc::now();
        CatalogEntry::Named(NamedService {
            id,
            category,
            name: name.to_string(),
            description: None,
            is_active,
            created_at: now,
            updated_at: now,
        })
    }

    #[test]
    fn test_category_parse_rejects_unknown() {
        assert_eq!("loan".parse::<Category>().unwrap(), Category::Loan);
        assert_eq!(" legal ".parse::<Category>().unwrap(), Category::Legal);

        let err = "insurance".parse::<Category>().unwrap_err();
        assert!(matches!(err, ValidationError::NotAllowed { .. }));
        assert!("Loan".parse::<Category>().is_err());
    }

    #[test]
    fn test_from_parts() {
        assert_eq!(
            ServiceRef::from_parts(Some("commercial"), Some(4), None).unwrap(),
            ServiceRef::Commercial(4)
        );
        assert_eq!(
            ServiceRef::from_parts(None, None, Some("Notary visit")).unwrap(),
            ServiceRef::Other("Notary visit".to_string())
        );
        assert_eq!(
            ServiceRef::from_parts(Some("legal"), None, Some("Custom")).unwrap(),
            ServiceRef::Other("Custom".to_string())
        );

        assert!(ServiceRef::from_parts(Some("bogus"), Some(1), None).is_err());
        assert!(ServiceRef::from_parts(Some("loan"), None, None).is_err());
        assert!(ServiceRef::from_parts(Some("loan"), Some(0), None).is_err());
        assert!(ServiceRef::from_parts(None, None, Some("   ")).is_err());
    }

    #[test]
    fn test_stored_columns() {
        let stored = ServiceRef::Loan(9).to_stored();
        assert_eq!(stored.service_category, "loan");
        assert_eq!(stored.service_id, Some(9));
        assert_eq!(stored.other_service_title, None);
        assert_eq!(ServiceRef::from_stored(&stored).unwrap(), ServiceRef::Loan(9));

        let stored = ServiceRef::Other("Translation".to_string()).to_stored();
        assert_eq!(stored.service_category, OTHER_CATEGORY);
        assert_eq!(stored.service_id, None);

        let broken = StoredServiceRef {
            service_category: "legal".to_string(),
            service_id: None,
            other_service_title: None,
        };
        assert!(ServiceRef::from_stored(&broken).is_err());
    }

    #[test]
    fn test_resolve_found_and_deleted() {
        let entry = named(Category::Commercial, 3, "Customs clearance", true);
        let resolved = ResolvedService::resolve(&ServiceRef::Commercial(3), Some(&entry));
        assert_eq!(resolved.display_name(), "Customs clearance");

        let resolved = ResolvedService::resolve(&ServiceRef::Commercial(3), None);
        assert!(resolved.is_deleted());
        assert_eq!(resolved.display_name(), "Deleted service (#3)");

        // A row from another catalog with the same id is not a match.
        let other = named(Category::Legal, 3, "Contract review", true);
        let resolved = ResolvedService::resolve(&ServiceRef::Commercial(3), Some(&other));
        assert!(resolved.is_deleted());
    }

    #[test]
    fn test_resolve_inactive_still_named() {
        let entry = named(Category::Leasing, 8, "Car leasing", false);
        let resolved = ResolvedService::resolve(&ServiceRef::Leasing(8), Some(&entry));
        assert_eq!(
            resolved,
            ResolvedService::Found {
                category: Category::Leasing,
                id: 8,
                name: "Car leasing".to_string(),
                is_active: false,
            }
        );
    }

    #[test]
    fn test_resolve_freeform() {
        let resolved = ResolvedService::resolve(&ServiceRef::Other("Courier".to_string()), None);
        assert_eq!(resolved.display_name(), "Courier");

        let resolved = ResolvedService::resolve(&ServiceRef::Other(String::new()), None);
        assert_eq!(resolved.display_name(), UNSPECIFIED_SERVICE);
    }

    #[test]
    fn test_loan_display_name() {
        assert_eq!(loan_display_name("Bank Melli", "Home plan"), "Bank Melli - Home plan");
    }

    #[test]
    fn test_service_ref_json_shape() {
        let json = serde_json::to_value(ServiceRef::Legal(12)).unwrap();
        assert_eq!(json, serde_json::json!({"category": "legal", "value": 12}));

        let other: ServiceRef =
            serde_json::from_value(serde_json::json!({"category": "other", "value": "Notary fee"}))
                .unwrap();
        assert_eq!(other, ServiceRef::Other("Notary fee".to_string()));
    }
}
