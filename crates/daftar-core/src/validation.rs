//! # Validation Module
//!
//! Input validation utilities for Daftar.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler (daftar-api)                                    │
//! │  ├── JSON deserialization (types, enums)                               │
//! │  └── Query parameter presence                                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Repository (daftar-db)                                       │
//! │  └── THIS MODULE: Business rule validation before any write            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE (national_id, username, invoice_number)                    │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use daftar_core::validation::{validate_mobile_number, validate_national_id};
//!
//! validate_mobile_number("phone_number", "09121234567").unwrap();
//! validate_national_id("0012345678").unwrap();
//! ```

use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

use crate::error::ValidationError;
use crate::money::Money;
use crate::service::{Category, ServiceRef};
use crate::types::{CatalogInput, InvoiceInput, LedgerEntryInput, PersonInput, SalaryInput, UserProfile};
use crate::PERSON_SEARCH_MIN_CHARS;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Customer mobile numbers: optional `+98` or `0`, then `9` and nine digits.
fn mobile_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\+98|0)?9\d{9}$").unwrap())
}

/// Staff phone numbers: optional `+`, optional `1`, then 9 to 15 digits.
fn staff_phone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\+?1?\d{9,15}$").unwrap())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required text field and returns it trimmed.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most `max` characters
pub fn validate_required_text(field: &str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value.to_string())
}

/// Trims an optional text field; blank becomes `None`.
pub fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Validates a customer mobile number.
///
/// ## Example
/// ```rust
/// use daftar_core::validation::validate_mobile_number;
///
/// assert!(validate_mobile_number("phone_number", "09121234567").is_ok());
/// assert!(validate_mobile_number("phone_number", "+989121234567").is_ok());
/// assert!(validate_mobile_number("phone_number", "9121234567").is_ok());
/// assert!(validate_mobile_number("phone_number", "08121234567").is_err());
/// ```
pub fn validate_mobile_number(field: &str, phone: &str) -> ValidationResult<String> {
    let phone = phone.trim();

    if phone.is_empty() {
        return Err(ValidationError::required(field));
    }

    if !mobile_regex().is_match(phone) {
        return Err(ValidationError::invalid(
            field,
            "must be a mobile number like 09123456789",
        ));
    }

    Ok(phone.to_string())
}

/// Validates a staff phone number.
pub fn validate_staff_phone(phone: &str) -> ValidationResult<String> {
    let phone = phone.trim();

    if !staff_phone_regex().is_match(phone) {
        return Err(ValidationError::invalid(
            "phone_number",
            "must be 9 to 15 digits with an optional leading +",
        ));
    }

    Ok(phone.to_string())
}

/// Validates a national identification number: exactly 10 digits.
pub fn validate_national_id(national_id: &str) -> ValidationResult<String> {
    let national_id = national_id.trim();

    if national_id.is_empty() {
        return Err(ValidationError::required("national_id"));
    }

    if national_id.len() != 10 || !national_id.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::invalid(
            "national_id",
            "must be exactly 10 digits",
        ));
    }

    Ok(national_id.to_string())
}

/// Validates a login name.
///
/// ## Rules
/// - 3 to 150 characters
/// - Letters, digits and `@ . + - _` only
pub fn validate_username(username: &str) -> ValidationResult<String> {
    let username = username.trim();

    if username.is_empty() {
        return Err(ValidationError::required("username"));
    }

    if username.chars().count() < 3 {
        return Err(ValidationError::TooShort {
            field: "username".to_string(),
            min: 3,
        });
    }

    if username.chars().count() > 150 {
        return Err(ValidationError::TooLong {
            field: "username".to_string(),
            max: 150,
        });
    }

    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(ValidationError::invalid(
            "username",
            "may contain only letters, digits and @/./+/-/_",
        ));
    }

    Ok(username.to_string())
}

/// Validates a new password. Only the length is checked.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::required("password"));
    }

    if password.chars().count() < 8 {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: 8,
        });
    }

    Ok(())
}

/// Normalizes a person search query.
///
/// ## Returns
/// `None` when the trimmed query is shorter than the minimum; the caller
/// returns an empty result list instead of querying.
pub fn normalize_search_query(query: &str) -> Option<String> {
    let query = query.trim();
    if query.chars().count() < PERSON_SEARCH_MIN_CHARS {
        return None;
    }
    Some(query.chars().take(100).collect())
}

// =============================================================================
// Numeric & Date Validators
// =============================================================================

/// Validates a price or amount: strictly positive.
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates that a range is ordered.
pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> ValidationResult<()> {
    if start > end {
        return Err(ValidationError::InvalidDateRange {
            start: start.to_string(),
            end: end.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Record Validators
// =============================================================================

/// Validates and normalizes Person fields.
pub fn validate_person(input: &PersonInput) -> ValidationResult<PersonInput> {
    Ok(PersonInput {
        first_name: validate_required_text("first_name", &input.first_name, 100)?,
        last_name: validate_required_text("last_name", &input.last_name, 100)?,
        phone_number: validate_mobile_number("phone_number", &input.phone_number)?,
        phone_number_optional: match normalize_optional(input.phone_number_optional.as_deref()) {
            Some(p) => Some(validate_mobile_number("phone_number_optional", &p)?),
            None => None,
        },
        national_id: validate_national_id(&input.national_id)?,
        address: validate_required_text("address", &input.address, 1000)?,
        description: normalize_optional(input.description.as_deref()),
    })
}

/// Validates and normalizes staff profile fields.
pub fn validate_user_profile(profile: &UserProfile) -> ValidationResult<UserProfile> {
    let phone_number = match normalize_optional(profile.phone_number.as_deref()) {
        Some(p) => Some(validate_staff_phone(&p)?),
        None => None,
    };
    let national_id = match normalize_optional(profile.national_id.as_deref()) {
        Some(n) => Some(validate_national_id(&n)?),
        None => None,
    };
    let email = normalize_optional(profile.email.as_deref());
    if let Some(email) = &email {
        if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
            return Err(ValidationError::invalid("email", "must be an email address"));
        }
    }

    Ok(UserProfile {
        first_name: profile.first_name.trim().to_string(),
        last_name: profile.last_name.trim().to_string(),
        email,
        phone_number,
        national_id,
        address: normalize_optional(profile.address.as_deref()),
        position: normalize_optional(profile.position.as_deref()),
        hire_date: profile.hire_date,
        bank_account_number: normalize_optional(profile.bank_account_number.as_deref()),
        bio: normalize_optional(profile.bio.as_deref()),
    })
}

/// Validates invoice fields that do not need the database.
///
/// Person and catalog existence are checked by the repository.
pub fn validate_invoice(input: &InvoiceInput) -> ValidationResult<()> {
    if input.person_id <= 0 {
        return Err(ValidationError::required("person_id"));
    }
    if let ServiceRef::Other(title) = &input.service {
        if title.trim().is_empty() {
            return Err(ValidationError::required("other_service_title"));
        }
    }
    validate_amount("price", input.price)
}

pub fn validate_ledger_entry(input: &LedgerEntryInput) -> ValidationResult<LedgerEntryInput> {
    validate_amount("amount", input.amount)?;
    Ok(LedgerEntryInput {
        amount: input.amount,
        subject: validate_required_text("subject", &input.subject, 255)?,
        date: input.date,
        description: normalize_optional(input.description.as_deref()),
    })
}

pub fn validate_salary(input: &SalaryInput) -> ValidationResult<()> {
    if input.employee_id <= 0 {
        return Err(ValidationError::required("employee_id"));
    }
    validate_amount("amount", input.amount)
}

/// Validates catalog entry fields for the given category.
pub fn validate_catalog_input(category: Category, input: &CatalogInput) -> ValidationResult<CatalogInput> {
    let description = normalize_optional(input.description.as_deref());

    if category == Category::Loan {
        let months = input
            .max_repayment_months
            .ok_or_else(|| ValidationError::required("max_repayment_months"))?;
        if months <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "max_repayment_months".to_string(),
            });
        }
        let amount = input
            .max_plan_amount
            .ok_or_else(|| ValidationError::required("max_plan_amount"))?;
        validate_amount("max_plan_amount", amount)?;

        return Ok(CatalogInput {
            name: None,
            bank_name: Some(validate_required_text(
                "bank_name",
                input.bank_name.as_deref().unwrap_or_default(),
                255,
            )?),
            plan_name: Some(validate_required_text(
                "plan_name",
                input.plan_name.as_deref().unwrap_or_default(),
                255,
            )?),
            max_repayment_months: Some(months),
            max_plan_amount: Some(amount),
            description,
            is_active: input.is_active,
        });
    }

    Ok(CatalogInput {
        name: Some(validate_required_text(
            "name",
            input.name.as_deref().unwrap_or_default(),
            255,
        )?),
        bank_name: None,
        plan_name: None,
        max_repayment_months: None,
        max_plan_amount: None,
        description,
        is_active: input.is_active,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ServiceRef;
    use crate::types::SettlementType;

    fn person_input() -> PersonInput {
        PersonInput {
            first_name: " Ali ".to_string(),
            last_name: "Rezaei".to_string(),
            phone_number: "09121234567".to_string(),
            phone_number_optional: Some("  ".to_string()),
            national_id: "0012345678".to_string(),
            address: "Tehran, Valiasr St.".to_string(),
            description: None,
        }
    }

    #[test]
    fn test_mobile_number_formats() {
        for ok in ["09121234567", "+989121234567", "9121234567"] {
            assert!(validate_mobile_number("phone_number", ok).is_ok(), "{}", ok);
        }
        for bad in ["", "0912123456", "091212345678", "+98912123456a", "08121234567"] {
            assert!(validate_mobile_number("phone_number", bad).is_err(), "{}", bad);
        }
    }

    #[test]
    fn test_staff_phone_formats() {
        assert!(validate_staff_phone("+12025550143").is_ok());
        assert!(validate_staff_phone("021234567").is_ok());
        assert!(validate_staff_phone("12345").is_err());
        assert!(validate_staff_phone("phone").is_err());
    }

    #[test]
    fn test_national_id() {
        assert_eq!(validate_national_id(" 0012345678 ").unwrap(), "0012345678");
        assert!(validate_national_id("").is_err());
        assert!(validate_national_id("123456789").is_err());
        assert!(validate_national_id("12345678901").is_err());
        assert!(validate_national_id("00123456a8").is_err());
    }

    #[test]
    fn test_validate_person_normalizes() {
        let person = validate_person(&person_input()).unwrap();
        assert_eq!(person.first_name, "Ali");
        assert_eq!(person.phone_number_optional, None);

        let mut bad = person_input();
        bad.phone_number_optional = Some("123".to_string());
        let err = validate_person(&bad).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFormat { ref field, .. } if field == "phone_number_optional"));
    }

    #[test]
    fn test_search_query_minimum() {
        assert_eq!(normalize_search_query(""), None);
        assert_eq!(normalize_search_query("  a  "), None);
        assert_eq!(normalize_search_query(" al "), Some("al".to_string()));
    }

    #[test]
    fn test_date_range() {
        let d1 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert!(validate_date_range(d1, d2).is_ok());
        assert!(validate_date_range(d1, d1).is_ok());
        assert!(matches!(
            validate_date_range(d2, d1),
            Err(ValidationError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn test_invoice_requires_positive_price() {
        let mut input = InvoiceInput {
            person_id: 1,
            invoice_date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            service: ServiceRef::Legal(1),
            price: Money::from_major(100),
            settlement_type: SettlementType::Cash,
            description: None,
        };
        assert!(validate_invoice(&input).is_ok());

        input.price = Money::zero();
        assert!(matches!(
            validate_invoice(&input),
            Err(ValidationError::MustBePositive { .. })
        ));

        input.price = Money::from_major(100);
        input.service = ServiceRef::Other("  ".to_string());
        assert_eq!(
            validate_invoice(&input),
            Err(ValidationError::required("other_service_title"))
        );
    }

    #[test]
    fn test_catalog_input_per_category() {
        let named = CatalogInput {
            name: Some("Company registration".to_string()),
            is_active: true,
            ..Default::default()
        };
        assert!(validate_catalog_input(Category::Registration, &named).is_ok());
        assert!(validate_catalog_input(Category::Loan, &named).is_err());

        let loan = CatalogInput {
            bank_name: Some("Bank Mellat".to_string()),
            plan_name: Some("Marriage loan".to_string()),
            max_repayment_months: Some(60),
            max_plan_amount: Some(Money::from_major(3_000_000)),
            is_active: true,
            ..Default::default()
        };
        let validated = validate_catalog_input(Category::Loan, &loan).unwrap();
        assert_eq!(validated.bank_name.as_deref(), Some("Bank Mellat"));
        assert!(validate_catalog_input(Category::Legal, &loan).is_err());
    }

    #[test]
    fn test_username_rules() {
        assert!(validate_username("admin").is_ok());
        assert!(validate_username("s.ahmadi@firm").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has space").is_err());
    }
}
