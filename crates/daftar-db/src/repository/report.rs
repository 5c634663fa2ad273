//! # Report Repository
//!
//! Saved report specifications and the queries that produce their results.
//! Specs are immutable once saved; every read reruns the query.
//!
//! ## Customer Report Query
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  for kind in {sales, purchase} ∩ invoice_type:                          │
//! │                                                                         │
//! │    SELECT ... FROM {kind}_invoices i                                    │
//! │    JOIN persons p          ON p.id = i.person_id                        │
//! │    LEFT JOIN users u       ON u.id = i.created_by                       │
//! │    WHERE 1 = 1                                                          │
//! │      [AND i.person_id = ?]          customer                            │
//! │      [AND i.service_category = ?]   category                            │
//! │      [AND i.service_id = ?]         service id (with category only)     │
//! │      [AND i.settlement_type = ?]    cash | conditional                  │
//! │      [AND i.invoice_date BETWEEN ? AND ?]                               │
//! │      [AND i.created_by = ?]         filter_user                         │
//! │      [AND i.created_by = ?]         actor, unless admin                 │
//! │                                                                         │
//! │  rows → resolve service names (cached) → CustomerReport::from_lines     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};

use super::catalog;
use super::finance::{SalaryRecord, SALARY_COLUMNS};
use crate::error::{DbError, DbResult};
use daftar_core::report::{
    category_label, salary_totals, CustomerReport, CustomerReportSpec, DateRange, EmployeeReport,
    EmployeeReportSpec, FinancialReportSpec, FinancialSummary, InvoiceTypeFilter, ReportKind,
    ReportLine, SavedReport, SettlementFilter, NO_CREATOR,
};
use daftar_core::service::{CatalogEntry, StoredServiceRef};
use daftar_core::{
    display_name, Actor, Category, InvoiceKind, Ledger, Money, ResolvedService, Salary, ServiceRef,
    SettlementType,
};

// =============================================================================
// Records
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CustomerSpecRecord {
    id: i64,
    customer_id: Option<i64>,
    service_category: Option<Category>,
    service_id: Option<i64>,
    invoice_type: InvoiceTypeFilter,
    settlement_type: SettlementFilter,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    single_date: Option<NaiveDate>,
    filter_user: Option<i64>,
    generated_by: Option<i64>,
    created_at: DateTime<Utc>,
}

impl From<CustomerSpecRecord> for SavedReport<CustomerReportSpec> {
    fn from(r: CustomerSpecRecord) -> Self {
        SavedReport {
            id: r.id,
            kind: ReportKind::Customer,
            spec: CustomerReportSpec {
                customer_id: r.customer_id,
                service_category: r.service_category,
                service_id: r.service_id,
                invoice_type: r.invoice_type,
                settlement_type: r.settlement_type,
                start_date: r.start_date,
                end_date: r.end_date,
                single_date: r.single_date,
                filter_user: r.filter_user,
            },
            generated_by: r.generated_by,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EmployeeSpecRecord {
    id: i64,
    employee_id: i64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    generated_by: Option<i64>,
    created_at: DateTime<Utc>,
}

impl From<EmployeeSpecRecord> for SavedReport<EmployeeReportSpec> {
    fn from(r: EmployeeSpecRecord) -> Self {
        SavedReport {
            id: r.id,
            kind: ReportKind::Employee,
            spec: EmployeeReportSpec {
                employee_id: r.employee_id,
                range: DateRange {
                    start_date: r.start_date,
                    end_date: r.end_date,
                },
            },
            generated_by: r.generated_by,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct FinancialSpecRecord {
    id: i64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    generated_by: Option<i64>,
    created_at: DateTime<Utc>,
}

impl From<FinancialSpecRecord> for SavedReport<FinancialReportSpec> {
    fn from(r: FinancialSpecRecord) -> Self {
        SavedReport {
            id: r.id,
            kind: ReportKind::Financial,
            spec: FinancialReportSpec {
                range: DateRange {
                    start_date: r.start_date,
                    end_date: r.end_date,
                },
            },
            generated_by: r.generated_by,
            created_at: r.created_at,
        }
    }
}

/// One invoice row joined with its person and creator.
#[derive(Debug, sqlx::FromRow)]
struct LineRecord {
    id: i64,
    invoice_number: i64,
    invoice_date: NaiveDate,
    person_id: i64,
    first_name: String,
    last_name: String,
    service_category: String,
    service_id: Option<i64>,
    other_service_title: Option<String>,
    settlement_type: SettlementType,
    created_by: Option<i64>,
    creator_first_name: Option<String>,
    creator_last_name: Option<String>,
    creator_username: Option<String>,
    price: i64,
}

const CUSTOMER_SPEC_COLUMNS: &str = r#"
    id, customer_id, service_category, service_id, invoice_type, settlement_type,
    start_date, end_date, single_date, filter_user, generated_by, created_at
"#;

type ServiceCache = HashMap<(Category, i64), Option<CatalogEntry>>;

// =============================================================================
// Repository
// =============================================================================

/// Repository for saved reports and report generation.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Customer reports
    // -------------------------------------------------------------------------

    /// Saves a customer report spec generated by `actor`.
    pub async fn create_customer(
        &self,
        actor: &Actor,
        spec: &CustomerReportSpec,
    ) -> DbResult<SavedReport<CustomerReportSpec>> {
        spec.validate()?;
        if let Some(customer_id) = spec.customer_id {
            self.ensure_exists("persons", "Person", customer_id).await?;
        }
        if let Some(user_id) = spec.filter_user {
            self.ensure_exists("users", "User", user_id).await?;
        }

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO customer_reports (
                customer_id, service_category, service_id, invoice_type, settlement_type,
                start_date, end_date, single_date, filter_user, generated_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            RETURNING id
            "#,
        )
        .bind(spec.customer_id)
        .bind(spec.service_category)
        .bind(spec.service_id)
        .bind(spec.invoice_type)
        .bind(spec.settlement_type)
        .bind(spec.start_date)
        .bind(spec.end_date)
        .bind(spec.single_date)
        .bind(spec.filter_user)
        .bind(actor.user_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        info!(id, generated_by = actor.user_id, "Customer report saved");
        self.get_customer(actor, id).await
    }

    pub async fn get_customer(
        &self,
        actor: &Actor,
        id: i64,
    ) -> DbResult<SavedReport<CustomerReportSpec>> {
        let sql = format!(
            "SELECT {} FROM customer_reports WHERE id = ?1",
            CUSTOMER_SPEC_COLUMNS
        );
        let report: SavedReport<CustomerReportSpec> = sqlx::query_as::<_, CustomerSpecRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Customer report", id))?
            .into();

        report.ensure_readable(actor)?;
        Ok(report)
    }

    /// Saved customer reports visible to the actor, newest first.
    pub async fn list_customer(&self, actor: &Actor) -> DbResult<Vec<SavedReport<CustomerReportSpec>>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM customer_reports
            WHERE ?1 IS NULL OR generated_by = ?1
            ORDER BY created_at DESC, id DESC
            "#,
            CUSTOMER_SPEC_COLUMNS
        );
        let records = sqlx::query_as::<_, CustomerSpecRecord>(&sql)
            .bind(actor.owner_scope())
            .fetch_all(&self.pool)
            .await?;

        Ok(records.into_iter().map(SavedReport::from).collect())
    }

    /// Reruns a saved customer report.
    pub async fn run_customer(&self, actor: &Actor, id: i64) -> DbResult<CustomerReport> {
        let saved = self.get_customer(actor, id).await?;
        self.generate_customer(actor, &saved.spec).await
    }

    /// Computes a customer report for `actor`.
    ///
    /// Non-admins only ever see invoices they created, whatever the spec says.
    pub async fn generate_customer(
        &self,
        actor: &Actor,
        spec: &CustomerReportSpec,
    ) -> DbResult<CustomerReport> {
        spec.validate()?;
        let window = spec.date_window()?;

        let mut cache = ServiceCache::new();
        let mut lines = Vec::new();

        for kind in [InvoiceKind::Sales, InvoiceKind::Purchase] {
            if !spec.invoice_type.includes(kind) {
                continue;
            }

            let mut qb = QueryBuilder::<Sqlite>::new(format!(
                r#"
                SELECT
                    i.id, i.invoice_number, i.invoice_date, i.person_id,
                    p.first_name, p.last_name,
                    i.service_category, i.service_id, i.other_service_title,
                    i.settlement_type, i.created_by,
                    u.first_name AS creator_first_name,
                    u.last_name AS creator_last_name,
                    u.username AS creator_username,
                    i.price
                FROM {} i
                JOIN persons p ON p.id = i.person_id
                LEFT JOIN users u ON u.id = i.created_by
                WHERE 1 = 1
                "#,
                Ledger::from(kind).table()
            ));

            if let Some(customer_id) = spec.customer_id {
                qb.push(" AND i.person_id = ").push_bind(customer_id);
            }
            if let Some(category) = spec.service_category {
                qb.push(" AND i.service_category = ").push_bind(category.as_str());
                if let Some(service_id) = spec.service_id {
                    qb.push(" AND i.service_id = ").push_bind(service_id);
                }
            }
            if let Some(settlement) = spec.settlement_type.settlement() {
                qb.push(" AND i.settlement_type = ").push_bind(settlement);
            }
            if let Some((from, to)) = window.bounds() {
                qb.push(" AND i.invoice_date BETWEEN ")
                    .push_bind(from)
                    .push(" AND ")
                    .push_bind(to);
            }
            if let Some(user_id) = spec.filter_user {
                qb.push(" AND i.created_by = ").push_bind(user_id);
            }
            if let Some(own) = actor.owner_scope() {
                qb.push(" AND i.created_by = ").push_bind(own);
            }

            let records = qb
                .build_query_as::<LineRecord>()
                .fetch_all(&self.pool)
                .await?;

            for record in records {
                lines.push(self.to_line(kind, record, &mut cache).await?);
            }
        }

        let report = CustomerReport::from_lines(lines);
        debug!(
            user_id = actor.user_id,
            rows = report.total_count,
            total = %report.total_price,
            "Customer report generated"
        );
        Ok(report)
    }

    async fn to_line(
        &self,
        kind: InvoiceKind,
        r: LineRecord,
        cache: &mut ServiceCache,
    ) -> DbResult<ReportLine> {
        let stored = StoredServiceRef {
            service_category: r.service_category,
            service_id: r.service_id,
            other_service_title: r.other_service_title,
        };
        let service = ServiceRef::from_stored(&stored).map_err(|e| DbError::Corrupt {
            entity: kind.label().to_string(),
            id: r.id,
            reason: e.to_string(),
        })?;

        let entry = match service.catalog_key() {
            Some(key) => {
                if !cache.contains_key(&key) {
                    let found = catalog::find_entry(&self.pool, key.0, key.1).await?;
                    cache.insert(key, found);
                }
                cache.get(&key).cloned().flatten()
            }
            None => None,
        };
        let service_name = ResolvedService::resolve(&service, entry.as_ref()).display_name();

        let creator_name = match (r.created_by, r.creator_username.as_deref()) {
            (Some(_), Some(username)) => display_name(
                r.creator_first_name.as_deref().unwrap_or_default(),
                r.creator_last_name.as_deref().unwrap_or_default(),
                username,
            ),
            _ => NO_CREATOR.to_string(),
        };

        Ok(ReportLine {
            kind,
            type_label: kind.label().to_string(),
            invoice_id: r.id,
            invoice_number: r.invoice_number,
            invoice_date: r.invoice_date,
            person_id: r.person_id,
            first_name: r.first_name,
            last_name: r.last_name,
            category_label: category_label(&stored.service_category),
            service_name,
            settlement_label: r.settlement_type.label().to_string(),
            created_by: r.created_by,
            creator_name,
            price: Money::from_minor(r.price),
        })
    }

    // -------------------------------------------------------------------------
    // Employee reports
    // -------------------------------------------------------------------------

    /// Saves an employee report spec. Admin, or the employee themself.
    pub async fn create_employee(
        &self,
        actor: &Actor,
        spec: &EmployeeReportSpec,
    ) -> DbResult<SavedReport<EmployeeReportSpec>> {
        actor.ensure_self_or_admin(spec.employee_id, "report on another employee")?;
        let range = DateRange::new(spec.range.start_date, spec.range.end_date)?;
        self.ensure_exists("users", "User", spec.employee_id).await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO employee_reports (employee_id, start_date, end_date, generated_by, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id
            "#,
        )
        .bind(spec.employee_id)
        .bind(range.start_date)
        .bind(range.end_date)
        .bind(actor.user_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        info!(id, employee_id = spec.employee_id, "Employee report saved");
        self.get_employee(actor, id).await
    }

    pub async fn get_employee(
        &self,
        actor: &Actor,
        id: i64,
    ) -> DbResult<SavedReport<EmployeeReportSpec>> {
        let report: SavedReport<EmployeeReportSpec> = sqlx::query_as::<_, EmployeeSpecRecord>(
            r#"
            SELECT id, employee_id, start_date, end_date, generated_by, created_at
            FROM employee_reports
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Employee report", id))?
        .into();

        report.ensure_readable(actor)?;
        Ok(report)
    }

    pub async fn list_employee(&self, actor: &Actor) -> DbResult<Vec<SavedReport<EmployeeReportSpec>>> {
        let records = sqlx::query_as::<_, EmployeeSpecRecord>(
            r#"
            SELECT id, employee_id, start_date, end_date, generated_by, created_at
            FROM employee_reports
            WHERE ?1 IS NULL OR generated_by = ?1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(actor.owner_scope())
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(SavedReport::from).collect())
    }

    pub async fn run_employee(&self, actor: &Actor, id: i64) -> DbResult<EmployeeReport> {
        let saved = self.get_employee(actor, id).await?;
        self.generate_employee(actor, &saved.spec).await
    }

    /// Invoices created and salaries received by one employee in a range.
    pub async fn generate_employee(
        &self,
        actor: &Actor,
        spec: &EmployeeReportSpec,
    ) -> DbResult<EmployeeReport> {
        actor.ensure_self_or_admin(spec.employee_id, "report on another employee")?;
        let range = DateRange::new(spec.range.start_date, spec.range.end_date)?;

        let employee: Option<(String, String, String)> = sqlx::query_as(
            "SELECT first_name, last_name, username FROM users WHERE id = ?1",
        )
        .bind(spec.employee_id)
        .fetch_optional(&self.pool)
        .await?;
        let (first, last, username) =
            employee.ok_or_else(|| DbError::not_found("User", spec.employee_id))?;

        let (sales_count, sales_total) =
            self.ledger_totals(InvoiceKind::Sales, range, Some(spec.employee_id)).await?;
        let (purchase_count, purchase_total) =
            self.ledger_totals(InvoiceKind::Purchase, range, Some(spec.employee_id)).await?;

        let sql = format!(
            r#"
            SELECT {}
            FROM salaries
            WHERE employee_id = ?1 AND date BETWEEN ?2 AND ?3
            ORDER BY date DESC, id DESC
            "#,
            SALARY_COLUMNS
        );
        let salaries: Vec<Salary> = sqlx::query_as::<_, SalaryRecord>(&sql)
            .bind(spec.employee_id)
            .bind(range.start_date)
            .bind(range.end_date)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Salary::from)
            .collect();

        let (paid_count, paid_total, unpaid_count, unpaid_total) = salary_totals(&salaries);

        Ok(EmployeeReport {
            employee_id: spec.employee_id,
            employee_name: display_name(&first, &last, &username),
            range,
            sales_count,
            sales_total,
            purchase_count,
            purchase_total,
            salaries,
            paid_count,
            paid_total,
            unpaid_count,
            unpaid_total,
            total_activity: sales_count + purchase_count,
        })
    }

    // -------------------------------------------------------------------------
    // Financial reports (admin only)
    // -------------------------------------------------------------------------

    pub async fn create_financial(
        &self,
        actor: &Actor,
        spec: &FinancialReportSpec,
    ) -> DbResult<SavedReport<FinancialReportSpec>> {
        actor.ensure_admin("create financial reports")?;
        let range = DateRange::new(spec.range.start_date, spec.range.end_date)?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO financial_reports (start_date, end_date, generated_by, created_at)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING id
            "#,
        )
        .bind(range.start_date)
        .bind(range.end_date)
        .bind(actor.user_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        info!(id, "Financial report saved");
        self.get_financial(actor, id).await
    }

    pub async fn get_financial(
        &self,
        actor: &Actor,
        id: i64,
    ) -> DbResult<SavedReport<FinancialReportSpec>> {
        actor.ensure_admin("open financial reports")?;

        let report = sqlx::query_as::<_, FinancialSpecRecord>(
            "SELECT id, start_date, end_date, generated_by, created_at FROM financial_reports WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Financial report", id))?;

        Ok(report.into())
    }

    pub async fn list_financial(&self, actor: &Actor) -> DbResult<Vec<SavedReport<FinancialReportSpec>>> {
        actor.ensure_admin("open financial reports")?;

        let records = sqlx::query_as::<_, FinancialSpecRecord>(
            r#"
            SELECT id, start_date, end_date, generated_by, created_at
            FROM financial_reports
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(SavedReport::from).collect())
    }

    pub async fn run_financial(&self, actor: &Actor, id: i64) -> DbResult<FinancialSummary> {
        let saved = self.get_financial(actor, id).await?;
        self.generate_financial(actor, &saved.spec).await
    }

    /// Sales income against purchase expenses in the range.
    pub async fn generate_financial(
        &self,
        actor: &Actor,
        spec: &FinancialReportSpec,
    ) -> DbResult<FinancialSummary> {
        actor.ensure_admin("open financial reports")?;
        let range = DateRange::new(spec.range.start_date, spec.range.end_date)?;

        let (sales_count, income) = self.ledger_totals(InvoiceKind::Sales, range, None).await?;
        let (purchase_count, expenses) =
            self.ledger_totals(InvoiceKind::Purchase, range, None).await?;

        Ok(FinancialSummary::new(
            range,
            sales_count,
            income,
            purchase_count,
            expenses,
        ))
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    /// `(count, sum of price)` of one invoice ledger in a range.
    async fn ledger_totals(
        &self,
        kind: InvoiceKind,
        range: DateRange,
        created_by: Option<i64>,
    ) -> DbResult<(i64, Money)> {
        let sql = format!(
            r#"
            SELECT COUNT(*), COALESCE(SUM(price), 0)
            FROM {}
            WHERE invoice_date BETWEEN ?1 AND ?2
              AND (?3 IS NULL OR created_by = ?3)
            "#,
            Ledger::from(kind).table()
        );
        let (count, total): (i64, i64) = sqlx::query_as(&sql)
            .bind(range.start_date)
            .bind(range.end_date)
            .bind(created_by)
            .fetch_one(&self.pool)
            .await?;

        Ok((count, Money::from_minor(total)))
    }

    async fn ensure_exists(&self, table: &str, entity: &str, id: i64) -> DbResult<()> {
        let sql = format!("SELECT id FROM {} WHERE id = ?1", table);
        let found: Option<i64> = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        found.map(|_| ()).ok_or_else(|| DbError::not_found(entity, id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{add_person, add_service, add_user, setup};
    use daftar_core::{InvoiceInput, Role, SalaryInput};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sale(person_id: i64, service: ServiceRef, day: u32, price: i64) -> InvoiceInput {
        InvoiceInput {
            person_id,
            invoice_date: date(2024, 5, day),
            service,
            price: Money::from_major(price),
            settlement_type: SettlementType::Cash,
            description: None,
        }
    }

    #[tokio::test]
    async fn test_report_filtered_by_customer() {
        let db = setup().await;
        let admin = add_user(&db, "admin", "Ada", "Admin", Role::Admin).await;
        let first = add_person(&db, "Ali", "Rezaei", "1234567890").await;
        let second = add_person(&db, "Sara", "Karimi", "9876543210").await;
        let other = ServiceRef::Other("Consulting".to_string());

        let kept = db.invoices().create(&admin, InvoiceKind::Sales, &sale(first.id, other.clone(), 1, 100)).await.unwrap();
        db.invoices().create(&admin, InvoiceKind::Sales, &sale(second.id, other, 1, 200)).await.unwrap();

        let spec = CustomerReportSpec {
            customer_id: Some(first.id),
            ..Default::default()
        };
        let saved = db.reports().create_customer(&admin, &spec).await.unwrap();
        let report = db.reports().run_customer(&admin, saved.id).await.unwrap();

        assert_eq!(report.total_count, 1);
        assert_eq!(report.lines[0].invoice_id, kept.id);
        assert_eq!(report.lines[0].first_name, "Ali");
        assert_eq!(report.lines[0].service_name, "Consulting");
        assert_eq!(report.lines[0].category_label, "Other");
        assert_eq!(report.lines[0].creator_name, "Ada Admin");
        assert_eq!(report.total_price, Money::from_major(100));
    }

    #[tokio::test]
    async fn test_non_admin_sees_only_own_invoices() {
        let db = setup().await;
        let admin = add_user(&db, "admin", "Ada", "Admin", Role::Admin).await;
        let clerk = add_user(&db, "clerk", "", "", Role::User).await;
        let person = add_person(&db, "Ali", "Rezaei", "1234567890").await;
        let other = ServiceRef::Other("Consulting".to_string());

        db.invoices().create(&admin, InvoiceKind::Sales, &sale(person.id, other.clone(), 1, 100)).await.unwrap();
        db.invoices().create(&clerk, InvoiceKind::Purchase, &sale(person.id, other, 2, 40)).await.unwrap();

        let all = CustomerReportSpec::default();
        let report = db.reports().generate_customer(&clerk, &all).await.unwrap();
        assert_eq!(report.total_count, 1);
        assert_eq!(report.lines[0].created_by, Some(clerk.user_id));
        assert_eq!(report.lines[0].creator_name, "clerk");
        assert_eq!(report.lines[0].type_label, "Purchase invoice");

        // An explicit filter for someone else cannot widen the scope.
        let theirs = CustomerReportSpec {
            filter_user: Some(admin.user_id),
            ..Default::default()
        };
        assert_eq!(db.reports().generate_customer(&clerk, &theirs).await.unwrap().total_count, 0);
        assert_eq!(db.reports().generate_customer(&admin, &all).await.unwrap().total_count, 2);
    }

    #[tokio::test]
    async fn test_filters_and_ordering() {
        let db = setup().await;
        let admin = add_user(&db, "admin", "Ada", "Admin", Role::Admin).await;
        let person = add_person(&db, "Ali", "Rezaei", "1234567890").await;
        let legal = add_service(&db, &admin, Category::Legal, "Contract review").await;
        let leasing = add_service(&db, &admin, Category::Leasing, "Car leasing").await;

        db.invoices().create(&admin, InvoiceKind::Sales, &sale(person.id, ServiceRef::Legal(legal), 3, 10)).await.unwrap();
        db.invoices().create(&admin, InvoiceKind::Sales, &sale(person.id, ServiceRef::Leasing(leasing), 5, 20)).await.unwrap();
        let mut deferred = sale(person.id, ServiceRef::Legal(legal), 5, 30);
        deferred.settlement_type = SettlementType::Conditional;
        db.invoices().create(&admin, InvoiceKind::Purchase, &deferred).await.unwrap();

        let report = db.reports().generate_customer(&admin, &CustomerReportSpec::default()).await.unwrap();
        let dates: Vec<_> = report.lines.iter().map(|l| l.invoice_date).collect();
        assert_eq!(dates, vec![date(2024, 5, 5), date(2024, 5, 5), date(2024, 5, 3)]);
        assert_eq!(report.total_price, Money::from_major(60));

        let legal_only = CustomerReportSpec {
            service_category: Some(Category::Legal),
            ..Default::default()
        };
        let report = db.reports().generate_customer(&admin, &legal_only).await.unwrap();
        assert_eq!(report.total_count, 2);
        assert!(report.lines.iter().all(|l| l.category_label == "Legal services"));

        let conditional = CustomerReportSpec {
            settlement_type: SettlementFilter::Conditional,
            ..Default::default()
        };
        let report = db.reports().generate_customer(&admin, &conditional).await.unwrap();
        assert_eq!(report.total_count, 1);
        assert_eq!(report.lines[0].settlement_label, "Conditional");

        let one_day = CustomerReportSpec {
            single_date: Some(date(2024, 5, 3)),
            start_date: Some(date(2024, 5, 1)),
            end_date: Some(date(2024, 5, 31)),
            ..Default::default()
        };
        assert_eq!(db.reports().generate_customer(&admin, &one_day).await.unwrap().total_count, 1);

        let sales_only = CustomerReportSpec {
            invoice_type: InvoiceTypeFilter::Sales,
            ..Default::default()
        };
        assert_eq!(db.reports().generate_customer(&admin, &sales_only).await.unwrap().total_count, 2);
    }

    #[tokio::test]
    async fn test_deleted_service_shows_placeholder() {
        let db = setup().await;
        let admin = add_user(&db, "admin", "Ada", "Admin", Role::Admin).await;
        let person = add_person(&db, "Ali", "Rezaei", "1234567890").await;
        let registration = add_service(&db, &admin, Category::Registration, "Trademark").await;

        db.invoices()
            .create(&admin, InvoiceKind::Sales, &sale(person.id, ServiceRef::Registration(registration), 1, 10))
            .await
            .unwrap();
        db.catalog().delete(&admin, Category::Registration, registration).await.unwrap();

        let report = db.reports().generate_customer(&admin, &CustomerReportSpec::default()).await.unwrap();
        assert_eq!(
            report.lines[0].service_name,
            format!("Deleted service (#{})", registration)
        );
    }

    #[tokio::test]
    async fn test_new_entry_does_not_take_over_deleted_id() {
        let db = setup().await;
        let admin = add_user(&db, "admin", "Ada", "Admin", Role::Admin).await;
        let person = add_person(&db, "Ali", "Rezaei", "1234567890").await;
        let old = add_service(&db, &admin, Category::Legal, "Contract review").await;

        db.invoices()
            .create(&admin, InvoiceKind::Sales, &sale(person.id, ServiceRef::Legal(old), 1, 10))
            .await
            .unwrap();
        db.catalog().delete(&admin, Category::Legal, old).await.unwrap();
        let replacement = add_service(&db, &admin, Category::Legal, "Divorce filing").await;
        assert_ne!(replacement, old);

        let report = db.reports().generate_customer(&admin, &CustomerReportSpec::default()).await.unwrap();
        assert_eq!(report.lines[0].service_name, format!("Deleted service (#{})", old));
    }

    #[tokio::test]
    async fn test_half_open_range_rejected() {
        let db = setup().await;
        let admin = add_user(&db, "admin", "Ada", "Admin", Role::Admin).await;

        let spec = CustomerReportSpec {
            start_date: Some(date(2024, 5, 1)),
            ..Default::default()
        };
        assert!(matches!(
            db.reports().create_customer(&admin, &spec).await,
            Err(DbError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_reports_readable_only_by_generator_or_admin() {
        let db = setup().await;
        let admin = add_user(&db, "admin", "Ada", "Admin", Role::Admin).await;
        let alice = add_user(&db, "alice", "Alice", "A", Role::User).await;
        let bob = add_user(&db, "bob", "Bob", "B", Role::User).await;

        let saved = db.reports().create_customer(&alice, &CustomerReportSpec::default()).await.unwrap();

        assert!(matches!(
            db.reports().run_customer(&bob, saved.id).await,
            Err(DbError::PermissionDenied { .. })
        ));
        assert!(db.reports().run_customer(&admin, saved.id).await.is_ok());
        assert_eq!(db.reports().list_customer(&bob).await.unwrap().len(), 0);
        assert_eq!(db.reports().list_customer(&alice).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_employee_and_financial_reports() {
        let db = setup().await;
        let admin = add_user(&db, "admin", "Ada", "Admin", Role::Admin).await;
        let clerk = add_user(&db, "clerk", "Cyrus", "Clerk", Role::User).await;
        let person = add_person(&db, "Ali", "Rezaei", "1234567890").await;
        let other = ServiceRef::Other("Consulting".to_string());

        db.invoices().create(&clerk, InvoiceKind::Sales, &sale(person.id, other.clone(), 2, 100)).await.unwrap();
        db.invoices().create(&clerk, InvoiceKind::Sales, &sale(person.id, other.clone(), 3, 50)).await.unwrap();
        db.invoices().create(&admin, InvoiceKind::Purchase, &sale(person.id, other, 4, 30)).await.unwrap();
        for (amount, is_paid) in [(500, true), (500, false)] {
            db.finance()
                .create_salary(
                    &admin,
                    &SalaryInput {
                        employee_id: clerk.user_id,
                        date: date(2024, 5, 20),
                        amount: Money::from_major(amount),
                        is_paid,
                        description: None,
                    },
                )
                .await
                .unwrap();
        }

        let range = DateRange::new(date(2024, 5, 1), date(2024, 5, 31)).unwrap();
        let spec = EmployeeReportSpec {
            employee_id: clerk.user_id,
            range,
        };
        let saved = db.reports().create_employee(&clerk, &spec).await.unwrap();
        let report = db.reports().run_employee(&clerk, saved.id).await.unwrap();
        assert_eq!(report.employee_name, "Cyrus Clerk");
        assert_eq!((report.sales_count, report.sales_total), (2, Money::from_major(150)));
        assert_eq!(report.purchase_count, 0);
        assert_eq!((report.paid_count, report.unpaid_count), (1, 1));
        assert_eq!(report.total_activity, 2);

        let about_admin = EmployeeReportSpec {
            employee_id: admin.user_id,
            range,
        };
        assert!(matches!(
            db.reports().create_employee(&clerk, &about_admin).await,
            Err(DbError::PermissionDenied { .. })
        ));

        assert!(matches!(
            db.reports().create_financial(&clerk, &FinancialReportSpec { range }).await,
            Err(DbError::PermissionDenied { .. })
        ));
        let saved = db.reports().create_financial(&admin, &FinancialReportSpec { range }).await.unwrap();
        let summary = db.reports().run_financial(&admin, saved.id).await.unwrap();
        assert_eq!(summary.total_income, Money::from_major(150));
        assert_eq!(summary.total_expenses, Money::from_major(30));
        assert_eq!(summary.net, Money::from_major(120));
    }
}
