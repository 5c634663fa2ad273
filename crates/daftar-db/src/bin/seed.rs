//! # Seed Data Generator
//!
//! Populates the database with demo data for development.
//!
//! ## Usage
//! ```bash
//! # 50 persons (default) with their invoices
//! cargo run -p daftar-db --bin seed
//!
//! # More persons
//! cargo run -p daftar-db --bin seed -- --count 500
//!
//! # Specify database path and admin password
//! cargo run -p daftar-db --bin seed -- --db ./data/daftar.db --admin-password s3cret-pass
//! ```
//!
//! ## Generated Data
//! - An `admin` account plus three staff accounts (same password)
//! - Entries in all five service catalogs
//! - `count` persons with national ids `1000000000 + n * 7919`
//! - One sales invoice per person, a purchase invoice for every other one
//! - Expense and income entries, a paid and an unpaid salary per staff member
//!
//! Everything is derived from the row index, so two runs on empty databases
//! produce the same data.

use chrono::{Days, NaiveDate};
use daftar_core::{
    Actor, CatalogInput, Category, EntryKind, InvoiceInput, InvoiceKind, LedgerEntryInput, Money,
    NewUser, PersonInput, Role, SalaryInput, ServiceRef, SettlementType, UserProfile,
};
use daftar_db::{Database, DbConfig};
use std::env;

const FIRST_NAMES: &[&str] = &[
    "Ali", "Sara", "Reza", "Maryam", "Hossein", "Zahra", "Mohammad", "Fatemeh", "Amir", "Niloofar",
];

const LAST_NAMES: &[&str] = &[
    "Rezaei", "Karimi", "Ahmadi", "Hosseini", "Moradi", "Jafari", "Rahimi", "Kazemi", "Sadeghi",
    "Ebrahimi",
];

const STAFF: &[(&str, &str, &str)] = &[
    ("nazanin", "Nazanin", "Amini"),
    ("kaveh", "Kaveh", "Ghasemi"),
    ("shirin", "Shirin", "Bagheri"),
];

/// Named catalogs and their entries.
const NAMED_SERVICES: &[(Category, &[&str])] = &[
    (
        Category::Legal,
        &["Contract review", "Court representation", "Legal consultation", "Notary services"],
    ),
    (
        Category::Commercial,
        &["Customs clearance", "Import license", "Export brokerage", "Market research"],
    ),
    (
        Category::Leasing,
        &["Car leasing", "Equipment leasing", "Office leasing"],
    ),
    (
        Category::Registration,
        &["Company registration", "Trademark registration", "Branch registration"],
    ),
];

/// Loan plans: (bank, plan, max months, max amount).
const LOAN_PLANS: &[(&str, &str, i64, i64)] = &[
    ("Mellat", "Business", 36, 2_000_000_000),
    ("Mellat", "Home", 120, 5_000_000_000),
    ("Melli", "Car", 48, 1_500_000_000),
    ("Tejarat", "Startup", 60, 3_000_000_000),
];

const DEFAULT_PASSWORD: &str = "daftar-admin";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 50;
    let mut db_path = String::from("./daftar_dev.db");
    let mut password = String::from(DEFAULT_PASSWORD);

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(50);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--admin-password" | "-p" => {
                if i + 1 < args.len() {
                    password = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Daftar Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>              Number of persons to generate (default: 50)");
                println!("  -d, --db <PATH>              Database file path (default: ./daftar_dev.db)");
                println!("  -p, --admin-password <PASS>  Password for all seeded accounts");
                println!("  -h, --help                   Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Daftar Seed Data Generator");
    println!("==========================");
    println!("Database: {}", db_path);
    println!("Persons:  {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.users().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} users", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();

    // Accounts
    let admin = db
        .users()
        .insert(&NewUser {
            username: "admin".to_string(),
            password: password.clone(),
            role: Role::Admin,
            profile: UserProfile {
                first_name: "System".to_string(),
                last_name: "Administrator".to_string(),
                position: Some("Manager".to_string()),
                ..Default::default()
            },
        })
        .await?;
    let admin = Actor::new(admin.id, admin.role);

    let mut staff = Vec::new();
    for (username, first, last) in STAFF {
        let user = db
            .users()
            .insert(&NewUser {
                username: username.to_string(),
                password: password.clone(),
                role: Role::User,
                profile: UserProfile {
                    first_name: first.to_string(),
                    last_name: last.to_string(),
                    position: Some("Clerk".to_string()),
                    ..Default::default()
                },
            })
            .await?;
        staff.push(Actor::new(user.id, user.role));
    }
    println!("✓ Created {} accounts", staff.len() + 1);

    // Catalogs
    let mut services = Vec::new();
    for (category, names) in NAMED_SERVICES {
        for name in names.iter() {
            let entry = db
                .catalog()
                .create(
                    &admin,
                    *category,
                    &CatalogInput {
                        name: Some(name.to_string()),
                        is_active: true,
                        ..Default::default()
                    },
                )
                .await?;
            services.push(ServiceRef::catalog(*category, entry.id())?);
        }
    }
    for (bank, plan, months, amount) in LOAN_PLANS {
        let entry = db
            .catalog()
            .create(
                &admin,
                Category::Loan,
                &CatalogInput {
                    bank_name: Some(bank.to_string()),
                    plan_name: Some(plan.to_string()),
                    max_repayment_months: Some(*months),
                    max_plan_amount: Some(Money::from_major(*amount)),
                    is_active: true,
                    ..Default::default()
                },
            )
            .await?;
        services.push(ServiceRef::Loan(entry.id()));
    }
    println!("✓ Created {} catalog entries", services.len());

    // Persons and invoices
    println!();
    println!("Generating persons and invoices...");

    let mut invoices = 0;
    for n in 0..count {
        let person = match db.persons().create(&generate_person(n)).await {
            Ok(p) => p,
            Err(e) => {
                eprintln!("Failed to insert person {}: {}", n, e);
                continue;
            }
        };

        let creator = if n % 4 == 0 { &admin } else { &staff[n % staff.len()] };

        let sale = generate_invoice(person.id, &services, n);
        db.invoices().create(creator, InvoiceKind::Sales, &sale).await?;
        invoices += 1;

        if n % 2 == 0 {
            let purchase = generate_invoice(person.id, &services, n + 7);
            db.invoices().create(creator, InvoiceKind::Purchase, &purchase).await?;
            invoices += 1;
        }

        if (n + 1) % 25 == 0 {
            println!("  Generated {} persons...", n + 1);
        }
    }
    println!("✓ Created {} invoices", invoices);

    // Finance
    for n in 0..12 {
        let kind = if n % 3 == 0 { EntryKind::Income } else { EntryKind::Expense };
        let subject = match kind {
            EntryKind::Income => "Consulting fees",
            EntryKind::Expense => ["Office rent", "Stationery", "Utilities"][n % 3],
        };
        db.finance()
            .create_entry(
                &admin,
                kind,
                &LedgerEntryInput {
                    amount: Money::from_major(1_000_000 + (n as i64 * 250_000)),
                    subject: subject.to_string(),
                    date: day(n * 30),
                    description: None,
                },
            )
            .await?;
    }
    for (idx, member) in staff.iter().enumerate() {
        for (month, is_paid) in [(0u64, true), (1, false)] {
            db.finance()
                .create_salary(
                    &admin,
                    &SalaryInput {
                        employee_id: member.user_id,
                        date: day(month as usize * 30 + 25),
                        amount: Money::from_major(150_000_000 + idx as i64 * 10_000_000),
                        is_paid,
                        description: None,
                    },
                )
                .await?;
        }
    }
    println!("✓ Created finance records");

    let elapsed = start.elapsed();
    println!();
    println!("✓ Seed complete in {:?}", elapsed);
    println!("  Log in as 'admin' with the configured password.");

    Ok(())
}

/// Deterministic date within 2024.
fn day(offset: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.checked_add_days(Days::new((offset % 366) as u64)))
        .unwrap_or_default()
}

fn generate_person(seed: usize) -> PersonInput {
    let first = FIRST_NAMES[seed % FIRST_NAMES.len()];
    let last = LAST_NAMES[(seed / FIRST_NAMES.len()) % LAST_NAMES.len()];

    PersonInput {
        first_name: first.to_string(),
        last_name: last.to_string(),
        phone_number: format!("0912{:07}", seed % 10_000_000),
        phone_number_optional: None,
        national_id: format!("{:010}", 1_000_000_000 + seed as u64 * 7919),
        address: format!("No. {}, Valiasr St, Tehran", seed % 300 + 1),
        description: None,
    }
}

fn generate_invoice(person_id: i64, services: &[ServiceRef], seed: usize) -> InvoiceInput {
    // Every tenth invoice uses a freeform service.
    let service = if seed % 10 == 9 || services.is_empty() {
        ServiceRef::Other("Translation of documents".to_string())
    } else {
        services[seed % services.len()].clone()
    };

    InvoiceInput {
        person_id,
        invoice_date: day(seed * 13),
        service,
        price: Money::from_major(5_000_000 + ((seed * 17) % 90) as i64 * 1_000_000),
        settlement_type: if seed % 3 == 0 {
            SettlementType::Conditional
        } else {
            SettlementType::Cash
        },
        description: None,
    }
}
