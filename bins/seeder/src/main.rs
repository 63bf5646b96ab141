//! Database seeder for Fiscus development and testing.
//!
//! Seeds a demo organization with a calendar fiscal year, its monthly
//! periods, a small chart of accounts and an opening entry. The year and the
//! current month are activated so entries can be posted right away.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use fiscus_core::account::{Account, AccountType, CodeGenerator, NewAccount};
use fiscus_core::auth::{Actor, UserRole};
use fiscus_core::fiscal::{FiscalYearType, NewFiscalYear, PeriodAction, PeriodScope};
use fiscus_core::ledger::{NewJournalEntry, PostingLine};
use fiscus_db::{AccountRepository, FiscalRepository, JournalRepository, PeriodTransition};
use fiscus_shared::types::{OrganizationId, UserId};

/// Demo organization ID (consistent for all seeds)
const DEMO_ORG_ID: Uuid = Uuid::from_u128(1);
/// Demo administrator ID (consistent for all seeds)
const DEMO_USER_ID: Uuid = Uuid::from_u128(2);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL must be set in environment")?;

    println!("Connecting to database...");
    let db = fiscus_db::connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    let org = OrganizationId::from_uuid(DEMO_ORG_ID);
    let admin = Actor::new(UserId::from_uuid(DEMO_USER_ID), UserRole::Admin);
    let fiscal = FiscalRepository::new(db.clone());

    if !fiscal.list_fiscal_years(org).await?.is_empty() {
        println!("  Demo organization already seeded, skipping...");
        return Ok(());
    }

    let today = Utc::now().date_naive();
    println!("Seeding fiscal year {}...", today.year());
    seed_calendar(&fiscal, &admin, org, today).await?;

    println!("Seeding chart of accounts...");
    let accounts = AccountRepository::new(db.clone(), CodeGenerator::default());
    let chart = seed_accounts(&accounts, &admin, org).await?;

    println!("Seeding opening entry...");
    let journal = JournalRepository::new(db);
    journal
        .post(
            &admin,
            org,
            &NewJournalEntry {
                entry_date: today,
                description: Some("Opening balances".to_string()),
                lines: vec![
                    line(&chart.cash, Decimal::new(150_000, 2), Decimal::ZERO),
                    line(&chart.bank, Decimal::new(2_350_000, 2), Decimal::ZERO),
                    line(&chart.capital, Decimal::ZERO, Decimal::new(2_500_000, 2)),
                ],
            },
        )
        .await?;

    println!("Seeding complete!");
    Ok(())
}

async fn seed_calendar(
    fiscal: &FiscalRepository,
    admin: &Actor,
    org: OrganizationId,
    today: NaiveDate,
) -> anyhow::Result<()> {
    let year = today.year();
    let (start_date, end_date) = FiscalYearType::Calendar
        .span_starting(year)
        .context("Calendar year out of range")?;
    let fy = fiscal
        .create_fiscal_year(
            admin,
            org,
            NewFiscalYear {
                name: format!("FY{year}"),
                start_date,
                end_date,
                fiscal_year_type: FiscalYearType::Calendar,
            },
        )
        .await?;
    let periods = fiscal.initialize_periods(admin, org, fy.id).await?;

    fiscal
        .transition(
            admin,
            org,
            &PeriodTransition {
                scope: PeriodScope::FiscalYear,
                period_id: fy.id.into_inner(),
                action: PeriodAction::Activate,
                reason: None,
            },
        )
        .await?;
    let current = periods
        .iter()
        .find(|p| p.contains_date(today))
        .context("No period covers today")?;
    fiscal
        .transition(
            admin,
            org,
            &PeriodTransition {
                scope: PeriodScope::MonthlyPeriod,
                period_id: current.id.into_inner(),
                action: PeriodAction::Activate,
                reason: None,
            },
        )
        .await?;
    println!("  Activated {}", current.name);
    Ok(())
}

struct Chart {
    cash: Account,
    bank: Account,
    capital: Account,
}

async fn seed_accounts(
    accounts: &AccountRepository,
    admin: &Actor,
    org: OrganizationId,
) -> anyhow::Result<Chart> {
    let open = |name: &str, account_type, parent: Option<&Account>, is_parent| NewAccount {
        name: name.to_string(),
        account_type,
        parent_id: parent.map(|p| p.id),
        is_parent,
    };

    let current = accounts
        .create(admin, org, open("Current assets", AccountType::Asset, None, true))
        .await?;
    let cash = accounts
        .create(admin, org, open("Cash", AccountType::Asset, Some(&current), false))
        .await?;
    let bank = accounts
        .create(admin, org, open("Bank", AccountType::Asset, Some(&current), false))
        .await?;
    accounts
        .create(admin, org, open("Accounts payable", AccountType::Liability, None, false))
        .await?;
    let capital = accounts
        .create(admin, org, open("Share capital", AccountType::Equity, None, false))
        .await?;
    accounts
        .create(admin, org, open("Sales", AccountType::Income, None, false))
        .await?;
    accounts
        .create(admin, org, open("Rent", AccountType::Expense, None, false))
        .await?;

    for account in [&current, &cash, &bank, &capital] {
        println!("  {} {}", account.code, account.name);
    }
    Ok(Chart { cash, bank, capital })
}

fn line(account: &Account, debit: Decimal, credit: Decimal) -> PostingLine {
    PostingLine {
        account_id: account.id,
        debit,
        credit,
        description: None,
    }
}
