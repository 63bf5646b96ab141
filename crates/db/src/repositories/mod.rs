//! Repository abstractions for data access.
//!
//! Repositories load state, hand it to the core for a decision, and persist
//! the outcome in one transaction per write. They hide the `SeaORM`
//! implementation details from the rest of the application.

pub mod account;
pub mod fiscal;
pub mod journal;
pub mod report;

pub use account::{AccountNode, AccountRepository};
pub use fiscal::{FiscalRepository, FiscalYearWithPeriods, PeriodContext, PeriodTransition};
pub use journal::{JournalEntryWithItems, JournalRepository};
pub use report::ReportRepository;
