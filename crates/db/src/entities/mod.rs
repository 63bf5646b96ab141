//! `SeaORM` entity definitions.

#![allow(missing_docs)]

pub mod prelude;

pub mod accounts;
pub mod fiscal_years;
pub mod journal_entries;
pub mod journal_entry_items;
pub mod monthly_periods;
pub mod period_audit_log;
pub mod sea_orm_active_enums;
