//! Core business logic for Fiscus.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `account` - Chart of accounts hierarchy and code generation
//! - `auth` - Roles and permissions of acting users
//! - `fiscal` - Fiscal years, monthly periods and their lifecycle
//! - `ledger` - Journal entries and the posting guard
//! - `reports` - Trial balance aggregation and balance verification
//! - `error` - Error taxonomy shared by every module

pub mod account;
pub mod auth;
pub mod error;
pub mod fiscal;
pub mod ledger;
pub mod reports;

pub use error::{DomainError, ErrorKind};
