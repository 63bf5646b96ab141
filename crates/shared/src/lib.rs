//! Shared types, errors, and configuration for Fiscus.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Decimal money helpers (presentation rounding, string boundary)
//! - Application-wide error types
//! - Configuration management
//! - JWT claims and token service

pub mod config;
pub mod error;
pub mod jwt;
pub mod types;

pub use config::{AccountCodeConfig, AppConfig, LedgerConfig};
pub use error::{AppError, AppResult};
pub use jwt::{Claims, JwtError, JwtService, TokenSettings};
