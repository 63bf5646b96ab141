//! Chart of accounts: types, hierarchy resolution, and code generation.
//!
//! - `types` - account classification and normal-balance nature
//! - `hierarchy` - arena-backed tree, traversal, parent and cycle checks
//! - `code` - hierarchical code allocation with collision retry

pub mod code;
pub mod error;
pub mod hierarchy;
pub mod types;

#[cfg(test)]
mod code_props;
#[cfg(test)]
mod hierarchy_props;

pub use code::{CodeGenerator, CodeSlot, rebase_subtree_codes};
pub use error::AccountError;
pub use hierarchy::{
    AccountTree, validate_new_account, validate_parent_candidate, validate_reparent,
};
pub use types::{Account, AccountType, Nature, NewAccount};
