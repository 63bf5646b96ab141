//! Hierarchical account code generation.
//!
//! Root codes are a type prefix digit followed by a zero-padded sequence
//! (`1000000`, `1000001`, ...). A subaccount appends a zero-padded suffix to
//! its parent's code (`100000001`, `100000002`, ...), so every code starts
//! with the code of each of its ancestors.

use std::collections::HashSet;

use rand::Rng;
use fiscus_shared::AccountCodeConfig;
use fiscus_shared::types::AccountId;

use super::error::AccountError;
use super::hierarchy::AccountTree;
use super::types::AccountType;

/// Where a new code is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeSlot<'a> {
    /// A top-level account of the given type.
    Root(AccountType),
    /// A subaccount of the account with the given code.
    Child(&'a str),
}

/// Allocates account codes within a fixed layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeGenerator {
    root_width: usize,
    suffix_width: usize,
    max_attempts: u32,
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self {
            root_width: 7,
            suffix_width: 2,
            max_attempts: 5,
        }
    }
}

impl CodeGenerator {
    /// Creates a generator.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::InvalidCodeLayout` unless `root_width` is in
    /// 2..=18, `suffix_width` in 1..=9, and `max_attempts` is at least 1.
    pub fn new(
        root_width: usize,
        suffix_width: usize,
        max_attempts: u32,
    ) -> Result<Self, AccountError> {
        if !(2..=18).contains(&root_width) {
            return Err(AccountError::InvalidCodeLayout(format!(
                "root code width {root_width} outside 2..=18"
            )));
        }
        if !(1..=9).contains(&suffix_width) {
            return Err(AccountError::InvalidCodeLayout(format!(
                "child suffix width {suffix_width} outside 1..=9"
            )));
        }
        if max_attempts == 0 {
            return Err(AccountError::InvalidCodeLayout(
                "at least one allocation attempt is required".to_string(),
            ));
        }
        Ok(Self {
            root_width,
            suffix_width,
            max_attempts,
        })
    }

    /// Creates a generator from application configuration.
    pub fn from_config(cfg: &AccountCodeConfig) -> Result<Self, AccountError> {
        Self::new(
            cfg.root_code_width,
            cfg.child_suffix_width,
            cfg.max_code_attempts,
        )
    }

    /// Maximum number of candidates tried per allocation.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Sequential root code: `<prefix>000000` for the first root of a type,
    /// otherwise one past the highest existing root sequence of that type.
    pub fn next_root_code(
        &self,
        account_type: AccountType,
        existing: &HashSet<String>,
    ) -> Result<String, AccountError> {
        let prefix = account_type.code_prefix();
        let seq_width = self.root_width - 1;
        let next = existing
            .iter()
            .filter_map(|code| self.root_sequence(code, prefix))
            .max()
            .map_or(0, |max| max + 1);
        if next >= capacity(seq_width) {
            return Err(AccountError::CodeSpaceExhausted(prefix.to_string()));
        }
        Ok(format!("{prefix}{next:0seq_width$}"))
    }

    /// Sequential child code: the parent code plus one past the highest
    /// existing sibling suffix (starting at 1).
    pub fn next_child_code(
        &self,
        parent_code: &str,
        existing: &HashSet<String>,
    ) -> Result<String, AccountError> {
        let width = self.suffix_width;
        let next = existing
            .iter()
            .filter_map(|code| self.child_suffix(code, parent_code))
            .max()
            .map_or(1, |max| max + 1);
        if next >= capacity(width) {
            return Err(AccountError::CodeSpaceExhausted(parent_code.to_string()));
        }
        Ok(format!("{parent_code}{next:0width$}"))
    }

    /// Candidate code for the given attempt.
    ///
    /// Attempt 0 yields the sequential code; later attempts draw a random
    /// code in the same slot.
    ///
    /// # Errors
    ///
    /// `CodeSpaceExhausted` when the slot has no sequential code left.
    pub fn candidate<R: Rng + ?Sized>(
        &self,
        slot: CodeSlot<'_>,
        existing: &HashSet<String>,
        attempt: u32,
        rng: &mut R,
    ) -> Result<String, AccountError> {
        if attempt > 0 {
            return Ok(self.random_candidate(slot, rng));
        }
        match slot {
            CodeSlot::Root(account_type) => self.next_root_code(account_type, existing),
            CodeSlot::Child(parent_code) => self.next_child_code(parent_code, existing),
        }
    }

    fn random_candidate<R: Rng + ?Sized>(&self, slot: CodeSlot<'_>, rng: &mut R) -> String {
        match slot {
            CodeSlot::Root(account_type) => {
                let seq_width = self.root_width - 1;
                let seq = rng.random_range(0..capacity(seq_width));
                format!("{}{seq:0seq_width$}", account_type.code_prefix())
            }
            CodeSlot::Child(parent_code) => {
                let width = self.suffix_width;
                let suffix = rng.random_range(1..capacity(width));
                format!("{parent_code}{suffix:0width$}")
            }
        }
    }

    fn root_sequence(&self, code: &str, prefix: char) -> Option<u64> {
        let rest = code.strip_prefix(prefix)?;
        if code.len() != self.root_width || !rest.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        rest.parse().ok()
    }

    fn child_suffix(&self, code: &str, parent_code: &str) -> Option<u64> {
        let suffix = code.strip_prefix(parent_code)?;
        if suffix.len() != self.suffix_width || !suffix.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        suffix.parse().ok()
    }
}

/// New codes for the subtree rooted at `account_id` once that account is
/// assigned `new_code`. Descendants keep their suffixes relative to the
/// moved account, so the prefix invariant survives the move.
#[must_use]
pub fn rebase_subtree_codes(
    tree: &AccountTree,
    account_id: AccountId,
    new_code: &str,
) -> Vec<(AccountId, String)> {
    let Some(old_code) = tree.get(account_id).map(|a| a.code.as_str()) else {
        return Vec::new();
    };
    tree.subtree(account_id)
        .into_iter()
        .filter_map(|(id, _)| {
            let code = &tree.get(id)?.code;
            let tail = code.strip_prefix(old_code).unwrap_or(code.as_str());
            Some((id, format!("{new_code}{tail}")))
        })
        .collect()
}

fn capacity(width: usize) -> u64 {
    u32::try_from(width)
        .ok()
        .and_then(|w| 10u64.checked_pow(w))
        .unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::hierarchy::tests::account;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn codes(list: &[&str]) -> HashSet<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_first_root_code_per_type() {
        let generator = CodeGenerator::default();
        let none = HashSet::new();
        assert_eq!(
            generator.next_root_code(AccountType::Asset, &none).unwrap(),
            "1000000"
        );
        assert_eq!(
            generator.next_root_code(AccountType::Memo, &none).unwrap(),
            "9000000"
        );
    }

    #[test]
    fn test_next_root_code_ignores_other_types_and_children() {
        let generator = CodeGenerator::default();
        let existing = codes(&["1000000", "1000003", "100000301", "2000007"]);
        assert_eq!(
            generator.next_root_code(AccountType::Asset, &existing).unwrap(),
            "1000004"
        );
        assert_eq!(
            generator
                .next_root_code(AccountType::Liability, &existing)
                .unwrap(),
            "2000008"
        );
    }

    #[test]
    fn test_child_codes_follow_highest_sibling() {
        let generator = CodeGenerator::default();
        let existing = codes(&["1000000", "100000001", "100000004", "10000000401"]);
        assert_eq!(
            generator.next_child_code("1000000", &existing).unwrap(),
            "100000005"
        );
        assert_eq!(
            generator.next_child_code("100000001", &existing).unwrap(),
            "10000000101"
        );
    }

    #[test]
    fn test_suffix_space_exhausted() {
        let generator = CodeGenerator::new(7, 1, 5).unwrap();
        let existing = codes(&["1000000", "10000009"]);
        assert!(matches!(
            generator.next_child_code("1000000", &existing),
            Err(AccountError::CodeSpaceExhausted(p)) if p == "1000000"
        ));
    }

    #[test]
    fn test_root_space_exhausted() {
        let generator = CodeGenerator::new(2, 2, 5).unwrap();
        let existing = codes(&["19"]);
        assert!(matches!(
            generator.next_root_code(AccountType::Asset, &existing),
            Err(AccountError::CodeSpaceExhausted(_))
        ));
    }

    #[test]
    fn test_retry_attempts_draw_random_codes_in_slot() {
        let generator = CodeGenerator::default();
        let mut rng = StdRng::seed_from_u64(7);
        let existing = codes(&["1000000", "100000001"]);

        let first = generator
            .candidate(CodeSlot::Child("1000000"), &existing, 0, &mut rng)
            .unwrap();
        assert_eq!(first, "100000002");
        for attempt in 1..generator.max_attempts() {
            let code = generator
                .candidate(CodeSlot::Child("1000000"), &existing, attempt, &mut rng)
                .unwrap();
            assert!(code.starts_with("1000000"));
            assert_eq!(code.len(), 9);
            assert_ne!(&code[7..], "00");
        }
    }

    #[test]
    fn test_random_root_candidates_keep_prefix_and_width() {
        let generator = CodeGenerator::new(7, 2, 4).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let none = HashSet::new();

        let tried: Vec<String> = (0..generator.max_attempts())
            .map(|attempt| {
                generator
                    .candidate(CodeSlot::Root(AccountType::Asset), &none, attempt, &mut rng)
                    .unwrap()
            })
            .collect();
        assert_eq!(tried[0], "1000000");
        assert!(tried.iter().all(|c| c.len() == 7 && c.starts_with('1')));
    }

    #[test]
    fn test_invalid_layouts() {
        assert!(CodeGenerator::new(1, 2, 5).is_err());
        assert!(CodeGenerator::new(7, 0, 5).is_err());
        assert!(CodeGenerator::new(7, 2, 0).is_err());
        assert!(CodeGenerator::from_config(&AccountCodeConfig::default()).is_ok());
    }

    #[test]
    fn test_rebase_subtree_keeps_relative_suffixes() {
        let assets = account("1000000", AccountType::Asset, None, true);
        let cash = account("100000001", AccountType::Asset, Some(&assets), true);
        let petty = account("10000000101", AccountType::Asset, Some(&cash), false);
        let tree = AccountTree::build(vec![assets, cash.clone(), petty.clone()]).unwrap();

        let rebased = rebase_subtree_codes(&tree, cash.id, "100000007");
        assert_eq!(
            rebased,
            vec![
                (cash.id, "100000007".to_string()),
                (petty.id, "10000000701".to_string()),
            ]
        );
    }
}
