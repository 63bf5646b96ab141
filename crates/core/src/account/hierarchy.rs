//! Account tree navigation and parent validation.
//!
//! Accounts live in an arena keyed by id. Each node keeps its parent
//! reference and a separate children index, sorted by code, drives
//! traversal. Every walk uses an explicit stack, so hierarchy depth is never
//! bounded by the call stack.

use std::collections::{HashMap, HashSet};

use fiscus_shared::types::AccountId;

use super::error::AccountError;
use super::types::{Account, AccountType, NewAccount};

/// Arena-backed account forest.
#[derive(Debug, Clone, Default)]
pub struct AccountTree {
    nodes: HashMap<AccountId, Account>,
    children: HashMap<AccountId, Vec<AccountId>>,
    roots: Vec<AccountId>,
}

impl AccountTree {
    /// Builds the tree from a set of accounts.
    ///
    /// An account whose parent is not part of the set is treated as a root.
    /// Siblings and roots are ordered by code.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::CorruptHierarchy` if stored parent links form
    /// a cycle.
    pub fn build(accounts: impl IntoIterator<Item = Account>) -> Result<Self, AccountError> {
        let nodes: HashMap<AccountId, Account> =
            accounts.into_iter().map(|a| (a.id, a)).collect();

        let mut children: HashMap<AccountId, Vec<AccountId>> = HashMap::new();
        let mut roots = Vec::new();
        for account in nodes.values() {
            match account.parent_id.filter(|p| nodes.contains_key(p)) {
                Some(parent) => children.entry(parent).or_default().push(account.id),
                None => roots.push(account.id),
            }
        }

        let by_code = |a: &AccountId, b: &AccountId| {
            nodes[a].code.cmp(&nodes[b].code).then_with(|| a.cmp(b))
        };
        roots.sort_by(by_code);
        for siblings in children.values_mut() {
            siblings.sort_by(by_code);
        }

        let tree = Self {
            nodes,
            children,
            roots,
        };

        // Anything unreachable from a root hangs off a parent cycle.
        let order = tree.preorder();
        if order.len() != tree.nodes.len() {
            let reached: HashSet<AccountId> = order.into_iter().map(|(id, _)| id).collect();
            let culprit = tree
                .nodes
                .keys()
                .filter(|id| !reached.contains(id))
                .min()
                .copied();
            if let Some(id) = culprit {
                return Err(AccountError::CorruptHierarchy(id));
            }
        }

        Ok(tree)
    }

    /// Number of accounts in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree holds no accounts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns true if the account is part of the tree.
    #[must_use]
    pub fn contains(&self, id: AccountId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Looks up an account.
    #[must_use]
    pub fn get(&self, id: AccountId) -> Option<&Account> {
        self.nodes.get(&id)
    }

    /// Root accounts, ordered by code.
    #[must_use]
    pub fn roots(&self) -> &[AccountId] {
        &self.roots
    }

    /// Direct children of an account, ordered by code.
    #[must_use]
    pub fn children(&self, id: AccountId) -> &[AccountId] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns true if the account has no children in this tree.
    #[must_use]
    pub fn is_leaf(&self, id: AccountId) -> bool {
        self.children(id).is_empty()
    }

    /// Parent of an account, if the parent is part of this tree.
    #[must_use]
    pub fn parent_of(&self, id: AccountId) -> Option<AccountId> {
        self.nodes
            .get(&id)
            .and_then(|a| a.parent_id)
            .filter(|p| self.nodes.contains_key(p))
    }

    /// Depth-first pre-order walk over the whole forest with node depths.
    ///
    /// Parents always precede their descendants.
    #[must_use]
    pub fn preorder(&self) -> Vec<(AccountId, usize)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(AccountId, usize)> =
            self.roots.iter().rev().map(|id| (*id, 0)).collect();
        while let Some((id, depth)) = stack.pop() {
            out.push((id, depth));
            stack.extend(self.children(id).iter().rev().map(|c| (*c, depth + 1)));
        }
        out
    }

    /// Pre-order walk of the subtree rooted at `id`, the root included,
    /// with depths relative to `id`.
    #[must_use]
    pub fn subtree(&self, id: AccountId) -> Vec<(AccountId, usize)> {
        if !self.contains(id) {
            return Vec::new();
        }
        let mut out = Vec::new();
        let mut stack = vec![(id, 0)];
        while let Some((node, depth)) = stack.pop() {
            out.push((node, depth));
            stack.extend(self.children(node).iter().rev().map(|c| (*c, depth + 1)));
        }
        out
    }

    /// Leaf accounts below `id`. A leaf is its own only leaf descendant.
    #[must_use]
    pub fn leaf_descendants(&self, id: AccountId) -> Vec<AccountId> {
        self.subtree(id)
            .into_iter()
            .map(|(node, _)| node)
            .filter(|node| self.is_leaf(*node))
            .collect()
    }

    /// Iterates the ancestors of `id`, nearest first.
    #[must_use]
    pub fn ancestors(&self, id: AccountId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent_of(id),
            remaining: self.nodes.len(),
        }
    }

    /// Returns true if placing `account` under `new_parent` would make the
    /// account its own ancestor.
    #[must_use]
    pub fn would_create_cycle(&self, account: AccountId, new_parent: AccountId) -> bool {
        account == new_parent || self.ancestors(new_parent).any(|a| a == account)
    }
}

/// Iterator over an account's ancestors.
#[derive(Debug)]
pub struct Ancestors<'a> {
    tree: &'a AccountTree,
    next: Option<AccountId>,
    remaining: usize,
}

impl Iterator for Ancestors<'_> {
    type Item = AccountId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.next = self.tree.parent_of(current);
        Some(current)
    }
}

/// Checks that `parent` may receive a child of `child_type`.
///
/// The parent must exist, be a group account, be active, and share the
/// child's type. The first failed condition is reported.
pub fn validate_parent_candidate(
    child_type: AccountType,
    parent_id: AccountId,
    parent: Option<&Account>,
) -> Result<(), AccountError> {
    let parent = parent.ok_or(AccountError::ParentNotFound(parent_id))?;
    if !parent.is_parent {
        return Err(AccountError::ParentNotGroup(parent_id));
    }
    if !parent.is_active {
        return Err(AccountError::ParentInactive(parent_id));
    }
    if parent.account_type != child_type {
        return Err(AccountError::TypeMismatch {
            child: child_type,
            parent: parent.account_type,
        });
    }
    Ok(())
}

/// Checks a new account request against its resolved parent.
///
/// `parent` is the account named by `input.parent_id`, if it was found.
pub fn validate_new_account(
    input: &NewAccount,
    parent: Option<&Account>,
) -> Result<(), AccountError> {
    if input.name.trim().is_empty() {
        return Err(AccountError::EmptyName);
    }
    match input.parent_id {
        Some(parent_id) => validate_parent_candidate(input.account_type, parent_id, parent),
        None => Ok(()),
    }
}

/// Checks a move of `account_id` under `new_parent` (or to the top level).
///
/// `tree` must contain every account of the organization, inactive ones
/// included, so that indirect cycles are seen.
pub fn validate_reparent(
    tree: &AccountTree,
    account_id: AccountId,
    new_parent: Option<AccountId>,
) -> Result<(), AccountError> {
    let account = tree
        .get(account_id)
        .ok_or(AccountError::NotFound(account_id))?;
    let Some(parent_id) = new_parent else {
        return Ok(());
    };
    if parent_id == account_id {
        return Err(AccountError::SelfParent(account_id));
    }
    validate_parent_candidate(account.account_type, parent_id, tree.get(parent_id))?;
    if tree.would_create_cycle(account_id, parent_id) {
        return Err(AccountError::Cycle {
            account: account_id,
            parent: parent_id,
        });
    }
    Ok(())
}
