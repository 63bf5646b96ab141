//! Property-based tests for the account tree.
//!
//! Forests are generated by giving node `i` either no parent or a parent
//! drawn from nodes `0..i`, which keeps the stored links acyclic.

use std::collections::{HashMap, HashSet};

use proptest::prelude::*;
use fiscus_shared::types::{AccountId, OrganizationId};

use super::error::AccountError;
use super::hierarchy::{AccountTree, validate_reparent};
use super::types::{Account, AccountType};

fn forest_strategy() -> impl Strategy<Value = Vec<Option<usize>>> {
    prop::collection::vec(any::<Option<prop::sample::Index>>(), 1..40).prop_map(|links| {
        links
            .into_iter()
            .enumerate()
            .map(|(i, link)| match link {
                Some(idx) if i > 0 => Some(idx.index(i)),
                _ => None,
            })
            .collect()
    })
}

fn build_forest(links: &[Option<usize>]) -> Vec<Account> {
    let ids: Vec<AccountId> = links.iter().map(|_| AccountId::new()).collect();
    links
        .iter()
        .enumerate()
        .map(|(i, parent)| Account {
            id: ids[i],
            organization_id: OrganizationId::from_uuid(uuid::Uuid::nil()),
            code: format!("{i:04}"),
            name: format!("Node {i}"),
            account_type: AccountType::Asset,
            parent_id: parent.map(|p| ids[p]),
            is_parent: true,
            is_active: true,
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* forest, the pre-order walk visits every account exactly
    /// once, parents before children, with depth = parent depth + 1.
    #[test]
    fn prop_preorder_visits_each_node_once(links in forest_strategy()) {
        let accounts = build_forest(&links);
        let tree = AccountTree::build(accounts.clone()).unwrap();
        let order = tree.preorder();

        prop_assert_eq!(order.len(), accounts.len());
        let position: HashMap<AccountId, usize> =
            order.iter().enumerate().map(|(pos, (id, _))| (*id, pos)).collect();
        prop_assert_eq!(position.len(), accounts.len());
        let depth: HashMap<AccountId, usize> = order.iter().copied().collect();

        for account in &accounts {
            match account.parent_id {
                Some(parent) => {
                    prop_assert!(position[&parent] < position[&account.id]);
                    prop_assert_eq!(depth[&account.id], depth[&parent] + 1);
                }
                None => prop_assert_eq!(depth[&account.id], 0),
            }
            prop_assert_eq!(tree.ancestors(account.id).count(), depth[&account.id]);
        }
    }

    /// *For any* forest, the leaf descendants of a node are exactly the
    /// leaves whose ancestor chain contains it.
    #[test]
    fn prop_leaf_descendants_match_ancestor_chains(links in forest_strategy()) {
        let accounts = build_forest(&links);
        let tree = AccountTree::build(accounts.clone()).unwrap();

        for node in &accounts {
            let got: HashSet<AccountId> = tree.leaf_descendants(node.id).into_iter().collect();
            let expected: HashSet<AccountId> = accounts
                .iter()
                .filter(|a| tree.is_leaf(a.id))
                .filter(|a| a.id == node.id || tree.ancestors(a.id).any(|x| x == node.id))
                .map(|a| a.id)
                .collect();
            prop_assert_eq!(got, expected);
        }
    }

    /// *For any* node and any of its descendants, moving the node under the
    /// descendant is rejected as a cycle.
    #[test]
    fn prop_reparent_under_descendant_is_cycle(links in forest_strategy()) {
        let accounts = build_forest(&links);
        let tree = AccountTree::build(accounts.clone()).unwrap();

        for node in &accounts {
            for (descendant, _) in tree.subtree(node.id).into_iter().skip(1) {
                let result = validate_reparent(&tree, node.id, Some(descendant));
                prop_assert!(
                    matches!(result, Err(AccountError::Cycle { .. })),
                    "expected cycle rejection"
                );
            }
        }
    }
}
