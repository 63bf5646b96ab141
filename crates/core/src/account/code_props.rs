//! Property-based tests for account code generation.
//!
//! - Generated codes are unique across the chart
//! - Every subaccount code is prefixed by its parent's code

use std::collections::{HashMap, HashSet};

use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::code::{CodeGenerator, CodeSlot};
use super::types::AccountType;

/// One creation step: a root of some type, or a child under the n-th
/// existing account (modulo the number of accounts).
#[derive(Debug, Clone)]
enum Step {
    Root(AccountType),
    Child(usize),
}

fn account_type_strategy() -> impl Strategy<Value = AccountType> {
    prop::sample::select(AccountType::ALL.to_vec())
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        1 => account_type_strategy().prop_map(Step::Root),
        3 => any::<usize>().prop_map(Step::Child),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* sequence of account creations, no two accounts share a
    /// code and each child's code starts with its parent's code.
    #[test]
    fn prop_codes_unique_and_prefixed(
        steps in prop::collection::vec(step_strategy(), 1..40),
        seed in any::<u64>(),
    ) {
        let generator = CodeGenerator::default();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut codes: Vec<String> = Vec::new();
        let mut parent_of: HashMap<usize, usize> = HashMap::new();
        let mut existing: HashSet<String> = HashSet::new();

        for step in steps {
            let (slot, parent) = match step {
                Step::Child(n) if !codes.is_empty() => {
                    let parent = n % codes.len();
                    (CodeSlot::Child(codes[parent].as_str()), Some(parent))
                }
                Step::Child(_) => (CodeSlot::Root(AccountType::Asset), None),
                Step::Root(account_type) => (CodeSlot::Root(account_type), None),
            };
            let code = generator.candidate(slot, &existing, 0, &mut rng).unwrap();
            prop_assert!(existing.insert(code.clone()), "duplicate code {}", code);
            if let Some(parent) = parent {
                parent_of.insert(codes.len(), parent);
            }
            codes.push(code);
        }

        for (child, parent) in &parent_of {
            prop_assert!(
                codes[*child].starts_with(&codes[*parent]),
                "{} is not prefixed by {}",
                codes[*child],
                codes[*parent]
            );
        }
    }

    /// *For any* root type, the sequential root code carries the type's
    /// prefix digit and the configured width.
    #[test]
    fn prop_root_codes_carry_type_prefix(
        account_type in account_type_strategy(),
        count in 1usize..20,
    ) {
        let generator = CodeGenerator::default();
        let mut existing = HashSet::new();
        for expected_seq in 0..count {
            let code = generator.next_root_code(account_type, &existing).unwrap();
            prop_assert_eq!(code.len(), 7);
            prop_assert!(code.starts_with(account_type.code_prefix()));
            prop_assert_eq!(code[1..].parse::<usize>().unwrap(), expected_seq);
            existing.insert(code);
        }
    }
}
