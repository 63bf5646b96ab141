//! Chart of accounts repository.
//!
//! Codes come from the core generator. The unique index on
//! `(organization_id, code)` is the final arbiter: a candidate that loses a
//! race is rolled back to a savepoint and the next candidate is tried.

use std::collections::HashSet;

use rand::SeedableRng;
use rand::rngs::StdRng;
use sea_orm::ActiveValue::{Set, Unchanged};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use fiscus_core::DomainError;
use fiscus_core::account::{
    Account, AccountError, AccountTree, CodeGenerator, CodeSlot, NewAccount,
    rebase_subtree_codes, validate_new_account, validate_reparent,
};
use fiscus_core::auth::{Actor, Permission};
use fiscus_shared::types::{AccountId, OrganizationId};

use crate::convert;
use crate::entities::accounts;
use crate::error::{RepositoryError, is_unique_violation};

/// An account with its depth in the hierarchy.
#[derive(Debug, Clone, Serialize)]
pub struct AccountNode {
    /// The account.
    #[serde(flatten)]
    pub account: Account,
    /// Zero for top-level accounts.
    pub depth: usize,
}

/// Chart of accounts repository.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
    codes: CodeGenerator,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, codes: CodeGenerator) -> Self {
        Self { db, codes }
    }

    /// Opens an account with a generated hierarchical code.
    pub async fn create(
        &self,
        actor: &Actor,
        organization_id: OrganizationId,
        input: NewAccount,
    ) -> Result<Account, RepositoryError> {
        actor.require(Permission::ManageAccounts)?;
        let txn = self.db.begin().await?;

        let parent = match input.parent_id {
            Some(parent_id) => accounts::Entity::find_by_id(parent_id.into_inner())
                .filter(accounts::Column::OrganizationId.eq(organization_id.into_inner()))
                .lock_exclusive()
                .one(&txn)
                .await?
                .map(Account::from),
            None => None,
        };
        if let Err(e) = validate_new_account(&input, parent.as_ref()) {
            warn!(
                organization_id = %organization_id,
                actor_id = %actor.user_id,
                error_code = e.error_code(),
                "Account rejected"
            );
            return Err(e.into());
        }

        let existing = codes_of(&txn, organization_id).await?;
        let slot = parent
            .as_ref()
            .map_or(CodeSlot::Root(input.account_type), |p| {
                CodeSlot::Child(p.code.as_str())
            });
        let mut rng = StdRng::from_os_rng();

        for attempt in 0..self.codes.max_attempts() {
            let code = self.codes.candidate(slot, &existing, attempt, &mut rng)?;
            if existing.contains(&code) {
                continue;
            }
            let account = Account {
                id: AccountId::new(),
                organization_id,
                code,
                name: input.name.trim().to_string(),
                account_type: input.account_type,
                parent_id: input.parent_id,
                is_parent: input.is_parent,
                is_active: true,
            };

            let savepoint = txn.begin().await?;
            match convert::new_account(&account).insert(&savepoint).await {
                Ok(_) => {
                    savepoint.commit().await?;
                    txn.commit().await?;
                    info!(
                        account_id = %account.id,
                        code = %account.code,
                        account_type = account.account_type.as_str(),
                        actor_id = %actor.user_id,
                        "Account created"
                    );
                    return Ok(account);
                }
                Err(e) if is_unique_violation(&e) => {
                    savepoint.rollback().await?;
                    debug!(code = %account.code, attempt, "Account code taken, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        warn!(
            organization_id = %organization_id,
            attempts = self.codes.max_attempts(),
            "Account code allocation exhausted"
        );
        Err(AccountError::CodeCollision(self.codes.max_attempts()).into())
    }

    /// Moves an account (and its subtree) under `new_parent`, or to the top
    /// level, re-coding the subtree so every code keeps its parent's prefix.
    pub async fn reparent(
        &self,
        actor: &Actor,
        organization_id: OrganizationId,
        account_id: AccountId,
        new_parent: Option<AccountId>,
    ) -> Result<Account, RepositoryError> {
        actor.require(Permission::ManageAccounts)?;
        let txn = self.db.begin().await?;

        let all: Vec<Account> = accounts::Entity::find()
            .filter(accounts::Column::OrganizationId.eq(organization_id.into_inner()))
            .lock_exclusive()
            .all(&txn)
            .await?
            .into_iter()
            .map(Account::from)
            .collect();
        let existing: HashSet<String> = all.iter().map(|a| a.code.clone()).collect();
        let tree = AccountTree::build(all)?;

        if let Err(e) = validate_reparent(&tree, account_id, new_parent) {
            warn!(
                account_id = %account_id,
                actor_id = %actor.user_id,
                error_code = e.error_code(),
                "Account move rejected"
            );
            return Err(e.into());
        }
        let account = tree
            .get(account_id)
            .cloned()
            .ok_or(AccountError::NotFound(account_id))?;
        if account.parent_id == new_parent {
            return Ok(account);
        }

        let slot = match new_parent.and_then(|id| tree.get(id)) {
            Some(parent) => CodeSlot::Child(parent.code.as_str()),
            None => CodeSlot::Root(account.account_type),
        };
        let subtree: HashSet<AccountId> =
            tree.subtree(account_id).into_iter().map(|(id, _)| id).collect();
        let outside: HashSet<&str> = tree
            .preorder()
            .into_iter()
            .filter(|(id, _)| !subtree.contains(id))
            .filter_map(|(id, _)| tree.get(id).map(|a| a.code.as_str()))
            .collect();
        let mut rng = StdRng::from_os_rng();

        for attempt in 0..self.codes.max_attempts() {
            let code = self.codes.candidate(slot, &existing, attempt, &mut rng)?;
            let recoded = rebase_subtree_codes(&tree, account_id, &code);
            if recoded
                .iter()
                .any(|(_, new_code)| outside.contains(new_code.as_str()))
            {
                continue;
            }

            let savepoint = txn.begin().await?;
            match write_move(&savepoint, account_id, new_parent, &recoded).await {
                Ok(()) => {
                    savepoint.commit().await?;
                    txn.commit().await?;
                    info!(
                        account_id = %account_id,
                        new_parent = ?new_parent,
                        code = %code,
                        recoded = recoded.len(),
                        actor_id = %actor.user_id,
                        "Account moved"
                    );
                    return Ok(Account {
                        code,
                        parent_id: new_parent,
                        ..account
                    });
                }
                Err(e) if is_unique_violation(&e) => {
                    savepoint.rollback().await?;
                    debug!(code = %code, attempt, "Account code taken, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AccountError::CodeCollision(self.codes.max_attempts()).into())
    }

    /// Lists accounts in hierarchy order: each group before its children,
    /// siblings by code.
    pub async fn list(
        &self,
        organization_id: OrganizationId,
        include_inactive: bool,
    ) -> Result<Vec<AccountNode>, RepositoryError> {
        let mut query = accounts::Entity::find()
            .filter(accounts::Column::OrganizationId.eq(organization_id.into_inner()));
        if !include_inactive {
            query = query.filter(accounts::Column::IsActive.eq(true));
        }
        let rows = query
            .order_by_asc(accounts::Column::Code)
            .all(&self.db)
            .await?;

        let tree = AccountTree::build(rows.into_iter().map(Account::from))?;
        Ok(tree
            .preorder()
            .into_iter()
            .filter_map(|(id, depth)| {
                tree.get(id).cloned().map(|account| AccountNode { account, depth })
            })
            .collect())
    }

    /// Finds an account.
    pub async fn find(
        &self,
        organization_id: OrganizationId,
        account_id: AccountId,
    ) -> Result<Account, RepositoryError> {
        let row = accounts::Entity::find_by_id(account_id.into_inner())
            .filter(accounts::Column::OrganizationId.eq(organization_id.into_inner()))
            .one(&self.db)
            .await?
            .ok_or(AccountError::NotFound(account_id))?;
        Ok(row.into())
    }
}

async fn codes_of(
    txn: &DatabaseTransaction,
    organization_id: OrganizationId,
) -> Result<HashSet<String>, DbErr> {
    let codes: Vec<String> = accounts::Entity::find()
        .select_only()
        .column(accounts::Column::Code)
        .filter(accounts::Column::OrganizationId.eq(organization_id.into_inner()))
        .into_tuple()
        .all(txn)
        .await?;
    Ok(codes.into_iter().collect())
}

async fn write_move(
    txn: &DatabaseTransaction,
    account_id: AccountId,
    new_parent: Option<AccountId>,
    recoded: &[(AccountId, String)],
) -> Result<(), DbErr> {
    let now = chrono::Utc::now().fixed_offset();
    for (id, code) in recoded {
        let mut model = accounts::ActiveModel {
            id: Unchanged(id.into_inner()),
            code: Set(code.clone()),
            updated_at: Set(now),
            ..Default::default()
        };
        if *id == account_id {
            model.parent_id = Set(new_parent.map(AccountId::into_inner));
        }
        model.update(txn).await?;
    }
    Ok(())
}
