//! Initial database migration.
//!
//! Creates the enums, the fiscal calendar, the chart of accounts, the journal
//! and the period audit log.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: FISCAL CALENDAR
        // ============================================================
        db.execute_unprepared(FISCAL_YEARS_SQL).await?;
        db.execute_unprepared(MONTHLY_PERIODS_SQL).await?;

        // ============================================================
        // PART 3: CHART OF ACCOUNTS
        // ============================================================
        db.execute_unprepared(ACCOUNTS_SQL).await?;

        // ============================================================
        // PART 4: JOURNAL
        // ============================================================
        db.execute_unprepared(JOURNAL_ENTRIES_SQL).await?;
        db.execute_unprepared(JOURNAL_ENTRY_ITEMS_SQL).await?;

        // ============================================================
        // PART 5: AUDIT
        // ============================================================
        db.execute_unprepared(PERIOD_AUDIT_LOG_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(DROP_ALL_SQL)
            .await?;
        Ok(())
    }
}

const ENUMS_SQL: &str = r"
CREATE TYPE account_type AS ENUM (
    'asset', 'liability', 'equity', 'income', 'expense', 'cost', 'memo'
);
CREATE TYPE fiscal_year_type AS ENUM (
    'calendar', 'april_march', 'july_june', 'october_september'
);
CREATE TYPE entry_status AS ENUM ('pending', 'approved', 'voided');
CREATE TYPE period_scope AS ENUM ('fiscal_year', 'monthly_period');
CREATE TYPE period_action AS ENUM ('activate', 'deactivate', 'close', 'reopen');
CREATE TYPE period_state AS ENUM ('open_inactive', 'open_active', 'closed');
CREATE TYPE user_role AS ENUM ('owner', 'admin', 'accountant', 'viewer');
";

const FISCAL_YEARS_SQL: &str = r"
CREATE TABLE fiscal_years (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id UUID NOT NULL,
    name VARCHAR(50) NOT NULL,
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    fiscal_year_type fiscal_year_type NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT false,
    is_closed BOOLEAN NOT NULL DEFAULT false,
    closed_at TIMESTAMPTZ,
    closed_by UUID,
    reopened_at TIMESTAMPTZ,
    reopened_by UUID,
    reopen_reason TEXT,
    reclosed_at TIMESTAMPTZ,
    reclosed_by UUID,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_fiscal_year_dates CHECK (end_date > start_date),
    CONSTRAINT chk_fiscal_year_closed_inactive CHECK (NOT (is_closed AND is_active)),
    UNIQUE (organization_id, name)
);

CREATE INDEX idx_fiscal_years_org_dates ON fiscal_years(organization_id, start_date, end_date);
";

const MONTHLY_PERIODS_SQL: &str = r"
CREATE TABLE monthly_periods (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    fiscal_year_id UUID NOT NULL REFERENCES fiscal_years(id) ON DELETE CASCADE,
    period_number SMALLINT NOT NULL,
    name VARCHAR(50) NOT NULL,
    year INTEGER NOT NULL,
    month INTEGER NOT NULL,
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT false,
    is_closed BOOLEAN NOT NULL DEFAULT false,
    closed_at TIMESTAMPTZ,
    closed_by UUID,
    reopened_at TIMESTAMPTZ,
    reopened_by UUID,
    reopen_reason TEXT,
    reclosed_at TIMESTAMPTZ,
    reclosed_by UUID,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_period_dates CHECK (end_date >= start_date),
    CONSTRAINT chk_period_number CHECK (period_number BETWEEN 1 AND 12),
    CONSTRAINT chk_period_month CHECK (month BETWEEN 1 AND 12),
    CONSTRAINT chk_period_closed_inactive CHECK (NOT (is_closed AND is_active)),
    UNIQUE (fiscal_year_id, period_number)
);

CREATE INDEX idx_monthly_periods_dates ON monthly_periods(fiscal_year_id, start_date, end_date);
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id UUID NOT NULL,
    code VARCHAR(64) NOT NULL,
    name VARCHAR(255) NOT NULL,
    account_type account_type NOT NULL,
    parent_id UUID REFERENCES accounts(id),
    is_parent BOOLEAN NOT NULL DEFAULT false,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_account_not_self_parent CHECK (parent_id IS NULL OR parent_id <> id),
    UNIQUE (organization_id, code)
);

CREATE INDEX idx_accounts_org_type ON accounts(organization_id, account_type);
CREATE INDEX idx_accounts_parent ON accounts(parent_id);
";

const JOURNAL_ENTRIES_SQL: &str = r"
CREATE TABLE journal_entries (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id UUID NOT NULL,
    entry_date DATE NOT NULL,
    monthly_period_id UUID NOT NULL REFERENCES monthly_periods(id),
    description TEXT,
    status entry_status NOT NULL DEFAULT 'pending',
    is_balanced BOOLEAN NOT NULL DEFAULT false,
    total_debit NUMERIC(24, 6) NOT NULL DEFAULT 0,
    total_credit NUMERIC(24, 6) NOT NULL DEFAULT 0,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    voided_by UUID,
    voided_at TIMESTAMPTZ,
    CONSTRAINT chk_entry_totals_non_negative CHECK (total_debit >= 0 AND total_credit >= 0),
    CONSTRAINT chk_entry_void_stamp CHECK ((status = 'voided') = (voided_at IS NOT NULL))
);

CREATE INDEX idx_journal_entries_org_date ON journal_entries(organization_id, entry_date);
CREATE INDEX idx_journal_entries_period ON journal_entries(monthly_period_id);
";

const JOURNAL_ENTRY_ITEMS_SQL: &str = r"
CREATE TABLE journal_entry_items (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    entry_id UUID NOT NULL REFERENCES journal_entries(id) ON DELETE CASCADE,
    account_id UUID NOT NULL REFERENCES accounts(id),
    debit NUMERIC(24, 6) NOT NULL DEFAULT 0,
    credit NUMERIC(24, 6) NOT NULL DEFAULT 0,
    description TEXT,
    CONSTRAINT chk_item_non_negative CHECK (debit >= 0 AND credit >= 0),
    CONSTRAINT chk_item_one_side CHECK (debit = 0 OR credit = 0),
    CONSTRAINT chk_item_non_zero CHECK (debit > 0 OR credit > 0)
);

CREATE INDEX idx_journal_entry_items_entry ON journal_entry_items(entry_id);
CREATE INDEX idx_journal_entry_items_account ON journal_entry_items(account_id);
";

const PERIOD_AUDIT_LOG_SQL: &str = r"
CREATE TABLE period_audit_log (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id UUID NOT NULL,
    scope period_scope NOT NULL,
    subject_id UUID NOT NULL,
    action period_action NOT NULL,
    from_state period_state NOT NULL,
    to_state period_state NOT NULL,
    actor_id UUID NOT NULL,
    actor_role user_role NOT NULL,
    reason TEXT,
    occurred_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_reopen_reason CHECK (action <> 'reopen' OR reason IS NOT NULL)
);

CREATE INDEX idx_period_audit_log_subject ON period_audit_log(subject_id, occurred_at);
CREATE INDEX idx_period_audit_log_org ON period_audit_log(organization_id, occurred_at);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS period_audit_log CASCADE;
DROP TABLE IF EXISTS journal_entry_items CASCADE;
DROP TABLE IF EXISTS journal_entries CASCADE;
DROP TABLE IF EXISTS accounts CASCADE;
DROP TABLE IF EXISTS monthly_periods CASCADE;
DROP TABLE IF EXISTS fiscal_years CASCADE;

DROP TYPE IF EXISTS user_role;
DROP TYPE IF EXISTS period_state;
DROP TYPE IF EXISTS period_action;
DROP TYPE IF EXISTS period_scope;
DROP TYPE IF EXISTS entry_status;
DROP TYPE IF EXISTS fiscal_year_type;
DROP TYPE IF EXISTS account_type;
";
