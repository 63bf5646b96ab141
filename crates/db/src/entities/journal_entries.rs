//! `SeaORM` Entity for journal_entries table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::EntryStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "journal_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub entry_date: Date,
    pub monthly_period_id: Uuid,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub status: EntryStatus,
    pub is_balanced: bool,
    #[sea_orm(column_type = "Decimal(Some((24, 6)))")]
    pub total_debit: Decimal,
    #[sea_orm(column_type = "Decimal(Some((24, 6)))")]
    pub total_credit: Decimal,
    pub created_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub voided_by: Option<Uuid>,
    pub voided_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::monthly_periods::Entity",
        from = "Column::MonthlyPeriodId",
        to = "super::monthly_periods::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    MonthlyPeriods,
    #[sea_orm(has_many = "super::journal_entry_items::Entity")]
    JournalEntryItems,
}

impl Related<super::monthly_periods::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MonthlyPeriods.def()
    }
}

impl Related<super::journal_entry_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JournalEntryItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
