//! `SeaORM` Entity for the transactions table.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub transaction_id: String,
    pub transaction_time: DateTimeWithTimeZone,
    pub account_number: String,
    pub journal_id: String,
    pub description: String,
    pub alignment: String,
    pub amount: i64,
    pub balance: i64,
    pub created_at: DateTimeWithTimeZone,
    pub created_by: String,
    pub is_deleted: bool,
    // Monotone insertion counter; the ordering tiebreaker for legs that
    // share a transaction_time.
    pub seq: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountNumber",
        to = "super::accounts::Column::AccountNumber"
    )]
    Accounts,
    #[sea_orm(
        belongs_to = "super::journals::Entity",
        from = "Column::JournalId",
        to = "super::journals::Column::JournalId"
    )]
    Journals,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl Related<super::journals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Journals.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
