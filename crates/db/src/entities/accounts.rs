//! `SeaORM` Entity for the accounts table.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub account_number: String,
    pub name: String,
    pub currency_code: String,
    pub description: String,
    pub alignment: String,
    pub balance: i64,
    pub coa: String,
    pub created_at: DateTimeWithTimeZone,
    pub created_by: String,
    pub updated_at: DateTimeWithTimeZone,
    pub updated_by: String,
    pub is_deleted: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::currencies::Entity",
        from = "Column::CurrencyCode",
        to = "super::currencies::Column::Code"
    )]
    Currencies,
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::currencies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Currencies.def()
    }
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
