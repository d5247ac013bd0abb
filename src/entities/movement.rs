//! Movement entity - Append-only audit trail of every balance change.
//!
//! Each row carries the id and kind of the business event that produced it,
//! so any account balance can be rebuilt from this table alone.
use super::sea_orm_active_enums::{EventKind, MovementDirection};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Movement database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "movements")]
pub struct Model {
    /// Append order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Account the movement belongs to
    pub account_id: String,
    /// Income or expense
    pub direction: MovementDirection,
    /// Always positive, in cents
    pub amount: i64,
    /// Free-text memo
    pub memo: String,
    /// Sale whose distribution the movement credits, if any
    pub sale_id: Option<String>,
    /// Id of the originating sale, order, payment, transfer or direct entry
    pub source_transaction_id: String,
    /// Kind of the originating event
    pub source_transaction_kind: EventKind,
    /// When the movement was committed
    pub occurred_at: DateTimeUtc,
}

impl Model {
    /// Signed effect of this movement on the account balance.
    #[must_use]
    pub const fn signed_amount(&self) -> i64 {
        match self.direction {
            MovementDirection::Income => self.amount,
            MovementDirection::Expense => -self.amount,
        }
    }
}

/// Defines relationships between Movement and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each movement belongs to one account
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::AccountId",
        to = "super::account::Column::Id"
    )]
    Account,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
