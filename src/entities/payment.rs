//! Payment entity - A reconciled payment from a client or to a distributor.

use super::sea_orm_active_enums::CounterpartyKind;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payment database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    /// Request id
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Client or distributor
    pub counterparty_kind: CounterpartyKind,
    /// Counterparty id
    pub counterparty_id: String,
    /// Sale or order the caller targeted; `None` means oldest-first allocation
    pub target_id: Option<String>,
    /// Amount paid, in cents
    pub amount: i64,
    /// Source account for distributor payments
    pub account_id: Option<String>,
    /// Free-text memo
    pub memo: String,
    /// Counterparty debt read when the payment was planned
    pub debt_before: i64,
    /// `debt_before - amount`
    pub debt_after: i64,
    /// Commit time
    pub created_at: DateTimeUtc,
}

/// `Payment` rows are linked to counterparties through `counterparty_id`
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
