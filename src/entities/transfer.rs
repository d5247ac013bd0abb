//! Transfer entity - Money moved between two accounts. Terminal once written.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Transfer database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transfers")]
pub struct Model {
    /// Request id
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Account debited
    pub from_account: String,
    /// Account credited
    pub to_account: String,
    /// Amount moved, in cents
    pub amount: i64,
    /// Free-text memo
    pub memo: String,
    /// Commit time
    pub created_at: DateTimeUtc,
}

/// `Transfer` rows are linked to accounts only through the movement log
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
