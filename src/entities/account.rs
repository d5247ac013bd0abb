//! Account entity - One named monetary bucket ("banco") of the ledger.
//!
//! The balance and lifetime totals are only ever changed through delta updates
//! issued by the ledger commit; see [`crate::core::account`].

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    /// One of the seven fixed identifiers (e.g. `"boveda_monte"`)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Current balance in cents
    pub balance: i64,
    /// Sum of all income movements ever recorded
    pub lifetime_income: i64,
    /// Sum of all expense movements ever recorded
    pub lifetime_expense: i64,
    /// Sum of both legs of every transfer touching this account
    pub lifetime_transfers: i64,
    /// When the account was created
    pub created_at: DateTimeUtc,
    /// Last balance change
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Account and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One account has many movements
    #[sea_orm(has_many = "super::movement::Entity")]
    Movements,
}

impl Related<super::movement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Movements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
