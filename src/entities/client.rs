//! Client entity - A counterparty that owes the business for sales.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Client database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "clients")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Display name
    pub name: String,
    /// Optional phone number, digits only once normalised
    pub phone: Option<String>,
    /// Optional email, lowercase
    pub email: Option<String>,
    /// Maximum outstanding debt in cents; 0 means no limit
    pub credit_limit: i64,
    /// Running amount owed across open sales
    pub total_owed: i64,
    /// Running amount paid, including payments at sale time
    pub total_paid: i64,
    /// When the client was created
    pub created_at: DateTimeUtc,
    /// Last change to the debt totals
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Client and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One client has many sales
    #[sea_orm(has_many = "super::sale::Entity")]
    Sales,
}

impl Related<super::sale::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sales.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
