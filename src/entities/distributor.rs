//! Distributor entity - A supplier the business owes for purchase orders.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Distributor database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "distributors")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Display name
    pub name: String,
    /// Optional company name
    pub company: Option<String>,
    /// Optional phone number
    pub phone: Option<String>,
    /// Optional email
    pub email: Option<String>,
    /// Running amount owed to the distributor across open orders
    pub total_owed: i64,
    /// Running amount paid to the distributor
    pub total_paid: i64,
    /// Grand total of every order ever placed
    pub total_ordered: i64,
    /// When the distributor was created
    pub created_at: DateTimeUtc,
    /// Last change to the debt totals
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Distributor and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One distributor has many purchase orders
    #[sea_orm(has_many = "super::purchase_order::Entity")]
    PurchaseOrders,
}

impl Related<super::purchase_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
