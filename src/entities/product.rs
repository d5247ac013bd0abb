//! Product entity - Inventory line tracked by purchase orders and sales.
//!
//! Purchase orders add stock, sales remove it. The stock column is only changed
//! through guarded delta updates so it cannot go negative.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Name of the product, unique
    #[sea_orm(unique)]
    pub name: String,
    /// Units on hand
    pub stock: i64,
    /// Unit total cost of the most recent purchase order, in cents
    pub unit_cost: i64,
    /// When the product was created
    pub created_at: DateTimeUtc,
    /// When the product was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A product appears on many sales
    #[sea_orm(has_many = "super::sale::Entity")]
    Sales,
    /// A product is bought through many purchase orders
    #[sea_orm(has_many = "super::purchase_order::Entity")]
    PurchaseOrders,
}

impl Related<super::sale::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sales.def()
    }
}

impl Related<super::purchase_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
