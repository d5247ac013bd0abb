//! Purchase order entity - Goods bought from a distributor, possibly on credit.

use super::sea_orm_active_enums::OrderStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Purchase order database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_orders")]
pub struct Model {
    /// Request id that created the order
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Supplier
    pub distributor_id: String,
    /// Inventory line that received the goods
    pub product_id: Option<String>,
    /// Product name as ordered
    pub product_name: String,
    /// Units ordered
    pub quantity: i64,
    /// Distributor's price per unit
    pub unit_distributor_cost: i64,
    /// Transport per unit
    pub unit_transport_cost: i64,
    /// `unit_distributor_cost + unit_transport_cost`
    pub unit_total_cost: i64,
    /// `unit_total_cost × quantity`
    pub grand_total: i64,
    /// Paid when the order was placed
    pub initial_payment: i64,
    /// Paid so far, initial payment included
    pub amount_paid: i64,
    /// Still owed to the distributor
    pub remaining_debt: i64,
    /// Lifecycle state
    pub status: OrderStatus,
    /// Account the initial payment left from
    pub source_account: Option<String>,
    /// When the order was committed
    pub created_at: DateTimeUtc,
    /// Last payment
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between `PurchaseOrder` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each order belongs to one distributor
    #[sea_orm(
        belongs_to = "super::distributor::Entity",
        from = "Column::DistributorId",
        to = "super::distributor::Column::Id"
    )]
    Distributor,
    /// The product that received the goods
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    /// Sales whose cost was looked up from this order
    #[sea_orm(has_many = "super::sale::Entity")]
    Sales,
}

impl Related<super::distributor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Distributor.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::sale::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sales.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
