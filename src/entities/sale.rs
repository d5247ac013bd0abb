//! Sale entity - A committed sale and its three-way distribution.
//!
//! `amount_paid + amount_remaining == total` holds for every stored row; the
//! payment fields move only through guarded deltas.

use super::sea_orm_active_enums::{Currency, SaleStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sale database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales")]
pub struct Model {
    /// Request id that created the sale
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Buyer
    pub client_id: String,
    /// Purchase order the goods came from, if known
    pub purchase_order_id: Option<String>,
    /// Inventory line the goods came from, if tracked
    pub product_id: Option<String>,
    /// Units sold
    pub quantity: i64,
    /// Price per unit charged to the client
    pub unit_sale_price: i64,
    /// Cost per unit
    pub unit_cost: i64,
    /// Freight per unit
    pub unit_freight: i64,
    /// Whether freight was split out of the revenue
    pub include_freight: bool,
    /// Settlement currency
    pub currency: Currency,
    /// `quantity × unit_sale_price`
    pub total: i64,
    /// Paid so far
    pub amount_paid: i64,
    /// Still owed
    pub amount_remaining: i64,
    /// Derived from paid/remaining
    pub status: SaleStatus,
    /// Full cost-recovery component
    pub cost_recovery: i64,
    /// Full freight component
    pub freight: i64,
    /// Full profit component
    pub profit: i64,
    /// When the sale was committed
    pub created_at: DateTimeUtc,
    /// Last payment
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Sale and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each sale belongs to one client
    #[sea_orm(
        belongs_to = "super::client::Entity",
        from = "Column::ClientId",
        to = "super::client::Column::Id"
    )]
    Client,
    /// A sale may reference the purchase order its cost came from
    #[sea_orm(
        belongs_to = "super::purchase_order::Entity",
        from = "Column::PurchaseOrderId",
        to = "super::purchase_order::Column::Id"
    )]
    PurchaseOrder,
    /// A sale may draw down a product's stock
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl Related<super::purchase_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrder.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
