//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod account;
pub mod client;
pub mod distributor;
pub mod ledger_event;
pub mod movement;
pub mod payment;
pub mod product;
pub mod purchase_order;
pub mod sale;
pub mod sea_orm_active_enums;
pub mod transfer;

// Re-export specific types to avoid conflicts
pub use account::{Column as AccountColumn, Entity as Account, Model as AccountModel};
pub use client::{Column as ClientColumn, Entity as Client, Model as ClientModel};
pub use distributor::{
    Column as DistributorColumn, Entity as Distributor, Model as DistributorModel,
};
pub use ledger_event::{
    Column as LedgerEventColumn, Entity as LedgerEvent, Model as LedgerEventModel,
};
pub use movement::{Column as MovementColumn, Entity as Movement, Model as MovementModel};
pub use payment::{Column as PaymentColumn, Entity as Payment, Model as PaymentModel};
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
pub use purchase_order::{
    Column as PurchaseOrderColumn, Entity as PurchaseOrder, Model as PurchaseOrderModel,
};
pub use sale::{Column as SaleColumn, Entity as Sale, Model as SaleModel};
pub use sea_orm_active_enums::{
    CounterpartyKind, Currency, EventKind, MovementDirection, OrderStatus, SaleStatus,
};
pub use transfer::{Column as TransferColumn, Entity as Transfer, Model as TransferModel};
