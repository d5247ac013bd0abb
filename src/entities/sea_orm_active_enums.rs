//! String-backed enumerations shared by several tables.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Whether a movement adds to or removes from an account balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum MovementDirection {
    /// Money in
    #[sea_orm(string_value = "income")]
    Income,
    /// Money out
    #[sea_orm(string_value = "expense")]
    Expense,
}

/// Business event that originated a ledger commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// `create_sale`
    #[sea_orm(string_value = "sale")]
    Sale,
    /// `create_purchase_order`
    #[sea_orm(string_value = "purchase_order")]
    PurchaseOrder,
    /// `register_payment`
    #[sea_orm(string_value = "payment")]
    Payment,
    /// `register_transfer`
    #[sea_orm(string_value = "transfer")]
    Transfer,
    /// `register_income`
    #[sea_orm(string_value = "income")]
    Income,
    /// `register_expense`
    #[sea_orm(string_value = "expense")]
    Expense,
}

/// Payment state of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Nothing remaining
    #[sea_orm(string_value = "complete")]
    Complete,
    /// Something paid, something remaining
    #[sea_orm(string_value = "partial")]
    Partial,
    /// Nothing paid yet
    #[sea_orm(string_value = "pending")]
    Pending,
}

impl SaleStatus {
    /// Derives the status from the paid and remaining amounts.
    #[must_use]
    pub const fn from_amounts(amount_paid: i64, amount_remaining: i64) -> Self {
        if amount_remaining <= 0 {
            Self::Complete
        } else if amount_paid > 0 {
            Self::Partial
        } else {
            Self::Pending
        }
    }
}

/// Lifecycle state of a purchase order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Nothing paid yet
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Partially paid
    #[sea_orm(string_value = "partial")]
    Partial,
    /// Fully paid
    #[sea_orm(string_value = "paid")]
    Paid,
    /// Superseded; kept for history
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl OrderStatus {
    /// Derives the status from the paid amount and remaining debt.
    #[must_use]
    pub const fn from_amounts(amount_paid: i64, remaining_debt: i64) -> Self {
        if remaining_debt <= 0 {
            Self::Paid
        } else if amount_paid > 0 {
            Self::Partial
        } else {
            Self::Pending
        }
    }
}

/// Currency a sale was settled in; decides which vault receives cost recovery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
#[serde(rename_all = "snake_case")]
pub enum Currency {
    /// Mexican peso
    #[default]
    #[sea_orm(string_value = "mxn")]
    Mxn,
    /// US dollar
    #[sea_orm(string_value = "usd")]
    Usd,
}

/// Which side of the business a counterparty sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum CounterpartyKind {
    /// Owes the business
    #[sea_orm(string_value = "client")]
    Client,
    /// Is owed by the business
    #[sea_orm(string_value = "distributor")]
    Distributor,
}
