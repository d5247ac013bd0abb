//! Counterparty debt tracker - Running owed/paid totals for clients and distributors.
//!
//! Totals only move by deltas. A payment is a guarded decrement
//! (`WHERE total_owed >= amount`), so debt can never go negative and an
//! overpayment is rejected instead of becoming a silent credit.

use crate::{
    entities::{
        Client, Distributor, OrderStatus, PurchaseOrder, Sale, client, distributor,
        purchase_order, sale,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, prelude::*, sea_query::Expr};

use super::{Amount, requests::Counterparty};

/// A commutative change to a counterparty's running totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebtDelta {
    /// Client or distributor
    pub counterparty: Counterparty,
    /// Signed change to `total_owed`
    pub owed: Amount,
    /// Added to `total_paid`
    pub paid: Amount,
    /// Added to `total_ordered`; distributors only
    pub ordered: Amount,
}

impl DebtDelta {
    /// New debt of `amount`, with `paid_now` settled at the same time.
    #[must_use]
    pub const fn obligation(counterparty: Counterparty, amount: Amount, paid_now: Amount) -> Self {
        Self {
            counterparty,
            owed: amount,
            paid: paid_now,
            ordered: 0,
        }
    }

    /// A purchase order of `grand_total`, with `initial_payment` paid up front.
    #[must_use]
    pub const fn order(
        distributor_id: String,
        grand_total: Amount,
        initial_payment: Amount,
    ) -> Self {
        Self {
            counterparty: Counterparty::Distributor(distributor_id),
            owed: grand_total - initial_payment,
            paid: initial_payment,
            ordered: grand_total,
        }
    }

    /// A reconciled payment of `amount`.
    #[must_use]
    pub const fn payment(counterparty: Counterparty, amount: Amount) -> Self {
        Self {
            counterparty,
            owed: -amount,
            paid: amount,
            ordered: 0,
        }
    }
}

/// Adds `amount` to what the counterparty owes.
pub async fn record_new_obligation<C>(db: &C, counterparty: &Counterparty, amount: Amount) -> Result<()>
where
    C: ConnectionTrait,
{
    apply_debt_delta(db, &DebtDelta::obligation(counterparty.clone(), amount, 0)).await
}

/// Subtracts `amount` from what the counterparty owes.
///
/// Fails with [`Error::PaymentExceedsDebt`] when `amount` is larger than the
/// outstanding debt.
pub async fn record_payment<C>(db: &C, counterparty: &Counterparty, amount: Amount) -> Result<()>
where
    C: ConnectionTrait,
{
    apply_debt_delta(db, &DebtDelta::payment(counterparty.clone(), amount)).await
}

/// Applies a delta to the counterparty row in one `UPDATE`.
pub async fn apply_debt_delta<C>(db: &C, delta: &DebtDelta) -> Result<()>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    let rows_affected = match &delta.counterparty {
        Counterparty::Client(id) => {
            let mut update = Client::update_many()
                .col_expr(
                    client::Column::TotalOwed,
                    Expr::col(client::Column::TotalOwed).add(delta.owed),
                )
                .col_expr(
                    client::Column::TotalPaid,
                    Expr::col(client::Column::TotalPaid).add(delta.paid),
                )
                .col_expr(client::Column::UpdatedAt, Expr::value(now))
                .filter(client::Column::Id.eq(id.as_str()));
            if delta.owed < 0 {
                update = update.filter(client::Column::TotalOwed.gte(-delta.owed));
            }
            update.exec(db).await?.rows_affected
        }
        Counterparty::Distributor(id) => {
            let mut update = Distributor::update_many()
                .col_expr(
                    distributor::Column::TotalOwed,
                    Expr::col(distributor::Column::TotalOwed).add(delta.owed),
                )
                .col_expr(
                    distributor::Column::TotalPaid,
                    Expr::col(distributor::Column::TotalPaid).add(delta.paid),
                )
                .col_expr(
                    distributor::Column::TotalOrdered,
                    Expr::col(distributor::Column::TotalOrdered).add(delta.ordered),
                )
                .col_expr(distributor::Column::UpdatedAt, Expr::value(now))
                .filter(distributor::Column::Id.eq(id.as_str()));
            if delta.owed < 0 {
                update = update.filter(distributor::Column::TotalOwed.gte(-delta.owed));
            }
            update.exec(db).await?.rows_affected
        }
    };

    if rows_affected == 0 {
        let outstanding = outstanding(db, &delta.counterparty).await?;
        return Err(Error::PaymentExceedsDebt {
            outstanding,
            requested: -delta.owed,
        });
    }
    Ok(())
}

/// What the counterparty currently owes (clients) or is owed (distributors).
pub async fn outstanding<C>(db: &C, counterparty: &Counterparty) -> Result<Amount>
where
    C: ConnectionTrait,
{
    match counterparty {
        Counterparty::Client(id) => Client::find_by_id(id.as_str())
            .one(db)
            .await?
            .map(|model| model.total_owed)
            .ok_or_else(|| Error::not_found("client", id.as_str())),
        Counterparty::Distributor(id) => Distributor::find_by_id(id.as_str())
            .one(db)
            .await?
            .map(|model| model.total_owed)
            .ok_or_else(|| Error::not_found("distributor", id.as_str())),
    }
}

/// Sales of a client with something still owed, oldest first.
pub async fn open_sales_for_client<C>(db: &C, client_id: &str) -> Result<Vec<sale::Model>>
where
    C: ConnectionTrait,
{
    Sale::find()
        .filter(sale::Column::ClientId.eq(client_id))
        .filter(sale::Column::AmountRemaining.gt(0))
        .order_by_asc(sale::Column::CreatedAt)
        .order_by_asc(sale::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Orders placed with a distributor that still carry debt, oldest first.
pub async fn open_orders_for_distributor<C>(
    db: &C,
    distributor_id: &str,
) -> Result<Vec<purchase_order::Model>>
where
    C: ConnectionTrait,
{
    PurchaseOrder::find()
        .filter(purchase_order::Column::DistributorId.eq(distributor_id))
        .filter(purchase_order::Column::RemainingDebt.gt(0))
        .filter(purchase_order::Column::Status.ne(OrderStatus::Cancelled))
        .order_by_asc(purchase_order::Column::CreatedAt)
        .order_by_asc(purchase_order::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
