//! Staged ledger transactions - What changes together, committed as one unit.
//!
//! A business event is planned into a [`Transaction`]: an ordered list of
//! [`Mutation`]s. Nothing touches the store until [`Transaction::commit`], which
//! applies every mutation inside one database transaction together with a
//! `ledger_events` row keyed by the request id. Any failure drops the database
//! transaction and rolls everything back.

use crate::{
    entities::{
        EventKind, LedgerEvent, OrderStatus, PurchaseOrder, Sale, SaleStatus, ledger_event,
        payment, purchase_order, sale, transfer,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{DatabaseTransaction, IntoActiveModel, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::Serialize;
use tracing::{debug, info};

use super::{
    Amount,
    account::{AccountDelta, AccountId, apply_delta},
    debt::{DebtDelta, apply_debt_delta},
    inventory::{ProductUpsert, apply_stock_delta, upsert_product},
    movement::{NewMovement, append},
};

/// One staged change. Applied in order, so rows are inserted before anything
/// that references them.
#[derive(Debug, Clone)]
pub enum Mutation {
    /// Create the product, or refresh its unit cost
    UpsertProduct(ProductUpsert),
    /// New sale row
    InsertSale(sale::ActiveModel),
    /// New purchase order row
    InsertPurchaseOrder(purchase_order::ActiveModel),
    /// New transfer row
    InsertTransfer(transfer::ActiveModel),
    /// New payment row
    InsertPayment(payment::ActiveModel),
    /// Balance and lifetime totals of one account
    Account(AccountDelta),
    /// Owed/paid totals of one counterparty
    Debt(DebtDelta),
    /// Stock of one product
    Stock {
        /// Product id
        product_id: String,
        /// Signed units
        delta: i64,
    },
    /// Moves `amount` of a sale from remaining to paid
    SalePayment {
        /// Sale id
        sale_id: String,
        /// Amount settled
        amount: Amount,
    },
    /// Moves `amount` of an order from remaining debt to paid
    OrderPayment {
        /// Order id
        order_id: String,
        /// Amount settled
        amount: Amount,
    },
    /// Movement log entry attributed to this transaction
    Movement(NewMovement),
}

/// Result of submitting a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    /// Request id
    pub id: String,
    /// Event kind
    pub kind: EventKind,
    /// Movement log entries written
    pub movement_count: i32,
    /// True when the id had already been committed and nothing was applied
    pub replayed: bool,
}

impl From<ledger_event::Model> for Receipt {
    fn from(event: ledger_event::Model) -> Self {
        Self {
            id: event.id,
            kind: event.kind,
            movement_count: event.movement_count,
            replayed: true,
        }
    }
}

/// An opened request: either a live database transaction or a replay.
pub enum Opened {
    /// First time this id is seen
    Fresh(DatabaseTransaction),
    /// Already committed
    Replayed(Receipt),
}

/// Begins the database transaction for request `id`, unless it was already committed.
///
/// The replay check runs inside the transaction, before anything is read for planning.
pub async fn open(db: &DatabaseConnection, id: &str) -> Result<Opened> {
    let txn = db.begin().await?;
    if let Some(event) = LedgerEvent::find_by_id(id).one(&txn).await? {
        debug!("Request {} already committed as {:?}; replaying", id, event.kind);
        return Ok(Opened::Replayed(event.into()));
    }
    Ok(Opened::Fresh(txn))
}

/// Ordered staged mutations for one business event.
#[derive(Debug, Clone)]
pub struct Transaction {
    id: String,
    kind: EventKind,
    mutations: Vec<Mutation>,
}

impl Transaction {
    /// Empty transaction for request `id`.
    pub fn new(id: impl Into<String>, kind: EventKind) -> Self {
        Self {
            id: id.into(),
            kind,
            mutations: Vec::new(),
        }
    }

    /// Request id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Event kind.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        self.kind
    }

    /// Staged mutations in application order.
    #[must_use]
    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    /// Number of movement log entries the commit will write.
    #[must_use]
    pub fn movement_count(&self) -> usize {
        self.mutations
            .iter()
            .filter(|mutation| matches!(mutation, Mutation::Movement(_)))
            .count()
    }

    /// Stages a raw mutation.
    pub fn push(&mut self, mutation: Mutation) -> &mut Self {
        self.mutations.push(mutation);
        self
    }

    /// Stages money received by `account`. Zero amounts stage nothing.
    pub fn credit(&mut self, account: AccountId, amount: Amount, memo: &str) -> &mut Self {
        if amount > 0 {
            self.push(Mutation::Account(AccountDelta::income(account, amount)))
                .push(Mutation::Movement(NewMovement::income(account, amount, memo)));
        }
        self
    }

    /// Like [`Transaction::credit`], attributing the movement to `sale_id`.
    pub fn credit_sale(
        &mut self,
        account: AccountId,
        amount: Amount,
        memo: &str,
        sale_id: &str,
    ) -> &mut Self {
        if amount > 0 {
            self.push(Mutation::Account(AccountDelta::income(account, amount)))
                .push(Mutation::Movement(
                    NewMovement::income(account, amount, memo).for_sale(sale_id),
                ));
        }
        self
    }

    /// Stages money spent from `account`. Zero amounts stage nothing.
    pub fn debit(
        &mut self,
        account: AccountId,
        amount: Amount,
        require_funds: bool,
        memo: &str,
    ) -> &mut Self {
        if amount > 0 {
            self.push(Mutation::Account(AccountDelta::expense(
                account,
                amount,
                require_funds,
            )))
            .push(Mutation::Movement(NewMovement::expense(account, amount, memo)));
        }
        self
    }

    /// Stages both legs of a transfer.
    pub fn transfer(
        &mut self,
        from: AccountId,
        to: AccountId,
        amount: Amount,
        require_funds: bool,
        memo: &str,
    ) -> &mut Self {
        self.push(Mutation::Account(AccountDelta::transfer_out(
            from,
            amount,
            require_funds,
        )))
        .push(Mutation::Movement(NewMovement::expense(from, amount, memo)))
        .push(Mutation::Account(AccountDelta::transfer_in(to, amount)))
        .push(Mutation::Movement(NewMovement::income(to, amount, memo)))
    }

    /// Applies every mutation inside `txn`, records the event and commits.
    ///
    /// On error `txn` is dropped, which rolls the whole event back.
    pub async fn commit(self, txn: DatabaseTransaction) -> Result<Receipt> {
        let movement_count = i32::try_from(self.movement_count()).unwrap_or(i32::MAX);

        for mutation in &self.mutations {
            debug!("Applying {:?} for {}", mutation, self.id);
            self.apply(&txn, mutation).await?;
        }

        let event = ledger_event::ActiveModel {
            id: Set(self.id.clone()),
            kind: Set(self.kind),
            movement_count: Set(movement_count),
            committed_at: Set(Utc::now()),
        };
        LedgerEvent::insert(event).exec_without_returning(&txn).await?;

        txn.commit().await?;
        info!(
            "Committed {:?} {} with {} movements",
            self.kind, self.id, movement_count
        );

        Ok(Receipt {
            id: self.id,
            kind: self.kind,
            movement_count,
            replayed: false,
        })
    }

    async fn apply(&self, txn: &DatabaseTransaction, mutation: &Mutation) -> Result<()> {
        match mutation {
            Mutation::UpsertProduct(upsert) => upsert_product(txn, upsert).await,
            Mutation::InsertSale(model) => {
                Sale::insert(model.clone()).exec_without_returning(txn).await?;
                Ok(())
            }
            Mutation::InsertPurchaseOrder(model) => {
                PurchaseOrder::insert(model.clone())
                    .exec_without_returning(txn)
                    .await?;
                Ok(())
            }
            Mutation::InsertTransfer(model) => {
                transfer::Entity::insert(model.clone())
                    .exec_without_returning(txn)
                    .await?;
                Ok(())
            }
            Mutation::InsertPayment(model) => {
                payment::Entity::insert(model.clone())
                    .exec_without_returning(txn)
                    .await?;
                Ok(())
            }
            Mutation::Account(delta) => apply_delta(txn, delta).await,
            Mutation::Debt(delta) => apply_debt_delta(txn, delta).await,
            Mutation::Stock { product_id, delta } => {
                apply_stock_delta(txn, product_id, *delta).await
            }
            Mutation::SalePayment { sale_id, amount } => {
                apply_sale_payment(txn, sale_id, *amount).await
            }
            Mutation::OrderPayment { order_id, amount } => {
                apply_order_payment(txn, order_id, *amount).await
            }
            Mutation::Movement(entry) => {
                append(txn, entry, &self.id, self.kind).await?;
                Ok(())
            }
        }
    }
}

async fn apply_sale_payment<C>(db: &C, sale_id: &str, amount: Amount) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = Sale::update_many()
        .col_expr(
            sale::Column::AmountPaid,
            Expr::col(sale::Column::AmountPaid).add(amount),
        )
        .col_expr(
            sale::Column::AmountRemaining,
            Expr::col(sale::Column::AmountRemaining).sub(amount),
        )
        .col_expr(sale::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(sale::Column::Id.eq(sale_id))
        .filter(sale::Column::AmountRemaining.gte(amount))
        .exec(db)
        .await?;

    let stored = Sale::find_by_id(sale_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("sale", sale_id))?;
    if result.rows_affected == 0 {
        return Err(Error::PaymentExceedsDebt {
            outstanding: stored.amount_remaining,
            requested: amount,
        });
    }

    let status = SaleStatus::from_amounts(stored.amount_paid, stored.amount_remaining);
    if stored.status != status {
        let mut active = stored.into_active_model();
        active.status = Set(status);
        active.update(db).await?;
    }
    Ok(())
}

async fn apply_order_payment<C>(db: &C, order_id: &str, amount: Amount) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = PurchaseOrder::update_many()
        .col_expr(
            purchase_order::Column::AmountPaid,
            Expr::col(purchase_order::Column::AmountPaid).add(amount),
        )
        .col_expr(
            purchase_order::Column::RemainingDebt,
            Expr::col(purchase_order::Column::RemainingDebt).sub(amount),
        )
        .col_expr(purchase_order::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(purchase_order::Column::Id.eq(order_id))
        .filter(purchase_order::Column::RemainingDebt.gte(amount))
        .exec(db)
        .await?;

    let stored = PurchaseOrder::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("purchase order", order_id))?;
    if result.rows_affected == 0 {
        return Err(Error::PaymentExceedsDebt {
            outstanding: stored.remaining_debt,
            requested: amount,
        });
    }

    let status = OrderStatus::from_amounts(stored.amount_paid, stored.remaining_debt);
    if stored.status != status {
        let mut active = stored.into_active_model();
        active.status = Set(status);
        active.update(db).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use crate::core::{account::get_account, movement::movements_for_source};
    use crate::test_utils::*;

    #[test]
    fn test_zero_amounts_stage_nothing() {
        let mut tx = Transaction::new("t-1", EventKind::Income);
        tx.credit(AccountId::Azteca, 0, "nothing")
            .debit(AccountId::Azteca, 0, true, "nothing");
        assert!(tx.mutations().is_empty());
        assert_eq!(tx.movement_count(), 0);
    }

    #[test]
    fn test_transfer_stages_two_legs() {
        let mut tx = Transaction::new("t-1", EventKind::Transfer);
        tx.transfer(AccountId::Profit, AccountId::Leftie, 500, true, "rebalance");
        assert_eq!(tx.mutations().len(), 4);
        assert_eq!(tx.movement_count(), 2);
    }

    #[tokio::test]
    async fn test_commit_applies_everything() -> Result<()> {
        let db = setup_test_db().await?;
        let Opened::Fresh(txn) = open(&db, "evt-1").await? else {
            panic!("fresh id reported as replay");
        };

        let mut tx = Transaction::new("evt-1", EventKind::Income);
        tx.credit(AccountId::Azteca, 1_000, "deposit");
        let receipt = tx.commit(txn).await?;

        assert!(!receipt.replayed);
        assert_eq!(receipt.movement_count, 1);
        let account = get_account(&db, AccountId::Azteca).await?.unwrap();
        assert_eq!(account.balance, 1_000);
        assert_eq!(movements_for_source(&db, "evt-1").await?.len(), 1);

        let Opened::Replayed(replay) = open(&db, "evt-1").await? else {
            panic!("committed id not detected");
        };
        assert!(replay.replayed);
        assert_eq!(replay.kind, EventKind::Income);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_mutation_rolls_back_earlier_ones() -> Result<()> {
        let db = setup_test_db().await?;
        let Opened::Fresh(txn) = open(&db, "evt-2").await? else {
            panic!("fresh id reported as replay");
        };

        let mut tx = Transaction::new("evt-2", EventKind::Transfer);
        tx.credit(AccountId::Leftie, 700, "first")
            .debit(AccountId::Azteca, 100, true, "unfunded");
        let result = tx.commit(txn).await;

        assert!(matches!(result, Err(Error::InsufficientFunds { .. })));
        assert!(get_account(&db, AccountId::Leftie).await?.is_none());
        assert!(movements_for_source(&db, "evt-2").await?.is_empty());
        assert!(matches!(open(&db, "evt-2").await?, Opened::Fresh(_)));
        Ok(())
    }
}
