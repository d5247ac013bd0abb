//! Movement log - Append-only record of every balance change.
//!
//! Rows are only ever inserted. Each one names the account, the direction, and
//! the id and kind of the event that produced it.

use crate::{
    entities::{EventKind, Movement, MovementDirection, movement},
    errors::Result,
};
use chrono::Utc;
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*};

use super::{Amount, account::AccountId};

/// A movement staged for append; the source is supplied by the commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMovement {
    /// Account the balance change applies to
    pub account: AccountId,
    /// Income or expense
    pub direction: MovementDirection,
    /// Positive amount
    pub amount: Amount,
    /// Free-text memo
    pub memo: String,
    /// Sale whose distribution this movement credits
    pub sale_id: Option<String>,
}

impl NewMovement {
    /// Money in.
    pub fn income(account: AccountId, amount: Amount, memo: impl Into<String>) -> Self {
        Self {
            account,
            direction: MovementDirection::Income,
            amount,
            memo: memo.into(),
            sale_id: None,
        }
    }

    /// Money out.
    pub fn expense(account: AccountId, amount: Amount, memo: impl Into<String>) -> Self {
        Self {
            account,
            direction: MovementDirection::Expense,
            amount,
            memo: memo.into(),
            sale_id: None,
        }
    }

    /// Attributes the movement to a sale's distribution.
    #[must_use]
    pub fn for_sale(mut self, sale_id: impl Into<String>) -> Self {
        self.sale_id = Some(sale_id.into());
        self
    }
}

/// Appends a movement attributed to `source_id`.
pub async fn append<C>(
    db: &C,
    entry: &NewMovement,
    source_id: &str,
    source_kind: EventKind,
) -> Result<movement::Model>
where
    C: ConnectionTrait,
{
    let model = movement::ActiveModel {
        account_id: Set(entry.account.as_str().to_string()),
        direction: Set(entry.direction),
        amount: Set(entry.amount),
        memo: Set(entry.memo.clone()),
        sale_id: Set(entry.sale_id.clone()),
        source_transaction_id: Set(source_id.to_string()),
        source_transaction_kind: Set(source_kind),
        occurred_at: Set(Utc::now()),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Movements of one account, newest first, optionally limited.
pub async fn movements_for_account<C>(
    db: &C,
    account: AccountId,
    limit: Option<u64>,
) -> Result<Vec<movement::Model>>
where
    C: ConnectionTrait,
{
    Movement::find()
        .filter(movement::Column::AccountId.eq(account.as_str()))
        .order_by_desc(movement::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Every movement produced by one event, in append order.
pub async fn movements_for_source<C>(db: &C, source_id: &str) -> Result<Vec<movement::Model>>
where
    C: ConnectionTrait,
{
    Movement::find()
        .filter(movement::Column::SourceTransactionId.eq(source_id))
        .order_by_asc(movement::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// The whole log, in append order.
pub async fn all_movements<C>(db: &C) -> Result<Vec<movement::Model>>
where
    C: ConnectionTrait,
{
    Movement::find()
        .order_by_asc(movement::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Net of every movement on `account`.
#[must_use]
pub fn net_of(movements: &[movement::Model], account: AccountId) -> Amount {
    movements
        .iter()
        .filter(|entry| entry.account_id == account.as_str())
        .map(movement::Model::signed_amount)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::account::{AccountDelta, apply_delta};
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_append_and_query() -> Result<()> {
        let db = setup_test_db().await?;
        apply_delta(&db, &AccountDelta::income(AccountId::Azteca, 0)).await?;

        append(
            &db,
            &NewMovement::income(AccountId::Azteca, 1_000, "deposit"),
            "evt-1",
            EventKind::Income,
        )
        .await?;
        append(
            &db,
            &NewMovement::expense(AccountId::Azteca, 400, "fuel"),
            "evt-2",
            EventKind::Expense,
        )
        .await?;

        let newest_first = movements_for_account(&db, AccountId::Azteca, None).await?;
        assert_eq!(newest_first.len(), 2);
        assert_eq!(newest_first[0].source_transaction_id, "evt-2");

        let limited = movements_for_account(&db, AccountId::Azteca, Some(1)).await?;
        assert_eq!(limited.len(), 1);

        let by_source = movements_for_source(&db, "evt-1").await?;
        assert_eq!(by_source.len(), 1);
        assert_eq!(by_source[0].source_transaction_kind, EventKind::Income);

        let log = all_movements(&db).await?;
        assert_eq!(net_of(&log, AccountId::Azteca), 600);
        assert_eq!(net_of(&log, AccountId::Leftie), 0);
        Ok(())
    }
}
