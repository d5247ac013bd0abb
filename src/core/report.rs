//! Report generation business logic.
//!
//! Read-only views over the ledger: per-account statements and per-client
//! summaries. All functions return structured data; formatting helpers render
//! cent amounts for logs.

use crate::{
    entities::{Sale, account, client, movement, sale},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, prelude::*};
use serde::Serialize;

use super::{
    Amount,
    account::{AccountId, get_account},
    distribution::{AggregateDistribution, LineItem, compute_aggregate_distribution},
    movement::movements_for_account,
};

/// Recent activity and lifetime totals of one account.
#[derive(Debug, Clone, Serialize)]
pub struct AccountStatement {
    /// The stored account
    pub account: account::Model,
    /// Latest movements, newest first
    pub recent_movements: Vec<movement::Model>,
}

/// Totals across everything a client has bought.
#[derive(Debug, Clone, Serialize)]
pub struct ClientSummary {
    /// The client record
    pub client: client::Model,
    /// Number of sales
    pub sale_count: usize,
    /// Sales with something still owed
    pub open_sale_count: usize,
    /// Full split of every sale, paid or not
    pub aggregate: AggregateDistribution,
    /// Sum of amounts paid on the client's sales
    pub total_paid: Amount,
    /// Sum of amounts still owed
    pub total_owed: Amount,
}

/// Builds the statement for `account`, with at most `limit` movements (default 10).
pub async fn account_statement<C>(
    db: &C,
    account: AccountId,
    limit: Option<u64>,
) -> Result<AccountStatement>
where
    C: ConnectionTrait,
{
    let stored = get_account(db, account)
        .await?
        .ok_or_else(|| Error::not_found("account", account.as_str()))?;
    let recent_movements = movements_for_account(db, account, Some(limit.unwrap_or(10))).await?;

    Ok(AccountStatement {
        account: stored,
        recent_movements,
    })
}

/// Summarises a client's sales.
pub async fn client_summary<C>(db: &C, client_id: &str) -> Result<ClientSummary>
where
    C: ConnectionTrait,
{
    let client = client::Entity::find_by_id(client_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("client", client_id))?;
    let sales = Sale::find()
        .filter(sale::Column::ClientId.eq(client_id))
        .order_by_asc(sale::Column::CreatedAt)
        .all(db)
        .await?;

    let line_of = |sale: &sale::Model| LineItem {
        unit_sale_price: sale.unit_sale_price,
        unit_cost: sale.unit_cost,
        unit_freight: sale.unit_freight,
        quantity: sale.quantity,
    };
    let (with_freight, without_freight): (Vec<&sale::Model>, Vec<&sale::Model>) =
        sales.iter().partition(|sale| sale.include_freight);
    let with = compute_aggregate_distribution(
        &with_freight.iter().map(|sale| line_of(*sale)).collect::<Vec<_>>(),
        true,
    );
    let without = compute_aggregate_distribution(
        &without_freight.iter().map(|sale| line_of(*sale)).collect::<Vec<_>>(),
        false,
    );

    let mut aggregate = with;
    aggregate.distribution.cost_recovery += without.distribution.cost_recovery;
    aggregate.distribution.freight += without.distribution.freight;
    aggregate.distribution.profit += without.distribution.profit;
    aggregate.total_revenue += without.total_revenue;
    aggregate.quantity += without.quantity;

    Ok(ClientSummary {
        sale_count: sales.len(),
        open_sale_count: sales.iter().filter(|sale| sale.amount_remaining > 0).count(),
        aggregate,
        total_paid: sales.iter().map(|sale| sale.amount_paid).sum(),
        total_owed: sales.iter().map(|sale| sale.amount_remaining).sum(),
        client,
    })
}

/// Formats cents as a signed currency string, like "+$50.00" or "-$25.50".
#[must_use]
pub fn format_amount(amount: Amount) -> String {
    let sign = if amount < 0 { "-" } else { "+" };
    let cents = amount.unsigned_abs();
    format!("{sign}${}.{:02}", cents / 100, cents % 100)
}

/// One-line rendering of a movement.
#[must_use]
pub fn format_movement_summary(entry: &movement::Model) -> String {
    format!(
        "{} | {} | {:?} {} | {}",
        format_amount(entry.signed_amount()),
        entry.account_id,
        entry.source_transaction_kind,
        entry.source_transaction_id,
        entry.memo
    )
}
