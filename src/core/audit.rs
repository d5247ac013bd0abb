//! Ledger audit - Recomputes stored totals from the records they summarise.
//!
//! The audit only reads. Any mismatch is reported, never repaired: account
//! balances against the movement log, counterparty debt against open records,
//! and each sale or order against its own arithmetic.

use crate::{
    entities::{Client, Distributor, LedgerEvent, OrderStatus, PurchaseOrder, Sale},
    errors::{Error, Result},
};
use sea_orm::prelude::*;
use serde::Serialize;
use std::{
    collections::{HashMap, HashSet},
    str::FromStr,
};
use tracing::error;

use super::{
    Amount,
    account::{AccountId, get_all_accounts},
    distribution::{Distribution, PaidFraction, prorate},
    movement::{all_movements, net_of},
};

/// Stored balance of one account next to the value rebuilt from the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceCheck {
    /// Record id
    pub id: String,
    /// Stored value
    pub stored: Amount,
    /// Value rebuilt from the underlying records
    pub computed: Amount,
}

impl BalanceCheck {
    /// Whether stored and computed agree.
    #[must_use]
    pub const fn matches(&self) -> bool {
        self.stored == self.computed
    }
}

/// Full audit result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    /// One entry per stored account
    pub accounts: Vec<BalanceCheck>,
    /// Client `total_owed` against open sales
    pub clients: Vec<BalanceCheck>,
    /// Distributor `total_owed` against open orders
    pub distributors: Vec<BalanceCheck>,
    /// Movements inspected
    pub movement_count: usize,
    /// Problems with individual records
    pub record_violations: Vec<String>,
}

impl AuditReport {
    /// Every mismatch, one line each.
    #[must_use]
    pub fn violations(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for (label, checks) in [
            ("account", &self.accounts),
            ("client", &self.clients),
            ("distributor", &self.distributors),
        ] {
            lines.extend(checks.iter().filter(|check| !check.matches()).map(|check| {
                format!(
                    "{label} '{}': stored {} but records sum to {}",
                    check.id, check.stored, check.computed
                )
            }));
        }
        lines.extend(self.record_violations.iter().cloned());
        lines
    }

    /// True when nothing disagrees.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.violations().is_empty()
    }
}

/// Recomputes every derived total and reports, without changing anything.
pub async fn audit<C>(db: &C) -> Result<AuditReport>
where
    C: ConnectionTrait,
{
    let mut report = AuditReport::default();

    let movements = all_movements(db).await?;
    report.movement_count = movements.len();
    for account in get_all_accounts(db).await? {
        let computed = match AccountId::from_str(&account.id) {
            Ok(id) => net_of(&movements, id),
            Err(_) => {
                report
                    .record_violations
                    .push(format!("unknown account '{}'", account.id));
                continue;
            }
        };
        if account.lifetime_income < 0 || account.lifetime_expense < 0 || account.lifetime_transfers < 0 {
            report
                .record_violations
                .push(format!("account '{}' has a negative lifetime total", account.id));
        }
        report.accounts.push(BalanceCheck {
            id: account.id,
            stored: account.balance,
            computed,
        });
    }

    let committed: HashSet<String> = LedgerEvent::find()
        .all(db)
        .await?
        .into_iter()
        .map(|event| event.id)
        .collect();
    for entry in movements.iter().filter(|entry| !committed.contains(&entry.source_transaction_id)) {
        report.record_violations.push(format!(
            "movement {} references uncommitted event '{}'",
            entry.id, entry.source_transaction_id
        ));
    }

    // Net credited per (sale, account) by distribution movements
    let mut credited: HashMap<(String, String), Amount> = HashMap::new();
    for entry in &movements {
        if let Some(sale_id) = &entry.sale_id {
            *credited
                .entry((sale_id.clone(), entry.account_id.clone()))
                .or_default() += entry.signed_amount();
        }
    }

    let sales = Sale::find().all(db).await?;
    for sale in &sales {
        let full = Distribution {
            cost_recovery: sale.cost_recovery,
            freight: sale.freight,
            profit: sale.profit,
        };
        let due = prorate(&full, PaidFraction::new(sale.amount_paid, sale.total));
        let accounts = AccountId::distribution_accounts(sale.currency);
        for (account, share) in accounts
            .into_iter()
            .zip([due.cost_recovery, due.freight, due.profit])
        {
            let received = credited
                .remove(&(sale.id.clone(), account.as_str().to_string()))
                .unwrap_or(0);
            if received != share {
                report.record_violations.push(format!(
                    "sale '{}': {} received {} but the paid share is {}",
                    sale.id, account, received, share
                ));
            }
        }

        if sale.amount_paid + sale.amount_remaining != sale.total {
            report
                .record_violations
                .push(format!("sale '{}': paid plus remaining differs from total", sale.id));
        }
        if sale.cost_recovery + sale.freight + sale.profit != sale.total {
            report
                .record_violations
                .push(format!("sale '{}': distribution differs from total", sale.id));
        }
    }
    for ((sale_id, account), amount) in &credited {
        report.record_violations.push(format!(
            "{amount} credited to '{account}' for sale '{sale_id}' outside its distribution"
        ));
    }
    for client in Client::find().all(db).await? {
        let computed = sales
            .iter()
            .filter(|sale| sale.client_id == client.id)
            .map(|sale| sale.amount_remaining)
            .sum();
        report.clients.push(BalanceCheck {
            id: client.id,
            stored: client.total_owed,
            computed,
        });
    }

    let orders = PurchaseOrder::find().all(db).await?;
    for order in &orders {
        if order.amount_paid + order.remaining_debt != order.grand_total {
            report.record_violations.push(format!(
                "purchase order '{}': paid plus remaining debt differs from grand total",
                order.id
            ));
        }
    }
    for distributor in Distributor::find().all(db).await? {
        let computed = orders
            .iter()
            .filter(|order| order.distributor_id == distributor.id)
            .filter(|order| order.status != OrderStatus::Cancelled)
            .map(|order| order.remaining_debt)
            .sum();
        report.distributors.push(BalanceCheck {
            id: distributor.id,
            stored: distributor.total_owed,
            computed,
        });
    }

    Ok(report)
}

/// Runs [`audit`] and turns any mismatch into [`Error::InvariantViolation`].
///
/// Each violation is logged at `error` level.
pub async fn verify<C>(db: &C) -> Result<AuditReport>
where
    C: ConnectionTrait,
{
    let report = audit(db).await?;
    let violations = report.violations();
    if violations.is_empty() {
        return Ok(report);
    }
    for violation in &violations {
        error!("Ledger audit: {}", violation);
    }
    Err(Error::InvariantViolation { violations })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic)]
    use super::*;
    use crate::core::account::{AccountDelta, apply_delta};
    use crate::core::ledger::{Opened, Transaction, open};
    use crate::core::requests::SaleRequest;
    use crate::entities::EventKind;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_empty_ledger_is_clean() -> Result<()> {
        let db = setup_test_db().await?;
        let report = verify(&db).await?;
        assert!(report.is_clean());
        assert_eq!(report.movement_count, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_balance_without_movement_is_reported() -> Result<()> {
        let db = setup_test_db().await?;
        // A delta applied outside a commit leaves no movement behind
        apply_delta(&db, &AccountDelta::income(AccountId::Profit, 900)).await?;

        let report = audit(&db).await?;
        assert!(!report.is_clean());
        assert_eq!(report.violations().len(), 1);
        assert!(report.violations()[0].contains("profit"));

        let result = verify(&db).await;
        assert!(matches!(
            result,
            Err(Error::InvariantViolation { ref violations }) if violations.len() == 1
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_sale_credit_beyond_paid_share_is_reported() -> Result<()> {
        let ledger = setup_ledger().await?;
        let client = create_test_client(ledger.connection(), "Ana").await?;
        let sale = SaleRequest::new(client.id.as_str(), 10, 10_000, 6_300)
            .with_freight(500)
            .paid(40_000);
        ledger.create_sale(sale.clone()).await?;
        assert!(ledger.audit().await?.is_clean());

        // An extra cent for freight, committed like any other event
        let Opened::Fresh(txn) = open(ledger.connection(), "extra-cent").await? else {
            panic!("fresh id reported as replay");
        };
        let mut tx = Transaction::new("extra-cent", EventKind::Payment);
        tx.credit_sale(AccountId::FleteSur, 1, "rounding", &sale.id);
        tx.commit(txn).await?;

        let report = ledger.audit().await?;
        let violations = report.violations();
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains(&sale.id));
        assert!(violations[0].contains("flete_sur"));
        Ok(())
    }
}
