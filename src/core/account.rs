//! Account store - Balances of the seven fixed ledger accounts.
//!
//! Balances are never overwritten. Every change is a delta applied with a single
//! `UPDATE accounts SET balance = balance + ? WHERE id = ?`, so two commits touching
//! the same account compose correctly in either order. Accounts are created on
//! first reference with zero balances.

use crate::{
    config::AppConfig,
    entities::{Account, Currency, account},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{
    Set,
    prelude::*,
    sea_query::{Expr, OnConflict},
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::Amount;

/// Identifier of one of the seven ledger accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountId {
    /// Main MXN vault; receives cost recovery from MXN sales
    BovedaMonte,
    /// USD vault; receives cost recovery from USD sales
    BovedaUsa,
    /// Net profit of sales
    Utilidades,
    /// Freight collected on sales
    FleteSur,
    /// Operational bank
    Azteca,
    /// Operational bank
    Leftie,
    /// Operational bank
    Profit,
}

impl AccountId {
    /// Every account, in display order.
    pub const ALL: [Self; 7] = [
        Self::BovedaMonte,
        Self::BovedaUsa,
        Self::Profit,
        Self::Leftie,
        Self::Azteca,
        Self::FleteSur,
        Self::Utilidades,
    ];

    /// Accounts allowed to receive direct income.
    pub const DIRECT_INCOME: [Self; 3] = [Self::Azteca, Self::Leftie, Self::Profit];

    /// Storage identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BovedaMonte => "boveda_monte",
            Self::BovedaUsa => "boveda_usa",
            Self::Utilidades => "utilidades",
            Self::FleteSur => "flete_sur",
            Self::Azteca => "azteca",
            Self::Leftie => "leftie",
            Self::Profit => "profit",
        }
    }

    /// Default display name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::BovedaMonte => "Bóveda Monte",
            Self::BovedaUsa => "Bóveda USA",
            Self::Utilidades => "Utilidades",
            Self::FleteSur => "Flete Sur",
            Self::Azteca => "Azteca",
            Self::Leftie => "Leftie",
            Self::Profit => "Profit",
        }
    }

    /// Whether the account may be the destination of `register_income`.
    #[must_use]
    pub const fn accepts_direct_income(self) -> bool {
        matches!(self, Self::Azteca | Self::Leftie | Self::Profit)
    }

    /// Vault that receives the cost-recovery share of a sale in `currency`.
    #[must_use]
    pub const fn cost_recovery_for(currency: Currency) -> Self {
        match currency {
            Currency::Mxn => Self::BovedaMonte,
            Currency::Usd => Self::BovedaUsa,
        }
    }

    /// The accounts a sale's distribution is credited to.
    #[must_use]
    pub const fn distribution_accounts(currency: Currency) -> [Self; 3] {
        [
            Self::cost_recovery_for(currency),
            Self::FleteSur,
            Self::Utilidades,
        ]
    }

    /// Whether the account may fund purchase orders and distributor payments.
    #[must_use]
    pub const fn can_pay_suppliers(self) -> bool {
        matches!(
            self,
            Self::BovedaMonte | Self::Profit | Self::Leftie | Self::Azteca
        )
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| Error::not_found("account", s))
    }
}

/// A commutative change to one account row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountDelta {
    /// Target account
    pub account: AccountId,
    /// Signed change to the balance
    pub balance: Amount,
    /// Added to `lifetime_income`
    pub income: Amount,
    /// Added to `lifetime_expense`
    pub expense: Amount,
    /// Added to `lifetime_transfers`
    pub transfers: Amount,
    /// Reject the delta when the balance would drop below zero
    pub require_funds: bool,
}

impl AccountDelta {
    /// Money received by `account`.
    #[must_use]
    pub const fn income(account: AccountId, amount: Amount) -> Self {
        Self {
            account,
            balance: amount,
            income: amount,
            expense: 0,
            transfers: 0,
            require_funds: false,
        }
    }

    /// Money spent from `account`.
    #[must_use]
    pub const fn expense(account: AccountId, amount: Amount, require_funds: bool) -> Self {
        Self {
            account,
            balance: -amount,
            income: 0,
            expense: amount,
            transfers: 0,
            require_funds,
        }
    }

    /// Sending leg of a transfer.
    #[must_use]
    pub const fn transfer_out(account: AccountId, amount: Amount, require_funds: bool) -> Self {
        Self {
            account,
            balance: -amount,
            income: 0,
            expense: 0,
            transfers: amount,
            require_funds,
        }
    }

    /// Receiving leg of a transfer.
    #[must_use]
    pub const fn transfer_in(account: AccountId, amount: Amount) -> Self {
        Self {
            account,
            balance: amount,
            income: 0,
            expense: 0,
            transfers: amount,
            require_funds: false,
        }
    }
}

/// Finds an account by identifier.
pub async fn get_account<C>(db: &C, account: AccountId) -> Result<Option<account::Model>>
where
    C: ConnectionTrait,
{
    Account::find_by_id(account.as_str())
        .one(db)
        .await
        .map_err(Into::into)
}

/// Returns every stored account in display order.
pub async fn get_all_accounts<C>(db: &C) -> Result<Vec<account::Model>>
where
    C: ConnectionTrait,
{
    let mut accounts = Account::find().all(db).await?;
    accounts.sort_by_key(|model| {
        AccountId::from_str(&model.id)
            .ok()
            .and_then(|id| AccountId::ALL.iter().position(|candidate| *candidate == id))
            .unwrap_or(usize::MAX)
    });
    Ok(accounts)
}

/// Current balance; an account that was never created has a balance of zero.
pub async fn get_balance<C>(db: &C, account: AccountId) -> Result<Amount>
where
    C: ConnectionTrait,
{
    Ok(get_account(db, account)
        .await?
        .map_or(0, |model| model.balance))
}

/// Inserts `account` with zero balances unless it already exists.
pub async fn ensure_account<C>(db: &C, account: AccountId, name: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    let model = account::ActiveModel {
        id: Set(account.as_str().to_string()),
        name: Set(name.to_string()),
        balance: Set(0),
        lifetime_income: Set(0),
        lifetime_expense: Set(0),
        lifetime_transfers: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
    };

    Account::insert(model)
        .on_conflict(
            OnConflict::column(account::Column::Id)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    Ok(())
}

/// Applies a delta to an account, creating the account first if needed.
///
/// This performs an atomic database-level update instead of reading the balance,
/// modifying it and writing it back. With `require_funds` set, the update carries
/// `WHERE balance >= amount` and zero affected rows means the funds were not there.
pub async fn apply_delta<C>(db: &C, delta: &AccountDelta) -> Result<()>
where
    C: ConnectionTrait,
{
    ensure_account(db, delta.account, delta.account.display_name()).await?;

    let mut update = Account::update_many()
        .col_expr(
            account::Column::Balance,
            Expr::col(account::Column::Balance).add(delta.balance),
        )
        .col_expr(
            account::Column::LifetimeIncome,
            Expr::col(account::Column::LifetimeIncome).add(delta.income),
        )
        .col_expr(
            account::Column::LifetimeExpense,
            Expr::col(account::Column::LifetimeExpense).add(delta.expense),
        )
        .col_expr(
            account::Column::LifetimeTransfers,
            Expr::col(account::Column::LifetimeTransfers).add(delta.transfers),
        )
        .col_expr(account::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(account::Column::Id.eq(delta.account.as_str()));

    let guarded = delta.require_funds && delta.balance < 0;
    if guarded {
        update = update.filter(account::Column::Balance.gte(-delta.balance));
    }

    let result = update.exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::InsufficientFunds {
            account: delta.account.as_str().to_string(),
            required: -delta.balance,
        });
    }

    Ok(())
}

/// Creates any of the seven accounts that are missing, using configured display names.
///
/// Returns the number of accounts that were created.
pub async fn seed_accounts(db: &DatabaseConnection, config: &AppConfig) -> Result<usize> {
    let mut created = 0;
    for id in AccountId::ALL {
        if get_account(db, id).await?.is_none() {
            ensure_account(db, id, &config.account_name(id)).await?;
            tracing::debug!("Seeded account {}", id);
            created += 1;
        }
    }
    Ok(created)
}
