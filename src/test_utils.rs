//! Shared test utilities for the ledger engine.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test records with sensible defaults.

use crate::{
    config::{AppConfig, LedgerSettings},
    core::{
        account::{AccountId, seed_accounts},
        counterparty,
        ledger::Receipt,
        orchestrator::Ledger,
        requests::{IncomeRequest, NewClient, NewDistributor, PurchaseOrderRequest},
    },
    entities,
    errors::Result,
};
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// A ledger over a fresh database with the seven accounts seeded and default settings.
pub async fn setup_ledger() -> Result<Ledger> {
    setup_ledger_with(LedgerSettings::default()).await
}

/// Like [`setup_ledger`] with custom settings.
pub async fn setup_ledger_with(settings: LedgerSettings) -> Result<Ledger> {
    let db = setup_test_db().await?;
    seed_accounts(&db, &AppConfig::default()).await?;
    Ok(Ledger::new(db, settings))
}

/// Creates a test client with no contact details and no credit limit.
pub async fn create_test_client(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::client::Model> {
    counterparty::create_client(db, &NewClient::new(name)).await
}

/// Creates a test distributor with no contact details.
pub async fn create_test_distributor(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::distributor::Model> {
    counterparty::create_distributor(db, &NewDistributor::new(name)).await
}

/// Deposits `amount` into one of the direct-income accounts.
pub async fn fund_account(ledger: &Ledger, account: AccountId, amount: i64) -> Result<Receipt> {
    ledger
        .register_income(IncomeRequest::new(account, amount, "test funding"))
        .await
}

/// Places an unpaid order of 100 "Widget" at 60.00 + 3.00 transport per unit.
///
/// # Defaults
/// * quantity: 100
/// * unit distributor cost: 6000
/// * unit transport cost: 300
pub async fn create_test_order(ledger: &Ledger, distributor_id: &str) -> Result<Receipt> {
    ledger
        .create_purchase_order(PurchaseOrderRequest::new(
            distributor_id,
            "Widget",
            100,
            6_000,
            300,
        ))
        .await
}
