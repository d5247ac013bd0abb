//! Database configuration module.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs without hand-written SQL. Parents are
//! created before children because `SQLite` foreign keys are enforced.

use crate::entities::{
    Account, Client, Distributor, LedgerEvent, Movement, Payment, Product, PurchaseOrder, Sale,
    Transfer,
};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};

/// Default location of the ledger database.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/ledger.sqlite?mode=rwc";

/// Resolves the database URL: `DATABASE_URL` from the environment wins over the
/// configured value, which falls back to [`DEFAULT_DATABASE_URL`].
#[must_use]
pub fn get_database_url(configured: Option<&str>) -> String {
    std::env::var("DATABASE_URL")
        .ok()
        .or_else(|| configured.map(ToString::to_string))
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database at `database_url`.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    tracing::debug!("Connecting to database at {}", database_url);
    Database::connect(database_url).await.map_err(Into::into)
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates every ledger table if it does not exist yet.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, Account).await?;
    create_table(db, &schema, Client).await?;
    create_table(db, &schema, Distributor).await?;
    create_table(db, &schema, Product).await?;
    create_table(db, &schema, PurchaseOrder).await?;
    create_table(db, &schema, Sale).await?;
    create_table(db, &schema, Movement).await?;
    create_table(db, &schema, Transfer).await?;
    create_table(db, &schema, Payment).await?;
    create_table(db, &schema, LedgerEvent).await?;

    Ok(())
}
