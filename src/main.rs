#![allow(clippy::result_large_err)]

use dotenvy::dotenv;
use ledger_engine::{
    config::{self, database},
    core::{
        account::seed_accounts,
        orchestrator::Ledger,
        report::{format_amount, format_movement_summary},
    },
    errors::Result,
};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, env vars can also be set externally
    dotenv().ok();

    // 3. Load the application configuration
    let app_config = config::load_app_configuration()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;

    // 4. Connect and create tables
    let database_url = database::get_database_url(app_config.database_url.as_deref());
    if database_url.starts_with("sqlite://data/") {
        std::fs::create_dir_all("data")?;
    }
    let db = database::create_connection(&database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed the fixed accounts
    let seeded = seed_accounts(&db, &app_config)
        .await
        .inspect_err(|e| error!("Failed to seed accounts: {}", e))?;
    info!("Accounts ready ({} newly seeded)", seeded);

    // 6. Check stored totals against the movement log before serving anything
    let ledger = Ledger::new(db, app_config.ledger);
    let report = ledger
        .verify()
        .await
        .inspect_err(|e| error!("Ledger audit failed: {}", e))?;
    info!(
        "Ledger audit clean: {} movements checked",
        report.movement_count
    );

    // 7. Log balances, with each account's latest movements at debug level
    for account in ledger.accounts().await? {
        info!("{:<14} {}", account.id, format_amount(account.balance));
        for entry in ledger
            .movements_for_account(account.id.parse()?, Some(3))
            .await?
        {
            debug!("  {}", format_movement_summary(&entry));
        }
    }

    for product in ledger.products().await? {
        info!(
            "{:<20} stock {:>6} at {}",
            product.name,
            product.stock,
            format_amount(product.unit_cost)
        );
    }

    Ok(())
}
