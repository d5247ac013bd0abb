//! Core business logic - the ledger engine.
//!
//! Pure calculation and validation live in [`distribution`] and [`validation`];
//! everything that touches the store is reached through
//! [`orchestrator::Ledger`].

/// Fixed accounts and commutative balance deltas
pub mod account;
/// Read-only reconciliation of stored totals
pub mod audit;
/// Client and distributor records
pub mod counterparty;
/// Running owed/paid totals of counterparties
pub mod debt;
/// Three-way revenue split and proration
pub mod distribution;
/// Products and stock
pub mod inventory;
/// Staged mutations and the atomic commit
pub mod ledger;
/// Append-only movement log
pub mod movement;
/// Public operations
pub mod orchestrator;
/// Statements and summaries
pub mod report;
/// Request types
pub mod requests;
/// Cross-field business rules
pub mod validation;

#[cfg(test)]
mod distribution_props;
#[cfg(test)]
mod validation_props;

/// Money in integer cents.
pub type Amount = i64;
