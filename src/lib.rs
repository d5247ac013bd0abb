//! `ledger-engine` - A multi-account ledger and sales distribution engine
//!
//! This crate turns commercial events (sales, purchase orders, payments,
//! transfers and direct entries) into atomic multi-record commits across seven
//! fixed accounts, counterparty debt, inventory and an append-only movement log.

#![deny(
    unsafe_code,
    unreachable_patterns,
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::float_cmp,
    clippy::cast_possible_truncation,
    clippy::clone_on_ref_ptr,
    clippy::large_enum_variant,
    clippy::too_many_lines,
    rust_2018_idioms,
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::result_large_err, // DbErr is carried by value
)]

/// Configuration management for database and application settings
pub mod config;
/// Core business logic - distribution, validation, orchestration and reporting
pub mod core;
/// SeaORM entity definitions for database tables
pub mod entities;
/// Unified error types and result handling
pub mod errors;

#[cfg(test)]
pub mod test_utils;
