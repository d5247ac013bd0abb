//! Ledger event entity - One row per committed business event.
//!
//! The primary key is the caller-generated request id, which makes replaying a
//! request detectable and keeps concurrent duplicates from both landing.

use super::sea_orm_active_enums::EventKind;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ledger event database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ledger_events")]
pub struct Model {
    /// Request id
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Which operation committed this event
    pub kind: EventKind,
    /// Number of movement rows the event appended
    pub movement_count: i32,
    /// Commit time
    pub committed_at: DateTimeUtc,
}

/// `LedgerEvent` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
