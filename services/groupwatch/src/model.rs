//! Domain types for group instances

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A live instance of a world, as seen in one poll cycle.
///
/// Rebuilt from the remote API on every cycle; never persisted. Only the
/// `id` outlives the cycle, as a key in the notification ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    /// Opaque instance identifier from the remote API
    pub id: String,
    pub world_name: String,
    pub world_url: String,
    pub instance_url: String,
    pub world_description: Option<String>,
    pub thumbnail_url: Option<String>,
    /// World publication time, already shifted to UTC+9 for display
    pub world_created_at: Option<DateTime<FixedOffset>>,
    pub popularity: Option<i64>,
    pub favorites: Option<i64>,
}
