//! Rooms capacity settings.

use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;

/// Rooms capacity settings.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize, SmartDefault,
)]
#[serde(default)]
pub struct Room {
    /// Maximum number of simultaneously existing rooms.
    /// Defaults to `10000`.
    #[default(10_000)]
    pub max_rooms: usize,

    /// Maximum number of members in a single room. Defaults to `256`.
    #[default(256)]
    pub max_members: usize,
}
