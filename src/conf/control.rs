//! Meetings lookup settings.

use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;

/// Meetings lookup settings.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, SmartDefault)]
#[serde(default)]
pub struct Control {
    /// Path to directory with static meeting specs.
    /// Defaults to `specs/`.
    ///
    /// Missing directory means no predefined meetings.
    #[default(String::from("specs/"))]
    pub static_specs_dir: String,

    /// Whether meetings which are not predefined are considered existing and
    /// open to any authenticated user. Defaults to `true`.
    #[default(true)]
    pub open_meetings: bool,
}
