//! Settings of principal extraction.
//!
//! Authentication itself happens upstream: the relay only trusts headers set
//! by the authenticating proxy.

use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;

/// Settings of principal extraction from upgrade requests.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, SmartDefault)]
#[serde(default)]
pub struct Auth {
    /// Header carrying ID of the authenticated user.
    /// Defaults to `X-User-Id`.
    #[default(String::from("X-User-Id"))]
    pub user_id_header: String,

    /// Header carrying display name of the authenticated user.
    /// Defaults to `X-User-Name`.
    ///
    /// User ID is used as a display name if this header is absent.
    #[default(String::from("X-User-Name"))]
    pub user_name_header: String,
}
