//! Settings for application servers.

use serde::{Deserialize, Serialize};

use super::ClientApiHttpServer;

/// [Client API] servers settings.
///
/// [Client API]: crate::api::client
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientApiServer {
    /// [Client API] server settings.
    ///
    /// [Client API]: crate::api::client
    pub http: ClientApiHttpServer,
}

/// Settings for application servers.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Server {
    /// [Client API] servers settings.
    ///
    /// [Client API]: crate::api::client
    pub client: ClientApiServer,
}
