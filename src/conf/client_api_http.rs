//! [Client API]'s HTTP server settings.
//!
//! [Client API]: crate::api::client

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;

/// [Client API]'s HTTP server settings.
///
/// [Client API]: crate::api::client
#[derive(Clone, Debug, Deserialize, Serialize, SmartDefault)]
#[serde(default)]
pub struct ClientApiHttpServer {
    /// IP address to bind HTTP server to. Defaults to `0.0.0.0`.
    #[default(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)))]
    pub bind_ip: IpAddr,

    /// Port to bind HTTP server to. Defaults to `8080`.
    ///
    /// `0` lets the OS pick a free port.
    #[default(8080)]
    pub bind_port: u16,
}

impl ClientApiHttpServer {
    /// Builds [`SocketAddr`] from `bind_ip` and `bind_port`.
    #[inline]
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.bind_port)
    }
}
