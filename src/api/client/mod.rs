//! Implementation of Client API: WebSocket connections of meeting
//! participants.

pub mod rpc_connection;
pub mod server;
pub mod session;

/// Max size of WebSocket message in bytes.
///
/// Also limits the total size of a message received in several frames.
const MAX_WS_MSG_SIZE: usize = 1024 * 1024;
