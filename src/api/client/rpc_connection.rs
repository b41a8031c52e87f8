//! [`RpcConnection`] with related messages.

use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use actix::Message;
use derive_more::{Display, From};
use huddle_client_api_proto::{Command, Event, MemberId};

/// Process-unique ID of a single [`RpcConnection`] instance.
///
/// Distinguishes a reconnected [`Member`] from its previous connection.
///
/// [`Member`]: crate::signalling::room::Member
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generates new unique [`ConnectionId`].
    #[must_use]
    pub fn generate() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// [`Command`] with actix [`Message`] implementation and [`MemberId`] from
/// which this [`Command`] was received.
#[derive(Debug, Message)]
#[rtype(result = "()")]
pub struct CommandMessage {
    /// ID of [`Member`] from which this [`Command`] was received.
    ///
    /// [`Member`]: crate::signalling::room::Member
    pub member_id: MemberId,

    /// Connection which this [`Command`] was received through.
    pub connection_id: ConnectionId,

    /// [`Command`] from [`Member`].
    ///
    /// [`Member`]: crate::signalling::room::Member
    pub cmd: Command,
}

impl CommandMessage {
    /// Creates new [`CommandMessage`].
    #[inline]
    #[must_use]
    pub fn new(
        member_id: MemberId,
        connection_id: ConnectionId,
        cmd: Command,
    ) -> Self {
        Self {
            member_id,
            connection_id,
            cmd,
        }
    }
}

/// Newtype for [`Event`] with actix [`Message`] implementation.
#[derive(Debug, From, Message)]
#[rtype(result = "()")]
pub struct EventMessage(pub Event);

/// Error of sending into an already closed [`RpcConnection`].
#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "RpcConnection is closed")]
pub struct ConnectionClosed;

impl std::error::Error for ConnectionClosed {}

/// Abstraction over RPC connection with some remote [`Member`].
///
/// [`Member`]: crate::signalling::room::Member
pub trait RpcConnection: fmt::Debug + Send + Sync {
    /// Enqueues [`Event`] for delivery to remote [`Member`].
    ///
    /// Never waits for the delivery itself. Errors if the connection is
    /// already gone.
    ///
    /// [`Member`]: crate::signalling::room::Member
    fn send_event(&self, event: Event) -> Result<(), ConnectionClosed>;

    /// Closes [`RpcConnection`] for the provided reason.
    fn close(&self, reason: ClosedReason);
}

/// Reasons of why [`RpcConnection`] may be closed by the server.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ClosedReason {
    /// The same [`Member`] has connected again, so this connection is
    /// superseded.
    ///
    /// [`Member`]: crate::signalling::room::Member
    Replaced,

    /// Server is shutting down.
    ShuttingDown,
}
