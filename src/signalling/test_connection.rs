//! [`RpcConnection`] implementation recording everything sent into it.

use std::sync::{Arc, Mutex};

use huddle_client_api_proto::Event;

use crate::{
    api::client::rpc_connection::{
        ClosedReason, ConnectionClosed, RpcConnection,
    },
    signalling::room::Participant,
};

/// Recording [`RpcConnection`]. Clones share the same records.
#[derive(Clone, Debug, Default)]
pub struct TestConnection {
    /// [`Event`]s sent into this connection and not yet taken.
    events: Arc<Mutex<Vec<Event>>>,

    /// Reason this connection was closed with by the server.
    closed: Arc<Mutex<Option<ClosedReason>>>,

    /// Whether the remote side is gone.
    disconnected: Arc<Mutex<bool>>,
}

impl TestConnection {
    /// Creates new open [`TestConnection`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes all the [`Event`]s received so far.
    pub fn events(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    /// Returns [`ClosedReason`] this connection was closed with, if any.
    pub fn closed_with(&self) -> Option<ClosedReason> {
        *self.closed.lock().unwrap()
    }

    /// Makes all further sends into this connection fail.
    pub fn disconnect(&self) {
        *self.disconnected.lock().unwrap() = true;
    }
}

impl RpcConnection for TestConnection {
    fn send_event(&self, event: Event) -> Result<(), ConnectionClosed> {
        if *self.disconnected.lock().unwrap() {
            return Err(ConnectionClosed);
        }
        self.events.lock().unwrap().push(event);
        Ok(())
    }

    fn close(&self, reason: ClosedReason) {
        *self.closed.lock().unwrap() = Some(reason);
    }
}

/// Builds [`Participant`] named after its ID.
pub fn participant(id: &str) -> Participant {
    Participant {
        id: id.into(),
        name: format!("User {}", id),
    }
}
