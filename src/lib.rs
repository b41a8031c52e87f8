//! Huddle signalling relay.
//!
//! Groups WebSocket connections of meeting participants into rooms and
//! relays presence and WebRTC negotiation messages between them. Media itself
//! flows peer-to-peer and never reaches this server.

#![allow(clippy::module_name_repetitions)]
#![forbid(non_ascii_idents, unsafe_code)]

pub mod api;
pub mod conf;
pub mod log;
pub mod shutdown;
pub mod signalling;

use std::sync::Arc;

use crate::{
    api::control::MeetingService, conf::Conf,
    signalling::room_repo::RoomRepository,
};

/// Global application context.
#[derive(Clone, Debug)]
pub struct AppContext {
    /// [Huddle] configuration.
    ///
    /// [Huddle]: crate
    pub config: Arc<Conf>,

    /// Repository of all currently existing [`Room`]s.
    ///
    /// [`Room`]: crate::signalling::Room
    pub rooms: RoomRepository,

    /// Service resolving meetings that participants connect to.
    pub meetings: Arc<dyn MeetingService>,
}

impl AppContext {
    /// Creates new [`AppContext`].
    #[inline]
    #[must_use]
    pub fn new(
        config: Conf,
        rooms: RoomRepository,
        meetings: Arc<dyn MeetingService>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            rooms,
            meetings,
        }
    }
}
