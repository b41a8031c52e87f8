//! Room definitions and implementations. Room is responsible for keeping
//! track of its [`Member`]s and relaying signalling messages between them.

mod command_handler;
mod presence;

use std::{collections::HashMap, sync::Arc};

use actix::{
    Actor, ActorContext as _, AsyncContext as _, Context, Handler, Message,
    MessageResult,
};
use derive_more::Display;
use huddle_client_api_proto::{Event, MemberId, RoomId};

use crate::{
    api::client::rpc_connection::{ClosedReason, ConnectionId, RpcConnection},
    log::prelude::*,
    shutdown::{self, Priority, ShutdownGracefully},
    signalling::room_repo::RoomRepository,
};

/// Identity of an authenticated participant.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Participant {
    /// ID of the participant.
    pub id: MemberId,

    /// Human readable name of the participant.
    pub name: String,
}

/// [`Participant`] connected to some [`Room`].
#[derive(Debug)]
pub struct Member {
    /// Identity of this [`Member`].
    pub participant: Participant,

    /// ID of the current connection of this [`Member`].
    pub connection_id: ConnectionId,

    /// Current connection of this [`Member`].
    pub connection: Arc<dyn RpcConnection>,
}

/// Errors of [`Room`] operations.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum RoomError {
    /// [`Room`] has reached its members limit.
    #[display(fmt = "Room is full")]
    RoomIsFull,

    /// [`Room`] is being torn down and accepts no more [`Member`]s.
    #[display(fmt = "Room is closing")]
    Closing,
}

impl std::error::Error for RoomError {}

/// Lifecycle state of [`Room`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum State {
    /// [`Room`] accepts [`Member`]s.
    Started,

    /// [`Room`] has been removed from [`RoomRepository`] and is stopping.
    Closing,
}

/// Set of connected [`Member`]s relaying signalling messages to each other.
///
/// Every mutation and read of the members set goes through this actor's
/// mailbox, so all of them are linearized per [`Room`].
#[derive(Debug)]
pub struct Room {
    /// ID of this [`Room`].
    id: RoomId,

    /// [`Member`]s of this [`Room`].
    members: HashMap<MemberId, Member>,

    /// Maximum number of [`Member`]s of this [`Room`].
    max_members: usize,

    /// [`RoomRepository`] which this [`Room`] is registered in.
    rooms: RoomRepository,

    /// Current lifecycle state.
    state: State,
}

impl Room {
    /// Creates new empty [`Room`].
    #[must_use]
    pub fn new(id: RoomId, max_members: usize, rooms: RoomRepository) -> Self {
        Self {
            id,
            members: HashMap::new(),
            max_members,
            rooms,
            state: State::Started,
        }
    }

    /// Sends [`Event`] to every [`Member`] except the `excluded` one.
    ///
    /// [`Member`]s whose connections turn out to be closed are evicted, which
    /// is announced to the rest of the [`Room`].
    pub(crate) fn broadcast(
        &mut self,
        event: &Event,
        excluded: Option<&MemberId>,
    ) {
        let closed: Vec<_> = self
            .members
            .values()
            .filter(|m| Some(&m.participant.id) != excluded)
            .filter_map(|m| {
                m.connection
                    .send_event(event.clone())
                    .err()
                    .map(|_| m.participant.id.clone())
            })
            .collect();
        for member_id in closed {
            self.evict(&member_id);
        }
    }

    /// Sends [`Event`] to the provided [`Member`] only.
    ///
    /// Returns `false` if there is no such [`Member`] in this [`Room`].
    pub(crate) fn send_to(
        &mut self,
        member_id: &MemberId,
        event: Event,
    ) -> bool {
        let delivered = match self.members.get(member_id) {
            None => return false,
            Some(member) => member.connection.send_event(event).is_ok(),
        };
        if !delivered {
            self.evict(member_id);
        }
        true
    }

    /// Removes [`Member`] with a closed connection and announces its
    /// departure.
    fn evict(&mut self, member_id: &MemberId) {
        if let Some(member) = self.members.remove(member_id) {
            warn!(
                "Member [id = {}] evicted from Room [id = {}]: connection {} \
                 is closed",
                member_id, self.id, member.connection_id,
            );
            self.announce_leave(&member.participant);
        }
    }

    /// Removes this [`Room`] from [`RoomRepository`] and stops it, if it has
    /// no [`Member`]s left.
    fn close_if_empty(&mut self, ctx: &mut Context<Self>) {
        if self.members.is_empty() && self.state == State::Started {
            debug!("Room [id = {}] is empty, closing", self.id);
            self.close(ctx);
        }
    }

    /// Removes this [`Room`] from [`RoomRepository`] and stops it.
    fn close(&mut self, ctx: &mut Context<Self>) {
        self.state = State::Closing;
        self.rooms.remove_room(&self.id, &ctx.address());
        ctx.stop();
    }
}

impl Actor for Room {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        debug!("Room [id = {}] started", self.id);
        if let Some(addr) = self.rooms.graceful_shutdown() {
            shutdown::subscribe(addr, ctx.address().recipient(), Priority(2));
        }
    }

    fn stopped(&mut self, ctx: &mut Self::Context) {
        debug!("Room [id = {}] stopped", self.id);
        if let Some(addr) = self.rooms.graceful_shutdown() {
            shutdown::unsubscribe(
                addr,
                ctx.address().recipient(),
                Priority(2),
            );
        }
    }
}

/// Registers new connection of some [`Participant`] in [`Room`].
///
/// Connection of the [`Member`] with the same ID is replaced.
#[derive(Debug, Message)]
#[rtype(result = "Result<(), RoomError>")]
pub struct Join {
    /// Joining [`Participant`].
    pub participant: Participant,

    /// ID of the joining connection.
    pub connection_id: ConnectionId,

    /// Joining connection.
    pub connection: Arc<dyn RpcConnection>,
}

impl Handler<Join> for Room {
    type Result = Result<(), RoomError>;

    fn handle(&mut self, msg: Join, _: &mut Self::Context) -> Self::Result {
        if self.state == State::Closing {
            return Err(RoomError::Closing);
        }
        let member_id = msg.participant.id.clone();

        if let Some(old) = self.members.remove(&member_id) {
            info!(
                "Member [id = {}] reconnected to Room [id = {}], replacing \
                 connection {} with {}",
                member_id, self.id, old.connection_id, msg.connection_id,
            );
            old.connection.close(ClosedReason::Replaced);
        } else if self.members.len() >= self.max_members {
            return Err(RoomError::RoomIsFull);
        } else {
            debug!(
                "Member [id = {}] connected to Room [id = {}]",
                member_id, self.id,
            );
        }

        self.members.insert(
            member_id,
            Member {
                participant: msg.participant,
                connection_id: msg.connection_id,
                connection: msg.connection,
            },
        );
        Ok(())
    }
}

/// Unregisters connection of some [`Member`] from [`Room`].
///
/// Nothing happens if this connection is not the current one of the
/// [`Member`].
#[derive(Debug, Message)]
#[rtype(result = "()")]
pub struct Leave {
    /// ID of the leaving [`Member`].
    pub member_id: MemberId,

    /// ID of the closed connection.
    pub connection_id: ConnectionId,
}

impl Handler<Leave> for Room {
    type Result = ();

    fn handle(&mut self, msg: Leave, ctx: &mut Self::Context) {
        let is_current = self
            .members
            .get(&msg.member_id)
            .map_or(false, |m| m.connection_id == msg.connection_id);
        if !is_current {
            debug!(
                "Ignoring leave of Member [id = {}] with stale connection {}",
                msg.member_id, msg.connection_id,
            );
            return;
        }

        if let Some(member) = self.members.remove(&msg.member_id) {
            debug!(
                "Member [id = {}] left Room [id = {}]",
                msg.member_id, self.id,
            );
            self.announce_leave(&member.participant);
        }
        self.close_if_empty(ctx);
    }
}

/// Sends [`Event`] to all [`Member`]s of [`Room`] except the excluded one.
#[derive(Debug, Message)]
#[rtype(result = "()")]
pub struct Broadcast {
    /// [`Event`] to send.
    pub event: Event,

    /// [`Member`] which shouldn't receive the [`Event`].
    pub exclude: Option<MemberId>,
}

impl Handler<Broadcast> for Room {
    type Result = ();

    fn handle(&mut self, msg: Broadcast, ctx: &mut Self::Context) {
        self.broadcast(&msg.event, msg.exclude.as_ref());
        self.close_if_empty(ctx);
    }
}

/// Returns snapshot of [`Room`]'s [`Participant`]s.
#[derive(Debug, Message)]
#[rtype(result = "Vec<Participant>")]
pub struct GetMembers;

impl Handler<GetMembers> for Room {
    type Result = MessageResult<GetMembers>;

    fn handle(&mut self, _: GetMembers, _: &mut Self::Context) -> Self::Result {
        MessageResult(
            self.members
                .values()
                .map(|m| m.participant.clone())
                .collect(),
        )
    }
}

impl Handler<ShutdownGracefully> for Room {
    type Result = ();

    fn handle(&mut self, _: ShutdownGracefully, ctx: &mut Self::Context) {
        info!(
            "Room [id = {}] received ShutdownGracefully message so shutting \
             down",
            self.id,
        );
        for (_, member) in self.members.drain() {
            member.connection.close(ClosedReason::ShuttingDown);
        }
        if self.state == State::Started {
            self.close(ctx);
        }
    }
}
