//! Repository that stores [`Room`]s addresses.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use actix::{Actor as _, Addr, MailboxError};
use derive_more::{Display, From};
use huddle_client_api_proto::{Event, MemberId, RoomId};

use crate::{
    api::client::rpc_connection::{
        CommandMessage, ConnectionId, RpcConnection,
    },
    conf,
    log::prelude::*,
    shutdown::GracefulShutdown,
    signalling::room::{
        Broadcast, GetMembers, Join, Leave, Participant, Room, RoomError,
    },
};

/// Errors of [`RoomRepository`] operations.
#[derive(Debug, Display, From)]
pub enum RoomRepoError {
    /// Limit of simultaneously existing [`Room`]s is reached.
    #[display(fmt = "Too many rooms")]
    #[from(ignore)]
    TooManyRooms,

    /// [`Room`] refused the operation.
    #[display(fmt = "Room error: {}", _0)]
    Room(RoomError),

    /// [`Room`] couldn't be reached.
    #[display(fmt = "Room mailbox error: {}", _0)]
    Mailbox(MailboxError),
}

impl std::error::Error for RoomRepoError {}

impl RoomRepoError {
    /// Indicates whether this error is caused by capacity limits.
    #[must_use]
    pub fn is_capacity_exhausted(&self) -> bool {
        matches!(self, Self::TooManyRooms | Self::Room(RoomError::RoomIsFull))
    }
}

/// Repository that stores [`Room`]s addresses.
///
/// [`Room`]s are created on the first join and remove themselves once the
/// last [`Member`] leaves.
///
/// [`Member`]: crate::signalling::room::Member
#[derive(Clone)]
pub struct RoomRepository {
    /// Addresses of currently existing [`Room`]s.
    rooms: Arc<Mutex<HashMap<RoomId, Addr<Room>>>>,

    /// Capacity limits of [`Room`]s.
    conf: conf::Room,

    /// [`GracefulShutdown`] which created [`Room`]s subscribe to.
    graceful_shutdown: Option<Addr<GracefulShutdown>>,
}

impl fmt::Debug for RoomRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoomRepository")
            .field("rooms", &self.lock().keys().collect::<Vec<_>>())
            .field("conf", &self.conf)
            .finish()
    }
}

impl RoomRepository {
    /// Creates new empty [`RoomRepository`].
    #[must_use]
    pub fn new(conf: conf::Room) -> Self {
        Self {
            rooms: Arc::default(),
            conf,
            graceful_shutdown: None,
        }
    }

    /// Makes all [`Room`]s created by this [`RoomRepository`] subscribe to
    /// the provided [`GracefulShutdown`].
    #[must_use]
    pub fn with_graceful_shutdown(
        mut self,
        addr: Addr<GracefulShutdown>,
    ) -> Self {
        self.graceful_shutdown = Some(addr);
        self
    }

    /// Returns [`GracefulShutdown`] which [`Room`]s should subscribe to.
    pub(crate) fn graceful_shutdown(&self) -> Option<&Addr<GracefulShutdown>> {
        self.graceful_shutdown.as_ref()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<RoomId, Addr<Room>>> {
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns [`Room`] by its ID.
    #[must_use]
    pub fn get(&self, id: &RoomId) -> Option<Addr<Room>> {
        self.lock().get(id).cloned()
    }

    /// Indicates whether [`Room`] with the provided ID exists.
    #[must_use]
    pub fn contains(&self, id: &RoomId) -> bool {
        self.lock().contains_key(id)
    }

    /// Returns count of currently existing [`Room`]s.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Indicates whether there are no [`Room`]s at the moment.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns [`Room`] with the provided ID, starting a new one if there is
    /// none.
    fn get_or_create(&self, id: &RoomId) -> Result<Addr<Room>, RoomRepoError> {
        let mut rooms = self.lock();
        match rooms.get(id) {
            Some(addr) if addr.connected() => return Ok(addr.clone()),
            Some(_) => {}
            None => {
                if rooms.len() >= self.conf.max_rooms {
                    return Err(RoomRepoError::TooManyRooms);
                }
            }
        }
        debug!("Creating Room [id = {}]", id);
        let addr = Room::new(id.clone(), self.conf.max_members, self.clone())
            .start();
        rooms.insert(id.clone(), addr.clone());
        Ok(addr)
    }

    /// Removes [`Room`] from this [`RoomRepository`], unless it has been
    /// already replaced with another one.
    pub fn remove_room(&self, id: &RoomId, addr: &Addr<Room>) {
        let mut rooms = self.lock();
        if rooms.get(id) == Some(addr) {
            rooms.remove(id);
            debug!("Room [id = {}] removed", id);
        }
    }

    /// Adds connection of the provided [`Participant`] to the [`Room`],
    /// creating the [`Room`] if it doesn't exist.
    ///
    /// Retries on a fresh [`Room`] if the existing one is being torn down at
    /// the moment.
    pub async fn join(
        &self,
        room_id: RoomId,
        participant: Participant,
        connection_id: ConnectionId,
        connection: Arc<dyn RpcConnection>,
    ) -> Result<(), RoomRepoError> {
        loop {
            let room = self.get_or_create(&room_id)?;
            let res = room
                .send(Join {
                    participant: participant.clone(),
                    connection_id,
                    connection: Arc::clone(&connection),
                })
                .await;
            match res {
                Ok(Ok(())) => return Ok(()),
                Ok(Err(RoomError::Closing)) | Err(MailboxError::Closed) => {
                    debug!(
                        "Room [id = {}] closed while Member [id = {}] was \
                         joining, retrying",
                        room_id, participant.id,
                    );
                    self.remove_room(&room_id, &room);
                }
                Ok(Err(e)) => return Err(e.into()),
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Removes connection of some [`Member`] from the [`Room`].
    ///
    /// Does nothing if there is no such [`Room`] or the connection is not the
    /// current one of the [`Member`].
    ///
    /// [`Member`]: crate::signalling::room::Member
    pub fn leave(
        &self,
        room_id: &RoomId,
        member_id: MemberId,
        connection_id: ConnectionId,
    ) {
        if let Some(room) = self.get(room_id) {
            room.do_send(Leave {
                member_id,
                connection_id,
            });
        }
    }

    /// Sends [`Event`] to all [`Member`]s of the [`Room`] except the
    /// `exclude`d one.
    ///
    /// [`Member`]: crate::signalling::room::Member
    pub fn broadcast(
        &self,
        room_id: &RoomId,
        event: Event,
        exclude: Option<MemberId>,
    ) {
        if let Some(room) = self.get(room_id) {
            room.do_send(Broadcast { event, exclude });
        }
    }

    /// Returns snapshot of [`Participant`]s of the [`Room`].
    ///
    /// Non-existent [`Room`] has no [`Participant`]s.
    pub async fn members(
        &self,
        room_id: &RoomId,
    ) -> Result<Vec<Participant>, RoomRepoError> {
        let room = match self.get(room_id) {
            Some(room) => room,
            None => return Ok(Vec::new()),
        };
        match room.send(GetMembers).await {
            Ok(members) => Ok(members),
            Err(MailboxError::Closed) => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Hands [`CommandMessage`] over to the [`Room`] for routing.
    pub fn route(&self, room_id: &RoomId, msg: CommandMessage) {
        match self.get(room_id) {
            Some(room) => room.do_send(msg),
            None => debug!(
                "Dropping Command of Member [id = {}]: Room [id = {}] is gone",
                msg.member_id, room_id,
            ),
        }
    }
}
