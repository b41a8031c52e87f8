//! Rooms of connected participants and signalling between them.

pub mod room;
pub mod room_repo;

#[cfg(test)]
pub(crate) mod test_connection;

#[doc(inline)]
pub use self::{room::Room, room_repo::RoomRepository};
