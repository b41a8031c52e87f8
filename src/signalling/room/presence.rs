//! Presence announcements of [`Room`] [`Member`]s.
//!
//! [`Member`]: super::Member

use huddle_client_api_proto::{Event, MemberId};

use crate::log::prelude::*;

use super::{Participant, Room};

impl Room {
    /// Announces arrival of the provided [`Member`] to all the other
    /// [`Member`]s of this [`Room`].
    ///
    /// [`Member`]: super::Member
    pub(super) fn announce_join(&mut self, member_id: &MemberId) {
        let participant = match self.members.get(member_id) {
            Some(member) => member.participant.clone(),
            None => {
                warn!(
                    "Cannot announce unknown Member [id = {}] in Room \
                     [id = {}]",
                    member_id, self.id,
                );
                return;
            }
        };
        let event = Event::UserJoined {
            user_id: participant.id,
            user_name: participant.name,
        };
        self.broadcast(&event, Some(member_id));
    }

    /// Announces departure of the provided [`Participant`] to all the
    /// [`Member`]s left in this [`Room`].
    ///
    /// Must be called only after the departed [`Member`] is removed.
    ///
    /// [`Member`]: super::Member
    pub(super) fn announce_leave(&mut self, participant: &Participant) {
        let event = Event::UserLeft {
            user_id: participant.id.clone(),
            user_name: participant.name.clone(),
        };
        self.broadcast(&event, Some(&participant.id));
    }
}
