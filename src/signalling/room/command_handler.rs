//! Implementation of the [`CommandHandler`] for the [`Room`] and related
//! definitions.

use actix::Handler;
use huddle_client_api_proto::{CommandHandler, Event, MemberId};

use crate::{api::client::rpc_connection::CommandMessage, log::prelude::*};

use super::Room;

impl Room {
    /// Relays negotiation [`Event`] produced by `from` [`Member`].
    ///
    /// Goes to the whole [`Room`] (except the sender) if `to` is not set.
    ///
    /// [`Member`]: super::Member
    fn relay(&mut self, from: &MemberId, to: Option<MemberId>, event: Event) {
        match to {
            None => self.broadcast(&event, Some(from)),
            Some(to) if &to == from => warn!(
                "Member [id = {}] in Room [id = {}] addressed a message to \
                 itself, dropping",
                from, self.id,
            ),
            Some(to) => {
                if !self.send_to(&to, event) {
                    debug!(
                        "Message from Member [id = {}] addressed to unknown \
                         Member [id = {}] in Room [id = {}], dropping",
                        from, to, self.id,
                    );
                }
            }
        }
    }
}

impl CommandHandler for Room {
    type Output = ();

    /// Announces arrival of the sender to the other [`Member`]s.
    ///
    /// [`Member`]: super::Member
    fn on_join(&mut self, from: MemberId) {
        self.announce_join(&from);
    }

    fn on_offer(&mut self, from: MemberId, sdp: String, to: Option<MemberId>) {
        let event = Event::Offer {
            sdp,
            from: from.clone(),
        };
        self.relay(&from, to, event);
    }

    fn on_answer(&mut self, from: MemberId, sdp: String, to: Option<MemberId>) {
        let event = Event::Answer {
            sdp,
            from: from.clone(),
        };
        self.relay(&from, to, event);
    }

    fn on_ice_candidate(
        &mut self,
        from: MemberId,
        candidate: serde_json::Value,
        to: Option<MemberId>,
    ) {
        let event = Event::IceCandidate {
            candidate,
            from: from.clone(),
        };
        self.relay(&from, to, event);
    }
}

impl Handler<CommandMessage> for Room {
    type Result = ();

    /// Dispatches [`Command`] received from the current connection of some
    /// [`Member`]. Commands arriving through superseded connections are
    /// dropped.
    ///
    /// [`Command`]: huddle_client_api_proto::Command
    /// [`Member`]: super::Member
    fn handle(&mut self, msg: CommandMessage, ctx: &mut Self::Context) {
        let is_current = self
            .members
            .get(&msg.member_id)
            .map_or(false, |m| m.connection_id == msg.connection_id);
        if !is_current {
            debug!(
                "Dropping Command from Member [id = {}] received through \
                 stale connection {}",
                msg.member_id, msg.connection_id,
            );
            return;
        }

        msg.cmd.dispatch_with(self, msg.member_id);
        self.close_if_empty(ctx);
    }
}
