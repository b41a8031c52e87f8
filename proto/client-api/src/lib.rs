//! Client API protocol implementation for Huddle signalling relay.
//!
//! Relay never looks inside session descriptions or ICE candidates: it only
//! routes them between members of the same room, so their payloads are kept
//! opaque here as well.

#![forbid(unsafe_code)]

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// ID of `Room`.
#[derive(
    Clone, Debug, Deserialize, Display, Eq, From, Hash, PartialEq, Serialize,
)]
#[from(forward)]
#[serde(transparent)]
pub struct RoomId(pub String);

/// ID of `Member`.
#[derive(
    Clone,
    Debug,
    Deserialize,
    Display,
    Eq,
    From,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[from(forward)]
#[serde(transparent)]
pub struct MemberId(pub String);

/// Message from `Client` to `Relay`.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Command {
    /// `Client` announces its presence to the other `Member`s of the room.
    Join,

    /// `Client` offers a session description to remote `Member`s.
    Offer {
        /// SDP Offer of the `RTCPeerConnection`.
        sdp: String,

        /// `Member` this offer is addressed to.
        ///
        /// Whole room receives it if not set.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to: Option<MemberId>,
    },

    /// `Client` answers a previously received [`Event::Offer`].
    Answer {
        /// SDP Answer of the `RTCPeerConnection`.
        sdp: String,

        /// `Member` this answer is addressed to.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to: Option<MemberId>,
    },

    /// `Client` discovered a new ICE candidate.
    IceCandidate {
        /// `RTCIceCandidateInit` as it was produced by the browser.
        candidate: serde_json::Value,

        /// `Member` this candidate is addressed to.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to: Option<MemberId>,
    },
}

impl Command {
    /// Calls the [`CommandHandler`] method matching this [`Command`] kind.
    pub fn dispatch_with<H: CommandHandler>(
        self,
        handler: &mut H,
        from: MemberId,
    ) -> H::Output {
        match self {
            Self::Join => handler.on_join(from),
            Self::Offer { sdp, to } => handler.on_offer(from, sdp, to),
            Self::Answer { sdp, to } => handler.on_answer(from, sdp, to),
            Self::IceCandidate { candidate, to } => {
                handler.on_ice_candidate(from, candidate, to)
            }
        }
    }
}

/// Handler of [`Command`]s received from some `Member`.
pub trait CommandHandler {
    /// Result of handling a single [`Command`].
    type Output;

    /// Handles [`Command::Join`].
    fn on_join(&mut self, from: MemberId) -> Self::Output;

    /// Handles [`Command::Offer`].
    fn on_offer(
        &mut self,
        from: MemberId,
        sdp: String,
        to: Option<MemberId>,
    ) -> Self::Output;

    /// Handles [`Command::Answer`].
    fn on_answer(
        &mut self,
        from: MemberId,
        sdp: String,
        to: Option<MemberId>,
    ) -> Self::Output;

    /// Handles [`Command::IceCandidate`].
    fn on_ice_candidate(
        &mut self,
        from: MemberId,
        candidate: serde_json::Value,
        to: Option<MemberId>,
    ) -> Self::Output;
}

/// Message from `Relay` to `Client`.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Event {
    /// Some other `Member` announced its presence in the room.
    #[serde(rename_all = "camelCase")]
    UserJoined {
        /// ID of the joined `Member`.
        user_id: MemberId,

        /// Human readable name of the joined `Member`.
        user_name: String,
    },

    /// Some other `Member` has left the room.
    #[serde(rename_all = "camelCase")]
    UserLeft {
        /// ID of the gone `Member`.
        user_id: MemberId,

        /// Human readable name of the gone `Member`.
        user_name: String,
    },

    /// Relayed [`Command::Offer`].
    Offer {
        /// SDP Offer of the remote `RTCPeerConnection`.
        sdp: String,

        /// `Member` that sent this offer.
        from: MemberId,
    },

    /// Relayed [`Command::Answer`].
    Answer {
        /// SDP Answer of the remote `RTCPeerConnection`.
        sdp: String,

        /// `Member` that sent this answer.
        from: MemberId,
    },

    /// Relayed [`Command::IceCandidate`].
    IceCandidate {
        /// `RTCIceCandidateInit` of the remote `RTCPeerConnection`.
        candidate: serde_json::Value,

        /// `Member` that discovered this candidate.
        from: MemberId,
    },
}
