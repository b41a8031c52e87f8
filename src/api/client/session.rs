//! WebSocket session of a single connected participant.

use std::time::Duration;

use actix::{
    Actor, ActorContext as _, Addr, AsyncContext as _, Handler, Message,
    SpawnHandle, StreamHandler,
};
use actix_http::ws::Item;
use actix_web_actors::ws::{self, CloseCode, CloseReason, WebsocketContext};
use huddle_client_api_proto::{Command, Event, MemberId, RoomId};
use serde_json::error::Category;

use crate::{
    api::client::{
        rpc_connection::{
            ClosedReason, CommandMessage, ConnectionClosed, ConnectionId,
            EventMessage, RpcConnection,
        },
        MAX_WS_MSG_SIZE,
    },
    conf,
    log::prelude::*,
    signalling::room_repo::RoomRepository,
};

/// Long-running WebSocket connection of some [`Member`] in some [`Room`].
///
/// [`Member`]: crate::signalling::room::Member
/// [`Room`]: crate::signalling::Room
#[derive(Debug)]
pub struct WsSession {
    /// ID of [`Member`] that this connection belongs to.
    ///
    /// [`Member`]: crate::signalling::room::Member
    member_id: MemberId,

    /// ID of this connection instance.
    connection_id: ConnectionId,

    /// ID of [`Room`] that [`Member`] joined.
    ///
    /// [`Member`]: crate::signalling::room::Member
    /// [`Room`]: crate::signalling::Room
    room_id: RoomId,

    /// [`RoomRepository`] which inbound [`Command`]s are routed through.
    rooms: RoomRepository,

    /// Duration without any inbound frame after which this connection is
    /// considered dead.
    idle_timeout: Duration,

    /// Interval between pings sent to the client.
    ping_interval: Duration,

    /// Handle of the currently scheduled idle watchdog.
    idle_handler: Option<SpawnHandle>,

    /// Fragmented message which is being received at the moment.
    fragmented: Option<Fragmented>,
}

/// Message received in several WebSocket frames.
#[derive(Debug)]
enum Fragmented {
    /// Text message and its payload received so far.
    Text(Vec<u8>),

    /// Binary message. Dropped once completed.
    Binary,

    /// Message exceeding [`MAX_WS_MSG_SIZE`]. Dropped once completed.
    Oversized,
}

impl WsSession {
    /// Creates new [`WsSession`] for specified [`Member`].
    ///
    /// [`Member`]: crate::signalling::room::Member
    #[must_use]
    pub fn new(
        member_id: MemberId,
        connection_id: ConnectionId,
        room_id: RoomId,
        rooms: RoomRepository,
        conf: conf::Rpc,
    ) -> Self {
        Self {
            member_id,
            connection_id,
            room_id,
            rooms,
            idle_timeout: conf.idle_timeout,
            ping_interval: conf.ping_interval,
            idle_handler: None,
            fragmented: None,
        }
    }

    /// Restarts idle watchdog of this [`WsSession`].
    fn reset_idle_timeout(&mut self, ctx: &mut <Self as Actor>::Context) {
        if let Some(handler) = self.idle_handler.take() {
            ctx.cancel_future(handler);
        }
        self.idle_handler =
            Some(ctx.run_later(self.idle_timeout, |this, ctx| {
                info!(
                    "WsSession of Member [id = {}] in Room [id = {}] is idle",
                    this.member_id, this.room_id,
                );
                ctx.close(Some(CloseReason {
                    code: CloseCode::Away,
                    description: Some("Idle timeout".into()),
                }));
                ctx.stop();
            }));
    }

    /// Decodes text frame and routes the resulting [`Command`] to the
    /// [`Room`].
    ///
    /// Frames that cannot be decoded are dropped.
    ///
    /// [`Room`]: crate::signalling::Room
    fn handle_text(&self, text: &str) {
        match serde_json::from_str::<Command>(text) {
            Ok(cmd) => {
                debug!(
                    "Command from Member [id = {}]: {:?}",
                    self.member_id, cmd
                );
                self.rooms.route(
                    &self.room_id,
                    CommandMessage::new(
                        self.member_id.clone(),
                        self.connection_id,
                        cmd,
                    ),
                );
            }
            Err(e) => match e.classify() {
                Category::Data => warn!(
                    "Dropped Command from Member [id = {}] of unknown type or \
                     shape: {}",
                    self.member_id, e,
                ),
                Category::Io | Category::Syntax | Category::Eof => warn!(
                    "Dropped undecodable frame from Member [id = {}]: {}",
                    self.member_id, e,
                ),
            },
        }
    }

    /// Accumulates continuation frame of a fragmented message, handling the
    /// message once its last frame is received.
    fn handle_continuation(&mut self, item: Item) {
        match item {
            Item::FirstText(bytes) => {
                self.start_fragmented(Fragmented::Text(Vec::new()));
                self.append_fragment(&bytes);
            }
            Item::FirstBinary(_) => {
                self.start_fragmented(Fragmented::Binary);
            }
            Item::Continue(bytes) => self.append_fragment(&bytes),
            Item::Last(bytes) => {
                self.append_fragment(&bytes);
                match self.fragmented.take() {
                    Some(Fragmented::Text(payload)) => {
                        match String::from_utf8(payload) {
                            Ok(text) => self.handle_text(&text),
                            Err(e) => warn!(
                                "Dropped undecodable frame from Member \
                                 [id = {}]: {}",
                                self.member_id, e,
                            ),
                        }
                    }
                    Some(Fragmented::Binary) => warn!(
                        "Dropped binary frame from Member [id = {}]",
                        self.member_id,
                    ),
                    Some(Fragmented::Oversized) | None => {}
                }
            }
        }
    }

    /// Begins receiving new fragmented message.
    fn start_fragmented(&mut self, msg: Fragmented) {
        if self.fragmented.is_some() {
            warn!(
                "Dropped unfinished fragmented message from Member [id = {}]",
                self.member_id,
            );
        }
        self.fragmented = Some(msg);
    }

    /// Appends payload of continuation frame to the fragmented message.
    fn append_fragment(&mut self, bytes: &[u8]) {
        match &mut self.fragmented {
            Some(Fragmented::Text(payload)) => {
                if payload.len() + bytes.len() > MAX_WS_MSG_SIZE {
                    warn!(
                        "Dropped fragmented message from Member [id = {}]: \
                         exceeds {} bytes",
                        self.member_id, MAX_WS_MSG_SIZE,
                    );
                    self.fragmented = Some(Fragmented::Oversized);
                } else {
                    payload.extend_from_slice(bytes);
                }
            }
            Some(Fragmented::Binary | Fragmented::Oversized) => {}
            None => warn!(
                "Dropped continuation frame without first frame from Member \
                 [id = {}]",
                self.member_id,
            ),
        }
    }
}

impl Actor for WsSession {
    type Context = WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        debug!(
            "WsSession of Member [id = {}] started, connection {}",
            self.member_id, self.connection_id,
        );
        self.reset_idle_timeout(ctx);
        ctx.run_interval(self.ping_interval, |_, ctx| {
            ctx.ping(b"");
        });
    }

    fn stopped(&mut self, _: &mut Self::Context) {
        debug!(
            "WsSession of Member [id = {}] stopped, connection {}",
            self.member_id, self.connection_id,
        );
        self.rooms.leave(
            &self.room_id,
            self.member_id.clone(),
            self.connection_id,
        );
    }
}

impl RpcConnection for Addr<WsSession> {
    fn send_event(&self, event: Event) -> Result<(), ConnectionClosed> {
        if self.connected() {
            self.do_send(EventMessage(event));
            Ok(())
        } else {
            Err(ConnectionClosed)
        }
    }

    fn close(&self, reason: ClosedReason) {
        self.do_send(CloseSession(reason));
    }
}

impl Handler<EventMessage> for WsSession {
    type Result = ();

    fn handle(&mut self, msg: EventMessage, ctx: &mut Self::Context) {
        match serde_json::to_string(&msg.0) {
            Ok(text) => ctx.text(text),
            Err(e) => error!("Failed to serialize Event {:?}: {}", msg.0, e),
        }
    }
}

/// Message closing [`WsSession`] from the server side.
#[derive(Debug, Message)]
#[rtype(result = "()")]
pub struct CloseSession(pub ClosedReason);

impl Handler<CloseSession> for WsSession {
    type Result = ();

    fn handle(&mut self, msg: CloseSession, ctx: &mut Self::Context) {
        info!(
            "Closing WsSession of Member [id = {}]: {}",
            self.member_id, msg.0,
        );
        let code = match msg.0 {
            ClosedReason::Replaced => CloseCode::Normal,
            ClosedReason::ShuttingDown => CloseCode::Away,
        };
        ctx.close(Some(CloseReason {
            code,
            description: Some(msg.0.to_string()),
        }));
        ctx.stop();
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(
        &mut self,
        msg: Result<ws::Message, ws::ProtocolError>,
        ctx: &mut Self::Context,
    ) {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                warn!(
                    "WebSocket protocol error of Member [id = {}]: {}",
                    self.member_id, e,
                );
                ctx.stop();
                return;
            }
        };
        self.reset_idle_timeout(ctx);

        match msg {
            ws::Message::Text(text) => self.handle_text(&text),
            ws::Message::Binary(_) => warn!(
                "Dropped binary frame from Member [id = {}]",
                self.member_id,
            ),
            ws::Message::Continuation(item) => self.handle_continuation(item),
            ws::Message::Ping(bytes) => ctx.pong(&bytes),
            ws::Message::Pong(_) | ws::Message::Nop => {}
            ws::Message::Close(reason) => {
                debug!(
                    "Member [id = {}] closed connection: {:?}",
                    self.member_id, reason,
                );
                ctx.close(reason);
                ctx.stop();
            }
        }
    }
}
