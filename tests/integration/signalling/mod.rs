//! Signalling API e2e tests.

mod command_validation;
mod presence;
mod relay;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use actix_codec::Framed;
use actix_http::ws::Item;
use awc::{
    error::WsClientError,
    ws::{self, CloseCode, Codec, Frame},
    BoxedSocket,
};
use futures::{SinkExt as _, StreamExt as _};
use huddle::{
    api::{client::server::Server, control::MeetingRepository},
    conf::Conf,
    signalling::RoomRepository,
    AppContext,
};
use huddle_client_api_proto::{Command, Event, RoomId};

/// Relay server started on a random local port.
pub struct TestServer {
    /// Address the server listens on.
    addr: SocketAddr,

    /// Rooms of the started server.
    pub rooms: RoomRepository,
}

impl TestServer {
    /// Starts [`TestServer`] with the default settings and open meetings.
    pub fn start() -> Self {
        Self::start_with(test_conf(), MeetingRepository::new(true))
    }

    /// Starts [`TestServer`] with the provided settings and meetings.
    pub fn start_with(conf: Conf, meetings: MeetingRepository) -> Self {
        let rooms = RoomRepository::new(conf.room);
        let app = AppContext::new(conf, rooms.clone(), Arc::new(meetings));
        let (_, addrs) = Server::run(app).unwrap();
        Self {
            addr: addrs[0],
            rooms,
        }
    }

    /// Returns WebSocket URL of the provided meeting.
    pub fn url(&self, meeting_id: &str) -> String {
        format!("ws://{}/ws/meeting/{}", self.addr, meeting_id)
    }

    /// Waits until room of the provided meeting disappears.
    ///
    /// Returns `false` if it's still there after a second.
    pub async fn wait_room_gone(&self, meeting_id: &str) -> bool {
        let room_id = RoomId(format!("meeting_{}", meeting_id));
        for _ in 0..50 {
            if !self.rooms.contains(&room_id) {
                return true;
            }
            actix_rt::time::sleep(Duration::from_millis(20)).await;
        }
        false
    }
}

/// [`Conf`] binding to a random local port.
pub fn test_conf() -> Conf {
    let mut conf = Conf::default();
    conf.server.client.http.bind_ip = [127, 0, 0, 1].into();
    conf.server.client.http.bind_port = 0;
    conf
}

/// Participant connected to [`TestServer`].
pub struct TestMember {
    conn: Framed<BoxedSocket, Codec>,
}

impl TestMember {
    /// Max duration of waiting for a single [`Event`].
    pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(3);

    /// Duration during which nothing is expected to arrive.
    pub const SILENCE: Duration = Duration::from_millis(300);

    /// Connects to the provided URL as user with the provided ID and name.
    pub async fn connect(
        url: &str,
        user_id: &str,
        user_name: Option<&str>,
    ) -> Result<Self, WsClientError> {
        let mut req = awc::Client::new().ws(url).header("X-User-Id", user_id);
        if let Some(name) = user_name {
            req = req.header("X-User-Name", name);
        }
        let (_, conn) = req.connect().await?;
        Ok(Self { conn })
    }

    /// Sends provided [`Command`].
    pub async fn send(&mut self, cmd: &Command) {
        self.send_text(serde_json::to_string(cmd).unwrap()).await;
    }

    /// Sends raw text frame.
    pub async fn send_text(&mut self, text: impl Into<String>) {
        self.conn
            .send(ws::Message::Text(text.into().into()))
            .await
            .unwrap();
    }

    /// Sends raw binary frame.
    pub async fn send_binary(&mut self, data: &'static [u8]) {
        self.conn
            .send(ws::Message::Binary(data.into()))
            .await
            .unwrap();
    }

    /// Sends text message split into the provided parts, one frame each.
    ///
    /// # Panics
    ///
    /// If less than two parts are provided.
    pub async fn send_fragmented(&mut self, parts: Vec<String>) {
        assert!(parts.len() > 1, "Fragmented message needs 2+ parts");
        let last = parts.len() - 1;
        for (i, part) in parts.into_iter().enumerate() {
            let item = match i {
                0 => Item::FirstText(part.into()),
                i if i == last => Item::Last(part.into()),
                _ => Item::Continue(part.into()),
            };
            self.conn
                .send(ws::Message::Continuation(item))
                .await
                .unwrap();
        }
    }

    /// Returns next non-control [`Frame`] arriving within `deadline`,
    /// answering pings on the way.
    async fn next_frame(&mut self, deadline: Duration) -> Option<Frame> {
        let conn = &mut self.conn;
        let wait = async move {
            while let Some(frame) = conn.next().await {
                match frame.ok()? {
                    Frame::Ping(payload) => {
                        let _ = conn.send(ws::Message::Pong(payload)).await;
                    }
                    Frame::Pong(_) => {}
                    frame => return Some(frame),
                }
            }
            None
        };
        actix_rt::time::timeout(deadline, wait).await.ok().flatten()
    }

    /// Waits for the next [`Event`].
    ///
    /// # Panics
    ///
    /// If nothing arrives within [`TestMember::DEFAULT_DEADLINE`].
    pub async fn expect_event(&mut self) -> Event {
        match self.next_frame(Self::DEFAULT_DEADLINE).await {
            Some(Frame::Text(text)) => serde_json::from_slice(&text).unwrap(),
            other => panic!("Expected Event, got {:?}", other),
        }
    }

    /// Asserts that nothing arrives during [`TestMember::SILENCE`].
    pub async fn expect_silence(&mut self) {
        if let Some(frame) = self.next_frame(Self::SILENCE).await {
            panic!("Expected nothing, got {:?}", frame);
        }
    }

    /// Waits for server to close this connection and returns the close code.
    pub async fn expect_close(&mut self) -> CloseCode {
        match self.next_frame(Self::DEFAULT_DEADLINE).await {
            Some(Frame::Close(Some(reason))) => reason.code,
            other => panic!("Expected Close frame, got {:?}", other),
        }
    }

    /// Closes this connection.
    pub async fn close(mut self) {
        let _ = self.conn.send(ws::Message::Close(None)).await;
    }
}
