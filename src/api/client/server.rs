//! HTTP server for handling WebSocket connections of Client API.

use std::{io, net::SocketAddr, sync::Arc};

use actix::{Actor, Addr, Handler, ResponseFuture};
use actix_web::{
    dev::ServerHandle,
    middleware,
    web::{self, Data, Path, Payload},
    App, HttpRequest, HttpResponse, HttpServer,
};
use actix_web_actors::ws;

use crate::{
    api::{
        client::{
            rpc_connection::ConnectionId, session::WsSession,
            MAX_WS_MSG_SIZE,
        },
        control::MeetingId,
    },
    conf,
    log::prelude::*,
    shutdown::ShutdownGracefully,
    signalling::room::Participant,
    AppContext,
};

/// Extracts the authenticated [`Participant`] from the headers set by the
/// upstream authenticator.
///
/// `None` if the request carries no user ID.
fn principal(request: &HttpRequest, conf: &conf::Auth) -> Option<Participant> {
    let header = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(ToOwned::to_owned)
    };
    let id = header(conf.user_id_header.as_str())?;
    let name = header(conf.user_name_header.as_str())
        .unwrap_or_else(|| id.clone());
    Some(Participant {
        id: id.into(),
        name,
    })
}

/// Handles all HTTP requests, performs WebSocket handshake (upgrade) and starts
/// new [`WsSession`] for WebSocket connection.
///
/// Connection is registered in its [`Room`] before the upgrade response is
/// sent back.
///
/// [`Room`]: crate::signalling::Room
async fn ws_index(
    request: HttpRequest,
    meeting_id: Path<String>,
    state: Data<AppContext>,
    payload: Payload,
) -> actix_web::Result<HttpResponse> {
    let meeting_id = MeetingId(meeting_id.into_inner());

    let participant = match principal(&request, &state.config.auth) {
        Some(p) => p,
        None => {
            debug!(
                "Unauthenticated connection to Meeting [id = {}]",
                meeting_id,
            );
            return Ok(HttpResponse::Unauthorized().finish());
        }
    };

    let meeting = match state.meetings.get_meeting(&meeting_id).await {
        Ok(Some(meeting)) => meeting,
        Ok(None) => {
            debug!("Meeting [id = {}] not found", meeting_id);
            return Ok(HttpResponse::NotFound().finish());
        }
        Err(e) => {
            error!("Failed to look up Meeting [id = {}]: {}", meeting_id, e);
            return Ok(HttpResponse::InternalServerError().finish());
        }
    };
    if !meeting.is_authorized(&participant.id) {
        info!(
            "Member [id = {}] is not allowed to join Meeting [id = {}]",
            participant.id, meeting_id,
        );
        return Ok(HttpResponse::Forbidden().finish());
    }

    let connection_id = ConnectionId::generate();
    let session = WsSession::new(
        participant.id.clone(),
        connection_id,
        meeting.room_id.clone(),
        state.rooms.clone(),
        state.config.rpc,
    );
    let (addr, response) =
        ws::WsResponseBuilder::new(session, &request, payload)
            .frame_size(MAX_WS_MSG_SIZE)
            .start_with_addr()?;

    let member_id = participant.id.clone();
    match state
        .rooms
        .join(
            meeting.room_id.clone(),
            participant,
            connection_id,
            Arc::new(addr),
        )
        .await
    {
        Ok(()) => {
            info!(
                "Member [id = {}] connected to Room [id = {}]",
                member_id, meeting.room_id,
            );
            Ok(response)
        }
        Err(e) if e.is_capacity_exhausted() => {
            warn!(
                "Member [id = {}] rejected from Room [id = {}]: {}",
                member_id, meeting.room_id, e,
            );
            Ok(HttpResponse::ServiceUnavailable().finish())
        }
        Err(e) => {
            error!(
                "Failed to join Member [id = {}] to Room [id = {}]: {}",
                member_id, meeting.room_id, e,
            );
            Ok(HttpResponse::InternalServerError().finish())
        }
    }
}

/// HTTP server that handles WebSocket connections of Client API.
pub struct Server(ServerHandle);

impl Server {
    /// Starts Client API HTTP server.
    ///
    /// Returns address of the started [`Server`] actor and the socket
    /// addresses the server is actually listening on.
    pub fn run(app: AppContext) -> io::Result<(Addr<Self>, Vec<SocketAddr>)> {
        let bind_addr = app.config.server.client.http.bind_addr();

        let server = HttpServer::new(move || {
            App::new()
                .app_data(Data::new(app.clone()))
                .wrap(middleware::NormalizePath::trim())
                .wrap(middleware::Logger::default())
                .service(
                    web::resource("/ws/meeting/{meeting_id}")
                        .route(web::get().to(ws_index)),
                )
        })
        .disable_signals()
        .bind(bind_addr)?;
        let addrs = server.addrs();
        let server = server.run();
        let handle = server.handle();

        actix::spawn(async move {
            if let Err(e) = server.await {
                error!("Client API HTTP server failed: {}", e);
            }
        });

        info!("Started Client API HTTP server on {:?}", addrs);

        Ok((Self(handle).start(), addrs))
    }
}

impl Actor for Server {
    type Context = actix::Context<Self>;
}

impl Handler<ShutdownGracefully> for Server {
    type Result = ResponseFuture<()>;

    fn handle(
        &mut self,
        _: ShutdownGracefully,
        _: &mut Self::Context,
    ) -> Self::Result {
        info!("Server received ShutdownGracefully message so shutting down");
        let handle = self.0.clone();
        Box::pin(async move { handle.stop(true).await })
    }
}
