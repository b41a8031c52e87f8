use std::sync::Arc;

use actix::Actor as _;
use dotenv::dotenv;
use huddle::{
    api::{client::server::Server, control::MeetingRepository},
    conf::Conf,
    log::{self, prelude::*},
    shutdown::{self, GracefulShutdown, Priority},
    signalling::room_repo::RoomRepository,
    AppContext,
};

fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Conf::parse()?;

    let logger = log::new_dual_logger(
        std::io::stdout(),
        std::io::stderr(),
        config.log.level(),
    );
    let _log_guard = slog_scope::set_global_logger(logger);
    slog_stdlog::init()?;

    info!("{:?}", config);

    let sys = actix::System::new();
    sys.block_on(async move {
        let graceful_shutdown =
            GracefulShutdown::new(config.shutdown.timeout).start();

        let meetings = MeetingRepository::from_conf(&config.control)?;
        let rooms = RoomRepository::new(config.room)
            .with_graceful_shutdown(graceful_shutdown.clone());
        let app = AppContext::new(config, rooms, Arc::new(meetings));

        let (server, _) = Server::run(app)?;
        shutdown::subscribe(
            &graceful_shutdown,
            server.recipient(),
            Priority(1),
        );

        Ok::<_, anyhow::Error>(())
    })?;
    sys.run()?;

    Ok(())
}
