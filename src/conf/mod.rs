//! Provides application configuration options.
//!
//! Configuration options can be parsed from config files in TOML format.

pub mod auth;
pub mod client_api_http;
pub mod control;
pub mod log;
pub mod room;
pub mod rpc;
pub mod server;
pub mod shutdown;

use std::env;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

#[doc(inline)]
pub use self::{
    auth::Auth,
    client_api_http::ClientApiHttpServer,
    control::Control,
    log::Log,
    room::Room,
    rpc::Rpc,
    server::{ClientApiServer, Server},
    shutdown::Shutdown,
};

/// CLI argument that is responsible for holding application configuration
/// file path.
static APP_CONF_PATH_CMD_ARG_NAME: &str = "--conf";

/// Environment variable that is responsible for holding application
/// configuration file path.
static APP_CONF_PATH_ENV_VAR_NAME: &str = "HUDDLE_CONF";

/// Prefix of environment variables overriding configuration options.
static APP_CONF_ENV_PREFIX: &str = "HUDDLE";

/// Holds application config.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Conf {
    /// HTTP server settings.
    pub server: Server,

    /// RPC connection settings.
    pub rpc: Rpc,

    /// Rooms capacity settings.
    pub room: Room,

    /// Settings of principal extraction from the upstream authenticator.
    pub auth: Auth,

    /// Meetings lookup settings.
    pub control: Control,

    /// Logging settings.
    pub log: Log,

    /// Application shutdown settings.
    pub shutdown: Shutdown,
}

impl Conf {
    /// Creates new [`Conf`] and applies values from such sources
    /// and in that order:
    /// - default values;
    /// - configuration file, the name of which is given as a command line
    ///   parameter or environment variable;
    /// - environment variables;
    pub fn parse() -> Result<Self, ConfigError> {
        let mut cfg =
            Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Some(path) = get_conf_file_name(
            env::var(APP_CONF_PATH_ENV_VAR_NAME),
            env::args(),
        ) {
            cfg = cfg.add_source(File::with_name(&path));
        }

        cfg.add_source(
            Environment::with_prefix(APP_CONF_ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?
        .try_deserialize()
    }
}

/// Returns the path to the configuration file, if it's set via CLI `args`
/// or environment variable.
fn get_conf_file_name<T>(
    env_var: Result<String, env::VarError>,
    cmd_args: T,
) -> Option<String>
where
    T: Iterator<Item = String>,
{
    if let Ok(path) = env_var {
        Some(path)
    } else {
        let mut args = cmd_args.skip_while(|x| x != APP_CONF_PATH_CMD_ARG_NAME);
        if args.next().is_some() {
            args.next().filter(|v| !v.is_empty())
        } else {
            None
        }
    }
}

/// Sets provided environment variables, parses [`Conf`] and unsets them back.
#[cfg(test)]
#[macro_export]
macro_rules! overrided_by_env_conf {
    ($($env:expr => $value:expr),+ $(,)?) => {{
        $(::std::env::set_var($env, $value);)+
        let conf = $crate::conf::Conf::parse().unwrap();
        $(::std::env::remove_var($env);)+
        conf
    }};
}
