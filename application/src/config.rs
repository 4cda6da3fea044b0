//! [`Config`]-related definitions.

use std::time;

use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use serde::Deserialize;
use service::token;
use smart_default::SmartDefault;

/// Configuration shared by all the components.
///
/// Each component reads only the sections it needs: the gateway ignores
/// [`Postgres`] and [`Redis`], while services ignore [`Clients`].
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    /// HTTP listener of the started component.
    #[serde(default)]
    pub server: Server,

    /// Signing of access and refresh tokens.
    #[serde(default)]
    pub token: Token,

    /// Store of record.
    #[serde(default)]
    pub postgres: Postgres,

    /// Task lists cache.
    #[serde(default)]
    pub redis: Redis,

    /// Services called by the gateway.
    #[serde(default)]
    pub clients: Clients,

    /// Logging.
    #[serde(default)]
    pub log: Log,
}

impl Config {
    /// Loads a [`Config`] from the TOML file at `path`, overridden by
    /// `CONF.`-prefixed environment variables.
    ///
    /// The file is optional, and every missing field takes its default.
    ///
    /// # Errors
    ///
    /// If a present value has the wrong shape.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize()
    }
}

/// HTTP listener configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Server {
    /// Interface to listen on.
    #[default("0.0.0.0".to_owned())]
    pub host: String,

    /// Port to listen on, if not the default one of the started
    /// [`Component`].
    ///
    /// [`Component`]: crate::Component
    pub port: Option<u16>,

    /// Deadline of a single request.
    #[default(time::Duration::from_secs(30))]
    #[serde(with = "humantime_serde")]
    pub request_timeout: time::Duration,

    /// Browser access to the gateway.
    pub cors: Cors,
}

/// [CORS] policy.
///
/// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Cors {
    /// Origins allowed to call the API.
    #[default(vec!["*".to_owned()])]
    pub origins: Vec<String>,
}

/// [JWT] configuration.
///
/// [JWT]: https://wikipedia.org/wiki/JSON_Web_Token
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Token {
    /// Secret shared by all components signing or verifying tokens.
    #[default("secret".to_owned())]
    pub secret: String,

    /// Lifetime of access tokens.
    #[default(time::Duration::from_secs(15 * 60))]
    #[serde(with = "humantime_serde")]
    pub access_ttl: time::Duration,

    /// Lifetime of refresh tokens.
    #[default(time::Duration::from_secs(24 * 60 * 60))]
    #[serde(with = "humantime_serde")]
    pub refresh_ttl: time::Duration,
}

impl From<Token> for service::Tokens {
    fn from(value: Token) -> Self {
        let Token {
            secret,
            access_ttl,
            refresh_ttl,
        } = value;

        Self::new(
            secret.as_bytes(),
            token::Config {
                access_ttl,
                refresh_ttl,
            },
        )
    }
}

impl From<Token> for service::Config {
    fn from(value: Token) -> Self {
        Self {
            tokens: value.into(),
        }
    }
}

/// Postgres store of users and tasks.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
#[expect(missing_docs, reason = "connection parameters")]
pub struct Postgres {
    #[default("127.0.0.1".to_owned())]
    pub host: String,

    #[default(5432)]
    pub port: u16,

    #[default("postgres".to_owned())]
    pub user: String,

    #[default("postgres".to_owned())]
    pub password: String,

    #[default("postgres".to_owned())]
    pub dbname: String,

    /// Maximum number of pooled connections.
    #[default(16)]
    pub pool_size: usize,
}

impl From<Postgres> for service::infra::postgres::Config {
    fn from(conf: Postgres) -> Self {
        let mut pg = Self::new();
        pg.host = Some(conf.host);
        pg.port = Some(conf.port);
        pg.user = Some(conf.user);
        pg.password = Some(conf.password);
        pg.dbname = Some(conf.dbname);
        pg.pool =
            Some(service::infra::postgres::PoolConfig::new(conf.pool_size));
        pg
    }
}

/// Redis cache of task lists.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Redis {
    /// Connection URL, as `redis://[user:password@]host[:port][/db]`.
    #[default("redis://127.0.0.1:6379".to_owned())]
    pub url: String,

    /// Maximum number of pooled connections.
    #[default(16)]
    pub pool_size: usize,
}

impl From<Redis> for service::infra::cache::redis::Config {
    fn from(conf: Redis) -> Self {
        let mut redis = Self::from_url(conf.url);
        redis.pool = Some(service::infra::cache::redis::PoolConfig::new(
            conf.pool_size,
        ));
        redis
    }
}

/// Base URLs of the services called by the gateway.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Clients {
    /// Identity service.
    #[default("http://127.0.0.1:50051".to_owned())]
    pub identity: String,

    /// Authentication service.
    #[default("http://127.0.0.1:50052".to_owned())]
    pub auth: String,

    /// Task service.
    #[default("http://127.0.0.1:50053".to_owned())]
    pub task: String,
}

/// Logging configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Most verbose level still written.
    pub level: LogLevel,
}

/// Verbosity of logs, from the most to the least verbose.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[expect(missing_docs, reason = "self-explanatory")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use super::Config;

    #[test]
    fn falls_back_to_defaults() {
        let config = Config::new("does-not-exist.toml").unwrap();

        assert_eq!(config.server.port, None);
        assert_eq!(config.server.request_timeout, Duration::from_secs(30));
        assert_eq!(config.token.secret, "secret");
        assert_eq!(config.token.access_ttl, Duration::from_secs(15 * 60));
        assert_eq!(config.token.refresh_ttl, Duration::from_secs(86_400));
        assert_eq!(config.postgres.pool_size, 16);
        assert_eq!(config.redis.url, "redis://127.0.0.1:6379");
        assert_eq!(config.clients.task, "http://127.0.0.1:50053");
        assert_eq!(tracing::Level::from(config.log.level), tracing::Level::INFO);
    }
}
