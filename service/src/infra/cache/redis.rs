//! [Redis] [`Backend`] implementation.
//!
//! [Redis]: https://redis.io

use std::fmt;

use ::redis::AsyncCommands as _;
use deadpool_redis::Runtime;
use derive_more::{Display, Error as StdError, From};
use tracerr::Traced;

use crate::infra::cache::{self, Backend};

pub use deadpool_redis::{Config, PoolConfig};

/// [Redis] [`Backend`] over a connection pool.
///
/// [Redis]: https://redis.io
#[derive(Clone)]
pub struct Redis {
    /// Pool of [Redis] connections.
    ///
    /// [Redis]: https://redis.io
    pool: deadpool_redis::Pool,
}

impl fmt::Debug for Redis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Redis")
            .field("status", &self.pool.status())
            .finish_non_exhaustive()
    }
}

impl Redis {
    /// Creates a new [`Redis`] backend with the provided [`Config`].
    ///
    /// Connections are established lazily.
    ///
    /// # Errors
    ///
    /// If the [`Config`] is invalid.
    pub fn new(conf: &Config) -> Result<Self, Traced<cache::Error>> {
        let pool = conf
            .create_pool(Some(Runtime::Tokio1))
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)?;
        Ok(Self { pool })
    }

    /// Borrows a connection from the pool.
    async fn connection(
        &self,
    ) -> Result<deadpool_redis::Connection, Traced<cache::Error>> {
        self.pool
            .get()
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)
    }
}

impl Backend for Redis {
    async fn get(
        &self,
        key: &str,
    ) -> Result<Option<String>, Traced<cache::Error>> {
        self.connection()
            .await
            .map_err(tracerr::wrap!())?
            .get(key)
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)
    }

    async fn set(
        &self,
        key: &str,
        value: String,
    ) -> Result<(), Traced<cache::Error>> {
        self.connection()
            .await
            .map_err(tracerr::wrap!())?
            .set(key, value)
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)
    }

    async fn del(&self, key: &str) -> Result<(), Traced<cache::Error>> {
        self.connection()
            .await
            .map_err(tracerr::wrap!())?
            .del(key)
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)
    }
}

/// [`Redis`] backend error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// [Redis] command error.
    ///
    /// [Redis]: https://redis.io
    #[display("Redis command failed: {_0}")]
    Command(::redis::RedisError),

    /// Error of creating a new connection pool.
    #[display("Failed to create a new Redis pool: {_0}")]
    PoolCreation(deadpool_redis::CreatePoolError),

    /// Connection pool error.
    #[display("Redis pool error: {_0}")]
    Pool(deadpool_redis::PoolError),
}
