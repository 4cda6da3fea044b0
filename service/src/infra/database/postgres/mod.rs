//! Postgres [`Database`] implementation.

pub mod client;
pub mod connection;
mod impls;
pub mod migrate;

use deadpool_postgres::Runtime;
use derive_more::{Deref, Display, Error as StdError, From};
use tokio_postgres::{error::SqlState, NoTls};
use tracerr::Traced;

use crate::infra::database;
#[cfg(doc)]
use crate::infra::Database;

pub use self::{
    client::{NonTx, Tx},
    connection::Connection,
    migrate::{embed_migrations, Runner},
};

pub use deadpool_postgres::{Config, PoolConfig};

/// Postgres [`Database`] client.
#[derive(Clone, Debug, Deref)]
pub struct Postgres<T = NonTx>(T);

impl Postgres {
    /// Creates a new [`Postgres`] store pooling connections as the provided
    /// [`Config`] describes.
    ///
    /// No connection is opened until the first query.
    ///
    /// # Errors
    ///
    /// If the [`Config`] doesn't describe a valid pool.
    pub fn new(conf: &Config) -> Result<Self, Traced<database::Error>> {
        conf.create_pool(Some(Runtime::Tokio1), NoTls)
            .map(|pool| Self(NonTx::from_pool(pool)))
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)
    }
}

/// Postgres database [`Error`].
#[derive(Debug, Display, StdError, From)]
pub enum Error {
    /// [`Connection`] error.
    #[display("`Connection` error: {_0}")]
    Connection(connection::Error),

    /// Failed to set up the [`connection::Pool`].
    #[display("Cannot create connection pool: {_0}")]
    PoolSetup(connection::PoolSetupError),

    /// Failed to borrow a connection from the [`connection::Pool`].
    #[display("Cannot borrow pooled connection: {_0}")]
    Pool(connection::PoolError),

    /// Schema migration error.
    #[display("Migration failed: {_0}")]
    Migration(refinery::Error),

    /// Statement with a `RETURNING` clause yielded no row.
    #[from(ignore)]
    #[display("`RETURNING` statement yielded no row")]
    NoRowReturned,

    /// [`Tx`] is used after being committed.
    #[from(ignore)]
    #[display("`Tx` has been committed already")]
    Committed,
}

impl Error {
    /// Checks if the error is a unique violation of the specified constraint.
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        match self {
            Self::Connection(e) => {
                e.code() == Some(&SqlState::UNIQUE_VIOLATION)
                    && constraint.map_or(true, |c| {
                        e.as_db_error().and_then(|e| e.constraint()) == Some(c)
                    })
            }
            Self::Migration(..)
            | Self::Pool(..)
            | Self::PoolSetup(..)
            | Self::NoRowReturned
            | Self::Committed => false,
        }
    }
}
