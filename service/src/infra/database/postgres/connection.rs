//! Single Postgres [`Connection`]s, borrowed from a [`Pool`].

use std::{fmt, future::Future};

use futures::{FutureExt as _, TryFutureExt as _};
use ouroboros::self_referencing;
use tokio_postgres::{types::ToSql, Row, ToStatement};
use tracerr::Traced;

use crate::infra::database::{self, postgres};

pub use deadpool_postgres::{
    Client as NonTx, CreatePoolError as PoolSetupError, Pool, PoolError,
};
pub use tokio_postgres::Error;

/// Pooled connection with an open transaction on it.
#[self_referencing]
pub struct Tx {
    /// Connection owning the transaction.
    conn: NonTx,

    /// Open transaction, taken out on commit.
    #[borrows(mut conn)]
    #[not_covariant]
    tx: Option<deadpool_postgres::Transaction<'this>>,
}

impl fmt::Debug for Tx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tx")
            .field("open", &self.with_tx(|tx| tx.is_some()))
            .finish_non_exhaustive()
    }
}

impl Tx {
    /// Returns the open transaction of this [`Tx`].
    fn tx(
        &self,
    ) -> Result<&deadpool_postgres::Transaction<'_>, Traced<database::Error>>
    {
        self.with_tx(|tx| tx.as_ref())
            .ok_or_else(|| tracerr::new!(postgres::Error::Committed))
            .map_err(tracerr::map_from)
    }

    /// Starts a transaction on the provided pooled connection.
    ///
    /// # Errors
    ///
    /// If Postgres refused to start a transaction.
    pub async fn begin(conn: NonTx) -> Result<Self, Traced<database::Error>> {
        Self::try_new_async_send(conn, |c| c.transaction().map_ok(Some).boxed())
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }

    /// Commits this [`Tx`], releasing its connection back to the pool.
    ///
    /// # Errors
    ///
    /// If the transaction is committed already, or Postgres failed to commit
    /// it.
    pub async fn commit(mut self) -> Result<(), Traced<database::Error>> {
        #[expect(
            clippy::redundant_closure_for_method_calls,
            reason = "different variance, see \
                      https://doc.rust-lang.org/nomicon/subtyping.html#variance"
        )]
        let tx = self
            .with_tx_mut(|tx| tx.take())
            .ok_or_else(|| tracerr::new!(postgres::Error::Committed))
            .map_err(tracerr::map_from)?;
        tx.commit()
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }
}

/// Postgres connection capable of running statements.
pub trait Connection: Send + Sync {
    /// Runs the provided `stmt` returning all the resulting rows.
    ///
    /// # Errors
    ///
    /// If the statement failed.
    fn query<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = Result<Vec<Row>, Traced<database::Error>>> + Send
    where
        T: ToStatement + Sync + ?Sized;

    /// Runs the provided `stmt` returning at most one resulting row.
    ///
    /// # Errors
    ///
    /// If the statement failed or returned more than one row.
    fn query_opt<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = Result<Option<Row>, Traced<database::Error>>> + Send
    where
        T: ToStatement + Sync + ?Sized;

    /// Runs the provided `stmt` returning the number of affected rows.
    ///
    /// # Errors
    ///
    /// If the statement failed.
    fn exec<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = Result<u64, Traced<database::Error>>> + Send
    where
        T: ToStatement + Sync + ?Sized;
}

/// Implements [`Connection`] by running statements on the client the
/// `$client` expression yields.
macro_rules! impl_connection {
    ($ty:ty, |$this:ident| $client:expr) => {
        impl Connection for $ty {
            async fn query<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ToSql + Sync)],
            ) -> Result<Vec<Row>, Traced<database::Error>>
            where
                T: ToStatement + Sync + ?Sized,
            {
                let $this = self;
                $client
                    .query(stmt, params)
                    .await
                    .map_err(tracerr::from_and_wrap!(=> postgres::Error))
                    .map_err(tracerr::map_from)
            }

            async fn query_opt<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ToSql + Sync)],
            ) -> Result<Option<Row>, Traced<database::Error>>
            where
                T: ToStatement + Sync + ?Sized,
            {
                let $this = self;
                $client
                    .query_opt(stmt, params)
                    .await
                    .map_err(tracerr::from_and_wrap!(=> postgres::Error))
                    .map_err(tracerr::map_from)
            }

            async fn exec<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ToSql + Sync)],
            ) -> Result<u64, Traced<database::Error>>
            where
                T: ToStatement + Sync + ?Sized,
            {
                let $this = self;
                $client
                    .execute(stmt, params)
                    .await
                    .map_err(tracerr::from_and_wrap!(=> postgres::Error))
                    .map_err(tracerr::map_from)
            }
        }
    };
}

impl_connection!(NonTx, |conn| &**conn);

impl_connection!(Tx, |this| this.tx()?);
