//! Postgres database client definitions.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_postgres::{types::ToSql, Row, ToStatement};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{self, connection, Connection},
};

/// Client running every statement on its own pooled connection.
#[derive(Clone, Debug)]
pub struct NonTx {
    /// Pool the connections are borrowed from.
    pool: connection::Pool,
}

impl NonTx {
    /// Wraps the provided [`connection::Pool`].
    #[must_use]
    pub(crate) fn from_pool(pool: connection::Pool) -> Self {
        Self { pool }
    }

    /// Borrows a connection from the pool.
    pub(crate) async fn connection(
        &self,
    ) -> Result<connection::NonTx, Traced<database::Error>> {
        self.pool
            .get()
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }
}

/// Client running all its statements in a single transaction.
///
/// Clones share the transaction. Dropping the last clone without
/// [committing](Tx::commit) rolls the transaction back.
#[derive(Clone, Debug)]
pub struct Tx {
    /// Open transaction, [`None`] once committed.
    tx: Arc<Mutex<Option<connection::Tx>>>,
}

impl Tx {
    /// Starts a transaction on a connection borrowed by the provided [`NonTx`]
    /// client.
    ///
    /// # Errors
    ///
    /// If no connection could be borrowed, or Postgres refused to start a
    /// transaction.
    pub async fn begin(client: &NonTx) -> Result<Self, Traced<database::Error>> {
        let conn = client.connection().await.map_err(tracerr::wrap!())?;
        let tx = connection::Tx::begin(conn).await.map_err(tracerr::wrap!())?;
        Ok(Self {
            tx: Arc::new(Mutex::new(Some(tx))),
        })
    }

    /// Commits the transaction of this [`Tx`] client.
    ///
    /// # Errors
    ///
    /// If the transaction is committed already, or Postgres failed to commit
    /// it.
    pub async fn commit(&self) -> Result<(), Traced<database::Error>> {
        let tx = self.tx.lock().await.take();
        tx.ok_or_else(|| tracerr::new!(postgres::Error::Committed))
            .map_err(tracerr::map_from)?
            .commit()
            .await
            .map_err(tracerr::wrap!())
    }
}

/// Implements [`Connection`] by forwarding every statement to the `$conn`
/// [`Connection`] the given statements acquire.
macro_rules! forward_connection {
    ($ty:ty, |$this:ident, $conn:ident| { $($acquire:tt)* }) => {
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
                $($acquire)*
                $conn.query(stmt, params).await.map_err(tracerr::wrap!())
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
                $($acquire)*
                $conn.query_opt(stmt, params).await.map_err(tracerr::wrap!())
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
                $($acquire)*
                $conn.exec(stmt, params).await.map_err(tracerr::wrap!())
            }
        }
    };
}

forward_connection!(NonTx, |this, conn| {
    let conn = this.connection().await.map_err(tracerr::wrap!())?;
});

forward_connection!(Tx, |this, conn| {
    let guard = this.tx.lock().await;
    let conn = guard
        .as_ref()
        .ok_or_else(|| tracerr::new!(postgres::Error::Committed))
        .map_err(tracerr::map_from)?;
});
