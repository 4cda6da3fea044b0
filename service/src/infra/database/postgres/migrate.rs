//! Schema migrations of the [`Postgres`] store.

use async_trait::async_trait;
use refinery_core::{
    traits::r#async::{AsyncQuery, AsyncTransaction},
    AsyncMigrate, Migration,
};
use tracerr::Traced;
use tracing as log;

use crate::infra::database::{self, postgres};

use super::Postgres;

pub use refinery::{embed_migrations, Runner};

impl Postgres {
    /// Applies the pending migrations of the provided [`Runner`], returning
    /// the number of the applied ones.
    ///
    /// # Errors
    ///
    /// If failed to borrow a connection or any migration failed.
    pub async fn migrate(
        &mut self,
        runner: &Runner,
    ) -> Result<usize, Traced<database::Error>> {
        let report = runner
            .run_async(self)
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)?;

        let applied = report.applied_migrations();
        for m in applied {
            log::info!("applied migration `V{}__{}`", m.version(), m.name());
        }
        if applied.is_empty() {
            log::debug!("schema is up to date");
        }
        Ok(applied.len())
    }
}

#[async_trait]
impl AsyncTransaction for Postgres {
    type Error = Traced<database::Error>;

    async fn execute(
        &mut self,
        queries: &[&str],
    ) -> Result<usize, Self::Error> {
        let mut conn = self.connection().await.map_err(tracerr::wrap!())?;
        AsyncTransaction::execute(&mut **conn, queries)
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }
}

#[async_trait]
impl AsyncQuery<Vec<Migration>> for Postgres {
    async fn query(
        &mut self,
        query: &str,
    ) -> Result<Vec<Migration>, Self::Error> {
        let mut conn = self.connection().await.map_err(tracerr::wrap!())?;
        AsyncQuery::query(&mut **conn, query)
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }
}

impl AsyncMigrate for Postgres {}
