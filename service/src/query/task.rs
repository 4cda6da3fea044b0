//! [`Query`] collection related to [`Task`]s.
//!
//! Both [`Query`]s read through the [`Cache`]: a hit is returned as is, while
//! a miss falls back to the [`Database`] and repopulates the [`Cache`].

use common::operations::{By, Insert, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{task, user, Task},
    error::{Classify, Kind},
    infra::{cache, database, Cache, Database},
    read, Service,
};

use super::Query;

/// Queries a [`Task`] by its [`task::Id`].
#[derive(Clone, Copy, Debug)]
pub struct ById(pub task::Id);

impl<Db, Kv> Query<ById> for Service<Db, Kv>
where
    Self: Sync,
    Db: Database<
        Select<By<Option<Task>, task::Id>>,
        Ok = Option<Task>,
        Err = Traced<database::Error>,
    >,
    Kv: Cache<
            Select<By<Option<Task>, task::Id>>,
            Ok = Option<Task>,
            Err = Traced<cache::Error>,
        > + Cache<Insert<Task>, Ok = (), Err = Traced<cache::Error>>,
{
    type Ok = Task;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, ById(id): ById) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let key = cache::key::task(id);
        if let Some(task) = self
            .cache()
            .execute(Select(By::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
        {
            log::debug!("cache hit for `{key}`");
            return Ok(task);
        }
        log::debug!("cache miss for `{key}`");

        let task = self
            .database()
            .execute(Select(By::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| E::TaskNotExists(id))
            .map_err(tracerr::wrap!())?;

        if let Err(e) = self.cache().execute(Insert(task.clone())).await {
            log::warn!("failed to update cache key `{key}`: {e}");
        }

        Ok(task)
    }
}

/// Queries all [`Task`]s of an owner.
#[derive(Clone, Copy, Debug)]
pub struct ByOwner(pub user::Id);

impl<Db, Kv> Query<ByOwner> for Service<Db, Kv>
where
    Self: Sync,
    Db: Database<
        Select<By<Vec<Task>, user::Id>>,
        Ok = Vec<Task>,
        Err = Traced<database::Error>,
    >,
    Kv: Cache<
            Select<By<Option<read::task::List>, user::Id>>,
            Ok = Option<read::task::List>,
            Err = Traced<cache::Error>,
        > + Cache<
            Insert<read::task::List>,
            Ok = (),
            Err = Traced<cache::Error>,
        >,
{
    type Ok = Vec<Task>;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        ByOwner(owner_id): ByOwner,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let key = cache::key::tasks(owner_id);
        if let Some(list) = self
            .cache()
            .execute(Select(By::new(owner_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
        {
            log::debug!("cache hit for `{key}`");
            return Ok(list.tasks);
        }
        log::debug!("cache miss for `{key}`");

        let tasks = self
            .database()
            .execute(Select(By::new(owner_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let list = read::task::List {
            owner_id,
            tasks: tasks.clone(),
        };
        if let Err(e) = self.cache().execute(Insert(list)).await {
            log::warn!("failed to update cache key `{key}`: {e}");
        }

        Ok(tasks)
    }
}

/// Error of [`Task`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Cache`] error.
    #[display("`Cache` operation failed: {_0}")]
    #[from]
    Cache(cache::Error),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Task`] with the provided ID does not exist.
    #[display("`Task(id: {_0})` does not exist")]
    TaskNotExists(#[error(not(source))] task::Id),
}

impl Classify for ExecutionError {
    fn kind(&self) -> Kind {
        match self {
            Self::Cache(_) | Self::Db(_) => Kind::Internal,
            Self::TaskNotExists(_) => Kind::NotFound,
        }
    }
}
