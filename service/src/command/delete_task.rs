//! [`Command`] for deleting a [`Task`].

use common::operations::{By, Delete, Insert, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{task, user, Task},
    error::{Classify, Kind},
    infra::{cache, database, Cache, Database},
    read, Service,
};

use super::{Command, Committed};

/// [`Command`] for deleting a [`Task`].
///
/// Once deleted from the store, the cached [`Task`] is evicted and, if the
/// owner's [`read::task::List`] is cached, the [`Task`] is removed from there.
#[derive(Clone, Copy, Debug)]
pub struct DeleteTask(pub task::Id);

impl<Db, Kv> Command<DeleteTask> for Service<Db, Kv>
where
    Self: Sync,
    Db: Database<
            Select<By<Option<Task>, task::Id>>,
            Ok = Option<Task>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Task, task::Id>>,
            Ok = u64,
            Err = Traced<database::Error>,
        >,
    Kv: Cache<Delete<By<Task, task::Id>>, Ok = (), Err = Traced<cache::Error>>
        + Cache<
            Select<By<Option<read::task::List>, user::Id>>,
            Ok = Option<read::task::List>,
            Err = Traced<cache::Error>,
        > + Cache<
            Insert<read::task::List>,
            Ok = (),
            Err = Traced<cache::Error>,
        >,
{
    type Ok = Committed<Task>;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: DeleteTask) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteTask(id) = cmd;

        // Owner is read first, as the row is gone once deleted.
        let task = self
            .database()
            .execute(Select(By::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| E::TaskNotExists(id))
            .map_err(tracerr::wrap!())?;
        let deleted = self
            .database()
            .execute(Delete(By::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if deleted == 0 {
            return Err(tracerr::new!(E::TaskNotExists(id)));
        }

        let owner_id = task.owner_id;
        let mut out = Committed::new(task);
        out.follow_up(
            &cache::key::task(id),
            self.cache().execute(Delete(By::new(id))).await,
        );
        let res = match self.cache().execute(Select(By::new(owner_id))).await {
            Ok(Some(mut list)) => {
                if list.remove(id).is_some() {
                    self.cache().execute(Insert(list)).await
                } else {
                    Ok(())
                }
            }
            Ok(None) => Ok(()),
            Err(e) => Err(e),
        };
        out.follow_up(&cache::key::tasks(owner_id), res);

        Ok(out)
    }
}

/// Error of [`DeleteTask`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
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
            Self::Db(_) => Kind::Internal,
            Self::TaskNotExists(_) => Kind::NotFound,
        }
    }
}
