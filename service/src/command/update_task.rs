//! [`Command`] for updating an existing [`Task`].

use common::operations::{By, Insert, Select, Update};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{task, user, Task},
    error::{Classify, Kind},
    infra::{cache, database, Cache, Database},
    read, Service,
};

use super::{Command, Committed};

/// [`Command`] for updating an existing [`Task`] of its owner.
///
/// Once stored, the cached [`Task`] is overwritten and, if the owner's
/// [`read::task::List`] is cached, the [`Task`] is replaced in there.
#[derive(Clone, Debug)]
pub struct UpdateTask(pub Task);

impl<Db, Kv> Command<UpdateTask> for Service<Db, Kv>
where
    Self: Sync,
    Db: Database<Update<Task>, Ok = u64, Err = Traced<database::Error>>,
    Kv: Cache<Insert<Task>, Ok = (), Err = Traced<cache::Error>>
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

    async fn execute(&self, cmd: UpdateTask) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateTask(task) = cmd;
        let (id, owner_id) = (task.id, task.owner_id);

        let updated = self
            .database()
            .execute(Update(task.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if updated == 0 {
            return Err(tracerr::new!(E::TaskNotExists(id)));
        }

        let mut out = Committed::new(task.clone());
        out.follow_up(
            &cache::key::task(id),
            self.cache().execute(Insert(task.clone())).await,
        );
        let res = match self.cache().execute(Select(By::new(owner_id))).await {
            Ok(Some(mut list)) => {
                if list.replace(task) {
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

/// Error of [`UpdateTask`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Task`] with the provided ID does not exist or is owned by someone
    /// else.
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
