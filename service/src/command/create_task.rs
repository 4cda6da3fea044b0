//! [`Command`] for creating a new [`Task`].

use common::operations::{By, Insert, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{task, user, Task},
    error::{Classify, Kind},
    infra::{cache, database, Cache, Database},
    read, Service,
};

use super::{Command, Committed};

/// [`Command`] for creating a new [`Task`].
///
/// Once stored, the [`Task`] is cached on its own and appended to the cached
/// [`read::task::List`] of its owner, which is initialized if absent.
#[derive(Clone, Debug)]
pub struct CreateTask {
    /// [`task::Title`] of the new [`Task`].
    pub title: task::Title,

    /// [`task::Description`] of the new [`Task`].
    pub description: task::Description,

    /// ID of the [`User`] owning the new [`Task`].
    ///
    /// [`User`]: crate::domain::User
    pub owner_id: user::Id,
}

impl<Db, Kv> Command<CreateTask> for Service<Db, Kv>
where
    Self: Sync,
    Db: Database<Insert<task::New>, Ok = Task, Err = Traced<database::Error>>,
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
    type Ok = Committed<task::Id>;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateTask) -> Result<Self::Ok, Self::Err> {
        let CreateTask {
            title,
            description,
            owner_id,
        } = cmd;

        let task = self
            .database()
            .execute(Insert(task::New {
                title,
                description,
                owner_id,
            }))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> ExecutionError))?;

        let mut out = Committed::new(task.id);
        out.follow_up(
            &cache::key::task(task.id),
            self.cache().execute(Insert(task.clone())).await,
        );
        let res = match self.cache().execute(Select(By::new(owner_id))).await {
            Ok(Some(mut list)) => {
                list.push(task);
                self.cache().execute(Insert(list)).await
            }
            Ok(None) => {
                self.cache()
                    .execute(Insert(read::task::List {
                        owner_id,
                        tasks: vec![task],
                    }))
                    .await
            }
            Err(e) => Err(e),
        };
        out.follow_up(&cache::key::tasks(owner_id), res);

        Ok(out)
    }
}

/// Error of [`CreateTask`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),
}

impl Classify for ExecutionError {
    fn kind(&self) -> Kind {
        match self {
            Self::Db(_) => Kind::Internal,
        }
    }
}
