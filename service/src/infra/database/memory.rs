//! In-memory [`Database`] implementation.

use std::{collections::BTreeMap, future::Future, sync::Arc};

use common::operations::{By, Commit, Delete, Insert, Select, Transact, Update};
use derive_more::{Display, Error as StdError};
use tokio::sync::{Mutex, OwnedRwLockWriteGuard, RwLock};
use tracerr::Traced;

use crate::{
    domain::{task, user, Task, User},
    infra::{database, Database},
};

/// In-memory [`Database`] keeping its rows in ordered tables.
#[derive(Clone, Debug, Default)]
pub struct Memory<S = Shared>(S);

impl Memory {
    /// Creates a new empty [`Memory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored [`User`]s.
    pub async fn users_count(&self) -> usize {
        self.0 .0.read().await.users.len()
    }

    /// Returns the number of stored [`Task`]s.
    pub async fn tasks_count(&self) -> usize {
        self.0 .0.read().await.tasks.len()
    }
}

/// Rows of a [`Memory`] database.
#[derive(Clone, Debug, Default)]
pub struct Tables {
    /// [`User`]s by their IDs.
    users: BTreeMap<user::Id, User>,

    /// [`Task`]s by their IDs.
    tasks: BTreeMap<task::Id, Task>,

    /// Last assigned [`user::Id`].
    last_user_id: i64,

    /// Last assigned [`task::Id`].
    last_task_id: i64,
}

/// Access to [`Tables`] of a [`Memory`] database.
pub trait Storage: Send + Sync {
    /// Runs the provided `op` over the [`Tables`].
    ///
    /// # Errors
    ///
    /// If the [`Tables`] are not accessible anymore.
    fn with<F, R>(
        &self,
        op: F,
    ) -> impl Future<Output = Result<R, Traced<database::Error>>> + Send
    where
        F: FnOnce(&mut Tables) -> R + Send,
        R: Send;
}

/// Non-transactional [`Storage`] applying changes immediately.
#[derive(Clone, Debug, Default)]
pub struct Shared(Arc<RwLock<Tables>>);

impl Storage for Shared {
    async fn with<F, R>(&self, op: F) -> Result<R, Traced<database::Error>>
    where
        F: FnOnce(&mut Tables) -> R + Send,
        R: Send,
    {
        Ok(op(&mut *self.0.write().await))
    }
}

/// Transactional [`Storage`] applying changes on [`Commit`] only.
///
/// Holds the [`Shared`] tables exclusively until committed or dropped, so
/// transactions are serializable.
#[derive(Clone, Debug)]
pub struct Staged(Arc<Mutex<Option<Staging>>>);

/// Open transaction of a [`Staged`] storage.
#[derive(Debug)]
struct Staging {
    /// Exclusively held committed [`Tables`].
    committed: OwnedRwLockWriteGuard<Tables>,

    /// [`Tables`] with the uncommitted changes applied.
    staged: Tables,
}

impl Storage for Staged {
    async fn with<F, R>(&self, op: F) -> Result<R, Traced<database::Error>>
    where
        F: FnOnce(&mut Tables) -> R + Send,
        R: Send,
    {
        let mut staging = self.0.lock().await;
        let staging = staging
            .as_mut()
            .ok_or_else(|| tracerr::new!(Error::Committed))
            .map_err(tracerr::map_from)?;
        Ok(op(&mut staging.staged))
    }
}

/// [`Memory`] database error.
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// Transaction is used after being committed.
    #[display("Transaction has been committed already")]
    Committed,

    /// Uniqueness constraint is violated.
    #[display("Unique constraint `{_0}` is violated")]
    UniqueViolation(#[error(not(source))] &'static str),
}

impl Database<Transact> for Memory<Shared> {
    type Ok = Memory<Staged>;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        let committed = Arc::clone(&self.0 .0).write_owned().await;
        let staged = committed.clone();
        Ok(Memory(Staged(Arc::new(Mutex::new(Some(Staging {
            committed,
            staged,
        }))))))
    }
}

impl Database<Transact> for Memory<Staged> {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for Memory<Staged> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        let Staging {
            mut committed,
            staged,
        } = self
            .0
             .0
            .lock()
            .await
            .take()
            .ok_or_else(|| tracerr::new!(Error::Committed))
            .map_err(tracerr::map_from)?;
        *committed = staged;
        Ok(())
    }
}

impl<'l, S: Storage> Database<Select<By<Option<User>, &'l user::Username>>>
    for Memory<S>
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'l user::Username>>,
    ) -> Result<Self::Ok, Self::Err> {
        let username = by.into_inner();
        self.0
            .with(|t| {
                t.users.values().find(|u| &u.username == username).cloned()
            })
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<S: Storage> Database<Select<By<Option<User>, user::Id>>> for Memory<S> {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.0
            .with(|t| t.users.get(&id).cloned())
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<'l, S: Storage>
    Database<
        Select<By<Option<user::Id>, (&'l user::Username, &'l user::Email)>>,
    > for Memory<S>
{
    type Ok = Option<user::Id>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Option<user::Id>, (&'l user::Username, &'l user::Email)>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let (username, email) = by.into_inner();
        self.0
            .with(|t| {
                t.users
                    .values()
                    .find(|u| &u.username == username || &u.email == email)
                    .map(|u| u.id)
            })
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<S: Storage> Database<Insert<user::New>> for Memory<S> {
    type Ok = user::Id;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(new): Insert<user::New>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .with(|t| {
                if t.users.values().any(|u| u.username == new.username) {
                    return Err(Error::UniqueViolation("users_username_key"));
                }
                if t.users.values().any(|u| u.email == new.email) {
                    return Err(Error::UniqueViolation("users_email_key"));
                }
                t.last_user_id += 1;
                let id = user::Id::from(t.last_user_id);
                drop(t.users.insert(
                    id,
                    User {
                        id,
                        username: new.username,
                        email: new.email,
                        password_hash: new.password_hash,
                    },
                ));
                Ok(id)
            })
            .await
            .map_err(tracerr::wrap!())?
            .map_err(|e| tracerr::new!(e))
            .map_err(tracerr::map_from)
    }
}

impl<'l, S: Storage> Database<Delete<By<User, &'l user::Username>>>
    for Memory<S>
{
    type Ok = u64;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<User, &'l user::Username>>,
    ) -> Result<Self::Ok, Self::Err> {
        let username = by.into_inner();
        self.0
            .with(|t| {
                let Some(id) = t
                    .users
                    .values()
                    .find(|u| &u.username == username)
                    .map(|u| u.id)
                else {
                    return 0;
                };
                drop(t.users.remove(&id));
                t.tasks.retain(|_, task| task.owner_id != id);
                1
            })
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<S: Storage> Database<Insert<task::New>> for Memory<S> {
    type Ok = Task;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(new): Insert<task::New>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .with(|t| {
                t.last_task_id += 1;
                let task = Task {
                    id: t.last_task_id.into(),
                    title: new.title,
                    description: new.description,
                    status: false,
                    owner_id: new.owner_id,
                };
                drop(t.tasks.insert(task.id, task.clone()));
                task
            })
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<S: Storage> Database<Select<By<Option<Task>, task::Id>>> for Memory<S> {
    type Ok = Option<Task>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Task>, task::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.0
            .with(|t| t.tasks.get(&id).cloned())
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<S: Storage> Database<Select<By<Vec<Task>, user::Id>>> for Memory<S> {
    type Ok = Vec<Task>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Task>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let owner_id = by.into_inner();
        self.0
            .with(|t| {
                t.tasks
                    .values()
                    .filter(|task| task.owner_id == owner_id)
                    .cloned()
                    .collect()
            })
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<S: Storage> Database<Update<Task>> for Memory<S> {
    type Ok = u64;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(task): Update<Task>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .with(|t| match t.tasks.get_mut(&task.id) {
                Some(stored) if stored.owner_id == task.owner_id => {
                    *stored = task;
                    1
                }
                Some(_) | None => 0,
            })
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<S: Storage> Database<Delete<By<Task, task::Id>>> for Memory<S> {
    type Ok = u64;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Task, task::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.0
            .with(|t| u64::from(t.tasks.remove(&id).is_some()))
            .await
            .map_err(tracerr::wrap!())
    }
}
