//! [`Cache`]-related implementations.
//!
//! Values are kept as JSON strings under the following keys:
//! - `task:{id}` holds a single [`Task`];
//! - `tasks:user:{owner_id}` holds a [`task::List`] as a JSON array of
//!   [`Task`]s.
//!
//! [`task::List`]: crate::read::task::List

#[cfg(any(test, feature = "memory"))]
pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

use std::future::Future;

use common::operations::{By, Delete, Insert, Select};
use derive_more::{Display, Error as StdError, From};
use serde::{de::DeserializeOwned, Serialize};
use tracerr::Traced;

use crate::{
    domain::{task, user, Task},
    read,
};

#[cfg(any(test, feature = "memory"))]
pub use self::memory::Memory;
#[cfg(feature = "redis")]
pub use self::redis::Redis;

/// Cache operation.
pub use common::Handler as Cache;

/// Key-value storage backing a [`KeyValue`] cache.
pub trait Backend: Send + Sync {
    /// Returns the value stored under the provided `key`, if any.
    ///
    /// # Errors
    ///
    /// If the [`Backend`] cannot be reached.
    fn get(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, Traced<Error>>> + Send;

    /// Stores the provided `value` under the provided `key`, overwriting any
    /// previous one.
    ///
    /// # Errors
    ///
    /// If the [`Backend`] cannot be reached.
    fn set(
        &self,
        key: &str,
        value: String,
    ) -> impl Future<Output = Result<(), Traced<Error>>> + Send;

    /// Removes the value stored under the provided `key`, if any.
    ///
    /// # Errors
    ///
    /// If the [`Backend`] cannot be reached.
    fn del(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<(), Traced<Error>>> + Send;
}

/// [`Cache`] of [`Task`] projections stored as JSON in a [`Backend`].
#[derive(Clone, Debug, Default)]
pub struct KeyValue<B>(B);

impl<B> KeyValue<B> {
    /// Wraps the provided [`Backend`] into a [`KeyValue`] cache.
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self(backend)
    }

    /// Returns the underlying [`Backend`] of this [`KeyValue`] cache.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.0
    }
}

/// Cache keys.
pub mod key {
    use crate::domain::{task, user};

    /// Returns the key of a single [`Task`].
    ///
    /// [`Task`]: crate::domain::Task
    #[must_use]
    pub fn task(id: task::Id) -> String {
        format!("task:{id}")
    }

    /// Returns the key of all [`Task`]s of an owner.
    ///
    /// [`Task`]: crate::domain::Task
    #[must_use]
    pub fn tasks(owner_id: user::Id) -> String {
        format!("tasks:user:{owner_id}")
    }
}

/// Encodes the provided `value` as JSON.
fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String, Traced<Error>> {
    serde_json::to_string(value).map_err(tracerr::from_and_wrap!(=> Error))
}

/// Decodes the provided JSON `value`.
fn decode<T: DeserializeOwned>(value: &str) -> Result<T, Traced<Error>> {
    serde_json::from_str(value).map_err(tracerr::from_and_wrap!(=> Error))
}

impl<B: Backend> Cache<Select<By<Option<Task>, task::Id>>> for KeyValue<B> {
    type Ok = Option<Task>;
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Task>, task::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .get(&key::task(by.into_inner()))
            .await
            .map_err(tracerr::wrap!())?
            .as_deref()
            .map(decode)
            .transpose()
    }
}

impl<B: Backend> Cache<Insert<Task>> for KeyValue<B> {
    type Ok = ();
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Insert(task): Insert<Task>,
    ) -> Result<Self::Ok, Self::Err> {
        let value = encode(&task).map_err(tracerr::wrap!())?;
        self.0
            .set(&key::task(task.id), value)
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<B: Backend> Cache<Delete<By<Task, task::Id>>> for KeyValue<B> {
    type Ok = ();
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Task, task::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .del(&key::task(by.into_inner()))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<B: Backend> Cache<Select<By<Option<read::task::List>, user::Id>>>
    for KeyValue<B>
{
    type Ok = Option<read::task::List>;
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<read::task::List>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let owner_id = by.into_inner();
        self.0
            .get(&key::tasks(owner_id))
            .await
            .map_err(tracerr::wrap!())?
            .as_deref()
            .map(decode)
            .transpose()
            .map(|tasks| {
                tasks.map(|tasks| read::task::List { owner_id, tasks })
            })
    }
}

impl<B: Backend> Cache<Insert<read::task::List>> for KeyValue<B> {
    type Ok = ();
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Insert(list): Insert<read::task::List>,
    ) -> Result<Self::Ok, Self::Err> {
        let value = encode(&list.tasks).map_err(tracerr::wrap!())?;
        self.0
            .set(&key::tasks(list.owner_id), value)
            .await
            .map_err(tracerr::wrap!())
    }
}

/// [`Cache`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// Cached value cannot be encoded or decoded.
    #[display("Failed to (de)serialize cached value: {_0}")]
    Serde(serde_json::Error),

    /// [`Memory`] cache error.
    #[cfg(any(test, feature = "memory"))]
    Memory(memory::Error),

    /// [`Redis`] cache error.
    #[cfg(feature = "redis")]
    Redis(redis::Error),
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Delete, Insert, Select};

    use crate::{
        domain::{task, Task},
        infra::Cache as _,
        read,
    };

    use super::{key, KeyValue, Memory};

    fn task(id: i64) -> Task {
        Task {
            id: id.into(),
            title: task::Title::new("buy milk").unwrap(),
            description: task::Description::new("2L").unwrap(),
            status: false,
            owner_id: 1.into(),
        }
    }

    #[test]
    fn formats_keys() {
        assert_eq!(key::task(7.into()), "task:7");
        assert_eq!(key::tasks(1.into()), "tasks:user:1");
    }

    #[tokio::test]
    async fn stores_task_as_json() {
        let cache = KeyValue::new(Memory::default());

        cache.execute(Insert(task(7))).await.unwrap();

        assert_eq!(
            cache.backend().raw("task:7").await.as_deref(),
            Some(
                r#"{"id":7,"title":"buy milk","description":"2L","status":false,"user_id":1}"#,
            ),
        );
        assert_eq!(
            cache
                .execute(Select(By::<Option<Task>, _>::new(7.into())))
                .await
                .unwrap(),
            Some(task(7)),
        );

        cache.execute(Delete(By::<Task, _>::new(7.into()))).await.unwrap();

        assert_eq!(cache.backend().raw("task:7").await, None);
    }

    #[tokio::test]
    async fn stores_list_as_json_array() {
        let cache = KeyValue::new(Memory::default());
        let list = read::task::List {
            owner_id: 1.into(),
            tasks: vec![task(1), task(2)],
        };

        cache.execute(Insert(list.clone())).await.unwrap();

        let raw = cache.backend().raw("tasks:user:1").await.unwrap();
        assert!(raw.starts_with('['));
        assert_eq!(
            cache
                .execute(Select(By::<Option<read::task::List>, _>::new(
                    1.into()
                )))
                .await
                .unwrap(),
            Some(list),
        );
    }

    #[tokio::test]
    async fn fails_on_corrupted_value() {
        let cache = KeyValue::new(Memory::default());
        cache.backend().put_raw("task:7", "{oops").await;

        assert!(cache
            .execute(Select(By::<Option<Task>, _>::new(7.into())))
            .await
            .is_err());
    }
}
