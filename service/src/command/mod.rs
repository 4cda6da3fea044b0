//! [`Command`] definition.

pub mod authenticate_user;
pub mod create_task;
pub mod delete_task;
pub mod delete_user;
pub mod refresh_token;
pub mod register_user;
pub mod update_task;

use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::infra::Cache;
use crate::infra::cache;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    authenticate_user::AuthenticateUser, create_task::CreateTask,
    delete_task::DeleteTask, delete_user::DeleteUser,
    refresh_token::RefreshToken, register_user::RegisterUser,
    update_task::UpdateTask,
};

/// Output of a [`Command`] whose store mutation has been committed.
///
/// [`Cache`] follow-ups of such a [`Command`] are best-effort: their failures
/// are logged and collected here rather than failing the [`Command`].
#[derive(Debug)]
pub struct Committed<T> {
    /// Committed value.
    pub value: T,

    /// Failed [`Cache`] follow-ups, in order of execution.
    pub cache_failures: Vec<Traced<cache::Error>>,
}

impl<T> Committed<T> {
    /// Wraps the provided committed `value`.
    fn new(value: T) -> Self {
        Self {
            value,
            cache_failures: Vec::new(),
        }
    }

    /// Indicates whether all [`Cache`] follow-ups succeeded.
    #[must_use]
    pub fn is_cache_synced(&self) -> bool {
        self.cache_failures.is_empty()
    }

    /// Returns the committed value.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.value
    }

    /// Records the outcome of a [`Cache`] follow-up touching the `key`.
    fn follow_up(&mut self, key: &str, res: Result<(), Traced<cache::Error>>) {
        if let Err(e) = res {
            log::warn!("failed to update cache key `{key}`: {e}");
            self.cache_failures.push(e);
        }
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{
            AuthenticateUser, CreateTask, DeleteTask, RegisterUser, UpdateTask,
        },
        domain::{user, Task},
        error::{Classify as _, Kind},
        fixture::{self, description, password, title, username},
        query, Command as _, Query as _,
    };

    #[tokio::test]
    async fn walks_through_task_lifecycle() {
        let svc = fixture::service();

        let alice = svc
            .execute(RegisterUser {
                username: username("alice"),
                email: user::Email::new("a@x.com").unwrap(),
                password: password("pw1"),
            })
            .await
            .unwrap();
        assert_eq!(alice, 1.into());

        let pair = svc
            .execute(AuthenticateUser {
                username: username("alice"),
                password: password("pw1"),
            })
            .await
            .unwrap();
        assert_eq!(
            svc.tokens().verify(&pair.access).unwrap(),
            username("alice"),
        );

        let id = svc
            .execute(CreateTask {
                title: title("Buy milk"),
                description: description("2%"),
                owner_id: alice,
            })
            .await
            .unwrap()
            .into_inner();
        assert_eq!(id, 1.into());

        let milk = Task {
            id,
            title: title("Buy milk"),
            description: description("2%"),
            status: false,
            owner_id: alice,
        };
        assert_eq!(
            svc.execute(query::task::ByOwner(alice)).await.unwrap(),
            vec![milk.clone()],
        );

        let done = Task {
            status: true,
            ..milk
        };
        _ = svc.execute(UpdateTask(done.clone())).await.unwrap();
        assert_eq!(svc.execute(query::task::ById(id)).await.unwrap(), done);

        _ = svc.execute(DeleteTask(id)).await.unwrap();
        let err = svc.execute(query::task::ById(id)).await.unwrap_err();
        assert_eq!(err.kind(), Kind::NotFound);
    }
}
