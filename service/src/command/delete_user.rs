//! [`Command`] for deleting a [`User`].

use common::operations::{By, Delete, Select};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret as _, SecretBox};
use tokio::task::{self, JoinError};
use tracerr::Traced;

use crate::{
    domain::{user, User},
    error::{Classify, Kind},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for deleting a [`User`] after re-checking its
/// [`user::Password`].
///
/// [`Task`]s of the deleted [`User`] are deleted by the store as well.
///
/// [`Task`]: crate::domain::Task
#[derive(Clone, Debug)]
pub struct DeleteUser {
    /// [`user::Username`] of the [`User`] to delete.
    pub username: user::Username,

    /// [`user::Password`] of the [`User`] to delete.
    pub password: SecretBox<user::Password>,
}

impl<Db, Kv> Command<DeleteUser> for Service<Db, Kv>
where
    Self: Sync,
    Db: for<'l> Database<
            Select<By<Option<User>, &'l user::Username>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + for<'l> Database<
            Delete<By<User, &'l user::Username>>,
            Ok = u64,
            Err = Traced<database::Error>,
        >,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: DeleteUser) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteUser { username, password } = cmd;

        let user = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(&username)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| E::UserNotExists(username.clone()))
            .map_err(tracerr::wrap!())?;

        let hash = user.password_hash;
        let matches = task::spawn_blocking(move || {
            hash.matches(password.expose_secret())
        })
        .await
        .map_err(tracerr::from_and_wrap!(=> E))?;
        if !matches {
            return Err(tracerr::new!(E::WrongCredentials));
        }

        let deleted = self
            .database()
            .execute(Delete(By::<User, _>::new(&username)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if deleted == 0 {
            return Err(tracerr::new!(E::UserNotExists(username)));
        }

        Ok(())
    }
}

/// Error of [`DeleteUser`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Password verification task failed to complete.
    #[display("Password verification task failed: {_0}")]
    #[from]
    Join(JoinError),

    /// [`User`] with the provided [`user::Username`] does not exist.
    #[display("`User(username: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Username),

    /// [`user::Password`] doesn't match.
    #[display("Wrong `User` credentials")]
    WrongCredentials,
}

impl Classify for ExecutionError {
    fn kind(&self) -> Kind {
        match self {
            Self::Db(_) | Self::Join(_) => Kind::Internal,
            Self::UserNotExists(_) => Kind::NotFound,
            Self::WrongCredentials => Kind::InvalidCredential,
        }
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        error::{Classify as _, Kind},
        fixture::{self, password, username},
        Command as _,
    };

    use super::DeleteUser;

    #[tokio::test]
    async fn deletes_user_with_its_tasks() {
        let svc = fixture::service();
        let alice = fixture::register(&svc, "alice").await;
        _ = fixture::create_task(&svc, alice, "buy milk").await;

        svc.execute(DeleteUser {
            username: username("alice"),
            password: password("pw1"),
        })
        .await
        .unwrap();

        assert_eq!(svc.database().users_count().await, 0);
        assert_eq!(svc.database().tasks_count().await, 0);
    }

    #[tokio::test]
    async fn keeps_user_on_wrong_password() {
        let svc = fixture::service();
        _ = fixture::register(&svc, "alice").await;

        let err = svc
            .execute(DeleteUser {
                username: username("alice"),
                password: password("pw2"),
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), Kind::InvalidCredential);
        assert_eq!(svc.database().users_count().await, 1);
    }

    #[tokio::test]
    async fn reports_unknown_username() {
        let svc = fixture::service();

        let err = svc
            .execute(DeleteUser {
                username: username("ghost"),
                password: password("pw1"),
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), Kind::NotFound);
    }
}
