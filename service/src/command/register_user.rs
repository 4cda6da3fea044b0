//! [`Command`] for registering a new [`User`].

use common::operations::{By, Commit, Insert, Select, Transact, Transacted};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret as _, SecretBox};
use tokio::task::{self, JoinError};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::User;
use crate::{
    domain::user,
    error::{Classify, Kind},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for registering a new [`User`].
#[derive(Clone, Debug)]
pub struct RegisterUser {
    /// [`user::Username`] of the new [`User`].
    pub username: user::Username,

    /// [`user::Email`] of the new [`User`].
    pub email: user::Email,

    /// [`user::Password`] of the new [`User`].
    pub password: SecretBox<user::Password>,
}

impl<Db, Kv> Command<RegisterUser> for Service<Db, Kv>
where
    Self: Sync,
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: for<'l> Database<
            Select<
                By<Option<user::Id>, (&'l user::Username, &'l user::Email)>,
            >,
            Ok = Option<user::Id>,
            Err = Traced<database::Error>,
        > + Database<
            Insert<user::New>,
            Ok = user::Id,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>
        + Send
        + Sync,
{
    type Ok = user::Id;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: RegisterUser) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RegisterUser {
            username,
            email,
            password,
        } = cmd;

        // Hashing is slow, so it happens before the transaction is opened.
        let password_hash = task::spawn_blocking(move || {
            user::PasswordHash::new(password.expose_secret())
        })
        .await
        .map_err(tracerr::from_and_wrap!(=> E))?
        .map_err(tracerr::from_and_wrap!(=> E))?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let occupied = tx
            .execute(Select(By::new((&username, &email))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if occupied.is_some() {
            return Err(tracerr::new!(E::Occupied { username, email }));
        }

        let new = user::New {
            username: username.clone(),
            email: email.clone(),
            password_hash,
        };
        let id = tx.execute(Insert(new)).await.map_err(|e| {
            if e.as_ref().is_unique_violation() {
                tracerr::new!(E::Occupied { username, email })
            } else {
                tracerr::map_from(e)
            }
        })?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(id)
    }
}

/// Error of [`RegisterUser`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`user::Password`] hashing failed.
    #[display("{_0}")]
    #[from]
    Hash(user::HashError),

    /// Hashing task failed to complete.
    #[display("Hashing task failed: {_0}")]
    #[from]
    Join(JoinError),

    /// [`user::Username`] or [`user::Email`] is already occupied.
    #[display("`{username}` username or `{email}` email is occupied")]
    Occupied {
        /// Requested [`user::Username`].
        username: user::Username,

        /// Requested [`user::Email`].
        email: user::Email,
    },
}

impl Classify for ExecutionError {
    fn kind(&self) -> Kind {
        match self {
            Self::Db(_) | Self::Hash(_) | Self::Join(_) => Kind::Internal,
            Self::Occupied { .. } => Kind::Conflict,
        }
    }
}
