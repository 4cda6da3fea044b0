//! [`Command`] for authenticating a [`User`] by credentials.

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret as _, SecretBox};
use tokio::task::{self, JoinError};
use tracerr::Traced;

use crate::{
    domain::{user, User},
    error::{Classify, Kind},
    infra::{database, Database},
    token, Service,
};

use super::Command;

/// [`Command`] for authenticating a [`User`] by credentials.
///
/// Issues a fresh [`token::Pair`] on success.
#[derive(Clone, Debug)]
pub struct AuthenticateUser {
    /// [`user::Username`] of the [`User`].
    pub username: user::Username,

    /// [`user::Password`] of the [`User`].
    pub password: SecretBox<user::Password>,
}

impl<Db, Kv> Command<AuthenticateUser> for Service<Db, Kv>
where
    Self: Sync,
    Db: for<'l> Database<
        Select<By<Option<User>, &'l user::Username>>,
        Ok = Option<User>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = token::Pair;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AuthenticateUser,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AuthenticateUser { username, password } = cmd;

        let user = self
            .database()
            .execute(Select(By::new(&username)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| E::UserNotExists(username.clone()))
            .map_err(tracerr::wrap!())?;

        let hash = user.password_hash.clone();
        let matches = task::spawn_blocking(move || {
            hash.matches(password.expose_secret())
        })
        .await
        .map_err(tracerr::from_and_wrap!(=> E))?;
        if !matches {
            return Err(tracerr::new!(E::WrongCredentials));
        }

        self.tokens()
            .issue_pair(&user.username)
            .map_err(tracerr::map_from_and_wrap!(=> E))
    }
}

/// Error of [`AuthenticateUser`] [`Command`] execution.
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

    /// [`token::Tokens`] error.
    #[display("{_0}")]
    #[from]
    Token(token::Error),

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
            Self::Token(e) => e.kind(),
            Self::UserNotExists(_) => Kind::NotFound,
            Self::WrongCredentials => Kind::InvalidCredential,
        }
    }
}
