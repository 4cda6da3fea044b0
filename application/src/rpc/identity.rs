//! Identity service [`Rpc`]s owning registered users.

use axum::Router;
use secrecy::SecretBox;
use serde::{Deserialize, Serialize};
use service::{
    command::{self, Command},
    domain::{user, User},
    infra::database,
    query::{self, Query},
};
use tracerr::Traced;

use crate::{define_error, AsError as _, Error};

use super::{Call, Message, RouterExt as _, Rpc};

/// Registers a new user.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RegisterUser {
    /// Unique name of the new user.
    pub username: String,

    /// Unique email of the new user.
    pub email: String,

    /// Password of the new user.
    pub password: String,
}

impl Rpc for RegisterUser {
    const PATH: &'static str = "/Identity/RegisterUser";
    type Response = UserId;
}

/// Returns the profile of a user.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct GetUserProfile {
    /// ID of the user.
    pub id: user::Id,
}

impl Rpc for GetUserProfile {
    const PATH: &'static str = "/Identity/GetUserProfile";
    type Response = Profile;
}

/// Deletes a user after re-verifying its password.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DeleteUser {
    /// Name of the user to delete.
    pub username: String,

    /// Password of the user to delete.
    pub password: String,
}

impl Rpc for DeleteUser {
    const PATH: &'static str = "/Identity/DeleteUser";
    type Response = Message;
}

/// Resolves a username into the ID of its user.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct GetUserIdWithUsername {
    /// Name of the user.
    pub username: String,
}

impl Rpc for GetUserIdWithUsername {
    const PATH: &'static str = "/Identity/GetUserIdWithUsername";
    type Response = UserId;
}

/// ID of a user.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct UserId {
    /// ID of the user.
    pub id: user::Id,
}

/// Public profile of a user.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Profile {
    /// ID of the user.
    pub id: user::Id,

    /// Name of the user.
    pub username: user::Username,

    /// Email of the user.
    pub email: user::Email,
}

impl From<User> for Profile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

/// Client of the identity service.
pub trait Client:
    Call<RegisterUser, Ok = UserId, Err = Error>
    + Call<GetUserProfile, Ok = Profile, Err = Error>
    + Call<DeleteUser, Ok = Message, Err = Error>
    + Call<GetUserIdWithUsername, Ok = UserId, Err = Error>
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> Client for T where
    T: Call<RegisterUser, Ok = UserId, Err = Error>
        + Call<GetUserProfile, Ok = Profile, Err = Error>
        + Call<DeleteUser, Ok = Message, Err = Error>
        + Call<GetUserIdWithUsername, Ok = UserId, Err = Error>
        + Clone
        + Send
        + Sync
        + 'static
{
}

/// Returns a [`Router`] serving the identity service [`Rpc`]s by the
/// provided [`Client`].
pub fn router<C: Client>(client: C) -> Router {
    Router::new()
        .rpc::<RegisterUser>()
        .rpc::<GetUserProfile>()
        .rpc::<DeleteUser>()
        .rpc::<GetUserIdWithUsername>()
        .with_state(client)
}

/// Endpoint serving the identity service [`Rpc`]s by a [`Service`].
///
/// [`Service`]: service::Service
#[derive(Clone, Debug)]
pub struct Identity<S>(S);

impl<S> Identity<S> {
    /// Wraps the provided [`Service`].
    ///
    /// [`Service`]: service::Service
    #[must_use]
    pub fn new(service: S) -> Self {
        Self(service)
    }
}

impl<S> Call<RegisterUser> for Identity<S>
where
    S: Command<
            command::RegisterUser,
            Ok = user::Id,
            Err = Traced<command::register_user::ExecutionError>,
        > + Sync,
{
    type Ok = UserId;
    type Err = Error;

    async fn execute(&self, req: RegisterUser) -> Result<Self::Ok, Self::Err> {
        let RegisterUser {
            username,
            email,
            password,
        } = req;

        let cmd = command::RegisterUser {
            username: user::Username::new(username)
                .ok_or(RequestError::InvalidUsername)?,
            email: user::Email::new(email)
                .ok_or(RequestError::InvalidEmail)?,
            password: SecretBox::new(Box::new(
                user::Password::new(password)
                    .ok_or(RequestError::InvalidPassword)?,
            )),
        };
        self.0
            .execute(cmd)
            .await
            .map(|id| UserId { id })
            .map_err(|e| e.into_error())
    }
}

impl<S> Call<GetUserProfile> for Identity<S>
where
    S: Query<
            query::user::ById,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Sync,
{
    type Ok = Profile;
    type Err = Error;

    async fn execute(
        &self,
        GetUserProfile { id }: GetUserProfile,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .execute(query::user::ById(id))
            .await
            .map_err(|e| e.into_error())?
            .map(Profile::from)
            .ok_or_else(|| RequestError::UserNotFound.into())
    }
}

impl<S> Call<DeleteUser> for Identity<S>
where
    S: Command<
            command::DeleteUser,
            Ok = (),
            Err = Traced<command::delete_user::ExecutionError>,
        > + Sync,
{
    type Ok = Message;
    type Err = Error;

    async fn execute(&self, req: DeleteUser) -> Result<Self::Ok, Self::Err> {
        let DeleteUser { username, password } = req;

        let username = user::Username::new(username)
            .ok_or(RequestError::InvalidUsername)?;
        let password = user::Password::new(password)
            .ok_or(RequestError::InvalidPassword)?;
        self.0
            .execute(command::DeleteUser {
                username: username.clone(),
                password: SecretBox::new(Box::new(password)),
            })
            .await
            .map_err(|e| e.into_error())?;

        Ok(Message {
            message: format!(
                "User deleted successfully with username: {username}",
            ),
        })
    }
}

impl<S> Call<GetUserIdWithUsername> for Identity<S>
where
    S: Query<
            query::user::ByUsername,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Sync,
{
    type Ok = UserId;
    type Err = Error;

    async fn execute(
        &self,
        GetUserIdWithUsername { username }: GetUserIdWithUsername,
    ) -> Result<Self::Ok, Self::Err> {
        let username = user::Username::new(username)
            .ok_or(RequestError::InvalidUsername)?;
        self.0
            .execute(query::user::ByUsername(username))
            .await
            .map_err(|e| e.into_error())?
            .map(|user| UserId { id: user.id })
            .ok_or_else(|| RequestError::UserNotFound.into())
    }
}

define_error! {
    /// Malformed or unsatisfiable identity request.
    enum RequestError {
        #[code = "BAD_REQUEST"]
        #[status = BAD_REQUEST]
        #[message = "Username must be non-empty and contain no whitespace"]
        InvalidUsername,

        #[code = "BAD_REQUEST"]
        #[status = BAD_REQUEST]
        #[message = "Email must be a valid address"]
        InvalidEmail,

        #[code = "BAD_REQUEST"]
        #[status = BAD_REQUEST]
        #[message = "Password must be non-empty"]
        InvalidPassword,

        #[code = "NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "User not found"]
        UserNotFound,
    }
}

#[cfg(test)]
mod spec {
    use crate::{fixture, rpc::Call as _};

    use super::{
        DeleteUser, GetUserIdWithUsername, GetUserProfile, Identity,
        RegisterUser,
    };

    fn register(name: &str) -> RegisterUser {
        RegisterUser {
            username: name.into(),
            email: format!("{name}@x.com"),
            password: "pw1".into(),
        }
    }

    #[tokio::test]
    async fn registers_and_resolves_users() {
        let identity = Identity::new(fixture::service());

        let id = identity.execute(register("alice")).await.unwrap().id;
        let resolved = identity
            .execute(GetUserIdWithUsername {
                username: "alice".into(),
            })
            .await
            .unwrap();
        let profile = identity.execute(GetUserProfile { id }).await.unwrap();

        assert_eq!(resolved.id, id);
        assert_eq!(profile.id, id);
        assert_eq!(profile.username.to_string(), "alice");
        assert_eq!(profile.email.to_string(), "alice@x.com");
    }

    #[tokio::test]
    async fn rejects_malformed_registration() {
        let identity = Identity::new(fixture::service());

        for req in [
            RegisterUser {
                username: String::new(),
                ..register("alice")
            },
            RegisterUser {
                username: " alice".into(),
                ..register("alice")
            },
            RegisterUser {
                email: "alice".into(),
                ..register("alice")
            },
            RegisterUser {
                password: String::new(),
                ..register("alice")
            },
        ] {
            let err = identity.execute(req).await.unwrap_err();

            assert_eq!(err.code, "BAD_REQUEST");
            assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let identity = Identity::new(fixture::service());
        _ = identity.execute(register("alice")).await.unwrap();

        let err = identity.execute(register("alice")).await.unwrap_err();

        assert_eq!(err.code, "CONFLICT");
        assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_users_are_not_found() {
        let identity = Identity::new(fixture::service());

        let by_name = identity
            .execute(GetUserIdWithUsername {
                username: "ghost".into(),
            })
            .await
            .unwrap_err();
        let by_id = identity
            .execute(GetUserProfile { id: 404.into() })
            .await
            .unwrap_err();

        assert_eq!(by_name.status_code, http::StatusCode::NOT_FOUND);
        assert_eq!(by_id.status_code, http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn deletes_user_with_its_password() {
        let identity = Identity::new(fixture::service());
        _ = identity.execute(register("alice")).await.unwrap();

        let wrong = identity
            .execute(DeleteUser {
                username: "alice".into(),
                password: "nope".into(),
            })
            .await
            .unwrap_err();
        let deleted = identity
            .execute(DeleteUser {
                username: "alice".into(),
                password: "pw1".into(),
            })
            .await
            .unwrap();

        assert_eq!(wrong.status_code, http::StatusCode::UNAUTHORIZED);
        assert_eq!(
            deleted.message,
            "User deleted successfully with username: alice",
        );
        assert!(identity
            .execute(GetUserIdWithUsername {
                username: "alice".into(),
            })
            .await
            .is_err());
    }
}
