//! Authentication service [`Rpc`]s issuing tokens.

use axum::Router;
use secrecy::SecretBox;
use serde::{Deserialize, Serialize};
use service::{
    command::{self, Command},
    domain::user,
    token::{self, Token},
};
use tracerr::Traced;

use crate::{define_error, AsError as _, Error};

use super::{Call, RouterExt as _, Rpc};

/// Authenticates a user by its credentials.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Authenticate {
    /// Name of the user.
    pub username: String,

    /// Password of the user.
    pub password: String,
}

impl Rpc for Authenticate {
    const PATH: &'static str = "/Auth/Authenticate";
    type Response = Tokens;
}

/// Exchanges a refresh token for a new access token.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RefreshToken {
    /// Refresh token to exchange.
    pub refresh_token: Token,
}

impl Rpc for RefreshToken {
    const PATH: &'static str = "/Auth/RefreshToken";
    type Response = AccessToken;
}

/// Access and refresh tokens issued on authentication.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Tokens {
    /// Short-lived token authorizing requests.
    pub access_token: Token,

    /// Long-lived token exchangeable for a new access token.
    pub refresh_token: Token,
}

impl From<token::Pair> for Tokens {
    fn from(pair: token::Pair) -> Self {
        Self {
            access_token: pair.access,
            refresh_token: pair.refresh,
        }
    }
}

/// Access token issued on refresh.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct AccessToken {
    /// Short-lived token authorizing requests.
    pub access_token: Token,
}

/// Client of the authentication service.
pub trait Client:
    Call<Authenticate, Ok = Tokens, Err = Error>
    + Call<RefreshToken, Ok = AccessToken, Err = Error>
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> Client for T where
    T: Call<Authenticate, Ok = Tokens, Err = Error>
        + Call<RefreshToken, Ok = AccessToken, Err = Error>
        + Clone
        + Send
        + Sync
        + 'static
{
}

/// Returns a [`Router`] serving the authentication service [`Rpc`]s by the
/// provided [`Client`].
pub fn router<C: Client>(client: C) -> Router {
    Router::new()
        .rpc::<Authenticate>()
        .rpc::<RefreshToken>()
        .with_state(client)
}

/// Endpoint serving the authentication service [`Rpc`]s by a [`Service`].
///
/// [`Service`]: service::Service
#[derive(Clone, Debug)]
pub struct Auth<S>(S);

impl<S> Auth<S> {
    /// Wraps the provided [`Service`].
    ///
    /// [`Service`]: service::Service
    #[must_use]
    pub fn new(service: S) -> Self {
        Self(service)
    }
}

impl<S> Call<Authenticate> for Auth<S>
where
    S: Command<
            command::AuthenticateUser,
            Ok = token::Pair,
            Err = Traced<command::authenticate_user::ExecutionError>,
        > + Sync,
{
    type Ok = Tokens;
    type Err = Error;

    async fn execute(&self, req: Authenticate) -> Result<Self::Ok, Self::Err> {
        let Authenticate { username, password } = req;

        let cmd = command::AuthenticateUser {
            username: user::Username::new(username)
                .ok_or(RequestError::MissingUsername)?,
            password: SecretBox::new(Box::new(
                user::Password::new(password)
                    .ok_or(RequestError::MissingPassword)?,
            )),
        };
        self.0
            .execute(cmd)
            .await
            .map(Tokens::from)
            .map_err(|e| e.into_error())
    }
}

impl<S> Call<RefreshToken> for Auth<S>
where
    S: Command<
            command::RefreshToken,
            Ok = Token,
            Err = Traced<command::refresh_token::ExecutionError>,
        > + Sync,
{
    type Ok = AccessToken;
    type Err = Error;

    async fn execute(
        &self,
        RefreshToken { refresh_token }: RefreshToken,
    ) -> Result<Self::Ok, Self::Err> {
        if refresh_token.as_ref().is_empty() {
            return Err(RequestError::MissingToken.into());
        }
        self.0
            .execute(command::RefreshToken(refresh_token))
            .await
            .map(|access_token| AccessToken { access_token })
            .map_err(|e| e.into_error())
    }
}

define_error! {
    /// Malformed authentication request.
    enum RequestError {
        #[code = "BAD_REQUEST"]
        #[status = BAD_REQUEST]
        #[message = "Username is required"]
        MissingUsername,

        #[code = "BAD_REQUEST"]
        #[status = BAD_REQUEST]
        #[message = "Password is required"]
        MissingPassword,

        #[code = "BAD_REQUEST"]
        #[status = BAD_REQUEST]
        #[message = "Refresh token is required"]
        MissingToken,
    }
}
