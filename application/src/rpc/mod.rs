//! Unary JSON-over-HTTP RPC surface of the services.
//!
//! Every [`Rpc`] is served as `POST /<Service>/<Method>` taking its request
//! and returning its [`Rpc::Response`] as JSON. Failures are returned as an
//! [`Error`] payload with the [`Error::status_code`].

pub mod auth;
pub mod client;
pub mod identity;
pub mod task;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{AsError as _, Error};

pub use self::client::Http;

/// Call of an [`Rpc`].
///
/// Implemented both by the serving endpoints and by the [`Http`] client, so
/// a caller doesn't tell a remote service from an in-process one.
pub use common::Handler as Call;

/// Unary remote procedure.
pub trait Rpc: Serialize + DeserializeOwned + Send + 'static {
    /// Path this [`Rpc`] is served on.
    const PATH: &'static str;

    /// Type of a successful response of this [`Rpc`].
    type Response: Serialize + DeserializeOwned + Send + 'static;
}

/// Extension of a [`Router`] serving [`Rpc`]s by its state.
pub trait RouterExt<E> {
    /// Serves the `R` [`Rpc`] by the state of this [`Router`].
    #[must_use]
    fn rpc<R>(self) -> Self
    where
        R: Rpc,
        E: Call<R, Ok = R::Response, Err = Error>;
}

impl<E> RouterExt<E> for Router<E>
where
    E: Clone + Send + Sync + 'static,
{
    fn rpc<R>(self) -> Self
    where
        R: Rpc,
        E: Call<R, Ok = R::Response, Err = Error>,
    {
        self.route(R::PATH, post(serve::<R, E>))
    }
}

/// Serves a single `R` [`Rpc`] request.
async fn serve<R, E>(
    State(endpoint): State<E>,
    request: Result<Json<R>, JsonRejection>,
) -> Result<Json<R::Response>, Error>
where
    R: Rpc,
    E: Call<R, Ok = R::Response, Err = Error>,
{
    let Json(request) = request.map_err(|e| e.into_error())?;
    endpoint.execute(request).await.map(Json)
}

/// Response carrying a human-readable message.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Message {
    /// Text of this [`Message`].
    pub message: String,
}
