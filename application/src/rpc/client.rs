//! [`Http`] client of remote [`Rpc`]s.

use crate::{AsError as _, Error};

use super::{Call, Rpc};

/// Client calling [`Rpc`]s of a remote service over HTTP.
#[derive(Clone, Debug)]
pub struct Http {
    /// Underlying [`reqwest::Client`] pooling connections.
    client: reqwest::Client,

    /// Base URL of the remote service.
    base: String,
}

impl Http {
    /// Creates a new [`Http`] client of the service at the `base` URL.
    #[must_use]
    pub fn new(base: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base)
    }

    /// Creates a new [`Http`] client reusing the provided
    /// [`reqwest::Client`].
    #[must_use]
    pub fn with_client(client: reqwest::Client, base: impl Into<String>) -> Self {
        let mut base = base.into();
        while base.ends_with('/') {
            _ = base.pop();
        }
        Self { client, base }
    }
}

impl<R: Rpc> Call<R> for Http {
    type Ok = R::Response;
    type Err = Error;

    async fn execute(&self, request: R) -> Result<Self::Ok, Self::Err> {
        let response = self
            .client
            .post(format!("{}{}", self.base, R::PATH))
            .json(&request)
            .send()
            .await
            .map_err(|e| e.into_error())?;

        let status = response.status();
        if status.is_success() {
            response.json().await.map_err(|e| e.into_error())
        } else {
            let body = response.bytes().await.map_err(|e| e.into_error())?;
            Err(Error::from_remote(status, &body))
        }
    }
}

#[cfg(test)]
mod spec {
    use tokio::net::TcpListener;

    use crate::{
        fixture,
        rpc::{
            identity::{self, Identity},
            Call as _,
        },
    };

    use super::Http;

    /// Serves the identity service on a random local port.
    async fn serve_identity() -> Http {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = identity::router(Identity::new(fixture::service()));
        drop(tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        }));
        local(&format!("http://{addr}/"))
    }

    /// Creates an [`Http`] client ignoring system proxies.
    fn local(base: &str) -> Http {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        Http::with_client(client, base)
    }

    fn register(name: &str) -> identity::RegisterUser {
        identity::RegisterUser {
            username: name.into(),
            email: format!("{name}@x.com"),
            password: "pw1".into(),
        }
    }

    #[tokio::test]
    async fn calls_remote_service() {
        let client = serve_identity().await;

        let id = client.execute(register("alice")).await.unwrap().id;
        let profile = client
            .execute(identity::GetUserProfile { id })
            .await
            .unwrap();

        assert_eq!(profile.id, id);
        assert_eq!(profile.username.to_string(), "alice");
    }

    #[tokio::test]
    async fn rebuilds_remote_errors() {
        let client = serve_identity().await;
        _ = client.execute(register("alice")).await.unwrap();

        let conflict = client.execute(register("alice")).await.unwrap_err();
        let missing = client
            .execute(identity::GetUserIdWithUsername {
                username: "ghost".into(),
            })
            .await
            .unwrap_err();

        assert_eq!(conflict.code, "CONFLICT");
        assert_eq!(conflict.status_code, http::StatusCode::BAD_REQUEST);
        assert_eq!(missing.code, "NOT_FOUND");
        assert_eq!(missing.status_code, http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unreachable_service_is_internal() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = local(&format!("http://{addr}"))
            .execute(register("alice"))
            .await
            .unwrap_err();

        assert_eq!(err.status_code, http::StatusCode::INTERNAL_SERVER_ERROR);
    }
}
