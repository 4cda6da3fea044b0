//! REST [`Gateway`] composing calls to the downstream services.

pub mod filter;

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    middleware,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use service::{
    domain::{task, Task},
    Tokens,
};

use crate::{
    define_error,
    rpc::{auth, identity, task as tasks, Call as _, Message},
    AsError as _, Error,
};

pub use self::filter::Subject;

/// Bundle of the downstream service clients used by a [`Gateway`].
pub trait Downstream: Send + Sync + 'static {
    /// Client of the identity service.
    type Identity: identity::Client;

    /// Client of the authentication service.
    type Auth: auth::Client;

    /// Client of the task service.
    type Task: tasks::Client;

    /// Returns the client of the identity service.
    fn identity(&self) -> &Self::Identity;

    /// Returns the client of the authentication service.
    fn auth(&self) -> &Self::Auth;

    /// Returns the client of the task service.
    fn task(&self) -> &Self::Task;
}

/// Typed clients of the downstream services.
#[derive(Clone, Debug)]
pub struct Clients<I, A, T> {
    /// Client of the identity service.
    pub identity: I,

    /// Client of the authentication service.
    pub auth: A,

    /// Client of the task service.
    pub task: T,
}

impl<I, A, T> Downstream for Clients<I, A, T>
where
    I: identity::Client,
    A: auth::Client,
    T: tasks::Client,
{
    type Identity = I;
    type Auth = A;
    type Task = T;

    fn identity(&self) -> &I {
        &self.identity
    }

    fn auth(&self) -> &A {
        &self.auth
    }

    fn task(&self) -> &T {
        &self.task
    }
}

/// REST gateway of the system.
///
/// Stateless: it only verifies tokens and forwards requests to the
/// [`Downstream`] services.
#[derive(Debug)]
pub struct Gateway<C> {
    /// [`Downstream`] clients of this [`Gateway`].
    clients: Arc<C>,

    /// [`Tokens`] verifying bearer tokens.
    tokens: Tokens,
}

impl<C> Clone for Gateway<C> {
    fn clone(&self) -> Self {
        Self {
            clients: Arc::clone(&self.clients),
            tokens: self.tokens.clone(),
        }
    }
}

impl<C> Gateway<C> {
    /// Creates a new [`Gateway`] over the provided [`Downstream`] clients.
    #[must_use]
    pub fn new(clients: C, tokens: Tokens) -> Self {
        Self {
            clients: Arc::new(clients),
            tokens,
        }
    }

    /// Returns [`Downstream`] clients of this [`Gateway`].
    #[must_use]
    pub fn clients(&self) -> &C {
        &self.clients
    }

    /// Returns [`Tokens`] of this [`Gateway`].
    #[must_use]
    pub fn tokens(&self) -> &Tokens {
        &self.tokens
    }
}

/// Returns a [`Router`] serving the REST surface of the provided
/// [`Gateway`].
///
/// Every `/user/*` and `/task/*` route is guarded by
/// [`filter::authorize()`].
pub fn router<C: Downstream>(gateway: Gateway<C>) -> Router {
    let protected = Router::new()
        .route("/user/get-user-profile", get(user_profile::<C>))
        .route("/user/delete-user", delete(delete_user::<C>))
        .route("/task/create-task", post(create_task::<C>))
        .route("/task/get-tasks", get(get_tasks::<C>))
        .route("/task/get-task/:id", get(get_task::<C>))
        .route("/task/update-task", put(update_task::<C>))
        .route("/task/delete-task/:id", delete(delete_task::<C>))
        .route_layer(middleware::from_fn_with_state(
            gateway.clone(),
            filter::authorize::<C>,
        ));

    Router::new()
        .route("/ping", get(ping))
        .route("/auth/register", post(register::<C>))
        .route("/auth/login", post(login::<C>))
        .route("/auth/refresh-token", post(refresh_token::<C>))
        .merge(protected)
        .with_state(gateway)
}

/// Body of a `DELETE /user/delete-user` request.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DeleteUser {
    /// Password of the [`Subject`].
    pub password: String,
}

/// Body of a `POST /task/create-task` request.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CreateTask {
    /// Title of the new task.
    pub title: String,

    /// Description of the new task.
    pub description: String,
}

/// Body of a `PUT /task/update-task` request.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct UpdateTask {
    /// ID of the task.
    pub id: task::Id,

    /// New title of the task.
    pub title: String,

    /// New description of the task.
    pub description: String,

    /// New status of the task.
    pub status: bool,
}

/// Unwraps a JSON request body.
fn body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, Error> {
    body.map(|Json(b)| b).map_err(|e| e.into_error())
}

/// Parses a [`task::Id`] path segment.
fn task_id(raw: &str) -> Result<task::Id, Error> {
    raw.parse().map_err(|_| RequestError::InvalidTaskId.into())
}

#[expect(clippy::unused_async, reason = "`async` is required by `axum`")]
async fn ping() -> &'static str {
    "pong"
}

async fn register<C: Downstream>(
    State(gw): State<Gateway<C>>,
    req: Result<Json<identity::RegisterUser>, JsonRejection>,
) -> Result<Json<identity::UserId>, Error> {
    gw.clients().identity().execute(body(req)?).await.map(Json)
}

async fn login<C: Downstream>(
    State(gw): State<Gateway<C>>,
    req: Result<Json<auth::Authenticate>, JsonRejection>,
) -> Result<Json<auth::Tokens>, Error> {
    gw.clients().auth().execute(body(req)?).await.map(Json)
}

async fn refresh_token<C: Downstream>(
    State(gw): State<Gateway<C>>,
    req: Result<Json<auth::RefreshToken>, JsonRejection>,
) -> Result<Json<auth::AccessToken>, Error> {
    gw.clients().auth().execute(body(req)?).await.map(Json)
}

async fn user_profile<C: Downstream>(
    State(gw): State<Gateway<C>>,
    Extension(subject): Extension<Subject>,
) -> Result<Json<identity::Profile>, Error> {
    gw.clients()
        .identity()
        .execute(identity::GetUserProfile { id: subject.id })
        .await
        .map(Json)
}

async fn delete_user<C: Downstream>(
    State(gw): State<Gateway<C>>,
    Extension(subject): Extension<Subject>,
    req: Result<Json<DeleteUser>, JsonRejection>,
) -> Result<Json<Message>, Error> {
    let DeleteUser { password } = body(req)?;
    gw.clients()
        .identity()
        .execute(identity::DeleteUser {
            username: subject.username.to_string(),
            password,
        })
        .await
        .map(Json)
}

async fn create_task<C: Downstream>(
    State(gw): State<Gateway<C>>,
    Extension(subject): Extension<Subject>,
    req: Result<Json<CreateTask>, JsonRejection>,
) -> Result<Json<tasks::TaskId>, Error> {
    let CreateTask { title, description } = body(req)?;
    gw.clients()
        .task()
        .execute(tasks::CreateTask {
            title,
            description,
            user_id: subject.id,
        })
        .await
        .map(Json)
}

async fn get_tasks<C: Downstream>(
    State(gw): State<Gateway<C>>,
    Extension(subject): Extension<Subject>,
) -> Result<Json<tasks::TaskList>, Error> {
    gw.clients()
        .task()
        .execute(tasks::GetTasks {
            username: subject.username.to_string(),
        })
        .await
        .map(Json)
}

async fn get_task<C: Downstream>(
    State(gw): State<Gateway<C>>,
    Path(id): Path<String>,
) -> Result<Json<Task>, Error> {
    gw.clients()
        .task()
        .execute(tasks::GetTask { id: task_id(&id)? })
        .await
        .map(Json)
}

async fn update_task<C: Downstream>(
    State(gw): State<Gateway<C>>,
    Extension(subject): Extension<Subject>,
    req: Result<Json<UpdateTask>, JsonRejection>,
) -> Result<Json<Task>, Error> {
    let UpdateTask {
        id,
        title,
        description,
        status,
    } = body(req)?;
    gw.clients()
        .task()
        .execute(tasks::UpdateTask {
            id,
            title,
            description,
            status,
            user_id: subject.id,
        })
        .await
        .map(Json)
}

async fn delete_task<C: Downstream>(
    State(gw): State<Gateway<C>>,
    Path(id): Path<String>,
) -> Result<Json<Message>, Error> {
    gw.clients()
        .task()
        .execute(tasks::DeleteTask { id: task_id(&id)? })
        .await
        .map(Json)
}

define_error! {
    /// Malformed gateway request.
    enum RequestError {
        #[code = "BAD_REQUEST"]
        #[status = BAD_REQUEST]
        #[message = "Task ID must be an integer"]
        InvalidTaskId,
    }
}

#[cfg(test)]
mod spec {
    use axum::{body::Body, Router};
    use http_body_util::BodyExt as _;
    use serde_json::{json, Value};
    use service::{token, Tokens};
    use tower::ServiceExt as _;

    use crate::{
        fixture,
        rpc::{auth::Auth, identity::Identity, task::Tasks},
    };

    use super::{router, Clients, Gateway};

    fn app() -> Router {
        let svc = fixture::service();
        let gateway = Gateway::new(
            Clients {
                identity: Identity::new(svc.clone()),
                auth: Auth::new(svc.clone()),
                task: Tasks::new(svc.clone()),
            },
            svc.tokens().clone(),
        );
        router(gateway)
    }

    async fn call(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (http::StatusCode, Value) {
        let mut req = http::Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(http::header::AUTHORIZATION, token);
        }
        let req = match body {
            Some(body) => req
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();

        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn sign_up(app: &Router, name: &str) -> String {
        let (status, _) = call(
            app,
            "POST",
            "/auth/register",
            None,
            Some(json!({
                "username": name,
                "email": format!("{name}@x.com"),
                "password": "pw1",
            })),
        )
        .await;
        assert_eq!(status, http::StatusCode::OK);

        let (status, tokens) = call(
            app,
            "POST",
            "/auth/login",
            None,
            Some(json!({"username": name, "password": "pw1"})),
        )
        .await;
        assert_eq!(status, http::StatusCode::OK);

        format!("Bearer {}", tokens["access_token"].as_str().unwrap())
    }

    #[tokio::test]
    async fn pongs() {
        let resp = app()
            .oneshot(
                http::Request::builder()
                    .uri("/ping")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();

        assert_eq!(&bytes[..], b"pong");
    }

    #[tokio::test]
    async fn serves_task_lifecycle() {
        let app = app();
        let bearer = sign_up(&app, "alice").await;
        let auth = Some(bearer.as_str());

        let (status, created) = call(
            &app,
            "POST",
            "/task/create-task",
            auth,
            Some(json!({"title": "Buy milk", "description": "2%"})),
        )
        .await;
        assert_eq!(status, http::StatusCode::OK);
        let id = created["id"].as_i64().unwrap();

        let (_, listed) = call(&app, "GET", "/task/get-tasks", auth, None).await;
        assert_eq!(
            listed,
            json!({"tasks": [{
                "id": id,
                "title": "Buy milk",
                "description": "2%",
                "status": false,
                "user_id": 1,
            }]}),
        );

        let (status, updated) = call(
            &app,
            "PUT",
            "/task/update-task",
            auth,
            Some(json!({
                "id": id,
                "title": "Buy milk",
                "description": "2%",
                "status": true,
            })),
        )
        .await;
        assert_eq!(status, http::StatusCode::OK);
        assert_eq!(updated["status"], json!(true));

        let uri = format!("/task/get-task/{id}");
        let (_, fetched) = call(&app, "GET", &uri, auth, None).await;
        assert_eq!(fetched, updated);

        let (status, deleted) = call(
            &app,
            "DELETE",
            &format!("/task/delete-task/{id}"),
            auth,
            None,
        )
        .await;
        assert_eq!(status, http::StatusCode::OK);
        assert_eq!(
            deleted["message"],
            json!(format!("Task with ID - {id} Deleted Successfully!")),
        );

        let (status, err) = call(&app, "GET", &uri, auth, None).await;
        assert_eq!(status, http::StatusCode::NOT_FOUND);
        assert_eq!(err["code"], json!("NOT_FOUND"));
    }

    #[tokio::test]
    async fn requires_authorization() {
        let app = app();

        for (method, uri) in [
            ("GET", "/user/get-user-profile"),
            ("GET", "/task/get-tasks"),
            ("GET", "/task/get-task/1"),
            ("DELETE", "/task/delete-task/1"),
        ] {
            let (status, err) = call(&app, method, uri, None, None).await;

            assert_eq!(status, http::StatusCode::UNAUTHORIZED, "{uri}");
            assert_eq!(err["code"], json!("UNAUTHORIZED"));
        }
    }

    #[tokio::test]
    async fn rejects_forged_tokens() {
        let app = app();
        _ = sign_up(&app, "alice").await;
        let forged = Tokens::new(b"other", token::Config::default())
            .issue(&"alice".parse().unwrap(), token::Kind::Access)
            .unwrap();

        for token in ["Bearer garbage".to_owned(), format!("Bearer {forged}")] {
            let (status, _) =
                call(&app, "GET", "/task/get-tasks", Some(token.as_str()), None)
                    .await;

            assert_eq!(status, http::StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn accepts_token_without_bearer_prefix() {
        let app = app();
        let bearer = sign_up(&app, "alice").await;
        let raw = bearer.trim_start_matches("Bearer ");

        let (status, profile) =
            call(&app, "GET", "/user/get-user-profile", Some(raw), None).await;

        assert_eq!(status, http::StatusCode::OK);
        assert_eq!(profile["username"], json!("alice"));
        assert_eq!(profile["email"], json!("alice@x.com"));
    }

    #[tokio::test]
    async fn deleted_subject_is_unauthorized() {
        let app = app();
        let bearer = sign_up(&app, "alice").await;
        let auth = Some(bearer.as_str());

        let (status, deleted) = call(
            &app,
            "DELETE",
            "/user/delete-user",
            auth,
            Some(json!({"password": "pw1"})),
        )
        .await;
        assert_eq!(status, http::StatusCode::OK);
        assert_eq!(
            deleted["message"],
            json!("User deleted successfully with username: alice"),
        );

        let (status, _) =
            call(&app, "GET", "/user/get-user-profile", auth, None).await;
        assert_eq!(status, http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn translates_downstream_failures() {
        let app = app();
        let bearer = sign_up(&app, "alice").await;
        let auth = Some(bearer.as_str());

        let (status, err) = call(
            &app,
            "POST",
            "/auth/register",
            None,
            Some(json!({
                "username": "alice",
                "email": "other@x.com",
                "password": "pw1",
            })),
        )
        .await;
        assert_eq!(status, http::StatusCode::BAD_REQUEST);
        assert_eq!(err["code"], json!("CONFLICT"));

        let (status, err) = call(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({"username": "alice", "password": "nope"})),
        )
        .await;
        assert_eq!(status, http::StatusCode::UNAUTHORIZED);
        assert_eq!(err["code"], json!("INVALID_CREDENTIAL"));

        let (status, _) =
            call(&app, "GET", "/task/get-task/abc", auth, None).await;
        assert_eq!(status, http::StatusCode::BAD_REQUEST);

        let (status, _) = call(
            &app,
            "POST",
            "/task/create-task",
            auth,
            Some(json!({"title": ""})),
        )
        .await;
        assert_eq!(status, http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn refreshes_access_token() {
        let app = app();
        _ = sign_up(&app, "alice").await;
        let (_, tokens) = call(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({"username": "alice", "password": "pw1"})),
        )
        .await;

        let (status, refreshed) = call(
            &app,
            "POST",
            "/auth/refresh-token",
            None,
            Some(json!({"refresh_token": tokens["refresh_token"]})),
        )
        .await;
        let bearer =
            format!("Bearer {}", refreshed["access_token"].as_str().unwrap());
        let (status_after, _) =
            call(&app, "GET", "/task/get-tasks", Some(bearer.as_str()), None)
                .await;

        assert_eq!(status, http::StatusCode::OK);
        assert_eq!(status_after, http::StatusCode::OK);
    }

    #[tokio::test]
    async fn lists_only_own_tasks() {
        let app = app();
        let alice = sign_up(&app, "alice").await;
        let bob = sign_up(&app, "bob").await;
        for (bearer, title) in [(&alice, "a1"), (&bob, "b1"), (&alice, "a2")] {
            let (status, _) = call(
                &app,
                "POST",
                "/task/create-task",
                Some(bearer.as_str()),
                Some(json!({"title": title, "description": "d"})),
            )
            .await;
            assert_eq!(status, http::StatusCode::OK);
        }

        let (_, listed) =
            call(&app, "GET", "/task/get-tasks", Some(alice.as_str()), None)
                .await;
        let titles = listed["tasks"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["title"].as_str().unwrap())
            .collect::<Vec<_>>();

        assert_eq!(titles, ["a1", "a2"]);
    }
}
