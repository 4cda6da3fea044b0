//! Task service [`Rpc`]s owning tasks.

use axum::Router;
use serde::{Deserialize, Serialize};
use service::{
    command::{self, Command, Committed},
    domain::{task, user, Task, User},
    infra::database,
    query::{self, Query},
};
use tracerr::Traced;

use crate::{define_error, AsError as _, Error};

use super::{Call, Message, RouterExt as _, Rpc};

/// Creates a new task.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CreateTask {
    /// Title of the new task.
    pub title: String,

    /// Description of the new task.
    pub description: String,

    /// ID of the user owning the new task.
    pub user_id: user::Id,
}

impl Rpc for CreateTask {
    const PATH: &'static str = "/Task/CreateTask";
    type Response = TaskId;
}

/// Returns a single task.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct GetTask {
    /// ID of the task.
    pub id: task::Id,
}

impl Rpc for GetTask {
    const PATH: &'static str = "/Task/GetTask";
    type Response = Task;
}

/// Returns all tasks of a user.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct GetTasks {
    /// Name of the user owning the tasks.
    pub username: String,
}

impl Rpc for GetTasks {
    const PATH: &'static str = "/Task/GetTasks";
    type Response = TaskList;
}

/// Updates an existing task of its owner.
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

    /// ID of the user owning the task.
    pub user_id: user::Id,
}

impl Rpc for UpdateTask {
    const PATH: &'static str = "/Task/UpdateTask";
    type Response = Task;
}

/// Deletes a task.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct DeleteTask {
    /// ID of the task.
    pub id: task::Id,
}

impl Rpc for DeleteTask {
    const PATH: &'static str = "/Task/DeleteTask";
    type Response = Message;
}

/// ID of a created task.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TaskId {
    /// ID of the task.
    pub id: task::Id,
}

/// Tasks of a user.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TaskList {
    /// Tasks, ordered by their IDs.
    pub tasks: Vec<Task>,
}

/// Client of the task service.
pub trait Client:
    Call<CreateTask, Ok = TaskId, Err = Error>
    + Call<GetTask, Ok = Task, Err = Error>
    + Call<GetTasks, Ok = TaskList, Err = Error>
    + Call<UpdateTask, Ok = Task, Err = Error>
    + Call<DeleteTask, Ok = Message, Err = Error>
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> Client for T where
    T: Call<CreateTask, Ok = TaskId, Err = Error>
        + Call<GetTask, Ok = Task, Err = Error>
        + Call<GetTasks, Ok = TaskList, Err = Error>
        + Call<UpdateTask, Ok = Task, Err = Error>
        + Call<DeleteTask, Ok = Message, Err = Error>
        + Clone
        + Send
        + Sync
        + 'static
{
}

/// Returns a [`Router`] serving the task service [`Rpc`]s by the provided
/// [`Client`].
pub fn router<C: Client>(client: C) -> Router {
    Router::new()
        .rpc::<CreateTask>()
        .rpc::<GetTask>()
        .rpc::<GetTasks>()
        .rpc::<UpdateTask>()
        .rpc::<DeleteTask>()
        .with_state(client)
}

/// Endpoint serving the task service [`Rpc`]s by a [`Service`].
///
/// [`Service`]: service::Service
#[derive(Clone, Debug)]
pub struct Tasks<S>(S);

impl<S> Tasks<S> {
    /// Wraps the provided [`Service`].
    ///
    /// [`Service`]: service::Service
    #[must_use]
    pub fn new(service: S) -> Self {
        Self(service)
    }
}

impl<S> Call<CreateTask> for Tasks<S>
where
    S: Command<
            command::CreateTask,
            Ok = Committed<task::Id>,
            Err = Traced<command::create_task::ExecutionError>,
        > + Sync,
{
    type Ok = TaskId;
    type Err = Error;

    async fn execute(&self, req: CreateTask) -> Result<Self::Ok, Self::Err> {
        let CreateTask {
            title,
            description,
            user_id,
        } = req;

        let cmd = command::CreateTask {
            title: task::Title::new(title)
                .ok_or(RequestError::InvalidTitle)?,
            description: task::Description::new(description)
                .ok_or(RequestError::InvalidDescription)?,
            owner_id: user_id,
        };
        self.0
            .execute(cmd)
            .await
            .map(|out| TaskId {
                id: out.into_inner(),
            })
            .map_err(|e| e.into_error())
    }
}

impl<S> Call<GetTask> for Tasks<S>
where
    S: Query<
            query::task::ById,
            Ok = Task,
            Err = Traced<query::task::ExecutionError>,
        > + Sync,
{
    type Ok = Task;
    type Err = Error;

    async fn execute(
        &self,
        GetTask { id }: GetTask,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .execute(query::task::ById(id))
            .await
            .map_err(|e| e.into_error())
    }
}

impl<S> Call<GetTasks> for Tasks<S>
where
    S: Query<
            query::user::ByUsername,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Query<
            query::task::ByOwner,
            Ok = Vec<Task>,
            Err = Traced<query::task::ExecutionError>,
        > + Sync,
{
    type Ok = TaskList;
    type Err = Error;

    async fn execute(
        &self,
        GetTasks { username }: GetTasks,
    ) -> Result<Self::Ok, Self::Err> {
        let username = user::Username::new(username)
            .ok_or(RequestError::InvalidUsername)?;
        let owner = self
            .0
            .execute(query::user::ByUsername(username))
            .await
            .map_err(|e| e.into_error())?
            .ok_or(RequestError::UserNotFound)?;
        self.0
            .execute(query::task::ByOwner(owner.id))
            .await
            .map(|tasks| TaskList { tasks })
            .map_err(|e| e.into_error())
    }
}

impl<S> Call<UpdateTask> for Tasks<S>
where
    S: Command<
            command::UpdateTask,
            Ok = Committed<Task>,
            Err = Traced<command::update_task::ExecutionError>,
        > + Sync,
{
    type Ok = Task;
    type Err = Error;

    async fn execute(&self, req: UpdateTask) -> Result<Self::Ok, Self::Err> {
        let UpdateTask {
            id,
            title,
            description,
            status,
            user_id,
        } = req;

        if i64::from(id) == 0 {
            return Err(RequestError::MissingId.into());
        }
        let task = Task {
            id,
            title: task::Title::new(title)
                .ok_or(RequestError::InvalidTitle)?,
            description: task::Description::new(description)
                .ok_or(RequestError::InvalidDescription)?,
            status,
            owner_id: user_id,
        };
        self.0
            .execute(command::UpdateTask(task))
            .await
            .map(Committed::into_inner)
            .map_err(|e| e.into_error())
    }
}

impl<S> Call<DeleteTask> for Tasks<S>
where
    S: Command<
            command::DeleteTask,
            Ok = Committed<Task>,
            Err = Traced<command::delete_task::ExecutionError>,
        > + Sync,
{
    type Ok = Message;
    type Err = Error;

    async fn execute(
        &self,
        DeleteTask { id }: DeleteTask,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self
            .0
            .execute(command::DeleteTask(id))
            .await
            .map_err(|e| e.into_error())?;

        Ok(Message {
            message: format!("Task with ID - {id} Deleted Successfully!"),
        })
    }
}

define_error! {
    /// Malformed or unsatisfiable task request.
    enum RequestError {
        #[code = "BAD_REQUEST"]
        #[status = BAD_REQUEST]
        #[message = "Title must be non-empty"]
        InvalidTitle,

        #[code = "BAD_REQUEST"]
        #[status = BAD_REQUEST]
        #[message = "Description must be non-empty"]
        InvalidDescription,

        #[code = "BAD_REQUEST"]
        #[status = BAD_REQUEST]
        #[message = "Task ID is required"]
        MissingId,

        #[code = "BAD_REQUEST"]
        #[status = BAD_REQUEST]
        #[message = "Username must be non-empty and contain no whitespace"]
        InvalidUsername,

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
        CreateTask, DeleteTask, GetTask, GetTasks, Tasks, UpdateTask,
    };

    #[tokio::test]
    async fn serves_task_lifecycle() {
        let svc = fixture::service();
        let owner = fixture::register(&svc, "alice").await;
        let tasks = Tasks::new(svc);

        let id = tasks
            .execute(CreateTask {
                title: "Buy milk".into(),
                description: "2%".into(),
                user_id: owner,
            })
            .await
            .unwrap()
            .id;
        let listed = tasks
            .execute(GetTasks {
                username: "alice".into(),
            })
            .await
            .unwrap()
            .tasks;
        let updated = tasks
            .execute(UpdateTask {
                id,
                title: "Buy milk".into(),
                description: "2%".into(),
                status: true,
                user_id: owner,
            })
            .await
            .unwrap();
        let fetched = tasks.execute(GetTask { id }).await.unwrap();
        let deleted = tasks.execute(DeleteTask { id }).await.unwrap();
        let gone = tasks.execute(GetTask { id }).await.unwrap_err();

        assert_eq!(listed.len(), 1);
        assert!(!listed[0].status);
        assert_eq!(listed[0].owner_id, owner);
        assert!(updated.status);
        assert_eq!(fetched, updated);
        assert_eq!(
            deleted.message,
            format!("Task with ID - {id} Deleted Successfully!"),
        );
        assert_eq!(gone.status_code, http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn validates_task_fields() {
        let svc = fixture::service();
        let owner = fixture::register(&svc, "alice").await;
        let tasks = Tasks::new(svc);

        let blank = tasks
            .execute(CreateTask {
                title: "  ".into(),
                description: "d".into(),
                user_id: owner,
            })
            .await
            .unwrap_err();
        let zero = tasks
            .execute(UpdateTask {
                id: 0.into(),
                title: "t".into(),
                description: "d".into(),
                status: false,
                user_id: owner,
            })
            .await
            .unwrap_err();

        assert_eq!(blank.status_code, http::StatusCode::BAD_REQUEST);
        assert_eq!(zero.status_code, http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let svc = fixture::service();
        let owner = fixture::register(&svc, "alice").await;
        let tasks = Tasks::new(svc);

        let update = tasks
            .execute(UpdateTask {
                id: 7.into(),
                title: "t".into(),
                description: "d".into(),
                status: false,
                user_id: owner,
            })
            .await
            .unwrap_err();
        let delete = tasks.execute(DeleteTask { id: 7.into() }).await;
        let list = tasks
            .execute(GetTasks {
                username: "ghost".into(),
            })
            .await
            .unwrap_err();

        assert_eq!(update.status_code, http::StatusCode::NOT_FOUND);
        assert_eq!(
            delete.unwrap_err().status_code,
            http::StatusCode::NOT_FOUND,
        );
        assert_eq!(list.status_code, http::StatusCode::NOT_FOUND);
    }
}
