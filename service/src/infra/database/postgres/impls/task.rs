//! [`Task`]-related [`Database`] implementations.

use common::operations::{By, Delete, Insert, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{task, user, Task},
    infra::{
        database::{
            self,
            postgres::{self, Connection},
            Postgres,
        },
        Database,
    },
};

/// Builds a [`Task`] out of the provided `tasks` table [`Row`].
fn from_row(row: &Row) -> Task {
    Task {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        status: row.get("status"),
        owner_id: row.get("user_id"),
    }
}

impl<C> Database<Insert<task::New>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Task;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(new): Insert<task::New>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            INSERT INTO tasks (title, description, status, user_id) \
            VALUES ($1::VARCHAR, $2::TEXT, FALSE, $3::INT8) \
            RETURNING id, title, description, status, user_id";
        self
            .query(SQL, &[&new.title, &new.description, &new.owner_id])
            .await
            .map_err(tracerr::wrap!())?
            .first()
            .map(from_row)
            .ok_or_else(|| tracerr::new!(postgres::Error::NoRowReturned))
            .map_err(tracerr::map_from)
    }
}

impl<C> Database<Select<By<Option<Task>, task::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Task>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Task>, task::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id, title, description, status, user_id \
            FROM tasks \
            WHERE id = $1::INT8";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<Task>, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Task>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Task>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let owner_id = by.into_inner();

        const SQL: &str = "\
            SELECT id, title, description, status, user_id \
            FROM tasks \
            WHERE user_id = $1::INT8 \
            ORDER BY id";
        Ok(self
            .query(SQL, &[&owner_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Update<Task>> for Postgres<C>
where
    C: Connection,
{
    type Ok = u64;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(task): Update<Task>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            UPDATE tasks \
            SET title = $2::VARCHAR, \
                description = $3::TEXT, \
                status = $4::BOOL \
            WHERE id = $1::INT8 \
              AND user_id = $5::INT8";
        self.exec(
            SQL,
            &[
                &task.id,
                &task.title,
                &task.description,
                &task.status,
                &task.owner_id,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Delete<By<Task, task::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = u64;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Task, task::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM tasks \
            WHERE id = $1::INT8";
        self.exec(SQL, &[&id]).await.map_err(tracerr::wrap!())
    }
}
