//! [`User`]-related [`Database`] implementations.

use common::operations::{By, Delete, Insert, Select};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{user, User},
    infra::{
        database::{
            self,
            postgres::{self, Connection},
            Postgres,
        },
        Database,
    },
};

/// Builds a [`User`] out of the provided `users` table [`Row`].
fn from_row(row: &Row) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
    }
}

impl<C> Database<Select<By<Option<User>, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id, username, email, password_hash \
            FROM users \
            WHERE id = $1::INT8";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<'l, C> Database<Select<By<Option<User>, &'l user::Username>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'l user::Username>>,
    ) -> Result<Self::Ok, Self::Err> {
        let username = by.into_inner();

        const SQL: &str = "\
            SELECT id, username, email, password_hash \
            FROM users \
            WHERE username = $1::VARCHAR";
        Ok(self
            .query_opt(SQL, &[username])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<'l, C>
    Database<
        Select<By<Option<user::Id>, (&'l user::Username, &'l user::Email)>>,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<user::Id>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Option<user::Id>, (&'l user::Username, &'l user::Email)>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let (username, email) = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM users \
            WHERE username = $1::VARCHAR \
               OR email = $2::VARCHAR \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[username, email])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| row.get("id")))
    }
}

impl<C> Database<Insert<user::New>> for Postgres<C>
where
    C: Connection,
{
    type Ok = user::Id;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(new): Insert<user::New>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            INSERT INTO users (username, email, password_hash) \
            VALUES ($1::VARCHAR, $2::VARCHAR, $3::VARCHAR) \
            RETURNING id";
        self
            .query(SQL, &[&new.username, &new.email, &new.password_hash])
            .await
            .map_err(tracerr::wrap!())?
            .first()
            .map(|row| row.get("id"))
            .ok_or_else(|| tracerr::new!(postgres::Error::NoRowReturned))
            .map_err(tracerr::map_from)
    }
}

impl<'l, C> Database<Delete<By<User, &'l user::Username>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = u64;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<User, &'l user::Username>>,
    ) -> Result<Self::Ok, Self::Err> {
        let username = by.into_inner();

        const SQL: &str = "\
            DELETE FROM users \
            WHERE username = $1::VARCHAR";
        self.exec(SQL, &[username])
            .await
            .map_err(tracerr::wrap!())
    }
}
