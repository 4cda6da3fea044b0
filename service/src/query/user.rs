//! [`Query`] collection related to [`User`]s.

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::{user, User},
    infra::{database, Database},
    Service,
};

use super::Query;

/// Queries a [`User`] by its [`user::Id`].
#[derive(Clone, Copy, Debug)]
pub struct ById(pub user::Id);

impl<Db, Kv> Query<ById> for Service<Db, Kv>
where
    Self: Sync,
    Db: Database<
        Select<By<Option<User>, user::Id>>,
        Ok = Option<User>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(&self, ById(id): ById) -> Result<Self::Ok, Self::Err> {
        self.database()
            .execute(Select(By::new(id)))
            .await
            .map_err(tracerr::wrap!())
    }
}

/// Queries a [`User`] by its [`user::Username`].
#[derive(Clone, Debug)]
pub struct ByUsername(pub user::Username);

impl<Db, Kv> Query<ByUsername> for Service<Db, Kv>
where
    Self: Sync,
    Db: for<'l> Database<
        Select<By<Option<User>, &'l user::Username>>,
        Ok = Option<User>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        ByUsername(username): ByUsername,
    ) -> Result<Self::Ok, Self::Err> {
        self.database()
            .execute(Select(By::new(&username)))
            .await
            .map_err(tracerr::wrap!())
    }
}
