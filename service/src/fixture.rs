//! Shared fixtures of unit tests.

use secrecy::SecretBox;

use crate::{
    command::{CreateTask, RegisterUser},
    domain::{task, user},
    infra::{cache, database},
    token, Command as _, Config, Service, Tokens,
};

/// [`Service`] over in-memory infrastructure.
pub(crate) type Memory =
    Service<database::Memory, cache::KeyValue<cache::Memory>>;

/// Creates a new [`Service`] over empty in-memory infrastructure.
pub(crate) fn service() -> Memory {
    Service::with_cache(
        Config {
            tokens: Tokens::new(b"secret", token::Config::default()),
        },
        database::Memory::new(),
        cache::KeyValue::new(cache::Memory::default()),
    )
}

/// Returns the in-memory cache backend of the provided [`Service`].
pub(crate) fn kv(svc: &Memory) -> &cache::Memory {
    svc.cache().backend()
}

pub(crate) fn username(name: &str) -> user::Username {
    user::Username::new(name).unwrap()
}

pub(crate) fn password(password: &str) -> SecretBox<user::Password> {
    SecretBox::new(Box::new(user::Password::new(password).unwrap()))
}

pub(crate) fn title(title: &str) -> task::Title {
    task::Title::new(title).unwrap()
}

pub(crate) fn description(text: &str) -> task::Description {
    task::Description::new(text).unwrap()
}

/// Registers a new user with the provided `name` and `pw1` password.
pub(crate) async fn register(svc: &Memory, name: &str) -> user::Id {
    svc.execute(RegisterUser {
        username: username(name),
        email: user::Email::new(format!("{name}@x.com")).unwrap(),
        password: password("pw1"),
    })
    .await
    .unwrap()
}

/// Creates a new task with the provided `title` owned by `owner_id`.
pub(crate) async fn create_task(
    svc: &Memory,
    owner_id: user::Id,
    name: &str,
) -> task::Id {
    svc.execute(CreateTask {
        title: title(name),
        description: description("d"),
        owner_id,
    })
    .await
    .unwrap()
    .into_inner()
}
