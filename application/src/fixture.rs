//! Shared fixtures of unit tests.

use secrecy::SecretBox;
use service::{
    command::{Command as _, RegisterUser},
    domain::user,
    infra::{cache, database},
    token, Config, Tokens,
};

/// [`service::Service`] over in-memory infrastructure.
pub(crate) type Memory =
    service::Service<database::Memory, cache::KeyValue<cache::Memory>>;

/// Creates a new [`service::Service`] over empty in-memory infrastructure.
pub(crate) fn service() -> Memory {
    service::Service::with_cache(
        Config {
            tokens: Tokens::new(b"secret", token::Config::default()),
        },
        database::Memory::new(),
        cache::KeyValue::new(cache::Memory::default()),
    )
}

/// Registers a new user with the provided `name` and `pw1` password.
pub(crate) async fn register(svc: &Memory, name: &str) -> user::Id {
    svc.execute(RegisterUser {
        username: user::Username::new(name).unwrap(),
        email: user::Email::new(format!("{name}@x.com")).unwrap(),
        password: SecretBox::new(Box::new(
            user::Password::new("pw1").unwrap(),
        )),
    })
    .await
    .unwrap()
}
