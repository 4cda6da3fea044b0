//! [`User`] definitions.

use std::sync::LazyLock;

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHasher as _, PasswordVerifier as _,
};
use derive_more::{AsRef, Debug, Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use secrecy::{zeroize::Zeroize, CloneableSecret};
use serde::{Deserialize, Serialize};

/// Registered user.
#[derive(Clone, Debug)]
pub struct User {
    /// ID of this [`User`].
    pub id: Id,

    /// [`Username`] of this [`User`].
    pub username: Username,

    /// [`Email`] of this [`User`].
    pub email: Email,

    /// [`PasswordHash`] of this [`User`].
    pub password_hash: PasswordHash,
}

/// [`User`] to be created.
#[derive(Clone, Debug)]
pub struct New {
    /// [`Username`] of the new [`User`].
    pub username: Username,

    /// [`Email`] of the new [`User`].
    pub email: Email,

    /// [`PasswordHash`] of the new [`User`].
    pub password_hash: PasswordHash,
}

/// ID of a [`User`], assigned by the store.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
#[serde(transparent)]
pub struct Id(i64);

/// Unique name of a [`User`].
#[derive(
    AsRef, Clone, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize,
)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Creates a new [`Username`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`Username`].
    fn check(name: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Username`] invariants:
        /// - Must not be empty;
        /// - Must not contain whitespace or control characters;
        /// - Must be at most 64 characters long.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[^\s\p{Cc}]{1,64}$").expect("valid regex")
        });

        REGEX.is_match(name.as_ref())
    }
}

impl FromStr for Username {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Username`")
    }
}

/// Plain password of a [`User`], never stored.
#[derive(Clone, Debug, Eq, PartialEq)]
#[debug("Password(***)")]
pub struct Password(String);

impl Password {
    /// Creates a new [`Password`] if the given `password` is valid.
    #[must_use]
    pub fn new(password: impl Into<String>) -> Option<Self> {
        let password = password.into();
        Self::check(&password).then_some(Self(password))
    }

    /// Checks whether the given `password` is a valid [`Password`].
    fn check(password: impl AsRef<str>) -> bool {
        let password = password.as_ref();
        !password.is_empty() && password.len() <= 128
    }
}

impl FromStr for Password {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Password`")
    }
}

impl CloneableSecret for Password {}
impl Zeroize for Password {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

/// [Argon2] hash of a [`User`]'s [`Password`], in the PHC string format.
///
/// [Argon2]: https://en.wikipedia.org/wiki/Argon2
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hashes the provided [`Password`] with a random salt.
    ///
    /// # Errors
    ///
    /// If the hashing fails.
    pub fn new(password: &Password) -> Result<Self, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.0.as_bytes(), &salt)
            .map_err(HashError)?;
        Ok(Self(hash.to_string()))
    }

    /// Creates a [`PasswordHash`] out of an already computed PHC string.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `phc` is a valid PHC string.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(phc: impl Into<String>) -> Self {
        Self(phc.into())
    }

    /// Checks whether the provided [`Password`] matches this [`PasswordHash`].
    ///
    /// Malformed hashes never match.
    #[must_use]
    pub fn matches(&self, password: &Password) -> bool {
        argon2::PasswordHash::new(&self.0).is_ok_and(|hash| {
            Argon2::default()
                .verify_password(password.0.as_bytes(), &hash)
                .is_ok()
        })
    }
}

/// Error of hashing a [`Password`].
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("Failed to hash `Password`: {_0}")]
pub struct HashError(#[error(not(source))] argon2::password_hash::Error);

/// Email address of a [`User`].
#[derive(
    AsRef, Clone, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize,
)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Creates a new [`Email`] if the given `address` is valid.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Option<Self> {
        let address = address.into();
        Self::check(&address).then_some(Self(address))
    }

    /// Checks whether the given `address` is a valid [`Email`].
    fn check(address: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Email`] format: a local part without
        /// whitespace, a single `@` and a dotted domain.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)+$").expect("valid regex")
        });

        address.as_ref().len() <= 255 && REGEX.is_match(address.as_ref())
    }
}

impl FromStr for Email {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Email`")
    }
}

#[cfg(test)]
mod spec {
    use super::{Email, Password, PasswordHash, Username};

    #[test]
    fn validates_username() {
        assert!(Username::new("alice").is_some());
        assert!(Username::new("alice_42").is_some());
        assert!(Username::new("").is_none());
        assert!(Username::new(" alice").is_none());
        assert!(Username::new("ali ce").is_none());
        assert!(Username::new("a".repeat(65)).is_none());
    }

    #[test]
    fn validates_email() {
        assert!(Email::new("a@x.io").is_some());
        assert!(Email::new("first.last@sub.example.com").is_some());
        assert!(Email::new("").is_none());
        assert!(Email::new("a@x").is_none());
        assert!(Email::new("a x@x.io").is_none());
        assert!(Email::new("@x.io").is_none());
    }

    #[test]
    fn validates_password() {
        assert!(Password::new("p").is_some());
        assert!(Password::new("").is_none());
        assert!(Password::new("p".repeat(129)).is_none());
    }

    #[test]
    fn hash_matches_only_its_password() {
        let password = Password::new("p1").unwrap();
        let hash = PasswordHash::new(&password).unwrap();

        assert!(hash.matches(&password));
        assert!(!hash.matches(&Password::new("p2").unwrap()));
        assert_ne!(hash.to_string(), "p1");
    }

    #[test]
    fn hashes_are_salted() {
        let password = Password::new("p1").unwrap();

        assert_ne!(
            PasswordHash::new(&password).unwrap(),
            PasswordHash::new(&password).unwrap(),
        );
    }

    #[test]
    fn malformed_hash_never_matches() {
        #[expect(unsafe_code, reason = "test")]
        let hash = unsafe { PasswordHash::new_unchecked("p1") };

        assert!(!hash.matches(&Password::new("p1").unwrap()));
    }
}
