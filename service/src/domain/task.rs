//! [`Task`] definitions.

use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};

use crate::domain::user;

/// To-do item owned by a [`User`].
///
/// [`User`]: crate::domain::User
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Task {
    /// ID of this [`Task`].
    pub id: Id,

    /// [`Title`] of this [`Task`].
    pub title: Title,

    /// [`Description`] of this [`Task`].
    pub description: Description,

    /// Indicator whether this [`Task`] is done.
    pub status: bool,

    /// ID of the [`User`] owning this [`Task`].
    ///
    /// Never changes after creation.
    ///
    /// [`User`]: crate::domain::User
    #[serde(rename = "user_id")]
    pub owner_id: user::Id,
}

/// [`Task`] to be created.
///
/// New [`Task`]s are never done.
#[derive(Clone, Debug)]
pub struct New {
    /// [`Title`] of the new [`Task`].
    pub title: Title,

    /// [`Description`] of the new [`Task`].
    pub description: Description,

    /// ID of the [`User`] owning the new [`Task`].
    ///
    /// [`User`]: crate::domain::User
    pub owner_id: user::Id,
}

/// ID of a [`Task`], assigned by the store.
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

/// Title of a [`Task`].
#[derive(
    AsRef, Clone, Debug, Deserialize, Display, Eq, PartialEq, Serialize,
)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[serde(transparent)]
pub struct Title(String);

impl Title {
    /// Creates a new [`Title`] if the given `title` is valid.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Option<Self> {
        let title = title.into();
        Self::check(&title).then_some(Self(title))
    }

    /// Checks whether the given `title` is a valid [`Title`].
    fn check(title: impl AsRef<str>) -> bool {
        let title = title.as_ref();
        !title.trim().is_empty() && title.len() <= 255
    }
}

impl FromStr for Title {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Title`")
    }
}

/// Free-form description of a [`Task`].
#[derive(
    AsRef, Clone, Debug, Deserialize, Display, Eq, PartialEq, Serialize,
)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[serde(transparent)]
pub struct Description(String);

impl Description {
    /// Creates a new [`Description`] if the given `text` is valid.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        Self::check(&text).then_some(Self(text))
    }

    /// Checks whether the given `text` is a valid [`Description`].
    fn check(text: impl AsRef<str>) -> bool {
        !text.as_ref().trim().is_empty()
    }
}

impl FromStr for Description {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Description`")
    }
}

#[cfg(test)]
mod spec {
    use serde_json::json;

    use super::{Description, Task, Title};

    #[test]
    fn validates_title() {
        assert!(Title::new("buy milk").is_some());
        assert!(Title::new("").is_none());
        assert!(Title::new("   ").is_none());
        assert!(Title::new("t".repeat(256)).is_none());
    }

    #[test]
    fn validates_description() {
        assert!(Description::new("2L").is_some());
        assert!(Description::new("").is_none());
    }

    #[test]
    fn serializes_with_owner_as_user_id() {
        let task = Task {
            id: 7.into(),
            title: Title::new("buy milk").unwrap(),
            description: Description::new("2L").unwrap(),
            status: false,
            owner_id: 1.into(),
        };

        let json = serde_json::to_value(&task).unwrap();

        assert_eq!(
            json,
            json!({
                "id": 7,
                "title": "buy milk",
                "description": "2L",
                "status": false,
                "user_id": 1,
            }),
        );
        assert_eq!(serde_json::from_value::<Task>(json).unwrap(), task);
    }
}
