//! Date and time utilities.

use std::{cmp::Ordering, marker::PhantomData, ops, time::Duration};

use derive_more::Debug;

/// Untyped date and time.
pub type DateTime = DateTimeOf;

/// UTC date and time with whole-second precision.
///
/// The `Of` parameter tells apart date and times of different meaning, so an
/// expiration can't be mixed up with an issue time.
#[derive(Debug)]
#[debug("{inner}")]
pub struct DateTimeOf<Of: ?Sized = ()> {
    /// Inner representation of the date and time.
    inner: time::OffsetDateTime,

    /// Type parameter describing the kind of date and time.
    _of: PhantomData<Of>,
}

impl<Of: ?Sized> DateTimeOf<Of> {
    /// Returns the current date and time, truncated to whole seconds.
    #[must_use]
    pub fn now() -> Self {
        let now = time::OffsetDateTime::now_utc();
        Self::wrap(now - time::Duration::nanoseconds(now.nanosecond().into()))
    }

    /// Creates a new [`DateTimeOf`] from the provided Unix timestamp.
    ///
    /// [`None`] is returned if the timestamp is out of the supported range.
    #[must_use]
    pub fn from_unix_timestamp(timestamp: i64) -> Option<Self> {
        time::OffsetDateTime::from_unix_timestamp(timestamp)
            .ok()
            .map(Self::wrap)
    }

    /// Returns the Unix timestamp of this [`DateTimeOf`].
    #[must_use]
    pub fn unix_timestamp(&self) -> i64 {
        self.inner.unix_timestamp()
    }

    /// Reinterprets this [`DateTimeOf`] as a date and time of another kind.
    #[must_use]
    pub fn coerce<NewOf: ?Sized>(self) -> DateTimeOf<NewOf> {
        DateTimeOf::wrap(self.inner)
    }

    fn wrap(inner: time::OffsetDateTime) -> Self {
        Self {
            inner,
            _of: PhantomData,
        }
    }
}

impl<Of: ?Sized> Copy for DateTimeOf<Of> {}
impl<Of: ?Sized> Clone for DateTimeOf<Of> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Of: ?Sized> Eq for DateTimeOf<Of> {}
impl<Of: ?Sized> PartialEq for DateTimeOf<Of> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<Of: ?Sized> Ord for DateTimeOf<Of> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner)
    }
}
impl<Of: ?Sized> PartialOrd for DateTimeOf<Of> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<Of: ?Sized> ops::Add<Duration> for DateTimeOf<Of> {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        Self::wrap(self.inner + rhs)
    }
}

impl<Of: ?Sized> ops::Sub<Duration> for DateTimeOf<Of> {
    type Output = Self;

    fn sub(self, rhs: Duration) -> Self::Output {
        Self::wrap(self.inner - rhs)
    }
}

#[cfg(feature = "serde")]
pub mod serde {
    //! [`serde`] integration.

    pub mod unix_timestamp {
        //! (De)serialization of a [`DateTimeOf`] as a Unix timestamp, the way
        //! JWT claims carry it.
        //!
        //! [`DateTimeOf`]: crate::DateTimeOf

        use serde::{de::Error as _, Deserialize as _, Deserializer, Serializer};

        use crate::DateTimeOf;

        /// Serializes the provided [`DateTimeOf`] as a Unix timestamp.
        ///
        /// # Errors
        ///
        /// If the `serializer` fails.
        pub fn serialize<Of, S>(
            dt: &DateTimeOf<Of>,
            serializer: S,
        ) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
            Of: ?Sized,
        {
            serializer.serialize_i64(dt.unix_timestamp())
        }

        /// Deserializes a Unix timestamp into a [`DateTimeOf`].
        ///
        /// # Errors
        ///
        /// If the value isn't an integer or is out of the supported range.
        pub fn deserialize<'de, D, Of>(
            deserializer: D,
        ) -> Result<DateTimeOf<Of>, D::Error>
        where
            D: Deserializer<'de>,
            Of: ?Sized,
        {
            let ts = i64::deserialize(deserializer)?;
            DateTimeOf::from_unix_timestamp(ts).ok_or_else(|| {
                D::Error::custom(format!("timestamp `{ts}` is out of range"))
            })
        }
    }
}
