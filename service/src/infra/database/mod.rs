//! [`Database`]-related implementations.

#[cfg(any(test, feature = "memory"))]
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use derive_more::{Display, Error as StdError, From};

#[cfg(any(test, feature = "memory"))]
pub use self::memory::Memory;
#[cfg(feature = "postgres")]
pub use self::postgres::Postgres;

/// Database operation.
pub use common::Handler as Database;

/// [`Database`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// [`Memory`] error.
    #[cfg(any(test, feature = "memory"))]
    Memory(memory::Error),

    /// [`Postgres`] error.
    #[cfg(feature = "postgres")]
    Postgres(postgres::Error),
}

impl Error {
    /// Checks if the error is a violation of a uniqueness constraint.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        match self {
            #[cfg(any(test, feature = "memory"))]
            Self::Memory(e) => matches!(e, memory::Error::UniqueViolation(_)),
            #[cfg(feature = "postgres")]
            Self::Postgres(e) => e.is_unique_violation(None),
        }
    }
}
