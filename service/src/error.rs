//! Caller-facing classification of errors.

use derive_more::Display;
use tracerr::Traced;

use crate::infra::{cache, database};

/// Category of a failed operation, as seen by its caller.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Kind {
    /// Credentials or token are wrong, expired or malformed.
    InvalidCredential,

    /// Resource is already taken by someone else.
    Conflict,

    /// Requested resource does not exist.
    NotFound,

    /// Input is malformed.
    Validation,

    /// Infrastructure failure.
    Internal,
}

/// Error which may be classified into a [`Kind`].
pub trait Classify {
    /// Returns the [`Kind`] of this error.
    fn kind(&self) -> Kind;
}

impl<E: Classify> Classify for Traced<E> {
    fn kind(&self) -> Kind {
        self.as_ref().kind()
    }
}

impl Classify for database::Error {
    fn kind(&self) -> Kind {
        Kind::Internal
    }
}

impl Classify for cache::Error {
    fn kind(&self) -> Kind {
        Kind::Internal
    }
}
