//! [`Error`]-related definitions.

use std::{borrow::Cow, fmt};

use axum::{
    extract::rejection::JsonRejection,
    response::{IntoResponse, Response},
    Json,
};
use derive_more::Error as StdError;
use itertools::Itertools as _;
use serde::{Deserialize, Serialize};
use service::{Classify, ErrorKind};
use tracerr::{Trace, Traced};
use tracing as log;

/// Defines an enum of request errors with a fixed code, status and message
/// per variant, convertible into an [`Error`].
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_error {
    (
        $(#[$attr:meta])*
        enum $name:ident {
            $(
                #[code = $code:literal]
                #[status = $status:ident]
                #[message = $message:literal]
                $variant:ident
            ),* $(,)?
        }
    ) => {
        $(#[$attr])*
        #[derive(
            Clone,
            Copy,
            Debug,
            Eq,
            PartialEq,
            ::derive_more::Display,
            ::derive_more::Error,
        )]
        pub enum $name {
            $(
                #[doc = $message]
                #[display($message)]
                $variant,
            )*
        }

        impl From<$name> for $crate::Error {
            fn from(err: $name) -> Self {
                let (code, status) = match err {
                    $( $name::$variant => ($code, ::http::StatusCode::$status), )*
                };
                Self::new(code, status, &err)
            }
        }
    };
}

/// API [`Error`] returned by both the RPC and the REST surfaces.
#[derive(Clone, Debug, StdError)]
pub struct Error {
    /// [`Error`] code.
    pub code: Code,

    /// [`http::StatusCode`] of this [`Error`].
    pub status_code: http::StatusCode,

    /// Backtrace of this [`Error`].
    ///
    /// Logged, but never sent over the wire.
    #[error(not(backtrace))]
    pub backtrace: Option<Trace>,

    /// [`Error`] message.
    pub message: String,
}

impl Error {
    /// Creates a new [`Error`] without a backtrace.
    #[must_use]
    pub fn new(
        code: &'static str,
        status_code: http::StatusCode,
        msg: &impl ToString,
    ) -> Self {
        Self {
            code: Cow::Borrowed(code),
            status_code,
            message: msg.to_string(),
            backtrace: None,
        }
    }

    /// Creates a new [`Error`] hiding an unexpected failure.
    #[must_use]
    pub fn internal(msg: &impl ToString) -> Self {
        Self::new(
            "INTERNAL_SERVER_ERROR",
            http::StatusCode::INTERNAL_SERVER_ERROR,
            msg,
        )
    }

    /// Creates a new [`Error`] of the provided [`ErrorKind`].
    #[must_use]
    pub fn of_kind(kind: ErrorKind, msg: &impl ToString) -> Self {
        let (code, status_code) = match kind {
            ErrorKind::InvalidCredential => {
                ("INVALID_CREDENTIAL", http::StatusCode::UNAUTHORIZED)
            }
            ErrorKind::Conflict => ("CONFLICT", http::StatusCode::BAD_REQUEST),
            ErrorKind::NotFound => ("NOT_FOUND", http::StatusCode::NOT_FOUND),
            ErrorKind::Validation => {
                ("BAD_REQUEST", http::StatusCode::BAD_REQUEST)
            }
            ErrorKind::Internal => return Self::internal(msg),
        };
        Self::new(code, status_code, msg)
    }

    /// Rebuilds an [`Error`] received from a remote service.
    ///
    /// Falls back to the canonical reason of the `status_code` if the `body`
    /// is not an [`Error`] payload.
    #[must_use]
    pub fn from_remote(status_code: http::StatusCode, body: &[u8]) -> Self {
        let Payload { code, message } = serde_json::from_slice(body)
            .unwrap_or_else(|_| Payload {
                code: status_code
                    .canonical_reason()
                    .unwrap_or("UNKNOWN")
                    .to_uppercase()
                    .replace(' ', "_")
                    .into(),
                message: String::from_utf8_lossy(body).into_owned(),
            });
        Self {
            code,
            status_code,
            message,
            backtrace: None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            code,
            status_code: _,
            backtrace,
            message,
        } = self;

        write!(
            f,
            "[{code}]: {message}{}",
            backtrace
                .iter()
                .format_with("\n", |trace, f| f(&format_args!("\n{trace}"))),
        )
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        if self.status_code.is_server_error() {
            log::error!("{self}");
        } else {
            log::debug!("{self}");
        }

        let Self {
            code,
            status_code,
            backtrace: _,
            message,
        } = self;
        (status_code, Json(Payload { code, message })).into_response()
    }
}

/// JSON body of an [`Error`] response.
#[derive(Debug, Deserialize, Serialize)]
struct Payload {
    /// [`Error::code`].
    code: Code,

    /// [`Error::message`].
    message: String,
}

/// [`Error`] code.
pub type Code = Cow<'static, str>;

/// Failure presentable to API clients as an [`Error`].
pub trait AsError {
    /// Returns the [`Error`] this failure is presented as, or [`None`] if it
    /// is unexpected.
    fn try_as_error(&self) -> Option<Error>;

    /// Presents this failure as an [`Error`], falling back to an
    /// [internal](Error::internal) one.
    fn as_error(&self) -> Error
    where
        Self: fmt::Display,
    {
        self.try_as_error()
            .unwrap_or_else(|| Error::internal(&self))
    }

    /// Presents this failure as an [`Error`], consuming it.
    fn into_error(self) -> Error
    where
        Self: fmt::Display + Sized,
    {
        self.as_error()
    }
}

impl<E: Classify + fmt::Display> AsError for Traced<E> {
    fn try_as_error(&self) -> Option<Error> {
        let mut error = Error::of_kind(self.kind(), self.as_ref());
        error.backtrace = Some(self.trace().clone());
        Some(error)
    }
}

impl AsError for JsonRejection {
    fn try_as_error(&self) -> Option<Error> {
        Some(Error::new(
            "BAD_REQUEST",
            http::StatusCode::BAD_REQUEST,
            &self.body_text(),
        ))
    }
}

impl AsError for reqwest::Error {
    fn try_as_error(&self) -> Option<Error> {
        None
    }
}
