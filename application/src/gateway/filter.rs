//! Authorization filter of the protected gateway routes.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use service::{domain::user, token::Token};
use tracing as log;

use crate::{
    define_error,
    rpc::{identity, Call as _},
    Error,
};

use super::{Downstream, Gateway};

/// Authenticated user on whose behalf a request is made.
///
/// Inserted into the request extensions by [`authorize()`].
#[derive(Clone, Debug)]
pub struct Subject {
    /// ID of the user.
    pub id: user::Id,

    /// Name of the user.
    pub username: user::Username,
}

/// Verifies the bearer token of the request and resolves its [`Subject`].
///
/// An optional `Bearer ` prefix of the `Authorization` header is stripped.
///
/// # Errors
///
/// Errors if:
/// - the `Authorization` header is missing;
/// - the token is malformed, forged or expired;
/// - the user the token was issued for doesn't exist anymore;
/// - the identity service fails.
pub async fn authorize<C: Downstream>(
    State(gateway): State<Gateway<C>>,
    mut req: Request,
    next: Next,
) -> Result<Response, Error> {
    let token = {
        let header = req
            .headers()
            .get(http::header::AUTHORIZATION)
            .ok_or(AuthError::AuthorizationRequired)?
            .to_str()
            .map_err(|_| AuthError::InvalidToken)?;
        Token::from(header.strip_prefix("Bearer ").unwrap_or(header))
    };

    let username = gateway.tokens().verify(&token).map_err(|e| {
        log::debug!("rejected token: {e}");
        AuthError::InvalidToken
    })?;

    let id = gateway
        .clients()
        .identity()
        .execute(identity::GetUserIdWithUsername {
            username: username.to_string(),
        })
        .await
        .map_err(|e| {
            if e.status_code == http::StatusCode::NOT_FOUND {
                log::debug!("token subject `{username}` doesn't exist");
                AuthError::UnknownSubject.into()
            } else {
                e
            }
        })?
        .id;

    _ = req.extensions_mut().insert(Subject { id, username });

    Ok(next.run(req).await)
}

define_error! {
    /// Failure to authorize a request.
    enum AuthError {
        #[code = "UNAUTHORIZED"]
        #[status = UNAUTHORIZED]
        #[message = "Authorization header is required"]
        AuthorizationRequired,

        #[code = "UNAUTHORIZED"]
        #[status = UNAUTHORIZED]
        #[message = "Invalid or expired token"]
        InvalidToken,

        #[code = "UNAUTHORIZED"]
        #[status = UNAUTHORIZED]
        #[message = "Token subject doesn't exist"]
        UnknownSubject,
    }
}
