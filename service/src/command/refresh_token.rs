//! [`Command`] for exchanging a refresh [`Token`] for an access one.

use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    error::{Classify, Kind},
    token::{self, Token},
    Service,
};

use super::Command;

/// [`Command`] for exchanging a refresh [`Token`] for an access one.
#[derive(Clone, Debug)]
pub struct RefreshToken(pub Token);

impl<Db, Kv> Command<RefreshToken> for Service<Db, Kv>
where
    Self: Sync,
{
    type Ok = Token;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: RefreshToken) -> Result<Self::Ok, Self::Err> {
        self.tokens()
            .refresh(&cmd.0)
            .map_err(tracerr::map_from_and_wrap!(=> ExecutionError))
    }
}

/// Error of [`RefreshToken`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`token::Tokens`] error.
    #[display("{_0}")]
    Token(token::Error),
}

impl Classify for ExecutionError {
    fn kind(&self) -> Kind {
        match self {
            Self::Token(e) => e.kind(),
        }
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        error::{Classify as _, Kind},
        fixture::{self, username},
        token, Command as _,
    };

    use super::RefreshToken;

    #[tokio::test]
    async fn issues_access_token_for_same_subject() {
        let svc = fixture::service();
        let refresh = svc
            .tokens()
            .issue(&username("alice"), token::Kind::Refresh)
            .unwrap();

        let access = svc.execute(RefreshToken(refresh)).await.unwrap();

        assert_eq!(svc.tokens().verify(&access).unwrap(), username("alice"));
    }

    #[tokio::test]
    async fn rejects_malformed_token() {
        let svc = fixture::service();

        let err = svc
            .execute(RefreshToken("garbage".into()))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), Kind::InvalidCredential);
    }
}
