//! Stateless issuing and verification of [JSON Web Token]s.
//!
//! [JSON Web Token]: https://datatracker.ietf.org/doc/html/rfc7519

use std::time::Duration;

use common::{DateTime, DateTimeOf};
use derive_more::{AsRef, Debug, Display, Error as StdError, From};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracerr::Traced;

use crate::{
    domain::user,
    error::{self, Classify},
};

/// Signed [JSON Web Token].
///
/// [JSON Web Token]: https://datatracker.ietf.org/doc/html/rfc7519
#[derive(AsRef, Clone, Debug, Deserialize, Display, Eq, From, PartialEq, Serialize)]
#[as_ref(str)]
#[from(String, &str)]
#[serde(transparent)]
pub struct Token(String);

/// Kind of a [`Token`].
#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    /// Short-lived [`Token`] authorizing requests.
    Access,

    /// Long-lived [`Token`] exchangeable for a new [`Kind::Access`] one.
    Refresh,
}

/// Access and refresh [`Token`]s issued together.
#[derive(Clone, Debug)]
pub struct Pair {
    /// [`Kind::Access`] [`Token`].
    pub access: Token,

    /// [`Kind::Refresh`] [`Token`].
    pub refresh: Token,
}

/// Claims encoded into a [`Token`].
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Claims {
    /// [`user::Username`] the [`Token`] is issued for.
    pub sub: user::Username,

    /// [`DateTime`] when the [`Token`] expires.
    #[serde(rename = "exp", with = "common::datetime::serde::unix_timestamp")]
    pub expires_at: ExpirationDateTime,

    /// [`Kind`] of the [`Token`].
    #[cfg(feature = "token-kind")]
    pub kind: Kind,
}

/// Marker of a [`Token`] expiration.
#[derive(Clone, Copy, Debug)]
pub struct Expiration;

/// [`DateTime`] of a [`Token`] expiration.
pub type ExpirationDateTime = DateTimeOf<(Claims, Expiration)>;

/// [`Tokens`] configuration.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Lifetime of [`Kind::Access`] [`Token`]s.
    pub access_ttl: Duration,

    /// Lifetime of [`Kind::Refresh`] [`Token`]s.
    pub refresh_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            access_ttl: Duration::from_secs(15 * 60),
            refresh_ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// Issuer and verifier of HS256-signed [`Token`]s.
///
/// Holds no state besides the signing secret, so any number of instances
/// sharing the secret are interchangeable.
#[derive(Clone, Debug)]
pub struct Tokens {
    /// Key signing issued [`Token`]s.
    #[debug(skip)]
    encoding_key: EncodingKey,

    /// Key verifying [`Token`] signatures.
    #[debug(skip)]
    decoding_key: DecodingKey,

    /// [`Config`] of these [`Tokens`].
    config: Config,
}

impl Tokens {
    /// Creates new [`Tokens`] signing with the provided `secret`.
    #[must_use]
    pub fn new(secret: &[u8], config: Config) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            config,
        }
    }

    /// Issues a new [`Token`] of the provided [`Kind`] for the `subject`.
    ///
    /// # Errors
    ///
    /// If the [`Token`] cannot be encoded.
    pub fn issue(
        &self,
        subject: &user::Username,
        kind: Kind,
    ) -> Result<Token, Traced<Error>> {
        self.issue_at(subject, kind, DateTime::now())
    }

    /// Issues [`Kind::Access`] and [`Kind::Refresh`] [`Token`]s for the
    /// `subject`.
    ///
    /// # Errors
    ///
    /// If any [`Token`] cannot be encoded.
    pub fn issue_pair(
        &self,
        subject: &user::Username,
    ) -> Result<Pair, Traced<Error>> {
        Ok(Pair {
            access: self
                .issue(subject, Kind::Access)
                .map_err(tracerr::wrap!())?,
            refresh: self
                .issue(subject, Kind::Refresh)
                .map_err(tracerr::wrap!())?,
        })
    }

    /// Issues a new [`Token`] as if the current time was `now`.
    pub(crate) fn issue_at(
        &self,
        subject: &user::Username,
        kind: Kind,
        now: DateTime,
    ) -> Result<Token, Traced<Error>> {
        let ttl = match kind {
            Kind::Access => self.config.access_ttl,
            Kind::Refresh => self.config.refresh_ttl,
        };
        let claims = Claims {
            sub: subject.clone(),
            expires_at: (now + ttl).coerce(),
            #[cfg(feature = "token-kind")]
            kind,
        };
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )
        .map(Token)
        .map_err(|e| tracerr::new!(Error::Encode(e)))
    }

    /// Verifies the provided [`Kind::Access`] [`Token`] and returns the
    /// subject it was issued for.
    ///
    /// # Errors
    ///
    /// If the [`Token`] is malformed, has a wrong signature or has expired.
    pub fn verify(&self, token: &Token) -> Result<user::Username, Traced<Error>> {
        self.decode(token, Kind::Access)
            .map(|claims| claims.sub)
            .map_err(tracerr::wrap!())
    }

    /// Exchanges the provided [`Kind::Refresh`] [`Token`] for a new
    /// [`Kind::Access`] one issued for the same subject.
    ///
    /// # Errors
    ///
    /// If the [`Token`] is malformed, has a wrong signature or has expired.
    pub fn refresh(&self, token: &Token) -> Result<Token, Traced<Error>> {
        let claims = self
            .decode(token, Kind::Refresh)
            .map_err(tracerr::wrap!())?;
        self.issue(&claims.sub, Kind::Access)
            .map_err(tracerr::wrap!())
    }

    /// Decodes [`Claims`] of the provided [`Token`] checking its signature,
    /// expiration and, with `token-kind` feature, its [`Kind`].
    fn decode(
        &self,
        token: &Token,
        expected: Kind,
    ) -> Result<Claims, Traced<Error>> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let claims = jsonwebtoken::decode::<Claims>(
            token.as_ref(),
            &self.decoding_key,
            &validation,
        )
        .map_err(|e| tracerr::new!(Error::Invalid(e)))?
        .claims;

        #[cfg(feature = "token-kind")]
        if claims.kind != expected {
            return Err(tracerr::new!(Error::WrongKind(expected)));
        }
        #[cfg(not(feature = "token-kind"))]
        let _ = expected;

        Ok(claims)
    }
}

/// Error of [`Tokens`] operations.
#[derive(Debug, Display, StdError)]
pub enum Error {
    /// [`jsonwebtoken`] encoding error.
    #[display("Failed to encode a JSON Web Token: {_0}")]
    Encode(jsonwebtoken::errors::Error),

    /// [`Token`] is malformed, has a wrong signature or has expired.
    #[display("Invalid JSON Web Token: {_0}")]
    Invalid(jsonwebtoken::errors::Error),

    /// [`Token`] of another [`Kind`] is expected.
    #[cfg(feature = "token-kind")]
    #[display("`{_0}` JSON Web Token expected")]
    WrongKind(#[error(not(source))] Kind),
}

impl Classify for Error {
    fn kind(&self) -> error::Kind {
        match self {
            Self::Encode(_) => error::Kind::Internal,
            Self::Invalid(_) => error::Kind::InvalidCredential,
            #[cfg(feature = "token-kind")]
            Self::WrongKind(_) => error::Kind::InvalidCredential,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::DateTime;

    use crate::{domain::user, error::Classify as _};

    use super::{Config, Kind, Token, Tokens};

    fn tokens() -> Tokens {
        Tokens::new(b"secret", Config::default())
    }

    fn alice() -> user::Username {
        user::Username::new("alice").unwrap()
    }

    #[test]
    fn verifies_issued_token() {
        let tokens = tokens();

        let token = tokens.issue(&alice(), Kind::Access).unwrap();

        assert_eq!(tokens.verify(&token).unwrap(), alice());
    }

    #[test]
    fn rejects_expired_token() {
        let tokens = tokens();
        let issued_at = DateTime::now() - Duration::from_secs(16 * 60);

        let token = tokens.issue_at(&alice(), Kind::Access, issued_at).unwrap();
        let err = tokens.verify(&token).unwrap_err();

        assert_eq!(err.kind(), crate::error::Kind::InvalidCredential);
    }

    #[test]
    fn refresh_token_outlives_access_token() {
        let tokens = tokens();
        let issued_at = DateTime::now() - Duration::from_secs(60 * 60);

        let token = tokens.issue_at(&alice(), Kind::Refresh, issued_at).unwrap();
        let access = tokens.refresh(&token).unwrap();

        assert_eq!(tokens.verify(&access).unwrap(), alice());
    }

    #[test]
    fn rejects_expired_refresh_token() {
        let tokens = tokens();
        let issued_at = DateTime::now() - Duration::from_secs(25 * 60 * 60);

        let token = tokens.issue_at(&alice(), Kind::Refresh, issued_at).unwrap();

        assert!(tokens.refresh(&token).is_err());
    }

    #[test]
    fn rejects_foreign_signature() {
        let token = Tokens::new(b"other", Config::default())
            .issue(&alice(), Kind::Access)
            .unwrap();

        let err = tokens().verify(&token).unwrap_err();

        assert_eq!(err.kind(), crate::error::Kind::InvalidCredential);
    }

    #[test]
    fn rejects_garbage() {
        let tokens = tokens();

        assert!(tokens.verify(&Token::from("")).is_err());
        assert!(tokens.verify(&Token::from("not.a.jwt")).is_err());
        assert!(tokens.refresh(&Token::from("garbage")).is_err());
    }

    #[test]
    fn issues_pair_for_same_subject() {
        let tokens = tokens();

        let pair = tokens.issue_pair(&alice()).unwrap();

        assert_ne!(pair.access, pair.refresh);
        assert_eq!(tokens.refresh(&pair.refresh).map(|_| ()).ok(), Some(()));
    }

    #[cfg(not(feature = "token-kind"))]
    #[test]
    fn kinds_are_interchangeable() {
        let tokens = tokens();
        let pair = tokens.issue_pair(&alice()).unwrap();

        assert_eq!(tokens.verify(&pair.refresh).unwrap(), alice());
        assert!(tokens.refresh(&pair.access).is_ok());
    }

    #[cfg(feature = "token-kind")]
    #[test]
    fn kinds_are_not_interchangeable() {
        let tokens = tokens();
        let pair = tokens.issue_pair(&alice()).unwrap();

        assert!(tokens.verify(&pair.refresh).is_err());
        assert!(tokens.refresh(&pair.access).is_err());
    }
}
