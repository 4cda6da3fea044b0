//! Service contains the business logic of the application.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
pub mod domain;
pub mod error;
pub mod infra;
pub mod query;
pub mod read;
pub mod token;

#[cfg(doc)]
use infra::{Cache, Database};

pub use self::{
    command::{Command, Committed},
    error::{Classify, Kind as ErrorKind},
    query::Query,
    token::Tokens,
};

/// [`Service`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// [`Tokens`] issuing and verifying [JWT]s.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    pub tokens: Tokens,
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db, Kv = ()> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Database`] of this [`Service`].
    database: Db,

    /// [`Cache`] of this [`Service`].
    cache: Kv,
}

impl<Db> Service<Db> {
    /// Creates a new [`Service`] without a [`Cache`].
    #[must_use]
    pub fn new(config: Config, database: Db) -> Self {
        Self::with_cache(config, database, ())
    }
}

impl<Db, Kv> Service<Db, Kv> {
    /// Creates a new [`Service`] on top of the provided [`Cache`].
    #[must_use]
    pub fn with_cache(config: Config, database: Db, cache: Kv) -> Self {
        Self {
            config,
            database,
            cache,
        }
    }

    /// Returns [`Tokens`] of this [`Service`].
    #[must_use]
    pub fn tokens(&self) -> &Tokens {
        &self.config.tokens
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }

    /// Returns [`Cache`] of this [`Service`].
    #[must_use]
    pub fn cache(&self) -> &Kv {
        &self.cache
    }
}

#[cfg(test)]
mod fixture;
