//! Application exposes the [`Service`] over HTTP: the RPC surface of the
//! identity, authentication and task services, and the REST [`gateway`]
//! composing them.

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

pub mod args;
pub mod config;
pub mod error;
pub mod gateway;
pub mod rpc;

#[cfg(test)]
mod fixture;

// Used in binary.
use axum_client_ip as _;
use refinery as _;
use tokio as _;
use tower_http as _;
use tracing_subscriber as _;

use service::infra::Postgres;

pub use self::{
    args::{Args, Component},
    config::Config,
    error::{AsError, Error},
};

/// [`service::Service`] with filled infrastructure dependencies.
pub type Service<Kv = ()> = service::Service<Postgres, Kv>;
