//! [`Query`] definitions.
//!
//! [`user`] queries read the [`Database`] directly, while [`task`] queries
//! read through the [`Cache`].
//!
//! [`Cache`]: crate::infra::Cache
//! [`Database`]: crate::infra::Database

pub mod task;
pub mod user;

/// Read-only operation of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Query;
