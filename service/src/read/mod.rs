//! Read models.

pub mod task;
