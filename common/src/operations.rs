//! Storage operations executed by [`Handler`]s.
//!
//! Each operation is a plain marker wrapping its argument, so a single backend
//! implements [`Handler`] once per supported operation and argument.

use std::marker::PhantomData;

use crate::Handler;

/// Inserts or overwrites the wrapped value.
#[derive(Clone, Copy, Debug)]
pub struct Insert<T>(pub T);

/// Updates an existing record with the wrapped value.
#[derive(Clone, Copy, Debug)]
pub struct Update<T>(pub T);

/// Deletes whatever the wrapped selector points to.
#[derive(Clone, Copy, Debug)]
pub struct Delete<T>(pub T);

/// Selects whatever the wrapped selector points to.
#[derive(Clone, Copy, Debug)]
pub struct Select<T>(pub T);

/// Opens a transaction.
#[derive(Clone, Copy, Debug)]
pub struct Transact;

/// Handle of an open transaction of `T`.
pub type Transacted<T> = <T as Handler<Transact>>::Ok;

/// Commits an open transaction.
#[derive(Clone, Copy, Debug)]
pub struct Commit;

/// Selector of a `W` by a `B` key.
///
/// `W` is the shape of the result, e.g. `Option<User>` or `Vec<Task>`.
#[derive(Clone, Copy, Debug)]
pub struct By<W, B> {
    /// Key to select by.
    key: B,

    /// Shape of the selected value.
    _what: PhantomData<W>,
}

impl<W, B> By<W, B> {
    /// Creates a new [`By`] selector of the provided `key`.
    #[must_use]
    pub const fn new(key: B) -> Self {
        Self {
            key,
            _what: PhantomData,
        }
    }

    /// Returns the key of this selector.
    #[must_use]
    pub fn into_inner(self) -> B {
        self.key
    }
}
