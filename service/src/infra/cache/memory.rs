//! In-memory [`Backend`] implementation.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use derive_more::{Display, Error as StdError};
use tokio::sync::RwLock;
use tracerr::Traced;

use crate::infra::cache::{self, Backend};

/// In-memory [`Backend`] which may be switched into an outage.
#[derive(Clone, Debug)]
pub struct Memory {
    /// Stored values by their keys.
    entries: Arc<RwLock<HashMap<String, String>>>,

    /// Indicator whether this [`Memory`] backend is reachable.
    available: Arc<AtomicBool>,
}

impl Default for Memory {
    fn default() -> Self {
        Self {
            entries: Arc::default(),
            available: Arc::new(AtomicBool::new(true)),
        }
    }
}

impl Memory {
    /// Makes all further operations of this [`Memory`] backend (and its
    /// clones) fail with [`Error::Unavailable`] until it's made available
    /// again.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Returns the raw value stored under the provided `key`, bypassing the
    /// availability check.
    pub async fn raw(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }

    /// Stores the raw `value` under the provided `key`, bypassing the
    /// availability check.
    pub async fn put_raw(&self, key: &str, value: impl Into<String>) {
        drop(self.entries.write().await.insert(key.into(), value.into()));
    }

    /// Fails if this [`Memory`] backend is in an outage.
    fn check(&self) -> Result<(), Traced<cache::Error>> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(tracerr::new!(Error::Unavailable)).map_err(tracerr::map_from)
        }
    }
}

impl Backend for Memory {
    async fn get(&self, key: &str) -> Result<Option<String>, Traced<cache::Error>> {
        self.check().map_err(tracerr::wrap!())?;
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(
        &self,
        key: &str,
        value: String,
    ) -> Result<(), Traced<cache::Error>> {
        self.check().map_err(tracerr::wrap!())?;
        drop(self.entries.write().await.insert(key.into(), value));
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), Traced<cache::Error>> {
        self.check().map_err(tracerr::wrap!())?;
        drop(self.entries.write().await.remove(key));
        Ok(())
    }
}

/// [`Memory`] backend error.
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// [`Memory`] backend is in an outage.
    #[display("Cache is unavailable")]
    Unavailable,
}
