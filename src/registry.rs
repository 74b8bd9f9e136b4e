//! Reference-counted shared buses.
//!
//! Several converters can sit on one SPI bus device.  A [`BusRegistry`]
//! is owned by the application and hands out [`SharedBus`] handles keyed
//! by device path; the underlying bus is opened by the first handle and
//! closed with the last one.
//!
//! ```text
//!   registry.open("/dev/spidev0.0", opener) ──▶ SharedBus ─┐
//!   registry.open("/dev/spidev0.0", opener) ──▶ SharedBus ─┼─▶ Arc<Mutex<B>>
//!                                    (opener not called)   │   users = 2
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, info};

use crate::transfer::Transfer;

struct Entry<B> {
    bus: Arc<Mutex<B>>,
    users: usize,
}

type Table<B> = Arc<Mutex<HashMap<String, Entry<B>>>>;

/// Caller-owned table of open buses. Clones share the same table.
pub struct BusRegistry<B> {
    table: Table<B>,
}

impl<B> Clone for BusRegistry<B> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
        }
    }
}

impl<B> Default for BusRegistry<B> {
    fn default() -> Self {
        Self {
            table: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<B: Transfer> BusRegistry<B> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the bus at `key`, calling `opener` only if no handle for
    /// that key is currently open.
    pub fn open<E>(
        &self,
        key: &str,
        opener: impl FnOnce(&str) -> Result<B, E>,
    ) -> Result<SharedBus<B>, E> {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        let bus = match table.get_mut(key) {
            Some(entry) => {
                entry.users += 1;
                debug!("bus {}: reused ({} users)", key, entry.users);
                entry.bus.clone()
            }
            None => {
                let bus = Arc::new(Mutex::new(opener(key)?));
                table.insert(
                    key.to_owned(),
                    Entry {
                        bus: bus.clone(),
                        users: 1,
                    },
                );
                info!("bus {}: opened", key);
                bus
            }
        };
        Ok(SharedBus {
            key: key.to_owned(),
            bus,
            table: self.table.clone(),
            released: false,
        })
    }

    /// Open handles for `key`; zero when the bus is not open.
    pub fn users(&self, key: &str) -> usize {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .map_or(0, |e| e.users)
    }

    pub fn len(&self) -> usize {
        self.table.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One user's handle on a registered bus.
///
/// Transfers lock the bus for the duration of one transaction.  Dropping
/// a handle without closing it releases it the same way.
pub struct SharedBus<B: Transfer> {
    key: String,
    bus: Arc<Mutex<B>>,
    table: Table<B>,
    released: bool,
}

impl<B: Transfer> SharedBus<B> {
    pub fn key(&self) -> &str {
        &self.key
    }

    fn release(&mut self) -> Result<(), B::Error> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        let last = match table.get_mut(&self.key) {
            Some(entry) => {
                entry.users -= 1;
                entry.users == 0
            }
            None => false,
        };
        if !last {
            return Ok(());
        }
        table.remove(&self.key);
        drop(table);

        info!("bus {}: closed", self.key);
        self.bus.lock().unwrap_or_else(PoisonError::into_inner).close()
    }
}

impl<B: Transfer> Transfer for SharedBus<B> {
    type Error = B::Error;

    fn transfer_in_place(&mut self, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.bus
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .transfer_in_place(buf)
    }

    fn close(&mut self) -> Result<(), Self::Error> {
        self.release()
    }
}

impl<B: Transfer> Drop for SharedBus<B> {
    fn drop(&mut self) {
        if self.release().is_err() {
            log::warn!("bus {}: close on drop failed", self.key);
        }
    }
}
