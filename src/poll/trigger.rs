//! Trigger sources for the polling worker.
//!
//! ```text
//!  Interval:  ticker task ──send().await──▶ ┌──────────────┐
//!                                           │ TriggerQueue │──▶ worker
//!  Interrupt: edge ISR ──TriggerHandle──▶   │  (depth 1)   │
//!             fire() = try_send, never      └──────────────┘
//!             blocks
//! ```
//!
//! Both sources feed the same depth-1 queue.  The ticker is owned by the
//! worker and may wait for room; the interrupt side must never block, so a
//! full queue rejects the trigger with [`Error::TooManyTriggers`].

use core::sync::atomic::{AtomicU32, Ordering};
use core::time::Duration;
use std::sync::{Arc, Weak};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::debug;

use super::{PollState, PollStateCell};
use crate::error::{Error, Result};

/// Pending-trigger queue shared by a worker and its trigger source.
pub type TriggerQueue = Channel<CriticalSectionRawMutex, (), 1>;

/// How acquisitions are paced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerMode {
    /// Internal ticker firing every period.
    Interval(Duration),
    /// External data-ready edge reported through the sensor's
    /// [`EdgeNotifier`].
    Interrupt,
}

/// External edge-notification collaborator (e.g. a GPIO line watching the
/// converter's DRDY pin).
///
/// `open` hands over the handle to fire on each edge; it may be called
/// from any context, including one that must not block.  `close` must
/// stop all further use of the handle.
pub trait EdgeNotifier: Send {
    fn open(&mut self, trigger: TriggerHandle) -> Result<()>;
    fn close(&mut self);
}

/// Non-blocking trigger entry point handed to an [`EdgeNotifier`].
#[derive(Clone)]
pub struct TriggerHandle {
    queue: Weak<TriggerQueue>,
    dropped: Arc<AtomicU32>,
}

impl TriggerHandle {
    pub(crate) fn new(queue: &Arc<TriggerQueue>, dropped: Arc<AtomicU32>) -> Self {
        Self {
            queue: Arc::downgrade(queue),
            dropped,
        }
    }

    /// Queue one acquisition.
    ///
    /// Fails with `TooManyTriggers` if the previous trigger is still
    /// pending (the trigger is dropped and counted), or `WrongArgs` if the
    /// polling loop this handle belonged to no longer exists.
    pub fn fire(&self) -> Result<()> {
        let Some(queue) = self.queue.upgrade() else {
            return Err(Error::WrongArgs);
        };
        if queue.try_send(()).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return Err(Error::TooManyTriggers);
        }
        Ok(())
    }

    /// Triggers rejected because the queue was full.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Interval source: one trigger per period while the sensor is polling.
pub(crate) async fn ticker(period: Duration, queue: Arc<TriggerQueue>, state: Arc<PollStateCell>) {
    debug!("ticker: every {:?}", period);
    while state.get() == PollState::Polling {
        async_io_mini::Timer::after(period).await;
        if state.get() == PollState::Polling {
            queue.send(()).await;
        }
    }
    debug!("ticker: stopped");
}
