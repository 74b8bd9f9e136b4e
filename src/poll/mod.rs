//! Polling engine: poll/stop lifecycle and the trigger-to-reading worker.
//!
//! ```text
//!            poll()              close()            worker drained
//!   Idle ───────────▶ Polling ───────────▶ Stopping ───────────▶ Stopped
//!     ▲                  │
//!     └──────────────────┘  trigger source could not be set up
//! ```
//!
//! `Stopped` is terminal: a closed sensor cannot be polled again.
//!
//! Each polling sensor owns one worker thread running a small
//! `edge-executor` under `futures_lite::future::block_on`:
//!
//! ```text
//!  ┌─────────────────────────────── worker thread ──────────────────────┐
//!  │  acquire loop:  or(stop.wait(), triggers.receive())                │
//!  │                   │ trigger                                        │
//!  │                   ▼                                                │
//!  │            device.temperature() ─▶ Reading ─▶ or(stop, out.send()) │
//!  │  ticker task (Interval mode only): Timer::after ─▶ triggers.send() │
//!  └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A faulted sample is delivered as a reading carrying the error; it never
//! ends the loop.  Only the stop signal does.

pub mod stream;
pub mod trigger;

use core::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use futures_lite::future;
use log::{debug, info};

use crate::device::Device;
use crate::error::{Error, Result};
use crate::transfer::Transfer;
use stream::ReadingSender;
use trigger::{EdgeNotifier, TriggerMode, TriggerQueue};

pub use stream::{Reading, ReadingStream};

/// Worker thread stack size.
const WORKER_STACK_KB: usize = 32;

// ---------------------------------------------------------------------------
// Poll state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PollState {
    Idle = 0,
    Polling = 1,
    Stopping = 2,
    Stopped = 3,
}

impl PollState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Idle,
            1 => Self::Polling,
            2 => Self::Stopping,
            3 => Self::Stopped,
            _ => {
                debug_assert!(false, "invalid poll state: {raw}");
                Self::Stopped
            }
        }
    }
}

/// Poll state shared between the caller's thread, the worker and the
/// ticker. Transitions are compare-and-swap so two racing `poll()` calls
/// cannot both win.
#[derive(Debug)]
pub struct PollStateCell(AtomicU8);

impl PollStateCell {
    pub const fn new() -> Self {
        Self(AtomicU8::new(PollState::Idle as u8))
    }

    pub fn get(&self) -> PollState {
        PollState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Move `from` → `to`; on failure returns the state actually found.
    pub fn transition(&self, from: PollState, to: PollState) -> core::result::Result<(), PollState> {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(PollState::from_u8)
    }

    pub(crate) fn set(&self, state: PollState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

impl Default for PollStateCell {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

type StopSignal = Signal<CriticalSectionRawMutex, ()>;

/// Device slot shared by the facade and its worker; `None` once closed.
pub(crate) type SharedDevice<T> = Arc<Mutex<Option<Device<T>>>>;

/// Edge notifier parked on the sensor while no worker holds it.
pub(crate) type NotifierSlot = Arc<Mutex<Option<Box<dyn EdgeNotifier>>>>;

/// Everything the worker thread needs, moved into it on spawn.
///
/// Dropping the context closes an opened notifier and parks it back in
/// `notifier_home`, including when the thread never started.
pub(crate) struct WorkerContext<T> {
    pub id: String,
    pub device: SharedDevice<T>,
    pub state: Arc<PollStateCell>,
    pub mode: TriggerMode,
    pub triggers: Arc<TriggerQueue>,
    pub notifier: Option<Box<dyn EdgeNotifier>>,
    pub notifier_home: NotifierSlot,
    pub output: ReadingSender,
}

impl<T> WorkerContext<T> {
    fn release_notifier(&mut self) {
        if let Some(mut notifier) = self.notifier.take() {
            notifier.close();
            *self
                .notifier_home
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = Some(notifier);
        }
    }
}

impl<T> Drop for WorkerContext<T> {
    fn drop(&mut self) {
        self.release_notifier();
    }
}

/// Handle to a running worker held by the sensor.
pub(crate) struct Worker {
    stop: Arc<StopSignal>,
    thread: JoinHandle<()>,
}

impl Worker {
    /// Spawn the acquisition worker thread.
    pub(crate) fn spawn<T: Transfer + 'static>(ctx: WorkerContext<T>) -> Result<Self> {
        let stop = Arc::new(StopSignal::new());
        let worker_stop = stop.clone();
        let name = if ctx.id.is_empty() {
            "max31865".to_owned()
        } else {
            format!("max31865-{}", ctx.id)
        };
        info!("Spawning '{}' (stack={}KB, {:?})", name, WORKER_STACK_KB, ctx.mode);

        let thread = std::thread::Builder::new()
            .name(name)
            .stack_size(WORKER_STACK_KB * 1024)
            .spawn(move || run(ctx, &worker_stop))
            .map_err(|_| Error::Spawn)?;
        Ok(Self { stop, thread })
    }

    /// Request a stop and wait until the worker has closed the stream and
    /// released its trigger source.
    pub(crate) fn stop(self) {
        self.stop.signal(());
        if self.thread.join().is_err() {
            log::error!("polling worker panicked");
        }
    }
}

fn run<T: Transfer>(mut ctx: WorkerContext<T>, stop: &StopSignal) {
    let executor: edge_executor::LocalExecutor<'_, 2> = edge_executor::LocalExecutor::new();

    if let TriggerMode::Interval(period) = ctx.mode {
        executor
            .spawn(trigger::ticker(period, ctx.triggers.clone(), ctx.state.clone()))
            .detach();
    }

    future::block_on(executor.run(acquire(&ctx, stop)));

    // Ticker observes this and winds down; it is dropped with the executor.
    ctx.state.set(PollState::Stopping);
    drop(executor);

    ctx.output.close();
    ctx.release_notifier();
    ctx.state.set(PollState::Stopped);
    info!("max31865 '{}': polling stopped", ctx.id);
}

enum Wake {
    Stop,
    Trigger,
}

async fn acquire<T: Transfer>(ctx: &WorkerContext<T>, stop: &StopSignal) {
    loop {
        let wake = future::or(
            async {
                stop.wait().await;
                Wake::Stop
            },
            async {
                ctx.triggers.receive().await;
                Wake::Trigger
            },
        )
        .await;
        if let Wake::Stop = wake {
            debug!("worker: stop requested");
            return;
        }

        let reading = Reading::new(&ctx.id, sample(&ctx.device));
        let delivered = future::or(
            async {
                stop.wait().await;
                false
            },
            async {
                ctx.output.send(reading).await;
                true
            },
        )
        .await;
        if !delivered {
            debug!("worker: stop requested while delivering");
            return;
        }
    }
}

fn sample<T: Transfer>(device: &SharedDevice<T>) -> Result<f32> {
    let mut guard = device.lock().unwrap_or_else(PoisonError::into_inner);
    match guard.as_mut() {
        Some(device) => device.temperature(),
        None => Err(Error::Closed),
    }
}
