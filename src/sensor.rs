//! Public sensor facade.
//!
//! ```text
//!   Sensor::new ── validate config ── check bus ── write config ──▶ Idle
//!
//!   poll(Interval)  ─┐                      ┌─▶ ReadingStream (consumer)
//!   poll(Interrupt) ─┴─▶ Worker (thread) ───┘
//!
//!   close() ── stop + join worker ── release transfer (once) ──▶ Stopped
//! ```
//!
//! The device sits behind a mutex shared with the polling worker, so
//! direct calls such as [`Sensor::temperature`] stay usable while a
//! polling loop is running.

use core::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use log::{info, warn};

use crate::config::DeviceConfig;
use crate::device::Device;
use crate::error::{Error, Result};
use crate::poll::stream;
use crate::poll::trigger::{EdgeNotifier, TriggerHandle, TriggerMode, TriggerQueue};
use crate::poll::{
    NotifierSlot, PollState, PollStateCell, ReadingStream, SharedDevice, Worker, WorkerContext,
};
use crate::registers::ConfigRegister;
use crate::transfer::Transfer;

/// One MAX31865 converter.
pub struct Sensor<T: Transfer + 'static> {
    config: DeviceConfig,
    device: SharedDevice<T>,
    state: Arc<PollStateCell>,
    notifier: NotifierSlot,
    worker: Mutex<Option<Worker>>,
    dropped: Arc<AtomicU32>,
}

impl<T: Transfer + 'static> Sensor<T> {
    /// Validate `config`, health-check the bus and write the initial
    /// configuration register.
    ///
    /// The sensor can only be polled with [`TriggerMode::Interval`]; use
    /// [`with_notifier`](Self::with_notifier) for interrupt mode.
    pub fn new(transfer: T, config: DeviceConfig) -> Result<Self> {
        config.validate()?;
        let device = Device::new(transfer, &config)?;
        Ok(Self {
            config,
            device: Arc::new(Mutex::new(Some(device))),
            state: Arc::new(PollStateCell::new()),
            notifier: Arc::new(Mutex::new(None)),
            worker: Mutex::new(None),
            dropped: Arc::new(AtomicU32::new(0)),
        })
    }

    /// Like [`new`](Self::new), with an edge notifier for
    /// [`TriggerMode::Interrupt`].
    pub fn with_notifier(
        transfer: T,
        config: DeviceConfig,
        notifier: impl EdgeNotifier + 'static,
    ) -> Result<Self> {
        let sensor = Self::new(transfer, config)?;
        *sensor.notifier.lock().unwrap_or_else(PoisonError::into_inner) = Some(Box::new(notifier));
        Ok(sensor)
    }

    pub fn id(&self) -> &str {
        &self.config.identifier
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Configuration register value in normal operation, or `Closed`.
    pub fn register(&self) -> Result<ConfigRegister> {
        self.with_device(|d| Ok(d.register()))
    }

    /// One-off acquisition in °C. Faults are cleared before the
    /// `RtdFault` error is returned.
    pub fn temperature(&self) -> Result<f32> {
        self.with_device(Device::temperature)
    }

    /// Run the converter's automatic fault-detect cycle.
    pub fn fault_detect(&self) -> Result<()> {
        self.with_device(Device::fault_detect)
    }

    /// Program the 15-bit low/high fault thresholds.
    pub fn set_fault_thresholds(&self, low: u16, high: u16) -> Result<()> {
        self.with_device(|d| d.set_fault_thresholds(low, high))
    }

    pub fn state(&self) -> PollState {
        self.state.get()
    }

    /// Interrupt triggers rejected because one was already pending.
    pub fn dropped_triggers(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Start a polling loop and return its reading stream.
    ///
    /// Returns immediately; acquisitions happen on a worker thread.  Fails
    /// with `AlreadyPolling` while a loop is running, `Closed` once the
    /// sensor has been closed, and `NoReadyInterface` when interrupt mode
    /// is requested without an edge notifier.  A failed call leaves the
    /// sensor state unchanged.
    pub fn poll(&self, mode: TriggerMode) -> Result<ReadingStream> {
        let mut worker_slot = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        match self.state.transition(PollState::Idle, PollState::Polling) {
            Ok(()) => {}
            Err(PollState::Polling) => return Err(Error::AlreadyPolling),
            Err(_) => return Err(Error::Closed),
        }

        let triggers = Arc::new(TriggerQueue::new());
        let notifier = match mode {
            TriggerMode::Interval(period) if period.is_zero() => {
                self.state.set(PollState::Idle);
                return Err(Error::Config("poll interval must be non-zero"));
            }
            TriggerMode::Interval(_) => None,
            TriggerMode::Interrupt => match self.open_notifier(&triggers) {
                Ok(notifier) => Some(notifier),
                Err(e) => {
                    self.state.set(PollState::Idle);
                    return Err(e);
                }
            },
        };

        let (output, readings) = stream::pair();
        let ctx = WorkerContext {
            id: self.config.identifier.clone(),
            device: self.device.clone(),
            state: self.state.clone(),
            mode,
            triggers,
            notifier,
            notifier_home: self.notifier.clone(),
            output,
        };
        // On failure the context is dropped, which parks the notifier again.
        match Worker::spawn(ctx) {
            Ok(worker) => {
                *worker_slot = Some(worker);
                info!("max31865 '{}': polling ({:?})", self.id(), mode);
                Ok(readings)
            }
            Err(e) => {
                self.state.set(PollState::Idle);
                Err(e)
            }
        }
    }

    /// Stop polling (waiting for the worker to finish) and release the
    /// transfer channel.
    ///
    /// The transfer is released exactly once; later calls return `Ok(())`.
    /// A closed sensor cannot be polled again.
    pub fn close(&self) -> Result<()> {
        let mut worker_slot = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(worker) = worker_slot.take() {
            let _ = self.state.transition(PollState::Polling, PollState::Stopping);
            worker.stop();
        }
        self.state.set(PollState::Stopped);

        let device = self
            .device
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match device {
            Some(mut device) => {
                info!("max31865 '{}': closing", self.id());
                device.close()
            }
            None => Ok(()),
        }
    }

    fn open_notifier(&self, triggers: &Arc<TriggerQueue>) -> Result<Box<dyn EdgeNotifier>> {
        let mut slot = self.notifier.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(mut notifier) = slot.take() else {
            return Err(Error::NoReadyInterface);
        };
        match notifier.open(TriggerHandle::new(triggers, self.dropped.clone())) {
            Ok(()) => Ok(notifier),
            Err(e) => {
                warn!("max31865 '{}': edge notifier open failed: {}", self.id(), e);
                *slot = Some(notifier);
                Err(e)
            }
        }
    }

    fn with_device<R>(&self, f: impl FnOnce(&mut Device<T>) -> Result<R>) -> Result<R> {
        let mut guard = self.device.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_mut() {
            Some(device) => f(device),
            None => Err(Error::Closed),
        }
    }
}

impl<T: Transfer + 'static> Drop for Sensor<T> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("max31865 '{}': close on drop failed: {}", self.id(), e);
        }
    }
}
