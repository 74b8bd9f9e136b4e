//! Mock hardware for integration tests.
//!
//! [`MockTransfer`] plays a MAX31865 behind a scripted register file and
//! records every frame; clones share state so a test can keep one after
//! the sensor has taken the other.  [`MockNotifier`] stands in for a GPIO
//! edge line and lets the test fire the trigger handle by hand.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use embedded_hal::spi::ErrorKind;
use max31865::registers::{REGISTER_COUNT, WRITE_BIT};
use max31865::{EdgeNotifier, Error, Result, Transfer, TriggerHandle};

// ── Register images ───────────────────────────────────────────

/// Power-on register contents.
pub const POR: [u8; REGISTER_COUNT] = [0x00, 0x00, 0x00, 0xFF, 0xFF, 0x00, 0x00, 0x00];

/// About 25 °C on a PT100 with a 430 Ohm reference.
pub const ROOM: [u8; REGISTER_COUNT] = [0xD1, 0x41, 0x54, 0xFF, 0xFF, 0x00, 0x00, 0x00];

/// RTD fault flag set, status reports an open element (D7).
pub const OPEN_RTD: [u8; REGISTER_COUNT] = [0xD1, 0x00, 0x01, 0xFF, 0xFF, 0x00, 0x00, 0x80];

// ── MockTransfer ──────────────────────────────────────────────

#[derive(Default)]
pub struct TransferLog {
    /// Register images answered in order, one per read transaction.
    pub script: VecDeque<[u8; REGISTER_COUNT]>,
    /// Answer once the script is exhausted.
    pub steady: [u8; REGISTER_COUNT],
    pub frames: Vec<Vec<u8>>,
    pub closes: u32,
    pub fail: bool,
    /// Fail write frames only; reads keep answering.
    pub fail_writes: bool,
}

#[derive(Clone, Default)]
pub struct MockTransfer {
    log: Arc<Mutex<TransferLog>>,
}

#[allow(dead_code)]
impl MockTransfer {
    /// Healthy converter that always reads `steady` after power-on.
    pub fn new(steady: [u8; REGISTER_COUNT]) -> Self {
        Self::scripted(&[POR], steady)
    }

    pub fn scripted(script: &[[u8; REGISTER_COUNT]], steady: [u8; REGISTER_COUNT]) -> Self {
        let t = Self::default();
        {
            let mut log = t.log();
            log.script = script.iter().copied().collect();
            log.steady = steady;
        }
        t
    }

    pub fn log(&self) -> MutexGuard<'_, TransferLog> {
        self.log.lock().unwrap()
    }

    /// Every write frame, in order.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.log()
            .frames
            .iter()
            .filter(|f| f[0] & WRITE_BIT != 0)
            .cloned()
            .collect()
    }

    pub fn closes(&self) -> u32 {
        self.log().closes
    }

    pub fn set_fail(&self, fail: bool) {
        self.log().fail = fail;
    }
}

impl Transfer for MockTransfer {
    type Error = ErrorKind;

    fn transfer_in_place(&mut self, buf: &mut [u8]) -> core::result::Result<(), ErrorKind> {
        let mut log = self.log();
        log.frames.push(buf.to_vec());
        if log.fail {
            return Err(ErrorKind::Other);
        }
        if buf[0] & WRITE_BIT != 0 {
            return if log.fail_writes {
                Err(ErrorKind::Other)
            } else {
                Ok(())
            };
        }

        let image = log.script.pop_front().unwrap_or(log.steady);
        let start = buf[0] as usize;
        let len = buf.len() - 1;
        buf[1..].copy_from_slice(&image[start..start + len]);
        Ok(())
    }

    fn close(&mut self) -> core::result::Result<(), ErrorKind> {
        self.log().closes += 1;
        Ok(())
    }
}

// ── MockNotifier ──────────────────────────────────────────────

#[derive(Default)]
pub struct NotifierLog {
    pub handle: Option<TriggerHandle>,
    pub last_handle: Option<TriggerHandle>,
    pub opens: u32,
    pub closes: u32,
    pub fail_open: bool,
}

#[derive(Clone, Default)]
pub struct MockNotifier {
    log: Arc<Mutex<NotifierLog>>,
}

#[allow(dead_code)]
impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> MutexGuard<'_, NotifierLog> {
        self.log.lock().unwrap()
    }

    /// Simulate one data-ready edge.
    pub fn edge(&self) -> Result<()> {
        let handle = self.log().handle.clone();
        handle.ok_or(Error::NoReadyInterface)?.fire()
    }

    /// The handle most recently handed over, even after `close`.
    pub fn last_handle(&self) -> Option<TriggerHandle> {
        self.log().last_handle.clone()
    }

    pub fn is_open(&self) -> bool {
        self.log().handle.is_some()
    }
}

impl EdgeNotifier for MockNotifier {
    fn open(&mut self, trigger: TriggerHandle) -> Result<()> {
        let mut log = self.log();
        log.opens += 1;
        if log.fail_open {
            return Err(Error::NoReadyInterface);
        }
        log.last_handle = Some(trigger.clone());
        log.handle = Some(trigger);
        Ok(())
    }

    fn close(&mut self) {
        let mut log = self.log();
        log.closes += 1;
        log.handle = None;
    }
}
