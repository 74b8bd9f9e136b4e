//! Unified error types for the MAX31865 driver.
//!
//! A single `Error` enum that every layer converts into, so the polling
//! worker can hand any failure to the consumer inline as part of a
//! [`Reading`](crate::poll::Reading).  Transport errors are reduced to
//! `embedded_hal::spi::ErrorKind` which keeps the enum `Clone + Eq`
//! regardless of the concrete bus.

use core::fmt;

use embedded_hal::spi::ErrorKind;
use heapless::Vec;

/// Maximum number of causes a fault-status byte can decode into
/// (one per fault bit D2..D7).
pub const MAX_FAULT_CAUSES: usize = 6;

// ---------------------------------------------------------------------------
// Top-level driver error
// ---------------------------------------------------------------------------

/// Every fallible operation in the driver funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The transfer channel failed. Never retried internally.
    Interface(ErrorKind),
    /// Health check read nothing but `0x00`: bus disconnected or held low.
    StuckLow,
    /// Health check read nothing but `0xFF`: bus floating or held high.
    StuckHigh,
    /// The converter flagged an RTD fault. Faults were cleared before this
    /// error was returned.
    RtdFault(FaultReport),
    /// `poll()` called while a polling loop is already running.
    AlreadyPolling,
    /// Interrupt mode requested but no edge notifier was supplied.
    NoReadyInterface,
    /// An interrupt trigger arrived while the previous one was still queued.
    TooManyTriggers,
    /// A trigger handle fired after its polling loop went away.
    WrongArgs,
    /// The sensor has been closed; its transfer is released.
    Closed,
    /// The automatic fault-detect cycle never reported completion.
    FaultDetectTimeout,
    /// The polling worker thread could not be spawned.
    Spawn,
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interface(kind) => write!(f, "interface fault: {kind}"),
            Self::StuckLow => write!(f, "bus stuck low: register block read all 0x00"),
            Self::StuckHigh => write!(f, "bus stuck high: register block read all 0xFF"),
            Self::RtdFault(report) => write!(f, "rtd fault: {report}"),
            Self::AlreadyPolling => write!(f, "sensor is already polling"),
            Self::NoReadyInterface => write!(f, "no ready interface registered"),
            Self::TooManyTriggers => write!(f, "too many triggers, previous one not consumed"),
            Self::WrongArgs => write!(f, "trigger dispatched to a sensor that is not polling"),
            Self::Closed => write!(f, "sensor closed"),
            Self::FaultDetectTimeout => write!(f, "fault detection cycle did not finish"),
            Self::Spawn => write!(f, "failed to spawn polling worker"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::Interface(kind)
    }
}

impl From<FaultReport> for Error {
    fn from(report: FaultReport) -> Self {
        Self::RtdFault(report)
    }
}

// ---------------------------------------------------------------------------
// RTD fault report
// ---------------------------------------------------------------------------

/// Raw fault-status register plus the causes decoded for the active
/// wiring mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultReport {
    /// Fault-status register (address 0x07) as read from the device.
    pub status: u8,
    /// Human-readable causes, lowest fault bit first.
    pub causes: Vec<&'static str, MAX_FAULT_CAUSES>,
}

impl FaultReport {
    /// Whether `cause` is among the decoded causes.
    pub fn contains(&self, cause: &str) -> bool {
        self.causes.iter().any(|c| *c == cause)
    }
}

impl fmt::Display for FaultReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "status 0b{:08b}, possible causes: [", self.status)?;
        for (i, cause) in self.causes.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{cause}")?;
        }
        write!(f, "]")
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Driver-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
