//! MAX31865 RTD-to-digital converter driver.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Sensor (facade)                                              │
//! │   temperature() · fault_detect() · poll() · close()          │
//! │                                                              │
//! │   Device ── RegisterBus ── Transfer ── SPI / spidev / mock   │
//! │     │ fault::decode      rtd::temperature                    │
//! │                                                              │
//! │   poll: Worker thread ── TriggerQueue ◀── ticker / edge ISR  │
//! │                └──────▶ ReadingStream (consumer)             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything except `adapters::linux_spi` is hardware independent and
//! tested on the host.

#![deny(unused_must_use)]

pub mod adapters;
pub mod config;
pub mod device;
pub mod error;
pub mod fault;
pub mod poll;
pub mod protocol;
pub mod registers;
pub mod registry;
pub mod rtd;
pub mod sensor;
pub mod transfer;

pub use config::{DeviceConfig, WiringMode};
pub use error::{Error, FaultReport, Result};
pub use poll::trigger::{EdgeNotifier, TriggerHandle, TriggerMode};
pub use poll::{PollState, Reading, ReadingStream};
pub use registry::{BusRegistry, SharedBus};
pub use sensor::Sensor;
pub use transfer::{SpiTransfer, Transfer};
