//! Single converter: register protocol, fault handling and conversion.
//!
//! [`Device`] owns the transfer channel and knows nothing about polling;
//! the [`Sensor`](crate::sensor::Sensor) facade shares one behind a mutex
//! with its polling worker.

use std::time::Duration;

use log::{info, warn};

use crate::config::{DeviceConfig, WiringMode};
use crate::error::{Error, Result};
use crate::fault;
use crate::protocol::RegisterBus;
use crate::registers::{ConfigRegister, REG_CONFIG, REG_FAULT_STATUS, REG_HIGH_FAULT_MSB};
use crate::rtd::{self, RtdSample};
use crate::transfer::Transfer;

/// How many times the configuration register is re-read while waiting for
/// a fault-detect cycle to finish.
pub const FAULT_DETECT_POLLS: u32 = 10;

/// Spacing between fault-detect completion checks.
const FAULT_DETECT_INTERVAL: Duration = Duration::from_millis(1);

/// Largest value a 15-bit fault threshold can hold.
pub const THRESHOLD_MAX: u16 = 0x7FFF;

pub struct Device<T> {
    bus: RegisterBus<T>,
    register: ConfigRegister,
    wiring: WiringMode,
    reference_ohms: f32,
    nominal_ohms: f32,
}

impl<T: Transfer> Device<T> {
    /// Health-check the bus, then write the initial configuration.
    ///
    /// Nothing is written if the health check fails.
    pub fn new(transfer: T, config: &DeviceConfig) -> Result<Self> {
        let mut bus = RegisterBus::new(transfer);
        bus.check_bus()?;

        let register = ConfigRegister::new(config.wiring);
        bus.configure(register.value())?;
        info!(
            "max31865 '{}': configured {:?}, reg=0b{:08b}",
            config.identifier,
            config.wiring,
            register.value()
        );

        Ok(Self {
            bus,
            register,
            wiring: config.wiring,
            reference_ohms: config.reference_resistance,
            nominal_ohms: config.nominal_resistance,
        })
    }

    pub fn register(&self) -> ConfigRegister {
        self.register
    }

    /// Read the register block and convert.
    ///
    /// A faulted sample clears the fault latch and reports the decoded
    /// causes; the device stays usable.
    pub fn temperature(&mut self) -> Result<f32> {
        let block = self.bus.read_block()?;
        let sample = RtdSample::from_registers(block.rtd_msb(), block.rtd_lsb());
        if sample.faulted {
            let report = fault::report(block.fault_status(), self.wiring);
            warn!("rtd fault: {}", report);
            self.clear_after_fault();
            return Err(Error::RtdFault(report));
        }
        Ok(rtd::temperature(
            sample.raw_ratio,
            self.reference_ohms,
            self.nominal_ohms,
        ))
    }

    /// Pulse the fault-clear bit, then restore the normal configuration.
    pub fn clear_faults(&mut self) -> Result<()> {
        self.bus.configure(self.register.clear_faults())?;
        self.bus.configure(self.register.value())
    }

    /// Clear on a fault path; the fault report outranks a failed clear.
    fn clear_after_fault(&mut self) {
        if let Err(e) = self.clear_faults() {
            warn!("fault clear failed: {}", e);
        }
    }

    /// Run the automatic fault-detect cycle.
    ///
    /// Returns `Ok(())` when the cycle finished without tripping a fault
    /// bit, `Err(RtdFault)` (after a clear attempt) otherwise.  The
    /// normal configuration is restored in every case except a transport
    /// failure.
    pub fn fault_detect(&mut self) -> Result<()> {
        self.bus.configure(self.register.fault_detect())?;

        let mut finished = false;
        for _ in 0..FAULT_DETECT_POLLS {
            let [config] = self.bus.read::<1>(REG_CONFIG)?;
            if ConfigRegister::fault_detect_finished(config) {
                finished = true;
                break;
            }
            std::thread::sleep(FAULT_DETECT_INTERVAL);
        }
        if !finished {
            self.bus.configure(self.register.value())?;
            return Err(Error::FaultDetectTimeout);
        }

        let [status] = self.bus.read::<1>(REG_FAULT_STATUS)?;
        if status != 0 {
            let report = fault::report(status, self.wiring);
            warn!("fault detect: {}", report);
            self.clear_after_fault();
            return Err(Error::RtdFault(report));
        }
        self.bus.configure(self.register.value())
    }

    /// Program the 15-bit low/high fault thresholds (registers 3..=6).
    pub fn set_fault_thresholds(&mut self, low: u16, high: u16) -> Result<()> {
        if low > THRESHOLD_MAX || high > THRESHOLD_MAX {
            return Err(Error::Config("fault threshold exceeds 15 bits"));
        }
        if low > high {
            return Err(Error::Config("low fault threshold above high threshold"));
        }
        let [high_msb, high_lsb] = (high << 1).to_be_bytes();
        let [low_msb, low_lsb] = (low << 1).to_be_bytes();
        self.bus
            .write(REG_HIGH_FAULT_MSB, &[high_msb, high_lsb, low_msb, low_lsb])
    }

    /// Release the transfer channel.
    pub fn close(&mut self) -> Result<()> {
        self.bus.close()
    }
}
