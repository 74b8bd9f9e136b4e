//! Fault-status decoding.
//!
//! Bits D2..D7 of the fault-status register each flag a detector; what a
//! tripped detector means physically depends on how the element is wired.
//! The tables below are indexed by `bit - 2`.

use heapless::Vec;

use crate::config::WiringMode;
use crate::error::{FaultReport, MAX_FAULT_CAUSES};

/// Lowest fault bit in the status register.
const FIRST_FAULT_BIT: u8 = 2;

const TWO_WIRE: [&str; MAX_FAULT_CAUSES] = [
    "Overvoltage or undervoltage fault",
    "RTDIN- shorted low, RTDIN+ shorted low",
    "RTDIN- shorted low",
    "Open RTD, RTDIN+ shorted high, RTDIN- shorted high",
    "Shorted RTD element, RTDIN+ shorted low",
    "Open RTD element",
];

const THREE_WIRE: [&str; MAX_FAULT_CAUSES] = [
    "Overvoltage or undervoltage fault",
    "Force+ shorted low, RTDIN+ shorted low and connected to RTD, RTDIN- shorted low",
    "RTDIN- shorted low",
    "Open RTD element, Force+ shorted high and connected to RTD, Force+ unconnected, \
     Force+ shorted high and not connected to RTD, RTDIN- shorted high",
    "RTDIN+ shorted to RTDIN-, RTDIN+ shorted low and not connected to RTD, Force+ shorted low",
    "Open RTD element, RTDIN+ shorted high and not connected to RTD, \
     Force+ shorted high and connected to RTD",
];

const FOUR_WIRE: [&str; MAX_FAULT_CAUSES] = [
    "Overvoltage or undervoltage fault",
    "Force+ shorted low, RTDIN+ shorted low and connected to RTD, \
     RTDIN- shorted low and connected to RTD, RTDIN- shorted low and not connected to RTD, \
     Force- shorted low",
    "Force- shorted low and connected to RTD, RTDIN- shorted low and connected to RTD",
    "Open RTD element, Force+ shorted high and connected to RTD, Force- unconnected, \
     Force+ unconnected, Force+ shorted high and not connected to RTD, \
     Force- shorted high and not connected to RTD, Force- shorted high and connected to RTD, \
     Force- shorted low and not connected to RTD",
    "RTDIN+ shorted to RTDIN-, RTDIN+ shorted low and not connected to RTD, \
     RTDIN- shorted high and not connected to RTD, Force+ shorted low",
    "Open RTD element, RTDIN+ shorted high and not connected to RTD, \
     Force+ shorted high and connected to RTD",
];

/// Cause table for a wiring mode.
pub const fn table(wiring: WiringMode) -> &'static [&'static str; MAX_FAULT_CAUSES] {
    match wiring {
        WiringMode::TwoWire => &TWO_WIRE,
        WiringMode::ThreeWire => &THREE_WIRE,
        WiringMode::FourWire => &FOUR_WIRE,
    }
}

/// Causes for every set bit in D2..D7, lowest bit first. Bits D0/D1 are
/// unused by the device and ignored; a zero byte decodes to nothing.
pub fn decode(status: u8, wiring: WiringMode) -> Vec<&'static str, MAX_FAULT_CAUSES> {
    let causes = table(wiring);
    let mut out = Vec::new();
    for (index, cause) in causes.iter().enumerate() {
        if status & (1 << (FIRST_FAULT_BIT as usize + index)) != 0 {
            // One slot per table entry, cannot overflow.
            let _ = out.push(*cause);
        }
    }
    out
}

/// Decode into a report that keeps the raw status byte.
pub fn report(status: u8, wiring: WiringMode) -> FaultReport {
    FaultReport {
        status,
        causes: decode(status, wiring),
    }
}
