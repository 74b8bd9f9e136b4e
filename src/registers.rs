//! MAX31865 register map and configuration register encoding.
//!
//! ```text
//!  addr  register            bit  configuration
//!  0x00  Configuration        0   filter 60 Hz (0 = 60 Hz notch, 1 = 50 Hz)
//!  0x01  RTD MSB              1   fault status clear (self-clearing)
//!  0x02  RTD LSB (D0 = fault) 2   fault detection cycle control 1
//!  0x03  High fault MSB       3   fault detection cycle control 2
//!  0x04  High fault LSB       4   3-wire
//!  0x05  Low fault MSB        5   one-shot
//!  0x06  Low fault LSB        6   conversion mode (1 = auto)
//!  0x07  Fault status         7   V_BIAS
//! ```

use crate::config::WiringMode;

// ---------------------------------------------------------------------------
// Register addresses
// ---------------------------------------------------------------------------

pub const REG_CONFIG: u8 = 0x00;
pub const REG_RTD_MSB: u8 = 0x01;
pub const REG_RTD_LSB: u8 = 0x02;
pub const REG_HIGH_FAULT_MSB: u8 = 0x03;
pub const REG_HIGH_FAULT_LSB: u8 = 0x04;
pub const REG_LOW_FAULT_MSB: u8 = 0x05;
pub const REG_LOW_FAULT_LSB: u8 = 0x06;
pub const REG_FAULT_STATUS: u8 = 0x07;

/// Number of registers in the block read on every acquisition.
pub const REGISTER_COUNT: usize = 8;

/// High bit of the address byte selects a write.
pub const WRITE_BIT: u8 = 0x80;

// ---------------------------------------------------------------------------
// Configuration register bits
// ---------------------------------------------------------------------------

pub const BIT_FILTER_60HZ: u8 = 0;
pub const BIT_CLEAR_FAULT: u8 = 1;
pub const BIT_FAULT_DETECT_1: u8 = 2;
pub const BIT_FAULT_DETECT_2: u8 = 3;
pub const BIT_WIRE_3: u8 = 4;
pub const BIT_ONE_SHOT: u8 = 5;
pub const BIT_CONTINUOUS: u8 = 6;
pub const BIT_V_BIAS: u8 = 7;

/// Bias on, automatic fault detection with manual delay cycle selected.
const FAULT_DETECT_PATTERN: u8 = 0b1000_0100;

/// The 8-bit configuration register value the driver writes to 0x00.
///
/// Built once from the wiring mode; the clear-fault and fault-detect
/// variants are derived values and never mutate the stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigRegister {
    value: u8,
}

impl ConfigRegister {
    /// Bias on, continuous conversion, filter bit set, 3-wire bit per wiring.
    pub const fn new(wiring: WiringMode) -> Self {
        let mut value = (1 << BIT_FILTER_60HZ) | (1 << BIT_CONTINUOUS) | (1 << BIT_V_BIAS);
        if wiring.is_three_wire() {
            value |= 1 << BIT_WIRE_3;
        }
        Self { value }
    }

    /// The normal operating value.
    pub const fn value(self) -> u8 {
        self.value
    }

    /// Normal value with the fault-status-clear bit set.
    pub const fn clear_faults(self) -> u8 {
        self.value | (1 << BIT_CLEAR_FAULT)
    }

    /// Value that starts the automatic fault-detect cycle, keeping only the
    /// filter and 3-wire selections of the normal value.
    pub const fn fault_detect(self) -> u8 {
        FAULT_DETECT_PATTERN | (self.value & ((1 << BIT_FILTER_60HZ) | (1 << BIT_WIRE_3)))
    }

    /// A fault-detect cycle is running while either detect bit reads back set.
    pub const fn fault_detect_finished(reg: u8) -> bool {
        reg & ((1 << BIT_FAULT_DETECT_1) | (1 << BIT_FAULT_DETECT_2)) == 0
    }

    pub const fn is_set(self, bit: u8) -> bool {
        self.value & (1 << bit) != 0
    }
}
