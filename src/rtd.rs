//! RTD ratio extraction and resistance-to-temperature conversion.
//!
//! The converter reports the RTD resistance as a 15-bit fraction of the
//! reference resistor:
//!
//! ```text
//!   Rt = ratio / 2^15 * R_ref
//! ```
//!
//! Above 0 °C the Callendar–Van Dusen equation reduces to a quadratic that
//! is solved directly.  Below 0 °C the quadratic drifts, so a fifth-order
//! polynomial fit in the normalised resistance takes over.

/// Callendar–Van Dusen A coefficient (IEC 60751).
const RTD_A: f32 = 3.9083e-3;
/// Callendar–Van Dusen B coefficient (IEC 60751).
const RTD_B: f32 = -5.775e-7;

/// Full-scale value of the 15-bit ratio.
const RATIO_FULL_SCALE: f32 = 32768.0;

/// Highest `Rt / R0` the quadratic has a real solution for (about
/// 7.61, roughly 3380 °C).
pub const MAX_RESISTANCE_RATIO: f32 = (RTD_A * RTD_A - 4.0 * RTD_B) / (-4.0 * RTD_B);

/// Sub-zero polynomial in `Rt / R0 * 100`, lowest power first.
const SUB_ZERO_POLY: [f32; 6] = [-242.02, 2.2228, 2.5859e-3, -4.8260e-6, -2.8183e-8, 1.5243e-10];

/// One acquisition worth of RTD data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtdSample {
    /// 15-bit resistance ratio; meaningless when `faulted`.
    pub raw_ratio: u16,
    /// D0 of the LSB register: the converter detected a fault.
    pub faulted: bool,
}

impl RtdSample {
    /// Split the MSB/LSB register pair into ratio and fault flag.
    pub const fn from_registers(msb: u8, lsb: u8) -> Self {
        let faulted = lsb & 0x01 != 0;
        let raw_ratio = if faulted {
            0
        } else {
            ((msb as u16) << 8 | lsb as u16) >> 1
        };
        Self { raw_ratio, faulted }
    }
}

/// RTD resistance in Ohm for a 15-bit ratio.
pub fn resistance(raw_ratio: u16, reference_ohms: f32) -> f32 {
    raw_ratio as f32 / RATIO_FULL_SCALE * reference_ohms
}

/// Temperature in °C for a 15-bit ratio.
pub fn temperature(raw_ratio: u16, reference_ohms: f32, nominal_ohms: f32) -> f32 {
    let rt = resistance(raw_ratio, reference_ohms);

    let z1 = -RTD_A;
    let z2 = RTD_A * RTD_A - 4.0 * RTD_B;
    let z3 = (4.0 * RTD_B) / nominal_ohms;
    let z4 = 2.0 * RTD_B;

    if rt >= nominal_ohms {
        // Past MAX_RESISTANCE_RATIO the root saturates at the vertex.
        let discriminant = (z2 + z3 * rt).max(0.0);
        return (discriminant.sqrt() + z1) / z4;
    }

    // Normalise to a PT100 so one polynomial covers every nominal value.
    let r = rt / nominal_ohms * 100.0;
    let mut power = 1.0;
    let mut t = 0.0;
    for coefficient in SUB_ZERO_POLY {
        t += coefficient * power;
        power *= r;
    }
    t
}
