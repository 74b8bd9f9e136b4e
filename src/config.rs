//! Sensor configuration parameters
//!
//! Set once at construction and read-only afterwards.  Loadable from JSON
//! so a deployment can describe its sensors in a file.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::rtd;

/// Number of conductors between the RTD element and the converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WiringMode {
    TwoWire,
    ThreeWire,
    FourWire,
}

impl WiringMode {
    /// Only three-wire elements need the 3-wire compensation bit.
    pub const fn is_three_wire(self) -> bool {
        matches!(self, Self::ThreeWire)
    }
}

/// Per-sensor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeviceConfig {
    /// Probe wiring; selects the 3-wire bit and the fault table.
    pub wiring: WiringMode,
    /// Reference resistor on the board (Ohm).
    pub reference_resistance: f32,
    /// RTD resistance at 0 °C (Ohm), e.g. 100 for a PT100.
    pub nominal_resistance: f32,
    /// Identifier copied into every reading.
    pub identifier: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            wiring: WiringMode::ThreeWire,
            reference_resistance: 430.0,
            nominal_resistance: 100.0,
            identifier: String::new(),
        }
    }
}

impl DeviceConfig {
    pub fn new(
        wiring: WiringMode,
        reference_resistance: f32,
        nominal_resistance: f32,
        identifier: impl Into<String>,
    ) -> Self {
        Self {
            wiring,
            reference_resistance,
            nominal_resistance,
            identifier: identifier.into(),
        }
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|_| Error::Config("malformed JSON"))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the conversion cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !self.reference_resistance.is_finite() || self.reference_resistance <= 0.0 {
            return Err(Error::Config("reference resistance must be positive"));
        }
        if !self.nominal_resistance.is_finite() || self.nominal_resistance <= 0.0 {
            return Err(Error::Config("nominal resistance must be positive"));
        }
        if self.reference_resistance <= self.nominal_resistance {
            return Err(Error::Config(
                "reference resistance must exceed nominal resistance",
            ));
        }
        if self.reference_resistance > self.nominal_resistance * rtd::MAX_RESISTANCE_RATIO {
            return Err(Error::Config(
                "reference resistance too large for the nominal resistance",
            ));
        }
        Ok(())
    }
}
