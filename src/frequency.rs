use std::fmt;

use crate::error::{LoraError, Result};
use crate::validate::Parameter;

/// Lowest commandable radio frequency in MHz.
pub const MIN_MHZ: u32 = 0;
/// Highest commandable radio frequency in MHz.
pub const MAX_MHZ: u32 = 48_000;

/// A radio frequency stored as whole MHz.
///
/// Commands and telemetry carry MHz; the driver is programmed in Hz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Frequency(u32);

impl Frequency {
    /// Centre of the 2.4 GHz ISM band, the SX128x default channel.
    pub const ISM_2400: Frequency = Frequency(2400);

    /// Create a `Frequency` from a commanded value in MHz.
    pub fn from_mhz(mhz: i64) -> Result<Self> {
        if mhz < MIN_MHZ as i64 || mhz > MAX_MHZ as i64 {
            return Err(LoraError::InvalidParameter {
                parameter: Parameter::Frequency,
                value: mhz,
            });
        }
        Ok(Self(mhz as u32))
    }

    /// Return the frequency in MHz.
    pub fn mhz(self) -> u32 {
        self.0
    }

    /// Return the frequency in Hz, as handed to the driver.
    pub fn hz(self) -> u64 {
        self.0 as u64 * 1_000_000
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} MHz", self.0)
    }
}
