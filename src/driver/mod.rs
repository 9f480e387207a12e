use std::sync::{Arc, Mutex, PoisonError};

use log::trace;

use crate::error::{LoraError, Result};
use crate::settings::{
    LowNoiseAmpMode, ModulationParams, PowerAmpRampTime, PowerRegulatorMode, RadioSetting,
    StandbyMode,
};

pub mod sim;

pub use sim::{DriverCall, SimulatedRadio};

/// Command surface of the radio driver.
///
/// The register protocol behind it is opaque; each call either succeeds or
/// fails as a whole. Calls are synchronous and expected to return promptly.
pub trait RadioDriver: Send {
    /// Whether the driver finished its own hardware initialisation.
    fn is_initialized(&self) -> bool;

    fn set_standby_mode(&mut self, mode: StandbyMode) -> Result<()>;

    fn set_power_regulator_mode(&mut self, mode: PowerRegulatorMode) -> Result<()>;

    fn set_low_noise_amp_mode(&mut self, mode: LowNoiseAmpMode) -> Result<()>;

    fn set_power_amp_ramp_time(&mut self, ramp: PowerAmpRampTime) -> Result<()>;

    /// Program the carrier frequency in Hz.
    fn set_radio_frequency(&mut self, hz: u64) -> Result<()>;

    fn set_modulation_params(&mut self, params: ModulationParams) -> Result<()>;
}

/// Exclusive, shareable handle to the one radio driver.
///
/// The lock is taken per call and never held across an `.await`, so the
/// control task and the Tx demo never drive the radio at the same time.
#[derive(Clone)]
pub struct SharedDriver {
    inner: Arc<Mutex<Box<dyn RadioDriver>>>,
}

impl SharedDriver {
    pub fn new(driver: impl RadioDriver + 'static) -> Self {
        Self::from_boxed(Box::new(driver))
    }

    pub fn from_boxed(driver: Box<dyn RadioDriver>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(driver)),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_initialized()
    }

    /// Route a setting to the matching driver setter.
    pub fn apply(&self, setting: &RadioSetting) -> Result<()> {
        let mut driver = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        trace!("driver {}: {setting}", setting.operation());
        match *setting {
            RadioSetting::StandbyMode(m) => driver.set_standby_mode(m),
            RadioSetting::PowerRegulatorMode(m) => driver.set_power_regulator_mode(m),
            RadioSetting::LowNoiseAmpMode(m) => driver.set_low_noise_amp_mode(m),
            RadioSetting::PowerAmpRampTime(r) => driver.set_power_amp_ramp_time(r),
            RadioSetting::Frequency(f) => driver.set_radio_frequency(f.hz()),
            RadioSetting::Modulation(p) => driver.set_modulation_params(p),
        }
    }
}

impl std::fmt::Debug for SharedDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedDriver").finish_non_exhaustive()
    }
}

/// Error returned by a driver whose setter reported failure.
pub fn rejected(operation: &'static str) -> LoraError {
    LoraError::Driver { operation }
}
