use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::debug;

use crate::error::Result;
use crate::settings::{
    LowNoiseAmpMode, ModulationParams, PowerAmpRampTime, PowerRegulatorMode, StandbyMode,
};

use super::{RadioDriver, rejected};

/// A driver call as observed by [`SimulatedRadio`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverCall {
    StandbyMode(StandbyMode),
    PowerRegulatorMode(PowerRegulatorMode),
    LowNoiseAmpMode(LowNoiseAmpMode),
    PowerAmpRampTime(PowerAmpRampTime),
    Frequency { hz: u64 },
    Modulation(ModulationParams),
}

#[derive(Debug, Default)]
struct SimState {
    initialized: bool,
    calls: Vec<DriverCall>,
    failing: HashSet<&'static str>,
}

/// In-memory radio used when no hardware is attached.
///
/// Clones share state, so a test can keep a handle after giving the driver
/// to the kernel. Failures are injected per operation name.
#[derive(Debug, Clone)]
pub struct SimulatedRadio {
    state: Arc<Mutex<SimState>>,
}

impl Default for SimulatedRadio {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedRadio {
    /// An initialised radio that accepts every call.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                initialized: true,
                ..SimState::default()
            })),
        }
    }

    /// A radio that never completed initialisation.
    pub fn uninitialized() -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState::default())),
        }
    }

    /// Make every future call of `operation` (e.g. `"set-standby-mode"`) fail.
    pub fn fail_operation(&self, operation: &'static str) {
        self.lock().failing.insert(operation);
    }

    pub fn clear_failures(&self) {
        self.lock().failing.clear();
    }

    /// Calls accepted so far, oldest first. Failed calls are not recorded.
    pub fn calls(&self) -> Vec<DriverCall> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&mut self, operation: &'static str, call: DriverCall) -> Result<()> {
        let mut state = self.lock();
        if state.failing.contains(operation) {
            debug!("simulated {operation} failure");
            return Err(rejected(operation));
        }
        state.calls.push(call);
        Ok(())
    }
}

impl RadioDriver for SimulatedRadio {
    fn is_initialized(&self) -> bool {
        self.lock().initialized
    }

    fn set_standby_mode(&mut self, mode: StandbyMode) -> Result<()> {
        self.record("set-standby-mode", DriverCall::StandbyMode(mode))
    }

    fn set_power_regulator_mode(&mut self, mode: PowerRegulatorMode) -> Result<()> {
        self.record("set-power-regulator-mode", DriverCall::PowerRegulatorMode(mode))
    }

    fn set_low_noise_amp_mode(&mut self, mode: LowNoiseAmpMode) -> Result<()> {
        self.record("set-low-noise-amp-mode", DriverCall::LowNoiseAmpMode(mode))
    }

    fn set_power_amp_ramp_time(&mut self, ramp: PowerAmpRampTime) -> Result<()> {
        self.record("set-power-amp-ramp-time", DriverCall::PowerAmpRampTime(ramp))
    }

    fn set_radio_frequency(&mut self, hz: u64) -> Result<()> {
        self.record("set-radio-frequency", DriverCall::Frequency { hz })
    }

    fn set_modulation_params(&mut self, params: ModulationParams) -> Result<()> {
        self.record("set-modulation-params", DriverCall::Modulation(params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let radio = SimulatedRadio::new();
        let mut handle = radio.clone();
        handle.set_standby_mode(StandbyMode::Xosc).unwrap();
        assert_eq!(radio.calls(), vec![DriverCall::StandbyMode(StandbyMode::Xosc)]);
    }

    #[test]
    fn test_failure_injection_and_clear() {
        let mut radio = SimulatedRadio::new();
        radio.fail_operation("set-low-noise-amp-mode");
        assert!(radio.set_low_noise_amp_mode(LowNoiseAmpMode::LowPower).is_err());
        assert!(radio.calls().is_empty());

        radio.clear_failures();
        radio.set_low_noise_amp_mode(LowNoiseAmpMode::LowPower).unwrap();
        assert_eq!(radio.calls().len(), 1);
    }

    #[test]
    fn test_initialized_flag() {
        assert!(SimulatedRadio::new().is_initialized());
        assert!(!SimulatedRadio::uninitialized().is_initialized());
    }
}
