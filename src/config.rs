use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use log::debug;

use crate::frequency::Frequency;
use crate::settings::{
    Bandwidth, CodingRate, LowNoiseAmpMode, ModulationParams, PowerAmpRampTime,
    PowerRegulatorMode, RadioSetting, SpreadingFactor, StandbyMode,
};

/// Last commanded radio configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadioConfig {
    pub frequency: Frequency,
    pub modulation: ModulationParams,
    pub low_noise_amp_mode: LowNoiseAmpMode,
    pub power_amp_ramp_time: PowerAmpRampTime,
    pub power_regulator_mode: PowerRegulatorMode,
    pub standby_mode: StandbyMode,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            frequency: Frequency::ISM_2400,
            modulation: ModulationParams {
                spreading_factor: SpreadingFactor::Sf7,
                bandwidth: Bandwidth::Bw1600,
                coding_rate: CodingRate::Cr4_8,
            },
            low_noise_amp_mode: LowNoiseAmpMode::HighSensitivity,
            power_amp_ramp_time: PowerAmpRampTime::Ramp20Us,
            power_regulator_mode: PowerRegulatorMode::UseLdo,
            standby_mode: StandbyMode::Xosc,
        }
    }
}

impl RadioConfig {
    /// Overwrite the field targeted by `setting`.
    pub fn apply(&mut self, setting: &RadioSetting) {
        match *setting {
            RadioSetting::StandbyMode(m) => self.standby_mode = m,
            RadioSetting::PowerRegulatorMode(m) => self.power_regulator_mode = m,
            RadioSetting::LowNoiseAmpMode(m) => self.low_noise_amp_mode = m,
            RadioSetting::PowerAmpRampTime(r) => self.power_amp_ramp_time = r,
            RadioSetting::Frequency(f) => self.frequency = f,
            RadioSetting::Modulation(p) => self.modulation = p,
        }
    }
}

/// Static descriptive fields of the radio hardware, reported in radio telemetry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// SPI device node the radio is attached to.
    pub spi_device: String,
    pub spi_device_num: u8,
    /// SPI clock in Hz.
    pub spi_speed: u32,
    pub pin_busy: i8,
    pub pin_nrst: i8,
    pub pin_nss: i8,
    pub pin_dio1: i8,
    pub pin_dio2: i8,
    pub pin_dio3: i8,
    pub pin_tx_en: i8,
    pub pin_rx_en: i8,
}

impl Default for DeviceDescriptor {
    fn default() -> Self {
        // Raspberry Pi wiring used by the SX128x demo board; -1 = not connected.
        Self {
            spi_device: "/dev/spidev0.0".to_string(),
            spi_device_num: 0,
            spi_speed: 8_000_000,
            pin_busy: 27,
            pin_nrst: 26,
            pin_nss: 20,
            pin_dio1: 16,
            pin_dio2: -1,
            pin_dio3: -1,
            pin_tx_en: 24,
            pin_rx_en: 25,
        }
    }
}

/// Kernel start-up configuration.
#[derive(Debug, Clone)]
pub struct KernelConfig {
    /// Radio configuration assumed at start-up.
    pub initial_radio: RadioConfig,
    pub device: DeviceDescriptor,
    /// Delay between Rx poll iterations.
    pub rx_poll_interval: Duration,
    /// Pacing delay between demo script steps.
    pub demo_step_delay: Duration,
    /// Number of start-demo triggers that may wait while a run executes.
    pub trigger_queue_depth: usize,
    /// Period of the status telemetry tick generated by the binary.
    pub status_period: Duration,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            initial_radio: RadioConfig::default(),
            device: DeviceDescriptor::default(),
            rx_poll_interval: Duration::from_millis(2000),
            demo_step_delay: Duration::from_millis(1000),
            trigger_queue_depth: 1,
            status_period: Duration::from_secs(1),
        }
    }
}

/// Holds the last applied [`RadioConfig`].
///
/// Single writer (the control task through the dispatcher), any number of
/// readers taking copies.
#[derive(Debug)]
pub struct RadioConfigStore {
    inner: RwLock<RadioConfig>,
}

impl RadioConfigStore {
    pub fn new(initial: RadioConfig) -> Self {
        Self {
            inner: RwLock::new(initial),
        }
    }

    /// Copy of the current configuration.
    pub fn snapshot(&self) -> RadioConfig {
        *self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Commit a validated setting.
    pub(crate) fn commit(&self, setting: &RadioSetting) {
        let mut config = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        config.apply(setting);
        debug!("committed {setting}");
    }
}
