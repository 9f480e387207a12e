use std::fmt;

use crate::frequency::Frequency;

/// Radio power state entered between active operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandbyMode {
    /// 13 MHz RC oscillator.
    Rc,
    /// 52 MHz crystal oscillator.
    Xosc,
}

impl StandbyMode {
    pub const MIN: u8 = 0;
    pub const MAX: u8 = 1;

    /// Decode from the command/telemetry enum value.
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Rc),
            1 => Some(Self::Xosc),
            _ => None,
        }
    }

    pub fn raw(self) -> u8 {
        match self {
            Self::Rc => 0,
            Self::Xosc => 1,
        }
    }
}

impl fmt::Display for StandbyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rc => write!(f, "STDBY_RC"),
            Self::Xosc => write!(f, "STDBY_XOSC"),
        }
    }
}

/// Internal voltage regulation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerRegulatorMode {
    UseLdo,
    UseDcdc,
}

impl PowerRegulatorMode {
    pub const MIN: u8 = 0;
    pub const MAX: u8 = 1;

    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::UseLdo),
            1 => Some(Self::UseDcdc),
            _ => None,
        }
    }

    pub fn raw(self) -> u8 {
        match self {
            Self::UseLdo => 0,
            Self::UseDcdc => 1,
        }
    }
}

impl fmt::Display for PowerRegulatorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UseLdo => write!(f, "USE_LDO"),
            Self::UseDcdc => write!(f, "USE_DCDC"),
        }
    }
}

/// Receive-path gain setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LowNoiseAmpMode {
    LowPower,
    HighSensitivity,
}

impl LowNoiseAmpMode {
    pub const MIN: u8 = 0;
    pub const MAX: u8 = 1;

    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::LowPower),
            1 => Some(Self::HighSensitivity),
            _ => None,
        }
    }

    pub fn raw(self) -> u8 {
        match self {
            Self::LowPower => 0,
            Self::HighSensitivity => 1,
        }
    }
}

impl fmt::Display for LowNoiseAmpMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LowPower => write!(f, "LOW_POWER"),
            Self::HighSensitivity => write!(f, "HIGH_SENSITIVITY"),
        }
    }
}

/// Power amplifier rise time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerAmpRampTime {
    Ramp2Us,
    Ramp4Us,
    Ramp6Us,
    Ramp8Us,
    Ramp10Us,
    Ramp12Us,
    Ramp16Us,
    Ramp20Us,
}

/// All ramp times in enum-value order.
const RAMP_TIMES: [PowerAmpRampTime; 8] = [
    PowerAmpRampTime::Ramp2Us,
    PowerAmpRampTime::Ramp4Us,
    PowerAmpRampTime::Ramp6Us,
    PowerAmpRampTime::Ramp8Us,
    PowerAmpRampTime::Ramp10Us,
    PowerAmpRampTime::Ramp12Us,
    PowerAmpRampTime::Ramp16Us,
    PowerAmpRampTime::Ramp20Us,
];

impl PowerAmpRampTime {
    pub const MIN: u8 = 0;
    pub const MAX: u8 = 7;

    pub fn from_raw(raw: u8) -> Option<Self> {
        RAMP_TIMES.get(raw as usize).copied()
    }

    pub fn raw(self) -> u8 {
        RAMP_TIMES.iter().position(|r| *r == self).unwrap_or(0) as u8
    }

    /// Ramp duration in microseconds.
    pub fn micros(self) -> u16 {
        match self {
            Self::Ramp2Us => 2,
            Self::Ramp4Us => 4,
            Self::Ramp6Us => 6,
            Self::Ramp8Us => 8,
            Self::Ramp10Us => 10,
            Self::Ramp12Us => 12,
            Self::Ramp16Us => 16,
            Self::Ramp20Us => 20,
        }
    }
}

impl fmt::Display for PowerAmpRampTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RAMP_{:02}_US", self.micros())
    }
}

/// LoRa spreading factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpreadingFactor {
    Sf5,
    Sf6,
    Sf7,
    Sf8,
    Sf9,
    Sf10,
    Sf11,
    Sf12,
}

const SPREADING_FACTORS: [SpreadingFactor; 8] = [
    SpreadingFactor::Sf5,
    SpreadingFactor::Sf6,
    SpreadingFactor::Sf7,
    SpreadingFactor::Sf8,
    SpreadingFactor::Sf9,
    SpreadingFactor::Sf10,
    SpreadingFactor::Sf11,
    SpreadingFactor::Sf12,
];

impl SpreadingFactor {
    pub const MIN: u8 = 5;
    pub const MAX: u8 = 12;

    pub fn from_raw(raw: u8) -> Option<Self> {
        if !(Self::MIN..=Self::MAX).contains(&raw) {
            return None;
        }
        Some(SPREADING_FACTORS[(raw - Self::MIN) as usize])
    }

    pub fn raw(self) -> u8 {
        let idx = SPREADING_FACTORS.iter().position(|sf| *sf == self).unwrap_or(0);
        Self::MIN + idx as u8
    }
}

impl fmt::Display for SpreadingFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SF{}", self.raw())
    }
}

/// LoRa channel bandwidth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bandwidth {
    Bw200,
    Bw400,
    Bw800,
    Bw1600,
}

impl Bandwidth {
    pub const MIN: u8 = 0;
    pub const MAX: u8 = 3;

    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Bw200),
            1 => Some(Self::Bw400),
            2 => Some(Self::Bw800),
            3 => Some(Self::Bw1600),
            _ => None,
        }
    }

    pub fn raw(self) -> u8 {
        match self {
            Self::Bw200 => 0,
            Self::Bw400 => 1,
            Self::Bw800 => 2,
            Self::Bw1600 => 3,
        }
    }

    /// Nominal bandwidth in kHz.
    pub fn khz(self) -> u16 {
        match self {
            Self::Bw200 => 200,
            Self::Bw400 => 400,
            Self::Bw800 => 800,
            Self::Bw1600 => 1600,
        }
    }
}

impl fmt::Display for Bandwidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BW{}", self.khz())
    }
}

/// LoRa forward error correction rate. `Li*` variants use long interleaving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodingRate {
    Cr4_5,
    Cr4_6,
    Cr4_7,
    Cr4_8,
    Li4_5,
    Li4_6,
    Li4_8,
}

const CODING_RATES: [CodingRate; 7] = [
    CodingRate::Cr4_5,
    CodingRate::Cr4_6,
    CodingRate::Cr4_7,
    CodingRate::Cr4_8,
    CodingRate::Li4_5,
    CodingRate::Li4_6,
    CodingRate::Li4_8,
];

impl CodingRate {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 7;

    pub fn from_raw(raw: u8) -> Option<Self> {
        if !(Self::MIN..=Self::MAX).contains(&raw) {
            return None;
        }
        Some(CODING_RATES[(raw - Self::MIN) as usize])
    }

    pub fn raw(self) -> u8 {
        let idx = CODING_RATES.iter().position(|cr| *cr == self).unwrap_or(0);
        Self::MIN + idx as u8
    }
}

impl fmt::Display for CodingRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cr4_5 => write!(f, "CR_4_5"),
            Self::Cr4_6 => write!(f, "CR_4_6"),
            Self::Cr4_7 => write!(f, "CR_4_7"),
            Self::Cr4_8 => write!(f, "CR_4_8"),
            Self::Li4_5 => write!(f, "CR_LI_4_5"),
            Self::Li4_6 => write!(f, "CR_LI_4_6"),
            Self::Li4_8 => write!(f, "CR_LI_4_8"),
        }
    }
}

/// The LoRa modulation triple, always set together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModulationParams {
    pub spreading_factor: SpreadingFactor,
    pub bandwidth: Bandwidth,
    pub coding_rate: CodingRate,
}

impl fmt::Display for ModulationParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}",
            self.spreading_factor, self.bandwidth, self.coding_rate
        )
    }
}

/// One typed radio-configuration change, the unit applied to the driver and
/// committed to the configuration store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RadioSetting {
    StandbyMode(StandbyMode),
    PowerRegulatorMode(PowerRegulatorMode),
    LowNoiseAmpMode(LowNoiseAmpMode),
    PowerAmpRampTime(PowerAmpRampTime),
    Frequency(Frequency),
    Modulation(ModulationParams),
}

impl RadioSetting {
    /// Name of the driver operation that applies this setting.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::StandbyMode(_) => "set-standby-mode",
            Self::PowerRegulatorMode(_) => "set-power-regulator-mode",
            Self::LowNoiseAmpMode(_) => "set-low-noise-amp-mode",
            Self::PowerAmpRampTime(_) => "set-power-amp-ramp-time",
            Self::Frequency(_) => "set-radio-frequency",
            Self::Modulation(_) => "set-modulation-params",
        }
    }
}

impl fmt::Display for RadioSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StandbyMode(m) => write!(f, "standby mode {m}"),
            Self::PowerRegulatorMode(m) => write!(f, "power regulator mode {m}"),
            Self::LowNoiseAmpMode(m) => write!(f, "low noise amplifier mode {m}"),
            Self::PowerAmpRampTime(r) => write!(f, "power amp ramp time {r}"),
            Self::Frequency(freq) => write!(f, "frequency {freq}"),
            Self::Modulation(p) => write!(f, "modulation parameters {p}"),
        }
    }
}
