use std::fmt;
use std::ops::RangeInclusive;

use crate::error::{LoraError, Result};
use crate::frequency::{self, Frequency};
use crate::settings::{
    Bandwidth, CodingRate, LowNoiseAmpMode, ModulationParams, PowerAmpRampTime,
    PowerRegulatorMode, RadioSetting, SpreadingFactor, StandbyMode,
};

/// A commandable radio parameter and its inclusive accepted range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parameter {
    Frequency,
    LowNoiseAmpMode,
    PowerAmpRampTime,
    PowerRegulatorMode,
    StandbyMode,
    SpreadingFactor,
    Bandwidth,
    CodingRate,
}

impl Parameter {
    /// Inclusive range of raw values accepted for this parameter.
    pub fn range(self) -> RangeInclusive<i64> {
        let (min, max) = match self {
            Self::Frequency => (frequency::MIN_MHZ as i64, frequency::MAX_MHZ as i64),
            Self::LowNoiseAmpMode => (LowNoiseAmpMode::MIN as i64, LowNoiseAmpMode::MAX as i64),
            Self::PowerAmpRampTime => (PowerAmpRampTime::MIN as i64, PowerAmpRampTime::MAX as i64),
            Self::PowerRegulatorMode => {
                (PowerRegulatorMode::MIN as i64, PowerRegulatorMode::MAX as i64)
            }
            Self::StandbyMode => (StandbyMode::MIN as i64, StandbyMode::MAX as i64),
            Self::SpreadingFactor => (SpreadingFactor::MIN as i64, SpreadingFactor::MAX as i64),
            Self::Bandwidth => (Bandwidth::MIN as i64, Bandwidth::MAX as i64),
            Self::CodingRate => (CodingRate::MIN as i64, CodingRate::MAX as i64),
        };
        min..=max
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Frequency => "radio frequency",
            Self::LowNoiseAmpMode => "low noise amplifier mode",
            Self::PowerAmpRampTime => "power amp ramp time",
            Self::PowerRegulatorMode => "power regulator mode",
            Self::StandbyMode => "standby mode",
            Self::SpreadingFactor => "spreading factor",
            Self::Bandwidth => "bandwidth",
            Self::CodingRate => "coding rate",
        };
        write!(f, "{name}")
    }
}

/// Result of a pure range check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject,
}

/// Check a raw value against the parameter's declared range. No side effects.
pub fn validate(parameter: Parameter, raw: i64) -> Verdict {
    if parameter.range().contains(&raw) {
        Verdict::Accept
    } else {
        Verdict::Reject
    }
}

fn invalid(parameter: Parameter, value: i64) -> LoraError {
    LoraError::InvalidParameter { parameter, value }
}

/// Range-check `raw`, then decode it into its typed form.
fn checked<T>(parameter: Parameter, raw: i64, decode: impl FnOnce() -> Option<T>) -> Result<T> {
    match validate(parameter, raw) {
        Verdict::Accept => decode().ok_or_else(|| invalid(parameter, raw)),
        Verdict::Reject => Err(invalid(parameter, raw)),
    }
}

/// Validate a set-radio-frequency request (MHz).
pub fn radio_frequency(mhz: i64) -> Result<RadioSetting> {
    checked(Parameter::Frequency, mhz, || Frequency::from_mhz(mhz).ok())
        .map(RadioSetting::Frequency)
}

/// Validate a set-standby-mode request.
pub fn standby_mode(raw: u8) -> Result<RadioSetting> {
    checked(Parameter::StandbyMode, raw.into(), || StandbyMode::from_raw(raw))
        .map(RadioSetting::StandbyMode)
}

/// Validate a set-power-regulator-mode request.
pub fn power_regulator_mode(raw: u8) -> Result<RadioSetting> {
    checked(Parameter::PowerRegulatorMode, raw.into(), || {
        PowerRegulatorMode::from_raw(raw)
    })
    .map(RadioSetting::PowerRegulatorMode)
}

/// Validate a set-low-noise-amp-mode request.
pub fn low_noise_amp_mode(raw: u8) -> Result<RadioSetting> {
    checked(Parameter::LowNoiseAmpMode, raw.into(), || LowNoiseAmpMode::from_raw(raw))
        .map(RadioSetting::LowNoiseAmpMode)
}

/// Validate a set-power-amp-ramp-time request.
pub fn power_amp_ramp_time(raw: u8) -> Result<RadioSetting> {
    checked(Parameter::PowerAmpRampTime, raw.into(), || PowerAmpRampTime::from_raw(raw))
        .map(RadioSetting::PowerAmpRampTime)
}

/// Validate a set-modulation-params request.
///
/// The triple is accepted or rejected as a whole; the first offending field
/// is reported.
pub fn modulation_params(spreading_factor: u8, bandwidth: u8, coding_rate: u8) -> Result<RadioSetting> {
    let spreading_factor = checked(Parameter::SpreadingFactor, spreading_factor.into(), || {
        SpreadingFactor::from_raw(spreading_factor)
    })?;
    let bandwidth = checked(Parameter::Bandwidth, bandwidth.into(), || {
        Bandwidth::from_raw(bandwidth)
    })?;
    let coding_rate = checked(Parameter::CodingRate, coding_rate.into(), || {
        CodingRate::from_raw(coding_rate)
    })?;
    Ok(RadioSetting::Modulation(ModulationParams {
        spreading_factor,
        bandwidth,
        coding_rate,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected_parameter(result: Result<RadioSetting>) -> (Parameter, i64) {
        match result {
            Err(LoraError::InvalidParameter { parameter, value }) => (parameter, value),
            other => panic!("expected InvalidParameter, got {other:?}"),
        }
    }

    #[test]
    fn test_frequency_range() {
        assert_eq!(validate(Parameter::Frequency, 0), Verdict::Accept);
        assert_eq!(validate(Parameter::Frequency, 48_000), Verdict::Accept);
        assert_eq!(validate(Parameter::Frequency, -1), Verdict::Reject);
        assert_eq!(validate(Parameter::Frequency, 48_001), Verdict::Reject);
    }

    #[test]
    fn test_range_agrees_with_typed_decoders() {
        // Every raw byte must be accepted by the range check exactly when the
        // typed decoder accepts it.
        for raw in 0..=u8::MAX {
            let checks: [(Parameter, bool); 7] = [
                (Parameter::StandbyMode, standby_mode(raw).is_ok()),
                (Parameter::PowerRegulatorMode, power_regulator_mode(raw).is_ok()),
                (Parameter::LowNoiseAmpMode, low_noise_amp_mode(raw).is_ok()),
                (Parameter::PowerAmpRampTime, power_amp_ramp_time(raw).is_ok()),
                (Parameter::SpreadingFactor, SpreadingFactor::from_raw(raw).is_some()),
                (Parameter::Bandwidth, Bandwidth::from_raw(raw).is_some()),
                (Parameter::CodingRate, CodingRate::from_raw(raw).is_some()),
            ];
            for (parameter, typed_ok) in checks {
                let verdict = validate(parameter, raw as i64);
                assert_eq!(verdict == Verdict::Accept, typed_ok, "{parameter} raw={raw}");
            }
        }
    }

    #[test]
    fn test_typed_validators_track_range_check() {
        for mhz in [-1, 0, 2400, 48_000, 48_001] {
            let accepted = validate(Parameter::Frequency, mhz) == Verdict::Accept;
            assert_eq!(radio_frequency(mhz).is_ok(), accepted, "mhz={mhz}");
        }
        for sf in 0..=u8::MAX {
            let accepted = validate(Parameter::SpreadingFactor, sf.into()) == Verdict::Accept;
            assert_eq!(modulation_params(sf, 0, 1).is_ok(), accepted, "sf={sf}");
        }
    }

    #[test]
    fn test_enum_rejection_names_parameter() {
        assert_eq!(rejected_parameter(standby_mode(2)), (Parameter::StandbyMode, 2));
        assert_eq!(
            rejected_parameter(power_regulator_mode(9)),
            (Parameter::PowerRegulatorMode, 9)
        );
        assert_eq!(
            rejected_parameter(low_noise_amp_mode(200)),
            (Parameter::LowNoiseAmpMode, 200)
        );
        assert_eq!(
            rejected_parameter(power_amp_ramp_time(8)),
            (Parameter::PowerAmpRampTime, 8)
        );
    }

    #[test]
    fn test_modulation_rejects_first_bad_field() {
        assert_eq!(
            rejected_parameter(modulation_params(4, 9, 0)),
            (Parameter::SpreadingFactor, 4)
        );
        assert_eq!(
            rejected_parameter(modulation_params(7, 4, 4)),
            (Parameter::Bandwidth, 4)
        );
        assert_eq!(
            rejected_parameter(modulation_params(7, 3, 8)),
            (Parameter::CodingRate, 8)
        );
    }

    #[test]
    fn test_modulation_accepts() {
        let setting = modulation_params(7, 3, 4).unwrap();
        assert_eq!(
            setting,
            RadioSetting::Modulation(ModulationParams {
                spreading_factor: SpreadingFactor::Sf7,
                bandwidth: Bandwidth::Bw1600,
                coding_rate: CodingRate::Cr4_8,
            })
        );
    }

    #[test]
    fn test_frequency_setting() {
        let setting = radio_frequency(2400).unwrap();
        assert_eq!(setting, RadioSetting::Frequency(Frequency::from_mhz(2400).unwrap()));
        assert_eq!(
            rejected_parameter(radio_frequency(50_000)),
            (Parameter::Frequency, 50_000)
        );
    }
}
