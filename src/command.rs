use std::fmt;

use crate::error::{LoraError, Result};

/// Command function codes.
pub mod cc {
    /// No operation; confirms the kernel is alive.
    pub const NOOP: u8 = 0;
    /// Zero all status counters and event filters.
    pub const RESET: u8 = 1;
    /// Emit the radio configuration telemetry message.
    pub const SEND_RADIO_TLM: u8 = 2;
    pub const SET_LOW_NOISE_AMP_MODE: u8 = 3;
    pub const SET_MODULATION_PARAMS: u8 = 4;
    pub const SET_POWER_AMP_RAMP_TIME: u8 = 5;
    pub const SET_POWER_REGULATOR_MODE: u8 = 6;
    pub const SET_RADIO_FREQUENCY: u8 = 7;
    pub const SET_STANDBY_MODE: u8 = 8;
    /// Release the Tx task for one demo run.
    pub const START_TX_DEMO: u8 = 9;
    /// Clear the demo-active flag.
    pub const STOP_TX_DEMO: u8 = 10;
}

/// A command as it arrives from the bus: function code plus raw payload.
///
/// Payload layout: enum setters carry one byte, modulation carries
/// `[spreading_factor, bandwidth, coding_rate]`, frequency carries an `i32`
/// in MHz (little-endian). Every other command has an empty payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPacket {
    pub code: u8,
    pub payload: Vec<u8>,
}

impl CommandPacket {
    pub fn new(code: u8, payload: Vec<u8>) -> Self {
        Self { code, payload }
    }
}

/// A decoded kernel command. Setter values are still raw and unvalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    NoOp,
    Reset,
    SendRadioTelemetry,
    SetLowNoiseAmpMode(u8),
    SetModulationParams {
        spreading_factor: u8,
        bandwidth: u8,
        coding_rate: u8,
    },
    SetPowerAmpRampTime(u8),
    SetPowerRegulatorMode(u8),
    /// Frequency in MHz.
    SetRadioFrequency(i32),
    SetStandbyMode(u8),
    StartTxDemo,
    StopTxDemo,
}

/// Expected payload length for a function code, or `None` if the code is unknown.
fn payload_len(code: u8) -> Option<usize> {
    match code {
        cc::NOOP | cc::RESET | cc::SEND_RADIO_TLM | cc::START_TX_DEMO | cc::STOP_TX_DEMO => Some(0),
        cc::SET_LOW_NOISE_AMP_MODE
        | cc::SET_POWER_AMP_RAMP_TIME
        | cc::SET_POWER_REGULATOR_MODE
        | cc::SET_STANDBY_MODE => Some(1),
        cc::SET_MODULATION_PARAMS => Some(3),
        cc::SET_RADIO_FREQUENCY => Some(4),
        _ => None,
    }
}

impl Command {
    /// Decode a bus packet. Rejects unknown codes and wrong payload sizes;
    /// parameter ranges are checked later by the dispatcher.
    pub fn decode(packet: &CommandPacket) -> Result<Self> {
        let expected =
            payload_len(packet.code).ok_or(LoraError::UnknownCommandCode(packet.code))?;
        let p = &packet.payload;
        if p.len() != expected {
            return Err(LoraError::PayloadLength {
                code: packet.code,
                expected,
                actual: p.len(),
            });
        }

        let command = match packet.code {
            cc::NOOP => Command::NoOp,
            cc::RESET => Command::Reset,
            cc::SEND_RADIO_TLM => Command::SendRadioTelemetry,
            cc::SET_LOW_NOISE_AMP_MODE => Command::SetLowNoiseAmpMode(p[0]),
            cc::SET_MODULATION_PARAMS => Command::SetModulationParams {
                spreading_factor: p[0],
                bandwidth: p[1],
                coding_rate: p[2],
            },
            cc::SET_POWER_AMP_RAMP_TIME => Command::SetPowerAmpRampTime(p[0]),
            cc::SET_POWER_REGULATOR_MODE => Command::SetPowerRegulatorMode(p[0]),
            cc::SET_RADIO_FREQUENCY => {
                Command::SetRadioFrequency(i32::from_le_bytes([p[0], p[1], p[2], p[3]]))
            }
            cc::SET_STANDBY_MODE => Command::SetStandbyMode(p[0]),
            cc::START_TX_DEMO => Command::StartTxDemo,
            cc::STOP_TX_DEMO => Command::StopTxDemo,
            other => return Err(LoraError::UnknownCommandCode(other)),
        };
        Ok(command)
    }

    /// Encode this command into a bus packet.
    pub fn to_packet(&self) -> CommandPacket {
        let payload = match *self {
            Command::SetLowNoiseAmpMode(v)
            | Command::SetPowerAmpRampTime(v)
            | Command::SetPowerRegulatorMode(v)
            | Command::SetStandbyMode(v) => vec![v],
            Command::SetModulationParams {
                spreading_factor,
                bandwidth,
                coding_rate,
            } => vec![spreading_factor, bandwidth, coding_rate],
            Command::SetRadioFrequency(mhz) => mhz.to_le_bytes().to_vec(),
            Command::NoOp
            | Command::Reset
            | Command::SendRadioTelemetry
            | Command::StartTxDemo
            | Command::StopTxDemo => vec![],
        };
        CommandPacket::new(self.code(), payload)
    }

    /// Return the function code for this command.
    pub fn code(&self) -> u8 {
        match self {
            Command::NoOp => cc::NOOP,
            Command::Reset => cc::RESET,
            Command::SendRadioTelemetry => cc::SEND_RADIO_TLM,
            Command::SetLowNoiseAmpMode(_) => cc::SET_LOW_NOISE_AMP_MODE,
            Command::SetModulationParams { .. } => cc::SET_MODULATION_PARAMS,
            Command::SetPowerAmpRampTime(_) => cc::SET_POWER_AMP_RAMP_TIME,
            Command::SetPowerRegulatorMode(_) => cc::SET_POWER_REGULATOR_MODE,
            Command::SetRadioFrequency(_) => cc::SET_RADIO_FREQUENCY,
            Command::SetStandbyMode(_) => cc::SET_STANDBY_MODE,
            Command::StartTxDemo => cc::START_TX_DEMO,
            Command::StopTxDemo => cc::STOP_TX_DEMO,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::NoOp => write!(f, "no-op"),
            Command::Reset => write!(f, "reset"),
            Command::SendRadioTelemetry => write!(f, "send-radio-telemetry"),
            Command::SetLowNoiseAmpMode(v) => write!(f, "set-low-noise-amp-mode({v})"),
            Command::SetModulationParams {
                spreading_factor,
                bandwidth,
                coding_rate,
            } => write!(
                f,
                "set-modulation-params(sf={spreading_factor}, bw={bandwidth}, cr={coding_rate})"
            ),
            Command::SetPowerAmpRampTime(v) => write!(f, "set-power-amp-ramp-time({v})"),
            Command::SetPowerRegulatorMode(v) => write!(f, "set-power-regulator-mode({v})"),
            Command::SetRadioFrequency(mhz) => write!(f, "set-radio-frequency({mhz} MHz)"),
            Command::SetStandbyMode(v) => write!(f, "set-standby-mode({v})"),
            Command::StartTxDemo => write!(f, "start-tx-demo"),
            Command::StopTxDemo => write!(f, "stop-tx-demo"),
        }
    }
}
