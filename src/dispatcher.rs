use std::sync::Arc;

use log::debug;

use crate::command::Command;
use crate::config::RadioConfigStore;
use crate::counters::CounterSet;
use crate::driver::SharedDriver;
use crate::error::{LoraError, Result};
use crate::events::{EventId, EventLog};
use crate::settings::RadioSetting;
use crate::telemetry::TelemetryPublisher;
use crate::validate;
use crate::worker::WorkerTaskController;

/// Kernel version reported by the init and no-op events.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// What happened to one dispatched command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Validation or delivery failed; nothing was changed.
    Rejected,
    AppliedOk,
    /// Validation passed but the driver call failed. The requested value is
    /// still committed to the configuration store.
    AppliedDriverFailed,
}

impl CommandOutcome {
    pub fn is_valid(self) -> bool {
        self != Self::Rejected
    }
}

/// Routes commands to their handlers and keeps the command counters.
///
/// This is the only path that mutates [`RadioConfigStore`].
pub struct CommandDispatcher {
    store: Arc<RadioConfigStore>,
    counters: Arc<CounterSet>,
    driver: SharedDriver,
    events: Arc<EventLog>,
    telemetry: Arc<TelemetryPublisher>,
}

impl CommandDispatcher {
    pub fn new(
        store: Arc<RadioConfigStore>,
        counters: Arc<CounterSet>,
        driver: SharedDriver,
        events: Arc<EventLog>,
        telemetry: Arc<TelemetryPublisher>,
    ) -> Self {
        Self {
            store,
            counters,
            driver,
            events,
            telemetry,
        }
    }

    /// Handle one command and update the valid/invalid counters.
    ///
    /// Reset is not counted since it zeroes the counters itself.
    pub fn dispatch(&self, command: Command, workers: &WorkerTaskController) -> CommandOutcome {
        debug!("dispatch {command}");
        let outcome = self.handle(command, workers);
        match (command, outcome.is_valid()) {
            (Command::Reset, _) => {}
            (_, true) => {
                self.counters.record_valid_cmd();
            }
            (_, false) => {
                self.counters.record_invalid_cmd();
            }
        }
        outcome
    }

    /// Count and report a command that could not be decoded.
    pub fn reject_undecodable(&self, code: u8, reason: &LoraError) {
        self.counters.record_invalid_cmd();
        self.events.error(
            EventId::InvalidCommand,
            format!("Invalid command code {code}: {reason}"),
        );
    }

    fn handle(&self, command: Command, workers: &WorkerTaskController) -> CommandOutcome {
        match command {
            Command::NoOp => {
                self.events
                    .info(EventId::NoOp, format!("No-op command, version {VERSION}"));
                CommandOutcome::AppliedOk
            }
            Command::Reset => {
                self.counters.reset();
                self.events.reset_filters();
                self.events.info(EventId::Reset, "Reset counters command");
                self.telemetry.send_status();
                CommandOutcome::AppliedOk
            }
            Command::SendRadioTelemetry => {
                self.telemetry.send_radio();
                self.events.info(
                    EventId::SendRadioTlm,
                    "Sent radio configuration telemetry message",
                );
                CommandOutcome::AppliedOk
            }
            Command::SetLowNoiseAmpMode(raw) => self.apply_setting(
                EventId::SetLowNoiseAmpMode,
                validate::low_noise_amp_mode(raw),
            ),
            Command::SetModulationParams {
                spreading_factor,
                bandwidth,
                coding_rate,
            } => self.apply_setting(
                EventId::SetModulationParams,
                validate::modulation_params(spreading_factor, bandwidth, coding_rate),
            ),
            Command::SetPowerAmpRampTime(raw) => self.apply_setting(
                EventId::SetPowerAmpRampTime,
                validate::power_amp_ramp_time(raw),
            ),
            Command::SetPowerRegulatorMode(raw) => self.apply_setting(
                EventId::SetPowerRegulatorMode,
                validate::power_regulator_mode(raw),
            ),
            Command::SetRadioFrequency(mhz) => self.apply_setting(
                EventId::SetRadioFrequency,
                validate::radio_frequency(i64::from(mhz)),
            ),
            Command::SetStandbyMode(raw) => {
                self.apply_setting(EventId::SetStandbyMode, validate::standby_mode(raw))
            }
            Command::StartTxDemo => match workers.start_trigger() {
                Ok(()) => CommandOutcome::AppliedOk,
                Err(_) => CommandOutcome::Rejected,
            },
            Command::StopTxDemo => {
                workers.stop_trigger();
                CommandOutcome::AppliedOk
            }
        }
    }

    /// Validate, drive the radio, then commit.
    fn apply_setting(&self, id: EventId, validated: Result<RadioSetting>) -> CommandOutcome {
        let setting = match validated {
            Ok(setting) => setting,
            Err(e) => {
                self.events.error(id, format!("Rejected: {e}"));
                return CommandOutcome::Rejected;
            }
        };

        let outcome = match self.driver.apply(&setting) {
            Ok(()) => {
                self.events.info(id, format!("Set {setting}"));
                CommandOutcome::AppliedOk
            }
            Err(e) => {
                self.events.error(id, format!("Failed to set {setting}: {e}"));
                CommandOutcome::AppliedDriverFailed
            }
        };
        self.store.commit(&setting);
        outcome
    }
}
