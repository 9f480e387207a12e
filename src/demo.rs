use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::debug;

use crate::config::RadioConfigStore;
use crate::counters::CounterSet;
use crate::driver::SharedDriver;
use crate::events::{EventId, EventLog};
use crate::settings::{
    LowNoiseAmpMode, PowerAmpRampTime, PowerRegulatorMode, RadioSetting, StandbyMode,
};

/// One step of the transmit demo: a radio setter and the value it requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoStep {
    pub setting: RadioSetting,
}

impl DemoStep {
    pub const fn new(setting: RadioSetting) -> Self {
        Self { setting }
    }

    /// Driver operation this step invokes.
    pub fn operation(&self) -> &'static str {
        self.setting.operation()
    }
}

impl fmt::Display for DemoStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.setting)
    }
}

/// The fixed demo sequence, evaluated top to bottom on every run.
pub const DEMO_SCRIPT: [DemoStep; 4] = [
    DemoStep::new(RadioSetting::StandbyMode(StandbyMode::Xosc)),
    DemoStep::new(RadioSetting::PowerRegulatorMode(PowerRegulatorMode::UseLdo)),
    DemoStep::new(RadioSetting::LowNoiseAmpMode(LowNoiseAmpMode::HighSensitivity)),
    DemoStep::new(RadioSetting::PowerAmpRampTime(PowerAmpRampTime::Ramp20Us)),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Succeeded,
    DriverFailed,
}

/// Per-step results of one demo run, in script order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemoReport {
    pub steps: Vec<(DemoStep, StepOutcome)>,
}

impl DemoReport {
    pub fn total(&self) -> usize {
        self.steps.len()
    }

    pub fn succeeded(&self) -> usize {
        self.steps
            .iter()
            .filter(|(_, outcome)| *outcome == StepOutcome::Succeeded)
            .count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.succeeded() == self.total()
    }
}

/// Executes the demo script against the shared driver.
///
/// A failing step is reported and counted, then the script moves on.
pub struct DemoScriptRunner {
    driver: SharedDriver,
    store: Arc<RadioConfigStore>,
    counters: Arc<CounterSet>,
    events: Arc<EventLog>,
    step_delay: Duration,
}

impl DemoScriptRunner {
    pub fn new(
        driver: SharedDriver,
        store: Arc<RadioConfigStore>,
        counters: Arc<CounterSet>,
        events: Arc<EventLog>,
        step_delay: Duration,
    ) -> Self {
        Self {
            driver,
            store,
            counters,
            events,
            step_delay,
        }
    }

    pub async fn run(&self) -> DemoReport {
        let config = self.store.snapshot();
        self.events.info(
            EventId::TxDemoScript,
            format!(
                "Starting transmit demo at {} ({})",
                config.frequency, config.modulation
            ),
        );

        let mut report = DemoReport::default();
        for (i, step) in DEMO_SCRIPT.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.step_delay).await;
            }

            let outcome = match self.driver.apply(&step.setting) {
                Ok(()) => {
                    let n = self.counters.record_tx_packet();
                    debug!("demo step {}: {step} ok (tx {n})", i + 1);
                    StepOutcome::Succeeded
                }
                Err(e) => {
                    self.counters.record_tx_packet_error();
                    self.events.error(
                        EventId::TxDemoScript,
                        format!("Demo step {} ({step}) failed: {e}", i + 1),
                    );
                    StepOutcome::DriverFailed
                }
            };
            report.steps.push((*step, outcome));
        }

        self.events.info(
            EventId::TxDemoScript,
            format!(
                "Transmit demo complete: {}/{} steps succeeded",
                report.succeeded(),
                report.total()
            ),
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RadioConfig;
    use crate::driver::{DriverCall, SimulatedRadio};
    use crate::events::Severity;
    use crate::message::Downlink;
    use tokio::sync::mpsc as tokio_mpsc;

    fn runner(
        radio: &SimulatedRadio,
    ) -> (
        DemoScriptRunner,
        Arc<CounterSet>,
        tokio_mpsc::UnboundedReceiver<Downlink>,
    ) {
        let (tx, rx) = tokio_mpsc::unbounded_channel();
        let counters = Arc::new(CounterSet::new());
        let runner = DemoScriptRunner::new(
            SharedDriver::new(radio.clone()),
            Arc::new(RadioConfigStore::new(RadioConfig::default())),
            Arc::clone(&counters),
            Arc::new(EventLog::new(tx)),
            Duration::from_millis(1000),
        );
        (runner, counters, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_all_steps_in_order() {
        let radio = SimulatedRadio::new();
        let (runner, counters, _rx) = runner(&radio);

        let start = tokio::time::Instant::now();
        let report = runner.run().await;

        assert!(report.all_succeeded());
        assert_eq!(report.total(), 4);
        assert_eq!(start.elapsed(), Duration::from_millis(3000));
        assert_eq!(
            radio.calls(),
            vec![
                DriverCall::StandbyMode(StandbyMode::Xosc),
                DriverCall::PowerRegulatorMode(PowerRegulatorMode::UseLdo),
                DriverCall::LowNoiseAmpMode(LowNoiseAmpMode::HighSensitivity),
                DriverCall::PowerAmpRampTime(PowerAmpRampTime::Ramp20Us),
            ]
        );
        let counts = counters.snapshot();
        assert_eq!(counts.tx_packet_count, 4);
        assert_eq!(counts.tx_packet_error_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_continues_after_failed_step() {
        let radio = SimulatedRadio::new();
        radio.fail_operation("set-power-regulator-mode");
        let (runner, counters, mut rx) = runner(&radio);

        let report = runner.run().await;

        assert_eq!(report.succeeded(), 3);
        assert_eq!(report.steps[1].1, StepOutcome::DriverFailed);
        assert_eq!(report.steps[3].1, StepOutcome::Succeeded);
        assert_eq!(radio.calls().len(), 3);

        let counts = counters.snapshot();
        assert_eq!(counts.tx_packet_count, 3);
        assert_eq!(counts.tx_packet_error_count, 1);

        let mut errors = 0;
        let mut summary = None;
        while let Ok(Downlink::Event(event)) = rx.try_recv() {
            if event.severity == Severity::Error {
                errors += 1;
            }
            summary = Some(event.message);
        }
        assert_eq!(errors, 1);
        assert_eq!(
            summary.as_deref(),
            Some("Transmit demo complete: 3/4 steps succeeded")
        );
    }

    #[test]
    fn test_script_touches_no_frequency_or_modulation() {
        assert!(DEMO_SCRIPT.iter().all(|step| !matches!(
            step.setting,
            RadioSetting::Frequency(_) | RadioSetting::Modulation(_)
        )));
        assert_eq!(DEMO_SCRIPT[3].operation(), "set-power-amp-ramp-time");
    }
}
