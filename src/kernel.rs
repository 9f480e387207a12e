use std::sync::Arc;

use log::{error, info, warn};
use tokio::sync::mpsc as tokio_mpsc;

use crate::command::{Command, CommandPacket};
use crate::config::{KernelConfig, RadioConfig, RadioConfigStore};
use crate::counters::{CounterSet, CounterSnapshot};
use crate::demo::DemoScriptRunner;
use crate::dispatcher::{CommandDispatcher, CommandOutcome, VERSION};
use crate::driver::{RadioDriver, SharedDriver};
use crate::error::{LoraError, Result};
use crate::events::{EventId, EventLog};
use crate::message::{Downlink, Inbound};
use crate::telemetry::{RadioTelemetry, StatusTelemetry, TelemetryPublisher};
use crate::worker::{WorkerTaskController, WorkerTaskState};

/// The LoRa control kernel: owns every component and is passed explicitly to
/// whoever drives it.
pub struct Kernel {
    store: Arc<RadioConfigStore>,
    counters: Arc<CounterSet>,
    events: Arc<EventLog>,
    telemetry: Arc<TelemetryPublisher>,
    dispatcher: CommandDispatcher,
    workers: WorkerTaskController,
}

impl Kernel {
    /// Build the kernel. Worker tasks are not started yet.
    pub fn new(
        config: KernelConfig,
        driver: impl RadioDriver + 'static,
        downlink: tokio_mpsc::UnboundedSender<Downlink>,
    ) -> Self {
        let driver = SharedDriver::new(driver);
        let store = Arc::new(RadioConfigStore::new(config.initial_radio));
        let counters = Arc::new(CounterSet::new());
        let events = Arc::new(EventLog::new(downlink.clone()));

        let runner = DemoScriptRunner::new(
            driver.clone(),
            Arc::clone(&store),
            Arc::clone(&counters),
            Arc::clone(&events),
            config.demo_step_delay,
        );
        let workers = WorkerTaskController::new(
            runner,
            Arc::clone(&counters),
            Arc::clone(&events),
            config.rx_poll_interval,
            config.trigger_queue_depth,
        );
        let telemetry = Arc::new(TelemetryPublisher::new(
            downlink,
            Arc::clone(&counters),
            Arc::clone(&store),
            driver.clone(),
            config.device,
            workers.subscribe_rx_state(),
            workers.subscribe_tx_state(),
        ));
        let dispatcher = CommandDispatcher::new(
            Arc::clone(&store),
            Arc::clone(&counters),
            driver.clone(),
            Arc::clone(&events),
            Arc::clone(&telemetry),
        );

        if !driver.is_initialized() {
            warn!("radio driver reports it is not initialized");
        }
        events.info(
            EventId::InitApp,
            format!("LoRa kernel initialized, version {VERSION}"),
        );

        Self {
            store,
            counters,
            events,
            telemetry,
            dispatcher,
            workers,
        }
    }

    /// Spawn the Rx and Tx worker tasks.
    pub fn start_workers(&mut self) {
        self.workers.start();
    }

    pub fn dispatch(&self, command: Command) -> CommandOutcome {
        self.dispatcher.dispatch(command, &self.workers)
    }

    /// Decode and dispatch a raw bus packet. Undecodable packets count as
    /// invalid commands.
    pub fn dispatch_packet(&self, packet: &CommandPacket) -> CommandOutcome {
        match Command::decode(packet) {
            Ok(command) => self.dispatch(command),
            Err(e) => {
                self.dispatcher.reject_undecodable(packet.code, &e);
                CommandOutcome::Rejected
            }
        }
    }

    /// Periodic scheduler tick: publish status telemetry.
    pub fn handle_one_hz(&self) -> StatusTelemetry {
        self.telemetry.send_status()
    }

    pub fn handle(&self, message: Inbound) {
        match message {
            Inbound::Packet(packet) => {
                self.dispatch_packet(&packet);
            }
            Inbound::Command(command) => {
                self.dispatch(command);
            }
            Inbound::OneHz => {
                self.handle_one_hz();
            }
        }
    }

    /// Control loop: process inbound messages one at a time until the pipe
    /// closes, then shut the workers down.
    ///
    /// Starts the workers if they are not running yet. Only returns on a
    /// closed pipe, with [`LoraError::CommandPipeClosed`].
    pub async fn run(&mut self, mut inbound: tokio_mpsc::Receiver<Inbound>) -> Result<()> {
        self.start_workers();
        info!("control loop running");

        while let Some(message) = inbound.recv().await {
            self.handle(message);
        }

        error!("LoRa kernel: command pipe closed");
        self.events
            .critical(EventId::Exit, "LoRa kernel exiting: command pipe closed");
        self.workers.shutdown().await;
        Err(LoraError::CommandPipeClosed)
    }

    pub fn counters(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    pub fn radio_config(&self) -> RadioConfig {
        self.store.snapshot()
    }

    pub fn snapshot_status(&self) -> StatusTelemetry {
        self.telemetry.snapshot_status()
    }

    pub fn snapshot_radio(&self) -> RadioTelemetry {
        self.telemetry.snapshot_radio()
    }

    pub fn rx_state(&self) -> WorkerTaskState {
        self.workers.rx_state()
    }

    pub fn tx_state(&self) -> WorkerTaskState {
        self.workers.tx_state()
    }

    /// Stop both workers without going through the control loop.
    pub async fn shutdown(&mut self) {
        self.workers.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::cc;
    use crate::driver::SimulatedRadio;
    use crate::events::Severity;

    fn kernel(radio: SimulatedRadio) -> (Kernel, tokio_mpsc::UnboundedReceiver<Downlink>) {
        let (tx, rx) = tokio_mpsc::unbounded_channel();
        (Kernel::new(KernelConfig::default(), radio, tx), rx)
    }

    #[test]
    fn test_new_emits_init_event() {
        let (_kernel, mut rx) = kernel(SimulatedRadio::new());
        match rx.try_recv().unwrap() {
            Downlink::Event(event) => {
                assert_eq!(event.id, EventId::InitApp);
                assert_eq!(event.message, "LoRa kernel initialized, version 1.0.0");
            }
            other => panic!("expected init event, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_packet_counts_invalid() {
        let (kernel, mut rx) = kernel(SimulatedRadio::new());
        rx.try_recv().unwrap();

        let outcome = kernel.dispatch_packet(&CommandPacket::new(99, vec![]));
        assert_eq!(outcome, CommandOutcome::Rejected);
        let outcome = kernel.dispatch_packet(&CommandPacket::new(cc::SET_RADIO_FREQUENCY, vec![1]));
        assert_eq!(outcome, CommandOutcome::Rejected);
        assert_eq!(kernel.counters().invalid_cmd_count, 2);

        match rx.try_recv().unwrap() {
            Downlink::Event(event) => {
                assert_eq!(event.id, EventId::InvalidCommand);
                assert_eq!(event.severity, Severity::Error);
            }
            other => panic!("expected invalid command event, got {other:?}"),
        }
    }

    #[test]
    fn test_packet_decodes_and_dispatches() {
        let (kernel, _rx) = kernel(SimulatedRadio::new());
        let packet = Command::SetRadioFrequency(915).to_packet();
        assert_eq!(kernel.dispatch_packet(&packet), CommandOutcome::AppliedOk);
        assert_eq!(kernel.radio_config().frequency.mhz(), 915);
    }

    #[test]
    fn test_one_hz_sends_status() {
        let (kernel, mut rx) = kernel(SimulatedRadio::uninitialized());
        rx.try_recv().unwrap();
        kernel.handle(Inbound::OneHz);
        match rx.try_recv().unwrap() {
            Downlink::StatusTlm(tlm) => {
                assert!(!tlm.radio_initialized);
                assert_eq!(tlm.rx_task, WorkerTaskState::Idle);
            }
            other => panic!("expected status tlm, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_pipe_terminates_workers() {
        let (mut kernel, mut rx) = kernel(SimulatedRadio::new());
        let (tx, inbound) = tokio_mpsc::channel(4);
        tx.send(Inbound::Command(Command::NoOp)).await.unwrap();
        drop(tx);

        let result = kernel.run(inbound).await;
        assert!(matches!(result, Err(LoraError::CommandPipeClosed)));
        assert_eq!(kernel.counters().valid_cmd_count, 1);
        assert_eq!(kernel.rx_state(), WorkerTaskState::Terminated);
        assert_eq!(kernel.tx_state(), WorkerTaskState::Terminated);

        let mut exit = None;
        while let Ok(msg) = rx.try_recv() {
            if let Downlink::Event(event) = msg {
                if event.id == EventId::Exit {
                    exit = Some(event);
                }
            }
        }
        assert_eq!(exit.map(|e| e.severity), Some(Severity::Critical));
    }
}
