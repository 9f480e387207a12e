use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use tokio::sync::{mpsc as tokio_mpsc, watch};

use crate::config::{DeviceDescriptor, RadioConfig, RadioConfigStore};
use crate::counters::CounterSet;
use crate::driver::SharedDriver;
use crate::message::Downlink;
use crate::worker::WorkerTaskState;

/// Periodic kernel status.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusTelemetry {
    pub captured_at: DateTime<Utc>,
    pub valid_cmd_count: u32,
    pub invalid_cmd_count: u32,
    pub radio_initialized: bool,
    pub rx_packet_count: u32,
    pub rx_packet_error_count: u32,
    pub tx_demo_active: bool,
    pub tx_packet_count: u32,
    pub tx_packet_error_count: u32,
    pub rx_task: WorkerTaskState,
    pub tx_task: WorkerTaskState,
}

/// On-demand radio configuration report.
#[derive(Debug, Clone, PartialEq)]
pub struct RadioTelemetry {
    pub captured_at: DateTime<Utc>,
    pub device: DeviceDescriptor,
    pub config: RadioConfig,
}

/// Builds telemetry from kernel state and pushes it on the downlink.
///
/// Only reads shared state; never mutates it.
pub struct TelemetryPublisher {
    downlink: tokio_mpsc::UnboundedSender<Downlink>,
    counters: Arc<CounterSet>,
    store: Arc<RadioConfigStore>,
    driver: SharedDriver,
    device: DeviceDescriptor,
    rx_state: watch::Receiver<WorkerTaskState>,
    tx_state: watch::Receiver<WorkerTaskState>,
}

impl TelemetryPublisher {
    pub fn new(
        downlink: tokio_mpsc::UnboundedSender<Downlink>,
        counters: Arc<CounterSet>,
        store: Arc<RadioConfigStore>,
        driver: SharedDriver,
        device: DeviceDescriptor,
        rx_state: watch::Receiver<WorkerTaskState>,
        tx_state: watch::Receiver<WorkerTaskState>,
    ) -> Self {
        Self {
            downlink,
            counters,
            store,
            driver,
            device,
            rx_state,
            tx_state,
        }
    }

    /// Capture current status without sending it.
    pub fn snapshot_status(&self) -> StatusTelemetry {
        let counts = self.counters.snapshot();
        StatusTelemetry {
            captured_at: Utc::now(),
            valid_cmd_count: counts.valid_cmd_count,
            invalid_cmd_count: counts.invalid_cmd_count,
            radio_initialized: self.driver.is_initialized(),
            rx_packet_count: counts.rx_packet_count,
            rx_packet_error_count: counts.rx_packet_error_count,
            tx_demo_active: counts.demo_active,
            tx_packet_count: counts.tx_packet_count,
            tx_packet_error_count: counts.tx_packet_error_count,
            rx_task: *self.rx_state.borrow(),
            tx_task: *self.tx_state.borrow(),
        }
    }

    /// Capture the radio configuration report without sending it.
    pub fn snapshot_radio(&self) -> RadioTelemetry {
        RadioTelemetry {
            captured_at: Utc::now(),
            device: self.device.clone(),
            config: self.store.snapshot(),
        }
    }

    /// Capture and send status telemetry.
    pub fn send_status(&self) -> StatusTelemetry {
        let tlm = self.snapshot_status();
        debug!(
            "status tlm: valid={} invalid={} rx={} tx={} demo_active={}",
            tlm.valid_cmd_count,
            tlm.invalid_cmd_count,
            tlm.rx_packet_count,
            tlm.tx_packet_count,
            tlm.tx_demo_active
        );
        if self.downlink.send(Downlink::StatusTlm(tlm.clone())).is_err() {
            warn!("downlink closed, status telemetry dropped");
        }
        tlm
    }

    /// Capture and send radio configuration telemetry.
    pub fn send_radio(&self) -> RadioTelemetry {
        let tlm = self.snapshot_radio();
        if self.downlink.send(Downlink::RadioTlm(tlm.clone())).is_err() {
            warn!("downlink closed, radio telemetry dropped");
        }
        tlm
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::SimulatedRadio;
    use crate::settings::{RadioSetting, StandbyMode};

    struct Fixture {
        publisher: TelemetryPublisher,
        counters: Arc<CounterSet>,
        store: Arc<RadioConfigStore>,
        rx: tokio_mpsc::UnboundedReceiver<Downlink>,
        tx_state: watch::Sender<WorkerTaskState>,
    }

    fn fixture(radio: SimulatedRadio) -> Fixture {
        let (downlink, rx) = tokio_mpsc::unbounded_channel();
        let counters = Arc::new(CounterSet::new());
        let store = Arc::new(RadioConfigStore::new(RadioConfig::default()));
        let (_rx_state_tx, rx_state) = watch::channel(WorkerTaskState::Running);
        let (tx_state_tx, tx_state) = watch::channel(WorkerTaskState::WaitingForTrigger);
        let publisher = TelemetryPublisher::new(
            downlink,
            Arc::clone(&counters),
            Arc::clone(&store),
            SharedDriver::new(radio),
            DeviceDescriptor::default(),
            rx_state,
            tx_state,
        );
        Fixture {
            publisher,
            counters,
            store,
            rx,
            tx_state: tx_state_tx,
        }
    }

    #[test]
    fn test_status_bundles_counters_and_states() {
        let mut f = fixture(SimulatedRadio::new());
        f.counters.record_valid_cmd();
        f.counters.record_invalid_cmd();
        f.counters.record_invalid_cmd();
        f.counters.record_rx_packet();
        f.counters.set_demo_active(true);
        f.tx_state.send_replace(WorkerTaskState::Running);

        let sent = f.publisher.send_status();
        assert_eq!(sent.valid_cmd_count, 1);
        assert_eq!(sent.invalid_cmd_count, 2);
        assert_eq!(sent.rx_packet_count, 1);
        assert!(sent.tx_demo_active);
        assert!(sent.radio_initialized);
        assert_eq!(sent.rx_task, WorkerTaskState::Running);
        assert_eq!(sent.tx_task, WorkerTaskState::Running);

        match f.rx.try_recv().unwrap() {
            Downlink::StatusTlm(tlm) => assert_eq!(tlm, sent),
            other => panic!("expected status tlm, got {other:?}"),
        }
    }

    #[test]
    fn test_status_reports_uninitialized_radio() {
        let f = fixture(SimulatedRadio::uninitialized());
        assert!(!f.publisher.snapshot_status().radio_initialized);
    }

    #[test]
    fn test_snapshot_does_not_send() {
        let mut f = fixture(SimulatedRadio::new());
        f.publisher.snapshot_status();
        f.publisher.snapshot_radio();
        assert!(f.rx.try_recv().is_err());
    }

    #[test]
    fn test_closed_downlink_still_returns_snapshot() {
        let f = fixture(SimulatedRadio::new());
        let Fixture { publisher, counters, rx, .. } = f;
        drop(rx);
        counters.record_valid_cmd();

        assert_eq!(publisher.send_status().valid_cmd_count, 1);
        assert_eq!(publisher.send_radio().config, RadioConfig::default());
    }

    #[test]
    fn test_radio_tlm_reflects_store() {
        let mut f = fixture(SimulatedRadio::new());
        f.store.commit(&RadioSetting::StandbyMode(StandbyMode::Rc));

        let sent = f.publisher.send_radio();
        assert_eq!(sent.config.standby_mode, StandbyMode::Rc);
        assert_eq!(sent.device.spi_device, "/dev/spidev0.0");
        assert!(matches!(f.rx.try_recv().unwrap(), Downlink::RadioTlm(_)));
    }
}
