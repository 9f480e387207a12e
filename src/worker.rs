use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use log::{debug, info, warn};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc as tokio_mpsc, watch};
use tokio::task::JoinHandle;

use crate::counters::CounterSet;
use crate::demo::DemoScriptRunner;
use crate::error::{LoraError, Result};
use crate::events::{EventId, EventLog};

/// Lifecycle of a background worker task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerTaskState {
    /// Not yet started.
    Idle,
    WaitingForTrigger,
    Running,
    Terminated,
}

impl fmt::Display for WorkerTaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::WaitingForTrigger => "waiting for trigger",
            Self::Running => "running",
            Self::Terminated => "terminated",
        };
        write!(f, "{s}")
    }
}

/// Owns the Rx poll task and the Tx demo task.
///
/// Each task is the only writer of its own state; the controller overwrites
/// both with `Terminated` after aborting them.
pub struct WorkerTaskController {
    counters: Arc<CounterSet>,
    events: Arc<EventLog>,
    rx_poll_interval: Duration,
    trigger_tx: tokio_mpsc::Sender<()>,
    /// Handed to the Tx task on start.
    pending: Option<(tokio_mpsc::Receiver<()>, DemoScriptRunner)>,
    rx_state: Arc<watch::Sender<WorkerTaskState>>,
    tx_state: Arc<watch::Sender<WorkerTaskState>>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerTaskController {
    /// Create the controller and its trigger queue. Tasks are not spawned
    /// until [`start`](Self::start).
    pub fn new(
        runner: DemoScriptRunner,
        counters: Arc<CounterSet>,
        events: Arc<EventLog>,
        rx_poll_interval: Duration,
        trigger_queue_depth: usize,
    ) -> Self {
        let (trigger_tx, trigger_rx) = tokio_mpsc::channel(trigger_queue_depth.max(1));
        let (rx_state, _) = watch::channel(WorkerTaskState::Idle);
        let (tx_state, _) = watch::channel(WorkerTaskState::Idle);
        Self {
            counters,
            events,
            rx_poll_interval,
            trigger_tx,
            pending: Some((trigger_rx, runner)),
            rx_state: Arc::new(rx_state),
            tx_state: Arc::new(tx_state),
            handles: Vec::new(),
        }
    }

    /// Spawn both worker tasks. Calling it again is a no-op.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        let Some((trigger_rx, runner)) = self.pending.take() else {
            warn!("worker tasks already started");
            return;
        };

        self.rx_state.send_replace(WorkerTaskState::Running);
        self.tx_state.send_replace(WorkerTaskState::WaitingForTrigger);

        self.handles.push(tokio::spawn(rx_loop(
            Arc::clone(&self.rx_state),
            Arc::clone(&self.counters),
            Arc::clone(&self.events),
            self.rx_poll_interval,
        )));
        self.handles.push(tokio::spawn(tx_loop(
            trigger_rx,
            runner,
            Arc::clone(&self.tx_state),
            Arc::clone(&self.counters),
            Arc::clone(&self.events),
        )));
        info!("worker tasks started");
    }

    /// Release the Tx task for one demo run.
    ///
    /// On success `demo_active` is set. If the trigger queue is full or the
    /// Tx task is gone, an error event is emitted and `demo_active` keeps its
    /// previous value.
    pub fn start_trigger(&self) -> Result<()> {
        let result = if self.handles.is_empty() {
            Err(LoraError::TriggerUnavailable("Tx task not started"))
        } else {
            self.trigger_tx
                .try_send(())
                .map(|()| self.counters.set_demo_active(true))
                .map_err(|e| match e {
                    TrySendError::Full(()) => LoraError::TriggerUnavailable("trigger queue full"),
                    TrySendError::Closed(()) => LoraError::TriggerUnavailable("Tx task stopped"),
                })
        };

        match &result {
            Ok(()) => {
                self.events.info(EventId::TxStartDemo, "Transmit demo triggered");
            }
            Err(e) => {
                self.events
                    .error(EventId::TxStartDemo, format!("Failed to trigger transmit demo: {e}"));
            }
        }
        result
    }

    /// Clear `demo_active`. A run in progress is not interrupted.
    pub fn stop_trigger(&self) {
        self.counters.set_demo_active(false);
        self.events.info(EventId::TxStopDemo, "Transmit demo stopped");
    }

    pub fn rx_state(&self) -> WorkerTaskState {
        *self.rx_state.borrow()
    }

    pub fn tx_state(&self) -> WorkerTaskState {
        *self.tx_state.borrow()
    }

    pub fn subscribe_rx_state(&self) -> watch::Receiver<WorkerTaskState> {
        self.rx_state.subscribe()
    }

    pub fn subscribe_tx_state(&self) -> watch::Receiver<WorkerTaskState> {
        self.tx_state.subscribe()
    }

    /// Abort both tasks and wait for them to finish unwinding.
    pub async fn shutdown(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
        for result in join_all(self.handles.drain(..)).await {
            if let Err(e) = result {
                if !e.is_cancelled() {
                    warn!("worker task ended abnormally: {e}");
                }
            }
        }
        self.rx_state.send_replace(WorkerTaskState::Terminated);
        self.tx_state.send_replace(WorkerTaskState::Terminated);
        debug!("worker tasks terminated");
    }
}

/// Rx poll loop: one packet counted per elapsed interval.
async fn rx_loop(
    state: Arc<watch::Sender<WorkerTaskState>>,
    counters: Arc<CounterSet>,
    events: Arc<EventLog>,
    interval: Duration,
) {
    state.send_replace(WorkerTaskState::Running);
    loop {
        tokio::time::sleep(interval).await;
        let n = counters.record_rx_packet();
        events.info(EventId::RxChildTask, format!("Rx task poll, packet count {n}"));
    }
}

/// Tx loop: one demo run per received trigger.
async fn tx_loop(
    mut trigger: tokio_mpsc::Receiver<()>,
    runner: DemoScriptRunner,
    state: Arc<watch::Sender<WorkerTaskState>>,
    counters: Arc<CounterSet>,
    events: Arc<EventLog>,
) {
    loop {
        state.send_replace(WorkerTaskState::WaitingForTrigger);
        events.info(EventId::TxChildTask, "Tx task waiting for demo trigger");
        if trigger.recv().await.is_none() {
            break;
        }

        state.send_replace(WorkerTaskState::Running);
        let report = runner.run().await;
        // A queued trigger keeps the flag for the run it releases.
        if trigger.is_empty() {
            counters.set_demo_active(false);
        }
        debug!(
            "demo run finished, {}/{} steps succeeded",
            report.succeeded(),
            report.total()
        );
    }
    state.send_replace(WorkerTaskState::Terminated);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RadioConfig, RadioConfigStore};
    use crate::driver::{SharedDriver, SimulatedRadio};
    use crate::message::Downlink;

    const STEP: Duration = Duration::from_millis(1000);
    const POLL: Duration = Duration::from_millis(2000);

    fn controller(depth: usize) -> (WorkerTaskController, Arc<CounterSet>) {
        let (tx, _) = tokio_mpsc::unbounded_channel::<Downlink>();
        let counters = Arc::new(CounterSet::new());
        let events = Arc::new(EventLog::new(tx));
        let runner = DemoScriptRunner::new(
            SharedDriver::new(SimulatedRadio::new()),
            Arc::new(RadioConfigStore::new(RadioConfig::default())),
            Arc::clone(&counters),
            Arc::clone(&events),
            STEP,
        );
        let controller =
            WorkerTaskController::new(runner, Arc::clone(&counters), events, POLL, depth);
        (controller, counters)
    }

    #[tokio::test(start_paused = true)]
    async fn test_states_before_and_after_start() {
        let (mut workers, _) = controller(1);
        assert_eq!(workers.rx_state(), WorkerTaskState::Idle);
        assert_eq!(workers.tx_state(), WorkerTaskState::Idle);

        workers.start();
        tokio::task::yield_now().await;
        assert_eq!(workers.rx_state(), WorkerTaskState::Running);
        assert_eq!(workers.tx_state(), WorkerTaskState::WaitingForTrigger);

        workers.shutdown().await;
        assert_eq!(workers.rx_state(), WorkerTaskState::Terminated);
        assert_eq!(workers.tx_state(), WorkerTaskState::Terminated);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_before_start_is_rejected() {
        let (workers, counters) = controller(1);
        assert!(matches!(
            workers.start_trigger(),
            Err(LoraError::TriggerUnavailable(_))
        ));
        assert!(!counters.demo_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rx_counts_one_per_interval() {
        let (mut workers, counters) = controller(1);
        workers.start();
        tokio::time::sleep(POLL * 5 + Duration::from_millis(10)).await;

        let counts = counters.snapshot();
        assert_eq!(counts.rx_packet_count, 5);
        assert_eq!(counts.rx_packet_error_count, 0);
        workers.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_runs_demo_then_waits_again() {
        let (mut workers, counters) = controller(1);
        workers.start();

        workers.start_trigger().unwrap();
        assert!(counters.demo_active());
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(workers.tx_state(), WorkerTaskState::Running);

        tokio::time::sleep(STEP * 3).await;
        assert_eq!(workers.tx_state(), WorkerTaskState::WaitingForTrigger);
        assert!(!counters.demo_active());
        assert_eq!(counters.snapshot().tx_packet_count, 4);
        workers.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_queue_rejects_and_keeps_flag() {
        let (mut workers, counters) = controller(1);
        workers.start();

        workers.start_trigger().unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        workers.start_trigger().unwrap();
        workers.stop_trigger();
        assert!(!counters.demo_active());

        assert!(workers.start_trigger().is_err());
        assert!(!counters.demo_active());
        workers.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_trigger_leaves_flag_set() {
        let (mut workers, counters) = controller(1);
        workers.start();

        workers.start_trigger().unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        workers.start_trigger().unwrap();
        assert!(workers.start_trigger().is_err());
        assert!(counters.demo_active());

        // Queued run holds the flag; it drops only once the queue is drained.
        tokio::time::sleep(STEP * 3).await;
        assert_eq!(workers.tx_state(), WorkerTaskState::Running);
        assert!(counters.demo_active());
        tokio::time::sleep(STEP * 3).await;
        assert_eq!(workers.tx_state(), WorkerTaskState::WaitingForTrigger);
        assert!(!counters.demo_active());
        workers.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_queued_run_does_not_raise_stopped_flag() {
        let (mut workers, counters) = controller(1);
        workers.start();

        workers.start_trigger().unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        workers.start_trigger().unwrap();
        workers.stop_trigger();

        tokio::time::sleep(STEP * 3).await;
        assert_eq!(workers.tx_state(), WorkerTaskState::Running);
        assert!(!counters.demo_active());
        assert_eq!(counters.snapshot().tx_packet_count, 5);
        workers.shutdown().await;
    }
}
