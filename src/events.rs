use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use log::{debug, error, info, trace};
use tokio::sync::mpsc as tokio_mpsc;

use crate::message::Downlink;

/// Number of events let through by a "first N then stop" filter.
const FIRST_4_STOP: u32 = 4;

/// Stable event identifiers, grouped by component base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventId {
    // Application (base 0)
    InitApp,
    NoOp,
    Exit,
    InvalidCommand,
    Reset,
    // Rx task (base 20)
    RxChildTask,
    // Tx task (base 40)
    TxChildTask,
    TxStartDemo,
    TxDemoScript,
    TxStopDemo,
    // Radio interface (base 60)
    SendRadioTlm,
    SetLowNoiseAmpMode,
    SetModulationParams,
    SetPowerAmpRampTime,
    SetPowerRegulatorMode,
    SetRadioFrequency,
    SetStandbyMode,
}

const APP_BASE_EID: u16 = 0;
const RX_BASE_EID: u16 = 20;
const TX_BASE_EID: u16 = 40;
const RADIO_IF_BASE_EID: u16 = 60;

impl EventId {
    /// Numeric identifier as seen on the ground.
    pub fn code(self) -> u16 {
        match self {
            Self::InitApp => APP_BASE_EID,
            Self::NoOp => APP_BASE_EID + 1,
            Self::Exit => APP_BASE_EID + 2,
            Self::InvalidCommand => APP_BASE_EID + 3,
            Self::Reset => APP_BASE_EID + 4,
            Self::RxChildTask => RX_BASE_EID + 1,
            Self::TxChildTask => TX_BASE_EID + 2,
            Self::TxStartDemo => TX_BASE_EID + 3,
            Self::TxDemoScript => TX_BASE_EID + 4,
            Self::TxStopDemo => TX_BASE_EID + 5,
            Self::SendRadioTlm => RADIO_IF_BASE_EID + 3,
            Self::SetLowNoiseAmpMode => RADIO_IF_BASE_EID + 4,
            Self::SetModulationParams => RADIO_IF_BASE_EID + 5,
            Self::SetPowerAmpRampTime => RADIO_IF_BASE_EID + 6,
            Self::SetPowerRegulatorMode => RADIO_IF_BASE_EID + 7,
            Self::SetRadioFrequency => RADIO_IF_BASE_EID + 8,
            Self::SetStandbyMode => RADIO_IF_BASE_EID + 9,
        }
    }

    /// Rate limit applied to this identifier, if any.
    fn filter_limit(self) -> Option<u32> {
        match self {
            Self::RxChildTask | Self::TxChildTask => Some(FIRST_4_STOP),
            _ => None,
        }
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Information,
    Error,
    Critical,
}

/// A formatted event as forwarded on the downlink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: EventId,
    pub severity: Severity,
    pub message: String,
}

/// Event sink: logs every event and forwards unfiltered ones on the downlink.
#[derive(Debug)]
pub struct EventLog {
    downlink: tokio_mpsc::UnboundedSender<Downlink>,
    /// Per-identifier count of events sent since the last filter reset.
    sent: Mutex<HashMap<EventId, u32>>,
}

impl EventLog {
    pub fn new(downlink: tokio_mpsc::UnboundedSender<Downlink>) -> Self {
        Self {
            downlink,
            sent: Mutex::new(HashMap::new()),
        }
    }

    pub fn info(&self, id: EventId, message: impl Into<String>) -> bool {
        self.send(id, Severity::Information, message.into())
    }

    pub fn error(&self, id: EventId, message: impl Into<String>) -> bool {
        self.send(id, Severity::Error, message.into())
    }

    pub fn critical(&self, id: EventId, message: impl Into<String>) -> bool {
        self.send(id, Severity::Critical, message.into())
    }

    /// Emit an event. Returns `false` if the identifier's filter suppressed it.
    pub fn send(&self, id: EventId, severity: Severity, message: String) -> bool {
        if !self.pass_filter(id) {
            trace!("filtered {id}: {message}");
            return false;
        }

        match severity {
            Severity::Information => info!("[{id}] {message}"),
            Severity::Error | Severity::Critical => error!("[{id}] {message}"),
        }

        let event = Event {
            id,
            severity,
            message,
        };
        if self.downlink.send(Downlink::Event(event)).is_err() {
            debug!("downlink closed, {id} not forwarded");
        }
        true
    }

    /// Re-open every rate-limited identifier.
    pub fn reset_filters(&self) {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    fn pass_filter(&self, id: EventId) -> bool {
        let Some(limit) = id.filter_limit() else {
            return true;
        };
        let mut sent = self.sent.lock().unwrap_or_else(PoisonError::into_inner);
        let count = sent.entry(id).or_insert(0);
        if *count >= limit {
            return false;
        }
        *count += 1;
        true
    }
}
