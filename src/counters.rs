use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Kernel-wide status counters.
///
/// Each counter has exactly one writer: the dispatcher owns the command
/// counts, the Rx task the rx counts and the demo runner the tx counts.
/// Everyone else reads. Only [`CounterSet::reset`] writes across owners.
#[derive(Debug, Default)]
pub struct CounterSet {
    valid_cmd: AtomicU32,
    invalid_cmd: AtomicU32,
    rx_packet: AtomicU32,
    rx_packet_error: AtomicU32,
    tx_packet: AtomicU32,
    tx_packet_error: AtomicU32,
    demo_active: AtomicBool,
}

/// Point-in-time copy of a [`CounterSet`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub valid_cmd_count: u32,
    pub invalid_cmd_count: u32,
    pub rx_packet_count: u32,
    pub rx_packet_error_count: u32,
    pub tx_packet_count: u32,
    pub tx_packet_error_count: u32,
    pub demo_active: bool,
}

fn bump(counter: &AtomicU32) -> u32 {
    counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
}

impl CounterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_valid_cmd(&self) -> u32 {
        bump(&self.valid_cmd)
    }

    pub fn record_invalid_cmd(&self) -> u32 {
        bump(&self.invalid_cmd)
    }

    pub fn record_rx_packet(&self) -> u32 {
        bump(&self.rx_packet)
    }

    pub fn record_rx_packet_error(&self) -> u32 {
        bump(&self.rx_packet_error)
    }

    pub fn record_tx_packet(&self) -> u32 {
        bump(&self.tx_packet)
    }

    pub fn record_tx_packet_error(&self) -> u32 {
        bump(&self.tx_packet_error)
    }

    pub fn set_demo_active(&self, active: bool) {
        self.demo_active.store(active, Ordering::SeqCst);
    }

    pub fn demo_active(&self) -> bool {
        self.demo_active.load(Ordering::SeqCst)
    }

    /// Zero every counter. `demo_active` is a status flag, not a counter, and
    /// is left alone.
    pub fn reset(&self) {
        for counter in [
            &self.valid_cmd,
            &self.invalid_cmd,
            &self.rx_packet,
            &self.rx_packet_error,
            &self.tx_packet,
            &self.tx_packet_error,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            valid_cmd_count: self.valid_cmd.load(Ordering::Relaxed),
            invalid_cmd_count: self.invalid_cmd.load(Ordering::Relaxed),
            rx_packet_count: self.rx_packet.load(Ordering::Relaxed),
            rx_packet_error_count: self.rx_packet_error.load(Ordering::Relaxed),
            tx_packet_count: self.tx_packet.load(Ordering::Relaxed),
            tx_packet_error_count: self.tx_packet_error.load(Ordering::Relaxed),
            demo_active: self.demo_active(),
        }
    }
}
