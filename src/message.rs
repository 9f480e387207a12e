use crate::command::{Command, CommandPacket};
use crate::events::Event;
use crate::telemetry::{RadioTelemetry, StatusTelemetry};

/// Messages consumed by the control task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Raw command from the bus, decoded by the kernel.
    Packet(CommandPacket),
    /// Command already decoded by the sender.
    Command(Command),
    /// Scheduler tick; triggers status telemetry.
    OneHz,
}

/// Messages produced by the kernel for the bus.
#[derive(Debug, Clone, PartialEq)]
pub enum Downlink {
    StatusTlm(StatusTelemetry),
    RadioTlm(RadioTelemetry),
    Event(Event),
}
