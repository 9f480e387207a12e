pub mod command;
pub mod config;
pub mod console;
pub mod counters;
pub mod demo;
pub mod dispatcher;
pub mod driver;
pub mod error;
pub mod events;
pub mod frequency;
pub mod kernel;
pub mod message;
pub mod settings;
pub mod telemetry;
pub mod validate;
pub mod worker;

pub use command::{Command, CommandPacket};
pub use config::{DeviceDescriptor, KernelConfig, RadioConfig, RadioConfigStore};
pub use counters::{CounterSet, CounterSnapshot};
pub use dispatcher::CommandOutcome;
pub use driver::{RadioDriver, SharedDriver, SimulatedRadio};
pub use error::{LoraError, Result};
pub use events::{Event, EventId, Severity};
pub use frequency::Frequency;
pub use kernel::Kernel;
pub use message::{Downlink, Inbound};
pub use telemetry::{RadioTelemetry, StatusTelemetry};
pub use worker::WorkerTaskState;
