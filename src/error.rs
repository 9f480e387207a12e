use thiserror::Error;

use crate::validate::Parameter;

pub type Result<T> = std::result::Result<T, LoraError>;

#[derive(Debug, Error)]
pub enum LoraError {
    #[error("invalid {parameter} value: {value}")]
    InvalidParameter { parameter: Parameter, value: i64 },

    #[error("radio driver rejected {operation}")]
    Driver { operation: &'static str },

    #[error("Tx demo trigger unavailable: {0}")]
    TriggerUnavailable(&'static str),

    #[error("command pipe closed")]
    CommandPipeClosed,

    #[error("unknown command code: {0}")]
    UnknownCommandCode(u8),

    #[error("command {code} payload length {actual}, expected {expected}")]
    PayloadLength {
        code: u8,
        expected: usize,
        actual: usize,
    },
}
