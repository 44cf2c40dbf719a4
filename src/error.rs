use std::{io, path::PathBuf};

use thiserror::Error;

pub type Result<T, E = BridgeError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("failed to read {path}: {source}")]
    ConfigIo { path: PathBuf, source: io::Error },

    #[error("invalid configuration in {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("id {0} does not fit in the five-bit header")]
    IdOutOfRange(u8),

    #[error("id {0} is reserved for the keypad and rotary encoder")]
    ReservedId(u8),

    #[error("id {0} is used by more than one input")]
    DuplicateId(u8),

    #[error("adc channel {0} does not exist (expected 0-7)")]
    AdcChannel(u8),

    #[error("digital input {0} is not declared in the board layout")]
    UndeclaredInput(u8),

    #[error("failed to initialise MIDI output: {0}")]
    MidiInit(String),

    #[error("no MIDI output port matching \"{0}\" was found")]
    PortNotFound(String),

    #[error("failed to open MIDI connection: {0}")]
    Connection(String),
}
