//! Controller-to-MIDI bridge for a two-board DJ controller.
//!
//! The boards condition their inputs (see [`firmware`]) and send every
//! significant change as one 16-bit [`wire`] word. The host frames the byte
//! stream back into words, decodes them and remaps them to MIDI (see
//! [`host`]).

pub mod config;
pub mod error;
pub mod firmware;
pub mod host;
pub mod wire;

pub use error::{BridgeError, Result};
