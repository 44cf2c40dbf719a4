//! Host-side decoding: bytes to words, words to events, events to MIDI.

pub mod decoder;
pub mod midi_out;
pub mod remap;
pub mod transport;

pub use decoder::{parse_message, DecodedEvent, Rotation};
pub use midi_out::{list_ports, LogSink, MidiOut};
pub use remap::{MidiSink, Remapper};
pub use transport::{WordFramer, WordReader};
