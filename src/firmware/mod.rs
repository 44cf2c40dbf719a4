//! Board-side input conditioning.
//!
//! Everything here decides when a physical change is worth a wire word. The
//! interrupt handlers only raise flags or mutate small fixed-size state; the
//! polling loop is the only writer of the outbound stream.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::wire::WireWord;

pub mod analog;
pub mod digital;
pub mod keypad;
pub mod rotary;
pub mod surface;

pub use analog::{AdcReader, AnalogChannel};
pub use digital::DigitalInput;
pub use keypad::{KeyState, KeypadEncoder, Mode};
pub use rotary::{Direction, RotaryEncoder};
pub use surface::ControlSurface;

/// Outbound byte stream of a board.
///
/// Backpressure is not modelled; a sink is assumed to always accept a word.
pub trait WireSink {
    fn send(&mut self, word: WireWord);
}

impl<W: std::io::Write> WireSink for W {
    fn send(&mut self, word: WireWord) {
        if let Err(err) = self.write_all(&word.to_bytes()) {
            log::warn!("dropping wire word {:#06x}: {err}", word.0);
        }
    }
}

/// A "something changed" flag raised from an interrupt and taken by the
/// polling loop.
#[derive(Debug, Default)]
pub struct EdgeFlag(AtomicBool);

impl EdgeFlag {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Interrupt side.
    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Polling side: returns whether the flag was set and clears it.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_flag_is_taken_once() {
        let flag = EdgeFlag::new();
        assert!(!flag.take());
        flag.raise();
        flag.raise();
        assert!(flag.is_raised());
        assert!(flag.take());
        assert!(!flag.take());
    }

    #[test]
    fn io_writer_receives_high_byte_first() {
        let mut out: Vec<u8> = Vec::new();
        out.send(WireWord(0x1234));
        out.send(WireWord(0xABCD));
        assert_eq!(out, vec![0x12, 0x34, 0xAB, 0xCD]);
    }
}
