use embedded_hal::digital::InputPin;

use crate::wire::WireWord;

use super::{EdgeFlag, WireSink};

/// A button or switch reported by level.
///
/// The pin-change interrupt raises `changed`; the polling loop then reads
/// whatever level the pin has *now* and sends that. Two toggles between the
/// interrupt and the poll collapse into a single report of the final level.
pub struct DigitalInput<'a, P> {
    id: u8,
    pin: P,
    changed: &'a EdgeFlag,
}

impl<'a, P: InputPin> DigitalInput<'a, P> {
    pub fn new(id: u8, pin: P, changed: &'a EdgeFlag) -> Self {
        Self { id, pin, changed }
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    /// Interrupt handler body.
    pub fn on_edge(&self) {
        self.changed.raise();
    }

    /// Send the current level if an edge was seen since the last poll.
    pub fn poll<S: WireSink>(&mut self, sink: &mut S) -> bool {
        if !self.changed.take() {
            return false;
        }
        match self.pin.is_high() {
            Ok(level) => {
                sink.send(WireWord::new(self.id, false, level as u16));
                true
            }
            Err(err) => {
                log::debug!("digital input {}: pin read failed: {err:?}", self.id);
                false
            }
        }
    }
}
