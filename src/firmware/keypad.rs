use crate::wire::{keypad_payload, WireWord, DECK_CHANGE_KEY, KEYPAD_ID, KEY_COUNT};

use super::{EdgeFlag, WireSink};

/// Position of the three-way mode switch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    First = 0,
    Second = 1,
    Third = 2,
}

impl Mode {
    /// Decode the two switch contacts. Low/low cannot happen on the real
    /// switch and yields `None`.
    pub fn from_switch(a: bool, b: bool) -> Option<Self> {
        match (a, b) {
            (false, true) => Some(Self::First),
            (true, false) => Some(Self::Second),
            (true, true) => Some(Self::Third),
            (false, false) => None,
        }
    }
}

/// Transition reported by the keypad scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Pressed,
    Released,
    Hold,
}

/// Encodes keypad activity together with the mode and deck selectors.
pub struct KeypadEncoder<'a> {
    mode: Mode,
    deck: bool,
    deck_changed: &'a EdgeFlag,
}

impl<'a> KeypadEncoder<'a> {
    pub fn new(mode: Mode, deck: bool, deck_changed: &'a EdgeFlag) -> Self {
        Self {
            mode,
            deck,
            deck_changed,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn deck(&self) -> bool {
        self.deck
    }

    /// Track the mode switch. Undefined positions keep the previous mode.
    pub fn set_mode_switch(&mut self, a: bool, b: bool) {
        match Mode::from_switch(a, b) {
            Some(mode) => self.mode = mode,
            None => log::debug!("mode switch in undefined position, keeping {:?}", self.mode),
        }
    }

    /// Deck switch pin-change interrupt handler body.
    pub fn on_deck_edge(&self) {
        self.deck_changed.raise();
    }

    /// Encode one scanner event. Holds produce nothing.
    pub fn on_key<S: WireSink>(&self, key: u8, state: KeyState, sink: &mut S) -> bool {
        let pressed = match state {
            KeyState::Pressed => true,
            KeyState::Released => false,
            KeyState::Hold => return false,
        };
        if key >= KEY_COUNT {
            log::debug!("ignoring key {key} outside the matrix");
            return false;
        }
        sink.send(self.word(key, pressed));
        true
    }

    /// Report a deck switch change seen since the last poll.
    ///
    /// `deck_level` is the switch level read now. An edge that did not
    /// actually change the deck sends nothing.
    pub fn poll<S: WireSink>(&mut self, deck_level: bool, sink: &mut S) -> bool {
        if !self.deck_changed.take() || deck_level == self.deck {
            return false;
        }
        self.deck = deck_level;
        sink.send(self.word(DECK_CHANGE_KEY, true));
        true
    }

    fn word(&self, key: u8, pressed: bool) -> WireWord {
        let payload = keypad_payload(key, pressed, self.mode as u8, self.deck as u8);
        WireWord::new(KEYPAD_ID, false, payload)
    }
}
