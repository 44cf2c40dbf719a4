use embedded_hal::digital::InputPin;

use crate::{
    config::BoardConfig,
    error::{BridgeError, Result},
};

use super::{
    AdcReader, AnalogChannel, DigitalInput, KeyState, KeypadEncoder, RotaryEncoder, WireSink,
};

/// Pin levels sampled by the loop right before a poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollLevels {
    /// Encoder button is held down; becomes the super-speed bit.
    pub encoder_button_held: bool,
    /// Current level of the deck selector switch.
    pub deck_switch: bool,
}

/// Every conditioned input of one board, polled together.
///
/// Built once at startup from a validated [`BoardConfig`] and handed to the
/// main loop, which calls [`ControlSurface::poll_once`] forever.
pub struct ControlSurface<'a, P> {
    board: BoardConfig,
    analog: Vec<AnalogChannel>,
    digital: Vec<DigitalInput<'a, P>>,
    rotary: Option<&'a RotaryEncoder>,
    keypad: Option<KeypadEncoder<'a>>,
}

impl<'a, P: InputPin> ControlSurface<'a, P> {
    pub fn from_board(board: BoardConfig) -> Result<Self> {
        board.validate()?;
        let analog = board
            .analog
            .iter()
            .map(|a| AnalogChannel::new(a.id, a.channel, a.sensitivity))
            .collect();
        Ok(Self {
            board,
            analog,
            digital: Vec::new(),
            rotary: None,
            keypad: None,
        })
    }

    /// Attach the pin for a digital input the layout declares.
    pub fn add_digital(&mut self, input: DigitalInput<'a, P>) -> Result<()> {
        let id = input.id();
        if !self.board.declares_digital(id) {
            return Err(BridgeError::UndeclaredInput(id));
        }
        if self.digital.iter().any(|d| d.id() == id) {
            return Err(BridgeError::DuplicateId(id));
        }
        self.digital.push(input);
        Ok(())
    }

    pub fn set_rotary(&mut self, encoder: &'a RotaryEncoder) {
        if !self.board.rotary {
            log::warn!("attaching a rotary encoder the board layout does not declare");
        }
        self.rotary = Some(encoder);
    }

    pub fn set_keypad(&mut self, keypad: KeypadEncoder<'a>) {
        if !self.board.keypad {
            log::warn!("attaching a keypad the board layout does not declare");
        }
        self.keypad = Some(keypad);
    }

    /// The attached keypad, for mode switch updates.
    pub fn keypad_mut(&mut self) -> Option<&mut KeypadEncoder<'a>> {
        self.keypad.as_mut()
    }

    /// Forward one keypad scanner event. Without a keypad nothing is sent.
    pub fn on_key<S: WireSink>(&self, key: u8, state: KeyState, sink: &mut S) -> bool {
        match &self.keypad {
            Some(keypad) => keypad.on_key(key, state, sink),
            None => false,
        }
    }

    /// One pass of the polling loop. Returns the number of words sent.
    pub fn poll_once<A: AdcReader, S: WireSink>(
        &mut self,
        adc: &mut A,
        levels: PollLevels,
        sink: &mut S,
    ) -> usize {
        let mut sent = 0;
        for channel in &mut self.analog {
            if channel.poll(adc, sink) {
                sent += 1;
            }
        }
        for input in &mut self.digital {
            if input.poll(sink) {
                sent += 1;
            }
        }
        if let Some(encoder) = self.rotary {
            sent += encoder.poll(levels.encoder_button_held, sink);
        }
        if let Some(keypad) = &mut self.keypad {
            if keypad.poll(levels.deck_switch, sink) {
                sent += 1;
            }
        }
        sent
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use crate::{
        config::{AnalogConfig, DigitalConfig},
        firmware::{analog::tests::FakeAdc, digital::tests::FakePin, EdgeFlag, Mode},
        wire::{keypad_payload, WireWord, DECK_CHANGE_KEY, KEYPAD_ID, ROTARY_ID},
    };

    use super::*;

    fn board() -> BoardConfig {
        BoardConfig {
            analog: vec![AnalogConfig {
                id: 8,
                channel: 0,
                sensitivity: 25,
            }],
            digital: vec![DigitalConfig { id: 2 }],
            rotary: true,
            keypad: true,
        }
    }

    fn words(bytes: &[u8]) -> Vec<WireWord> {
        bytes
            .chunks_exact(2)
            .map(|pair| WireWord::from_bytes([pair[0], pair[1]]))
            .collect()
    }

    #[test]
    fn poll_once_drains_every_input() {
        let level = Cell::new(false);
        let flag = EdgeFlag::new();
        let deck_flag = EdgeFlag::new();
        let encoder = RotaryEncoder::new();
        let mut surface = ControlSurface::from_board(board()).unwrap();
        surface
            .add_digital(DigitalInput::new(2, FakePin(&level), &flag))
            .unwrap();
        surface.set_rotary(&encoder);
        surface.set_keypad(KeypadEncoder::new(Mode::Second, false, &deck_flag));

        flag.raise();
        for (a, b) in [(false, true), (true, true), (true, false), (false, false)] {
            encoder.on_quadrature_edge(a, b);
        }
        deck_flag.raise();

        let levels = PollLevels {
            encoder_button_held: false,
            deck_switch: true,
        };
        let mut adc = FakeAdc::with(&[1023]);
        let mut out: Vec<u8> = Vec::new();
        assert_eq!(surface.poll_once(&mut adc, levels, &mut out), 4);

        let sent = words(&out);
        assert_eq!(sent[0], WireWord::new(8, true, 1023));
        assert_eq!(sent[1], WireWord::new(2, false, 0));
        assert_eq!(sent[2].id(), ROTARY_ID);
        let deck_change = keypad_payload(DECK_CHANGE_KEY, true, 1, 1);
        assert_eq!(sent[3], WireWord::new(KEYPAD_ID, false, deck_change));
        assert_eq!(surface.keypad_mut().map(|k| k.deck()), Some(true));

        out.clear();
        assert_eq!(surface.poll_once(&mut FakeAdc::default(), levels, &mut out), 0);
    }

    #[test]
    fn keys_go_through_the_attached_keypad() {
        let deck_flag = EdgeFlag::new();
        let mut surface = ControlSurface::<FakePin>::from_board(board()).unwrap();
        let mut out: Vec<u8> = Vec::new();

        assert!(!surface.on_key(3, KeyState::Pressed, &mut out));
        assert!(out.is_empty());

        surface.set_keypad(KeypadEncoder::new(Mode::First, true, &deck_flag));
        if let Some(keypad) = surface.keypad_mut() {
            keypad.set_mode_switch(true, true);
        }
        assert!(surface.on_key(3, KeyState::Pressed, &mut out));
        assert_eq!(
            words(&out),
            vec![WireWord::new(KEYPAD_ID, false, keypad_payload(3, true, 2, 1))]
        );
    }

    #[test]
    fn undeclared_or_repeated_digital_input_is_rejected() {
        let level = Cell::new(false);
        let flag = EdgeFlag::new();
        let mut surface = ControlSurface::from_board(board()).unwrap();

        let err = surface
            .add_digital(DigitalInput::new(3, FakePin(&level), &flag))
            .unwrap_err();
        assert!(matches!(err, BridgeError::UndeclaredInput(3)));

        surface
            .add_digital(DigitalInput::new(2, FakePin(&level), &flag))
            .unwrap();
        let err = surface
            .add_digital(DigitalInput::new(2, FakePin(&level), &flag))
            .unwrap_err();
        assert!(matches!(err, BridgeError::DuplicateId(2)));
    }

    #[test]
    fn invalid_layout_is_rejected() {
        let mut layout = board();
        layout.digital.push(DigitalConfig { id: 8 });
        assert!(ControlSurface::<FakePin>::from_board(layout).is_err());
    }
}
