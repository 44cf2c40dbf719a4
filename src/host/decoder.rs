use crate::wire::{
    decode, split_keypad_payload, split_rotary_payload, RotaryValue, WireWord, DECK_CHANGE_KEY,
    KEYPAD_ID, ROTARY_ID,
};

/// Direction of one rotary detent as seen by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Clockwise,
    CounterClockwise,
}

/// Meaning of one wire word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodedEvent {
    AnalogChange {
        id: u8,
        value: u16,
    },
    DigitalChange {
        id: u8,
        state: bool,
    },
    RotaryRotation {
        direction: Rotation,
        super_speed: bool,
    },
    RotaryDoubleClick,
    KeypadEvent {
        key: u8,
        pressed: bool,
        mode: u8,
        deck: u8,
    },
    DeckChange {
        deck: u8,
    },
    /// Rotary word with the unused value 3 in bits 9-8.
    Unknown(WireWord),
}

/// Split a wire word into its event.
pub fn parse_message(word: WireWord) -> DecodedEvent {
    let (id, is_analog, payload) = decode(word.0);

    if is_analog {
        return DecodedEvent::AnalogChange { id, value: payload };
    }

    match id {
        KEYPAD_ID => {
            let fields = split_keypad_payload(payload);
            if fields.key == DECK_CHANGE_KEY {
                DecodedEvent::DeckChange { deck: fields.deck }
            } else {
                DecodedEvent::KeypadEvent {
                    key: fields.key,
                    pressed: fields.pressed,
                    mode: fields.mode,
                    deck: fields.deck,
                }
            }
        }
        ROTARY_ID => {
            let (value, super_speed) = split_rotary_payload(payload);
            match RotaryValue::from_bits(value) {
                Some(RotaryValue::Clockwise) => DecodedEvent::RotaryRotation {
                    direction: Rotation::Clockwise,
                    super_speed,
                },
                Some(RotaryValue::CounterClockwise) => DecodedEvent::RotaryRotation {
                    direction: Rotation::CounterClockwise,
                    super_speed,
                },
                Some(RotaryValue::DoubleClick) => DecodedEvent::RotaryDoubleClick,
                None => DecodedEvent::Unknown(word),
            }
        }
        _ => DecodedEvent::DigitalChange {
            id,
            state: payload & 1 != 0,
        },
    }
}
