//! The 16-bit wire word shared by both controller boards and the host.
//!
//! ```text
//!  15      11  10   9                                0
//! +----------+----+-----------------------------------+
//! |    id    |type|              payload              |
//! +----------+----+-----------------------------------+
//! ```
//!
//! `type` is 0 for digital-class and 1 for analog-class messages. Id 0 is the
//! keypad channel and id 1 the rotary encoder channel; both use their own
//! payload sub-layouts (see [`keypad_payload`] and [`rotary_payload`]).
//!
//! Nothing at this layer validates ranges. Out-of-range ids or payloads
//! silently alias into neighbouring bits.

/// Id reserved for keypad and deck-change messages.
pub const KEYPAD_ID: u8 = 0;
/// Id reserved for the rotary encoder.
pub const ROTARY_ID: u8 = 1;
/// Real keys on the matrix are `0..KEY_COUNT`.
pub const KEY_COUNT: u8 = 12;
/// Synthetic key id announcing a deck switch change.
pub const DECK_CHANGE_KEY: u8 = 15;
/// Largest id that fits in the header.
pub const MAX_ID: u8 = 31;
/// Largest 10-bit payload value.
pub const MAX_VALUE: u16 = 1023;

const ID_SHIFT: u16 = 11;
const TYPE_BIT: u16 = 1 << 10;
const PAYLOAD_MASK: u16 = 0x03FF;

/// One message on the wire. Always exactly two bytes, high byte first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WireWord(pub u16);

impl WireWord {
    pub fn new(id: u8, is_analog: bool, payload: u16) -> Self {
        Self(encode(id, is_analog, payload))
    }

    pub fn id(self) -> u8 {
        decode(self.0).0
    }

    pub fn is_analog(self) -> bool {
        decode(self.0).1
    }

    pub fn payload(self) -> u16 {
        decode(self.0).2
    }

    pub fn to_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }

    pub fn from_bytes(bytes: [u8; 2]) -> Self {
        Self(u16::from_be_bytes(bytes))
    }
}

/// Pack a header and payload into a word.
pub fn encode(id: u8, is_analog: bool, payload: u16) -> u16 {
    let mut word = (id as u16) << ID_SHIFT;
    if is_analog {
        word |= TYPE_BIT;
    }
    word | payload
}

/// Split a word into `(id, is_analog, payload)`.
pub fn decode(word: u16) -> (u8, bool, u16) {
    let id = (word >> ID_SHIFT) as u8;
    let is_analog = word & TYPE_BIT != 0;
    (id, is_analog, word & PAYLOAD_MASK)
}

/// Value carried by a rotary message in payload bits 9-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotaryValue {
    Clockwise = 0,
    CounterClockwise = 1,
    DoubleClick = 2,
}

impl RotaryValue {
    pub fn from_bits(bits: u16) -> Option<Self> {
        match bits {
            0 => Some(Self::Clockwise),
            1 => Some(Self::CounterClockwise),
            2 => Some(Self::DoubleClick),
            _ => None,
        }
    }
}

/// Payload for the rotary channel: value in bits 9-8, super-speed in bit 7.
pub fn rotary_payload(value: RotaryValue, super_speed: bool) -> u16 {
    let mut payload = (value as u16) << 8;
    if super_speed {
        payload |= 1 << 7;
    }
    payload
}

/// Inverse of [`rotary_payload`]: `(value bits, super_speed)`.
pub fn split_rotary_payload(payload: u16) -> (u16, bool) {
    ((payload >> 8) & 0b11, payload & (1 << 7) != 0)
}

/// Payload for the keypad channel.
///
/// Key in bits 9-6, pressed in bit 5, mode in bits 4-3, deck in bit 2.
pub fn keypad_payload(key: u8, pressed: bool, mode: u8, deck: u8) -> u16 {
    ((key as u16) << 6) | ((pressed as u16) << 5) | ((mode as u16) << 3) | ((deck as u16) << 2)
}

/// Fields of a keypad payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeypadFields {
    pub key: u8,
    pub pressed: bool,
    pub mode: u8,
    pub deck: u8,
}

pub fn split_keypad_payload(payload: u16) -> KeypadFields {
    KeypadFields {
        key: ((payload >> 6) & 0x0F) as u8,
        pressed: payload & (1 << 5) != 0,
        mode: ((payload >> 3) & 0b11) as u8,
        deck: ((payload >> 2) & 0b1) as u8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trip() {
        for id in 0..=MAX_ID {
            for is_analog in [false, true] {
                for payload in [0, 1, 511, 512, MAX_VALUE] {
                    let word = encode(id, is_analog, payload);
                    assert_eq!(decode(word), (id, is_analog, payload));
                }
            }
        }
    }

    #[test]
    fn header_layout_is_bit_exact() {
        assert_eq!(encode(8, true, 1023), 0b01000_1_1111111111);
        assert_eq!(WireWord::new(8, true, 1023).to_bytes(), [0x47, 0xFF]);
        assert_eq!(WireWord::from_bytes([0x47, 0xFF]).id(), 8);
    }

    #[test]
    fn oversized_payload_aliases_into_type_bit() {
        let word = encode(2, false, 0x0400);
        assert_eq!(decode(word), (2, true, 0));
    }

    #[test]
    fn rotary_payload_layout() {
        let payload = rotary_payload(RotaryValue::CounterClockwise, true);
        assert_eq!(payload, 0b01_1_0000000);
        assert_eq!(split_rotary_payload(payload), (1, true));
        assert_eq!(
            split_rotary_payload(rotary_payload(RotaryValue::DoubleClick, false)),
            (2, false)
        );
    }

    #[test]
    fn keypad_payload_layout() {
        let payload = keypad_payload(3, true, 1, 1);
        assert_eq!(payload, 0b0011_1_01_1_00);
        assert_eq!(
            split_keypad_payload(payload),
            KeypadFields {
                key: 3,
                pressed: true,
                mode: 1,
                deck: 1
            }
        );
    }
}
