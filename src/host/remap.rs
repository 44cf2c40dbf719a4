use std::time::Instant;

use crate::{config::MappingConfig, wire::KEY_COUNT};

use super::decoder::{DecodedEvent, Rotation};

/// Highest note or controller number MIDI can carry.
pub const MIDI_DATA_MAX: u16 = 127;

/// Destination for remapped events.
///
/// Implementations only ever see note and controller numbers in `0..=127`.
pub trait MidiSink {
    fn emit_note(&mut self, note: u8, on: bool);
    fn emit_control_change(&mut self, controller: u8, value: u8);
}

impl<T: MidiSink + ?Sized> MidiSink for &mut T {
    fn emit_note(&mut self, note: u8, on: bool) {
        (**self).emit_note(note, on)
    }

    fn emit_control_change(&mut self, controller: u8, value: u8) {
        (**self).emit_control_change(controller, value)
    }
}

/// Scale a 10-bit reading to a 7-bit controller value.
pub fn scale_to_7bit(value: u16) -> u8 {
    let value = value.min(1023) as f64;
    (value / 1023.0 * 127.0).round() as u8
}

/// Turns decoded events into notes and control changes.
#[derive(Debug, Clone)]
pub struct Remapper {
    mapping: MappingConfig,
    last_control_change: Option<Instant>,
    deck: Option<u8>,
}

impl Remapper {
    pub fn new(mapping: MappingConfig) -> Self {
        Self {
            mapping,
            last_control_change: None,
            deck: None,
        }
    }

    pub fn mapping(&self) -> &MappingConfig {
        &self.mapping
    }

    /// Deck reported by the most recent deck-change word.
    pub fn deck(&self) -> Option<u8> {
        self.deck
    }

    /// Note a keypad key plays, before range checking.
    pub fn keypad_note(&self, key: u8, mode: u8, deck: u8) -> u16 {
        self.mapping.keypad_offset as u16 + key as u16 * 6 + mode as u16 + deck as u16 * 3
    }

    /// Emit whatever `event` maps to. Returns the number of MIDI messages
    /// sent to `sink`.
    pub fn dispatch<S: MidiSink>(
        &mut self,
        event: DecodedEvent,
        now: Instant,
        sink: &mut S,
    ) -> usize {
        match event {
            DecodedEvent::AnalogChange { id, value } => {
                let controller = id as u16 + self.mapping.control_change_offset as u16;
                self.control_change(controller, scale_to_7bit(value), now, sink)
            }
            DecodedEvent::DigitalChange { id, state } => {
                // pull-ups: a pressed button reads low
                emit_note(sink, id as u16, !state)
            }
            DecodedEvent::RotaryRotation {
                direction,
                super_speed,
            } => {
                let notes = self.mapping.rotary_notes;
                let note = match direction {
                    Rotation::Clockwise => notes.clockwise,
                    Rotation::CounterClockwise => notes.counter_clockwise,
                };
                let pulses = if super_speed {
                    1 + self.mapping.super_speed_multiplier as usize
                } else {
                    1
                };
                (0..pulses).map(|_| pulse(sink, note as u16)).sum()
            }
            DecodedEvent::RotaryDoubleClick => {
                pulse(sink, self.mapping.rotary_notes.double_click as u16)
            }
            DecodedEvent::KeypadEvent { key, .. } if key >= KEY_COUNT => {
                log::debug!("ignoring key {key} outside the matrix");
                0
            }
            DecodedEvent::KeypadEvent {
                key,
                pressed,
                mode,
                deck,
            } => emit_note(sink, self.keypad_note(key, mode, deck), pressed),
            DecodedEvent::DeckChange { deck } => {
                log::info!("deck {deck} selected");
                self.deck = Some(deck);
                0
            }
            DecodedEvent::Unknown(word) => {
                log::debug!("ignoring unrecognised word {:#06x}", word.0);
                0
            }
        }
    }

    /// All analog channels share one timer.
    fn control_change<S: MidiSink>(
        &mut self,
        controller: u16,
        value: u8,
        now: Instant,
        sink: &mut S,
    ) -> usize {
        if let Some(last) = self.last_control_change {
            if now.saturating_duration_since(last) < self.mapping.message_sensitivity() {
                log::trace!("rate limited control change {controller} = {value}");
                return 0;
            }
        }
        let Some(controller) = to_data_byte(controller) else {
            log::debug!("controller {controller} out of MIDI range, dropped");
            return 0;
        };
        sink.emit_control_change(controller, value);
        self.last_control_change = Some(now);
        1
    }
}

fn to_data_byte(value: u16) -> Option<u8> {
    (value <= MIDI_DATA_MAX).then_some(value as u8)
}

fn emit_note<S: MidiSink>(sink: &mut S, note: u16, on: bool) -> usize {
    match to_data_byte(note) {
        Some(note) => {
            sink.emit_note(note, on);
            1
        }
        None => {
            log::debug!("note {note} out of MIDI range, dropped");
            0
        }
    }
}

fn pulse<S: MidiSink>(sink: &mut S, note: u16) -> usize {
    emit_note(sink, note, true) + emit_note(sink, note, false)
}
