//! Quadrature rotary encoder with an integrated push button.
//!
//! Both quadrature pins and the button are serviced from interrupts. The
//! shared [`RotaryState`] lives behind a critical-section mutex so the
//! polling loop can read and clear the pending flags without tearing.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::CriticalSectionMutex;

use crate::wire::{rotary_payload, RotaryValue, WireWord, ROTARY_ID};

use super::WireSink;

/// Quadrature edges per mechanical detent.
pub const EDGES_PER_DETENT: u8 = 4;
/// Shortest button gap (ms) that still counts as a double click.
pub const DOUBLE_CLICK_MIN_MS: u32 = 100;
/// Button gaps (ms) below this count as a double click.
pub const DOUBLE_CLICK_MAX_MS: u32 = 450;
/// Button gaps (ms) above this restart the double-click window.
pub const CLICK_RESET_MS: u32 = 300;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Clockwise,
    CounterClockwise,
}

impl Direction {
    /// Direction for a 4-bit transition code `current << 2 | previous`.
    pub fn from_transition(code: u8) -> Option<Self> {
        match code & 0x0F {
            0b1101 | 0b0100 | 0b0010 | 0b1011 => Some(Self::Clockwise),
            0b1110 | 0b0111 | 0b0001 | 0b1000 => Some(Self::CounterClockwise),
            _ => None,
        }
    }

    fn wire_value(self) -> RotaryValue {
        match self {
            Self::Clockwise => RotaryValue::Clockwise,
            Self::CounterClockwise => RotaryValue::CounterClockwise,
        }
    }
}

/// Interrupt-shared encoder state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RotaryState {
    pub last_code: u8,
    pub edges: u8,
    pub direction: Direction,
    pub last_click_ms: u32,
    pub pending_rotation: bool,
    pub pending_double_click: bool,
}

impl RotaryState {
    pub const fn new() -> Self {
        Self {
            last_code: 0,
            edges: 0,
            direction: Direction::Clockwise,
            last_click_ms: 0,
            pending_rotation: false,
            pending_double_click: false,
        }
    }

    /// Feed one quadrature edge given the 2-bit pin code `a << 1 | b`.
    ///
    /// The edge counter advances on every edge, recognised or not. The
    /// direction reported for a detent is whatever the last recognised
    /// transition latched, even if the direction flipped mid-detent.
    pub fn quadrature_edge(&mut self, code: u8) {
        let code = code & 0b11;
        let transition = (code << 2) | self.last_code;
        if let Some(direction) = Direction::from_transition(transition) {
            self.direction = direction;
        }
        self.last_code = code;

        self.edges += 1;
        if self.edges >= EDGES_PER_DETENT {
            self.pending_rotation = true;
            self.edges = 0;
        }
    }

    /// Feed one button release at `now_ms`.
    ///
    /// Gaps in `[300, 450)` hit the double-click branch first and therefore
    /// never restart the window.
    pub fn button_release(&mut self, now_ms: u32) {
        let delta = now_ms.wrapping_sub(self.last_click_ms);
        if (DOUBLE_CLICK_MIN_MS..DOUBLE_CLICK_MAX_MS).contains(&delta) {
            self.pending_double_click = true;
        } else if delta > CLICK_RESET_MS {
            self.last_click_ms = now_ms;
        }
    }
}

/// Events taken out of the shared state by one poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pending {
    pub rotation: Option<Direction>,
    pub double_click: bool,
}

pub struct RotaryEncoder {
    state: CriticalSectionMutex<RefCell<RotaryState>>,
}

impl Default for RotaryEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl RotaryEncoder {
    /// Usable as a `static` shared between interrupt handlers and the loop.
    pub const fn new() -> Self {
        Self {
            state: CriticalSectionMutex::new(RefCell::new(RotaryState::new())),
        }
    }

    /// Quadrature pin-change interrupt handler body.
    pub fn on_quadrature_edge(&self, a: bool, b: bool) {
        let code = ((a as u8) << 1) | b as u8;
        self.state
            .lock(|state| state.borrow_mut().quadrature_edge(code));
    }

    /// Button rising-edge (release) interrupt handler body.
    pub fn on_button_release(&self, now_ms: u32) {
        self.state
            .lock(|state| state.borrow_mut().button_release(now_ms));
    }

    /// Read and clear both pending flags in one critical section.
    pub fn take_pending(&self) -> Pending {
        self.state.lock(|state| {
            let mut state = state.borrow_mut();
            let pending = Pending {
                rotation: state.pending_rotation.then_some(state.direction),
                double_click: state.pending_double_click,
            };
            state.pending_rotation = false;
            state.pending_double_click = false;
            pending
        })
    }

    pub fn snapshot(&self) -> RotaryState {
        self.state.lock(|state| state.borrow().clone())
    }

    /// Send whatever the interrupts left pending.
    ///
    /// `button_held` is sampled by the caller at send time and becomes the
    /// super-speed bit of a rotation. Double clicks never carry it.
    pub fn poll<S: WireSink>(&self, button_held: bool, sink: &mut S) -> usize {
        let pending = self.take_pending();
        let mut sent = 0;
        if let Some(direction) = pending.rotation {
            let payload = rotary_payload(direction.wire_value(), button_held);
            sink.send(WireWord::new(ROTARY_ID, false, payload));
            sent += 1;
        }
        if pending.double_click {
            let payload = rotary_payload(RotaryValue::DoubleClick, false);
            sink.send(WireWord::new(ROTARY_ID, false, payload));
            sent += 1;
        }
        sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(encoder: &RotaryEncoder, codes: &[u8]) {
        for &code in codes {
            encoder.on_quadrature_edge(code & 0b10 != 0, code & 0b01 != 0);
        }
    }

    #[test]
    fn one_clockwise_detent() {
        let encoder = RotaryEncoder::new();
        // starts at 00, so this is 00 -> 01 -> 11 -> 10 -> 00
        feed(&encoder, &[0b01, 0b11, 0b10]);
        assert!(!encoder.snapshot().pending_rotation);
        feed(&encoder, &[0b00]);

        let state = encoder.snapshot();
        assert!(state.pending_rotation);
        assert_eq!(state.direction, Direction::Clockwise);
        assert_eq!(state.edges, 0);
    }

    #[test]
    fn one_counter_clockwise_detent() {
        let encoder = RotaryEncoder::new();
        feed(&encoder, &[0b10, 0b11, 0b01, 0b00]);
        assert_eq!(
            encoder.take_pending().rotation,
            Some(Direction::CounterClockwise)
        );
    }

    #[test]
    fn invalid_transition_counts_but_keeps_direction() {
        let mut state = RotaryState::new();
        state.quadrature_edge(0b10); // 10|00 -> counter-clockwise
        assert_eq!(state.direction, Direction::CounterClockwise);
        state.quadrature_edge(0b01); // 01|10 is not a valid step
        assert_eq!(state.direction, Direction::CounterClockwise);
        assert_eq!(state.edges, 2);
    }

    #[test]
    fn direction_reflects_last_recognised_edge_only() {
        let mut state = RotaryState::new();
        state.quadrature_edge(0b10); // ccw
        state.quadrature_edge(0b11); // ccw
        state.quadrature_edge(0b10); // 10|11 cw
        state.quadrature_edge(0b00); // 00|10 cw
        assert!(state.pending_rotation);
        assert_eq!(state.direction, Direction::Clockwise);
    }

    #[test]
    fn double_click_inside_window() {
        let mut state = RotaryState::new();
        state.button_release(1_000);
        assert_eq!(state.last_click_ms, 1_000);
        state.button_release(1_200);
        assert!(state.pending_double_click);
        assert_eq!(state.last_click_ms, 1_000);
    }

    #[test]
    fn slow_second_click_restarts_window() {
        let mut state = RotaryState::new();
        state.button_release(1_000);
        state.button_release(1_500);
        assert!(!state.pending_double_click);
        assert_eq!(state.last_click_ms, 1_500);
    }

    #[test]
    fn bounce_below_minimum_is_ignored() {
        let mut state = RotaryState::new();
        state.button_release(1_000);
        state.button_release(1_050);
        assert!(!state.pending_double_click);
        assert_eq!(state.last_click_ms, 1_000);
    }

    #[test]
    fn overlap_window_prefers_double_click() {
        let mut state = RotaryState::new();
        state.button_release(1_000);
        state.button_release(1_350);
        assert!(state.pending_double_click);
        assert_eq!(state.last_click_ms, 1_000);
    }

    #[test]
    fn poll_sends_rotation_with_super_speed_sampled_at_send() {
        let encoder = RotaryEncoder::new();
        feed(&encoder, &[0b01, 0b11, 0b10, 0b00]);
        let mut out: Vec<u8> = Vec::new();

        assert_eq!(encoder.poll(true, &mut out), 1);
        let payload = rotary_payload(RotaryValue::Clockwise, true);
        let expected = WireWord::new(ROTARY_ID, false, payload);
        assert_eq!(out, expected.to_bytes().to_vec());

        out.clear();
        assert_eq!(encoder.poll(true, &mut out), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn poll_sends_double_click_without_super_speed() {
        let encoder = RotaryEncoder::new();
        encoder.on_button_release(1_000);
        encoder.on_button_release(1_200);
        let mut out: Vec<u8> = Vec::new();

        assert_eq!(encoder.poll(true, &mut out), 1);
        let payload = rotary_payload(RotaryValue::DoubleClick, false);
        let expected = WireWord::new(ROTARY_ID, false, payload);
        assert_eq!(out, expected.to_bytes().to_vec());
        assert!(!encoder.snapshot().pending_double_click);
    }
}
