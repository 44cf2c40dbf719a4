use crate::wire::{WireWord, MAX_VALUE};

use super::WireSink;

/// Samples above this snap to the top rail without smoothing.
const NEAR_RAIL: u16 = 1015;
const SAMPLES_PER_READING: u8 = 4;
/// Number of single-ended channels on the external converter.
pub const ADC_CHANNELS: u8 = 8;

/// External 10-bit analog-to-digital converter.
pub trait AdcReader {
    /// Read one conversion. Returns `None` for channels outside `0..8`.
    fn read_channel(&mut self, channel: u8, single_ended: bool) -> Option<u16>;
}

/// One potentiometer or fader.
///
/// Collects four samples per reading and only reports readings that leave
/// the dead-band around the last reported value. The rails (0 and 1023)
/// bypass both the averaging and the dead-band so the ends of travel are
/// always reachable.
#[derive(Debug, Clone)]
pub struct AnalogChannel {
    id: u8,
    channel: u8,
    sensitivity: u16,
    sum: u16,
    count: u8,
    last_reported: Option<u16>,
}

impl AnalogChannel {
    pub fn new(id: u8, channel: u8, sensitivity: u16) -> Self {
        Self {
            id,
            channel,
            sensitivity,
            sum: 0,
            count: 0,
            last_reported: None,
        }
    }

    pub fn last_reported(&self) -> Option<u16> {
        self.last_reported
    }

    /// Raw conversion from the converter.
    pub fn sample<A: AdcReader>(&self, adc: &mut A) -> Option<u16> {
        adc.read_channel(self.channel, true)
    }

    /// Smoothed reading, or `None` while the accumulator is still filling.
    pub fn read<A: AdcReader>(&mut self, adc: &mut A) -> Option<u16> {
        let Some(raw) = self.sample(adc) else {
            log::trace!("adc channel {} out of range", self.channel);
            return None;
        };

        if raw == 0 || raw == MAX_VALUE {
            return Some(raw);
        }
        if raw > NEAR_RAIL {
            return Some(MAX_VALUE);
        }

        self.sum += raw;
        self.count += 1;
        if self.count < SAMPLES_PER_READING {
            return None;
        }

        let value = self.sum / SAMPLES_PER_READING as u16;
        self.sum = 0;
        self.count = 0;
        Some(value)
    }

    /// Take a reading and decide whether it must be reported.
    ///
    /// A `true` result has already updated the last reported value, so the
    /// caller must transmit [`Self::last_reported`] right away. Prefer
    /// [`Self::poll`], which does both.
    pub fn is_new<A: AdcReader>(&mut self, adc: &mut A) -> bool {
        let Some(value) = self.read(adc) else {
            return false;
        };

        let at_rail = value == 0 || value == MAX_VALUE;
        let changed = match self.last_reported {
            None => true,
            Some(last) if at_rail => value != last,
            Some(last) => {
                let delta = (value as i32 - last as i32).abs();
                delta > self.sensitivity as i32
            }
        };

        if changed {
            self.last_reported = Some(value);
        }
        changed
    }

    /// Run one conditioning step and send the new value if there is one.
    pub fn poll<A: AdcReader, S: WireSink>(&mut self, adc: &mut A, sink: &mut S) -> bool {
        if !self.is_new(adc) {
            return false;
        }
        match self.last_reported {
            Some(value) => {
                sink.send(WireWord::new(self.id, true, value));
                true
            }
            None => false,
        }
    }
}
