//! YAML configuration for the host bridge and the board layout.
//!
//! Every field has a default, so an empty file (or no file) is valid.

use std::{collections::HashSet, fs, path::Path, time::Duration};

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    error::{BridgeError, Result},
    firmware::analog::ADC_CHANNELS,
    wire::{KEYPAD_ID, MAX_ID, ROTARY_ID},
};

/// Host-side settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Case-insensitive substring of the MIDI output port name. Empty picks
    /// the first port.
    pub midi_port: String,
    /// Path of the byte stream coming from the boards.
    pub serial_port: String,
    pub mapping: MappingConfig,
}

/// How decoded events become notes and control changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    pub control_change_offset: u8,
    pub keypad_offset: u8,
    /// Minimum gap between any two control changes.
    pub message_sensitivity_ms: u64,
    /// Extra pulses replayed for a super-speed rotation.
    pub super_speed_multiplier: u8,
    pub rotary_notes: RotaryNotes,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            control_change_offset: 70,
            keypad_offset: 20,
            message_sensitivity_ms: 10,
            super_speed_multiplier: 5,
            rotary_notes: RotaryNotes::default(),
        }
    }
}

impl MappingConfig {
    pub fn message_sensitivity(&self) -> Duration {
        Duration::from_millis(self.message_sensitivity_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotaryNotes {
    pub clockwise: u8,
    pub counter_clockwise: u8,
    pub double_click: u8,
}

impl Default for RotaryNotes {
    fn default() -> Self {
        Self {
            clockwise: 116,
            counter_clockwise: 117,
            double_click: 118,
        }
    }
}

/// Inputs wired to a board.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub analog: Vec<AnalogConfig>,
    pub digital: Vec<DigitalConfig>,
    pub rotary: bool,
    pub keypad: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalogConfig {
    pub id: u8,
    pub channel: u8,
    #[serde(default = "default_sensitivity")]
    pub sensitivity: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitalConfig {
    pub id: u8,
}

fn default_sensitivity() -> u16 {
    8
}

impl BoardConfig {
    /// Check that every input has its own id and a usable channel.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        let ids = self
            .analog
            .iter()
            .map(|a| a.id)
            .chain(self.digital.iter().map(|d| d.id));

        for id in ids {
            if id > MAX_ID {
                return Err(BridgeError::IdOutOfRange(id));
            }
            if id == KEYPAD_ID || id == ROTARY_ID {
                return Err(BridgeError::ReservedId(id));
            }
            if !seen.insert(id) {
                return Err(BridgeError::DuplicateId(id));
            }
        }

        if let Some(bad) = self.analog.iter().find(|a| a.channel >= ADC_CHANNELS) {
            return Err(BridgeError::AdcChannel(bad.channel));
        }
        Ok(())
    }

    pub fn declares_digital(&self, id: u8) -> bool {
        self.digital.iter().any(|d| d.id == id)
    }
}

/// Load a YAML file, falling back to defaults when `path` does not exist.
pub fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        log::info!("{} not found, using defaults", path.display());
        return Ok(T::default());
    }
    let text = fs::read_to_string(path).map_err(|source| BridgeError::ConfigIo {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&text, path)
}

fn parse<T: DeserializeOwned + Default>(text: &str, path: &Path) -> Result<T> {
    if text.trim().is_empty() {
        return Ok(T::default());
    }
    serde_yaml::from_str(text).map_err(|source| BridgeError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_board(path: &Path) -> Result<BoardConfig> {
    let board: BoardConfig = load_or_default(path)?;
    board.validate()?;
    Ok(board)
}
