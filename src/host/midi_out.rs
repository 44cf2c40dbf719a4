use midir::{MidiOutput, MidiOutputConnection, MidiOutputPort, SendError};

use crate::error::{BridgeError, Result};

use super::remap::MidiSink;

const CLIENT_NAME: &str = "deck-bridge";
const CONNECTION_NAME: &str = "deck-bridge-out";
const CHANNEL: u8 = 0;
const VELOCITY: u8 = 100;

const NOTE_OFF: u8 = 0x80;
const NOTE_ON: u8 = 0x90;
const CONTROL_CHANGE: u8 = 0xB0;

/// Names of the MIDI output ports currently available.
pub fn list_ports() -> Result<Vec<String>> {
    let midi_out =
        MidiOutput::new(CLIENT_NAME).map_err(|err| BridgeError::MidiInit(err.to_string()))?;
    Ok(midi_out
        .ports()
        .iter()
        .filter_map(|port| midi_out.port_name(port).ok())
        .collect())
}

/// A connected MIDI output port.
pub struct MidiOut {
    connection: MidiOutputConnection,
    port_name: String,
}

impl MidiOut {
    /// Connect to the first port whose name contains `port_hint`
    /// (case-insensitive), or to the first port when the hint is empty.
    pub fn connect(port_hint: &str) -> Result<Self> {
        let midi_out =
            MidiOutput::new(CLIENT_NAME).map_err(|err| BridgeError::MidiInit(err.to_string()))?;
        let target_port = find_port(&midi_out, port_hint)?;

        let port_name = midi_out
            .port_name(&target_port)
            .unwrap_or_else(|_| "<unknown>".into());

        let connection = midi_out
            .connect(&target_port, CONNECTION_NAME)
            .map_err(|err| BridgeError::Connection(err.to_string()))?;

        log::info!("connected to MIDI output \"{port_name}\"");
        Ok(Self {
            connection,
            port_name,
        })
    }

    pub fn close(self) {
        log::info!("disconnecting from MIDI output \"{}\"", self.port_name);
        let _ = self.connection.close();
    }

    fn send(&mut self, message: &[u8; 3]) {
        if let Err(err) = self.connection.send(message) {
            report_send_error(&self.port_name, message, err);
        }
    }
}

fn find_port(midi_out: &MidiOutput, port_hint: &str) -> Result<MidiOutputPort> {
    let ports = midi_out.ports();
    if ports.is_empty() {
        return Err(BridgeError::PortNotFound(port_hint.to_string()));
    }

    if port_hint.trim().is_empty() {
        return Ok(ports[0].clone());
    }

    let hint = port_hint.to_lowercase();
    ports
        .iter()
        .find(|port| {
            midi_out
                .port_name(port)
                .map(|name| name.to_lowercase().contains(&hint))
                .unwrap_or(false)
        })
        .cloned()
        .ok_or_else(|| BridgeError::PortNotFound(port_hint.to_string()))
}

fn report_send_error(port_name: &str, message: &[u8; 3], err: SendError) {
    log::error!("midi out ({port_name}): failed to send {message:02X?}: {err}");
}

impl MidiSink for MidiOut {
    fn emit_note(&mut self, note: u8, on: bool) {
        let status = if on { NOTE_ON } else { NOTE_OFF };
        self.send(&[status | CHANNEL, note & 0x7F, VELOCITY]);
    }

    fn emit_control_change(&mut self, controller: u8, value: u8) {
        self.send(&[CONTROL_CHANGE | CHANNEL, controller & 0x7F, value & 0x7F]);
    }
}

/// Sink that only logs, for running without a MIDI port.
#[derive(Debug, Default)]
pub struct LogSink;

impl MidiSink for LogSink {
    fn emit_note(&mut self, note: u8, on: bool) {
        log::info!("note {note} {}", if on { "on" } else { "off" });
    }

    fn emit_control_change(&mut self, controller: u8, value: u8) {
        log::info!("cc {controller} = {value}");
    }
}
