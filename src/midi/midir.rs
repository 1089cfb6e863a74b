// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//


use std::fmt;

use crossbeam_channel::{Sender, TrySendError};
use midir::{MidiInput, MidiInputConnection, MidiInputPort};
use tracing::{debug, info, span, warn, Level};

use super::parse::to_note_event;
use super::MidiError;
use crate::samples::NoteEvent;

/// A MIDI input port.
pub struct InputDevice {
    name: String,
    port: MidiInputPort,
}

impl InputDevice {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Forwards note events from this port into `sender` until the returned
    /// connection is dropped.
    ///
    /// `channel` is zero-based. Events are dropped when the receiver falls behind.
    pub fn watch_events(
        &self,
        channel: Option<u8>,
        sender: Sender<NoteEvent>,
    ) -> Result<MidiInputConnection<()>, MidiError> {
        let span = span!(Level::INFO, "watch notes (midir)");
        let _enter = span.enter();

        let input = MidiInput::new("glider input")?;
        let connection = input
            .connect(
                &self.port,
                "glider note input",
                move |_, raw_event, _| {
                    let Some(event) = to_note_event(raw_event, channel) else {
                        return;
                    };
                    debug!(event = ?event, "Received note event.");
                    match sender.try_send(event) {
                        Ok(()) => {}
                        Err(TrySendError::Full(_)) => warn!("Note queue full, dropping event."),
                        Err(TrySendError::Disconnected(_)) => {
                            debug!("Note receiver gone, dropping event.")
                        }
                    }
                },
                (),
            )
            .map_err(|e| MidiError::Connect(e.to_string()))?;

        info!(device = %self.name, channel = ?channel, "Watching MIDI notes.");
        Ok(connection)
    }
}

impl fmt::Display for InputDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Lists MIDI input ports, sorted by name.
pub fn list() -> Result<Vec<InputDevice>, MidiError> {
    let input = MidiInput::new("glider input listing")?;
    let mut devices = Vec::new();
    for port in input.ports() {
        let name = input.port_name(&port)?;
        devices.push(InputDevice { name, port });
    }
    devices.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(devices)
}

/// Gets the one input whose name contains `name`.
pub fn get(name: &str) -> Result<InputDevice, MidiError> {
    let mut matches = list()?
        .into_iter()
        .filter(|device| device.name.contains(name))
        .collect::<Vec<InputDevice>>();

    match matches.len() {
        0 => Err(MidiError::NotFound(name.to_string())),
        1 => Ok(matches.swap_remove(0)),
        _ => Err(MidiError::Ambiguous(
            matches
                .iter()
                .map(|device| device.name.clone())
                .collect::<Vec<String>>()
                .join(", "),
        )),
    }
}
