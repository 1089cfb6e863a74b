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


//! MIDI note input.

mod midir;
mod parse;

pub use self::midir::{get, list, InputDevice};
pub use self::parse::{to_note_event, MIDDLE_C};

#[derive(Debug, thiserror::Error)]
pub enum MidiError {
    #[error("MIDI init error: {0}")]
    Init(#[from] ::midir::InitError),

    #[error("MIDI port error: {0}")]
    PortInfo(#[from] ::midir::PortInfoError),

    #[error("Unable to connect to MIDI input: {0}")]
    Connect(String),

    #[error("No MIDI input found with name {0}")]
    NotFound(String),

    #[error("Found too many MIDI inputs that match ({0}), use a less ambiguous name")]
    Ambiguous(String),
}
