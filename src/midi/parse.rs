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


use midly::live::LiveEvent;
use midly::MidiMessage;

use crate::samples::NoteEvent;

/// The MIDI key that plays a sample at its recorded pitch.
pub const MIDDLE_C: u8 = 60;

/// Channel mode message that releases every note.
const ALL_NOTES_OFF: u8 = 123;

fn pitch(key: midly::num::u7) -> f32 {
    key.as_int() as f32 - MIDDLE_C as f32
}

/// Converts a raw MIDI message into a note event.
///
/// `channel` is zero-based; when set, messages on other channels are ignored. A note-on
/// with velocity zero is a note-off. Anything that isn't a note is ignored.
pub fn to_note_event(raw: &[u8], channel: Option<u8>) -> Option<NoteEvent> {
    let LiveEvent::Midi {
        channel: event_channel,
        message,
    } = LiveEvent::parse(raw).ok()?
    else {
        return None;
    };
    if channel.is_some_and(|channel| channel != event_channel.as_int()) {
        return None;
    }

    match message {
        MidiMessage::NoteOn { key, vel } if vel.as_int() == 0 => Some(NoteEvent::NoteOff {
            pitch: Some(pitch(key)),
        }),
        MidiMessage::NoteOn { key, vel } => Some(NoteEvent::NoteOn {
            pitch: pitch(key),
            velocity: vel.as_int() as f32 / 127.0,
        }),
        MidiMessage::NoteOff { key, .. } => Some(NoteEvent::NoteOff {
            pitch: Some(pitch(key)),
        }),
        MidiMessage::Controller { controller, .. } if controller.as_int() == ALL_NOTES_OFF => {
            Some(NoteEvent::NoteOff { pitch: None })
        }
        _ => None,
    }
}
