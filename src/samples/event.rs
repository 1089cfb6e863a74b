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

/// A decoded note event.
///
/// Pitch is in semitones relative to MIDI note 60, which plays a sample at its
/// recorded pitch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NoteEvent {
    NoteOn {
        pitch: f32,
        /// 0 to 1.
        velocity: f32,
    },
    /// Releases the voice playing `pitch`, or every sounding voice when `None`.
    NoteOff { pitch: Option<f32> },
}

/// A note event positioned within a render block.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimedEvent {
    /// Frame offset from the start of the block.
    pub offset: usize,
    pub event: NoteEvent,
}

impl TimedEvent {
    pub fn new(offset: usize, event: NoteEvent) -> Self {
        Self { offset, event }
    }
}
