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

use super::playhead::Playhead;

/// Length of the retrigger crossfade in samples.
pub const CROSSFADE_LENGTH: u32 = 256;

/// Blends the playhead a voice had before a retrigger into the restarted one.
///
/// The outgoing playhead keeps advancing at its own ratio for the whole window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Crossfade {
    outgoing: Playhead,
    elapsed: u32,
    length: u32,
}

impl Crossfade {
    pub fn new(outgoing: Playhead, length: u32) -> Self {
        Self {
            outgoing,
            elapsed: 0,
            length: length.max(1),
        }
    }

    /// Weights for the outgoing and incoming signal. They always sum to one.
    #[inline]
    pub fn weights(&self) -> (f32, f32) {
        let incoming = self.elapsed as f32 / self.length as f32;
        (1.0 - incoming, incoming)
    }

    pub fn outgoing(&self) -> &Playhead {
        &self.outgoing
    }

    /// Moves to the next sample. Returns true when the window is over.
    #[inline]
    pub fn advance(&mut self) -> bool {
        self.outgoing.advance();
        self.elapsed += 1;
        self.elapsed >= self.length
    }
}
