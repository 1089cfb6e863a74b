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

//! Voice allocation with oldest-first stealing.

use super::voice::Voice;

/// Where a new note should play.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Allocation {
    pub index: usize,
    /// True if the slot was playing and its note is being cut off.
    pub stolen: bool,
    /// The start order to stamp on the new note.
    pub start_order: u64,
}

/// Hands out voice slots and a strictly increasing start order.
#[derive(Debug, Default)]
pub struct VoiceAllocator {
    next_order: u64,
}

impl VoiceAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a fresh start order stamp.
    pub fn next_start_order(&mut self) -> u64 {
        let order = self.next_order;
        self.next_order += 1;
        order
    }

    /// Chooses a slot among the first `voice_count` voices.
    ///
    /// The first idle slot wins. If every slot is playing, the one with the oldest
    /// start order is stolen. Returns `None` only when there are no usable slots.
    pub fn allocate(&mut self, voices: &[Voice], voice_count: usize) -> Option<Allocation> {
        let usable = &voices[..voice_count.min(voices.len())];
        if usable.is_empty() {
            return None;
        }

        let (index, stolen) = match usable.iter().position(|voice| !voice.is_active()) {
            Some(index) => (index, false),
            None => {
                let (index, _) = usable
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, voice)| voice.start_order().unwrap_or(u64::MAX))?;
                (index, true)
            }
        };
        Some(Allocation {
            index,
            stolen,
            start_order: self.next_start_order(),
        })
    }
}
