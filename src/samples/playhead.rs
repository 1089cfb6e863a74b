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

/// Playback rate for a pitch offset in semitones.
#[inline]
pub fn pitch_ratio(semitones: f32) -> f64 {
    (semitones as f64 / 12.0).exp2()
}

/// A fractional read position into a sample buffer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Playhead {
    /// Position in samples.
    pub position: f64,
    /// Samples advanced per output frame.
    pub ratio: f64,
}

impl Default for Playhead {
    fn default() -> Self {
        Self {
            position: 0.0,
            ratio: 1.0,
        }
    }
}

impl Playhead {
    pub fn new(ratio: f64) -> Self {
        Self {
            position: 0.0,
            ratio,
        }
    }

    /// Reads `data` at the current position with linear interpolation.
    /// The last sample is held; anything past it reads as silence.
    #[inline]
    pub fn read(&self, data: &[f32]) -> f32 {
        let index = self.position as usize;
        let frac = (self.position - index as f64) as f32;
        match (data.get(index), data.get(index + 1)) {
            (Some(s0), Some(s1)) => s0 + (s1 - s0) * frac,
            (Some(s0), None) => *s0,
            _ => 0.0,
        }
    }

    #[inline]
    pub fn advance(&mut self) {
        self.position += self.ratio;
    }

    /// Whether the position has run off the end of a buffer of `frames` samples.
    #[inline]
    pub fn is_past(&self, frames: usize) -> bool {
        self.position >= frames as f64
    }
}
