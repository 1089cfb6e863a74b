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

/// A portamento that moves between two pitches in discrete steps.
///
/// Step `k` of `steps` sits at `start + (target - start) * k / (steps - 1)`, so the
/// glide visits exactly `steps` evenly spaced pitches, both endpoints included.
/// Every step is held for `samples_per_step` samples.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SteppedGlide {
    start: f32,
    target: f32,
    steps: u32,
    samples_per_step: u32,
    step: u32,
    counter: u32,
}

impl SteppedGlide {
    pub fn new(start: f32, target: f32, steps: u32, samples_per_step: u32) -> Self {
        Self {
            start,
            target,
            steps: steps.max(2),
            samples_per_step: samples_per_step.max(1),
            step: 0,
            counter: 0,
        }
    }

    /// Splits a glide time across `steps`. Always at least one sample per step.
    pub fn samples_per_step(glide_time_ms: f32, steps: u32, sample_rate: f64) -> u32 {
        let total = (glide_time_ms.max(0.0) as f64 * 0.001 * sample_rate) as u32;
        (total / steps.max(1)).max(1)
    }

    /// The pitch for the current sample.
    #[inline]
    pub fn pitch(&self) -> f32 {
        if self.is_finished() {
            return self.target;
        }
        let progress = self.step as f32 / (self.steps - 1) as f32;
        self.start + (self.target - self.start) * progress
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    /// Whether the glide has arrived on the target pitch.
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.step + 1 >= self.steps
    }

    /// Moves to the next sample. Returns true once the target is reached.
    #[inline]
    pub fn advance(&mut self) -> bool {
        if !self.is_finished() {
            self.counter += 1;
            if self.counter >= self.samples_per_step {
                self.counter = 0;
                self.step += 1;
            }
        }
        self.is_finished()
    }
}
