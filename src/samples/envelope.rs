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

//! Linear attack/decay/sustain/release envelope.
//!
//! Segments are driven by sample counters rather than accumulated increments, so a
//! segment of N samples lands exactly on its target at sample N.

use crate::params::ParameterSnapshot;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnvelopeStage {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// Envelope timing in samples.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnvelopeSettings {
    pub attack: u32,
    pub decay: u32,
    pub sustain: f32,
    pub release: u32,
}

impl EnvelopeSettings {
    pub fn from_seconds(
        attack: f32,
        decay: f32,
        sustain: f32,
        release: f32,
        sample_rate: f64,
    ) -> Self {
        let samples = |seconds: f32| (seconds.max(0.0) as f64 * sample_rate).round() as u32;
        Self {
            attack: samples(attack),
            decay: samples(decay),
            sustain: sustain.clamp(0.0, 1.0),
            release: samples(release),
        }
    }

    pub fn from_params(params: &ParameterSnapshot, sample_rate: f64) -> Self {
        Self::from_seconds(
            params.attack,
            params.decay,
            params.sustain,
            params.release,
            sample_rate,
        )
    }
}

#[derive(Clone, Debug)]
pub struct Envelope {
    stage: EnvelopeStage,
    level: f32,
    from: f32,
    to: f32,
    length: u32,
    position: u32,
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new()
    }
}

impl Envelope {
    pub fn new() -> Self {
        Self {
            stage: EnvelopeStage::Idle,
            level: 0.0,
            from: 0.0,
            to: 0.0,
            length: 0,
            position: 0,
        }
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn is_active(&self) -> bool {
        self.stage != EnvelopeStage::Idle
    }

    /// Restarts the attack from the current level, whatever the stage.
    pub fn note_on(&mut self, settings: &EnvelopeSettings) {
        self.begin(EnvelopeStage::Attack, 1.0, settings.attack);
    }

    /// Starts the release from the current level. Ignored when idle or already releasing.
    pub fn note_off(&mut self, settings: &EnvelopeSettings) {
        if matches!(self.stage, EnvelopeStage::Idle | EnvelopeStage::Release) {
            return;
        }
        self.begin(EnvelopeStage::Release, 0.0, settings.release);
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Advances one sample and returns the new level.
    #[inline]
    pub fn next_sample(&mut self, settings: &EnvelopeSettings) -> f32 {
        match self.stage {
            EnvelopeStage::Idle => {
                self.level = 0.0;
            }
            EnvelopeStage::Sustain => {
                self.level = settings.sustain;
            }
            EnvelopeStage::Attack | EnvelopeStage::Decay | EnvelopeStage::Release => {
                self.position += 1;
                if self.position >= self.length {
                    self.level = self.to;
                    self.finish_segment(settings);
                } else {
                    let t = self.position as f32 / self.length as f32;
                    self.level = self.from + (self.to - self.from) * t;
                }
            }
        }
        self.level
    }

    fn begin(&mut self, stage: EnvelopeStage, target: f32, length: u32) {
        self.stage = stage;
        self.from = self.level;
        self.to = target;
        self.length = length;
        self.position = 0;
    }

    fn finish_segment(&mut self, settings: &EnvelopeSettings) {
        match self.stage {
            EnvelopeStage::Attack => {
                self.begin(EnvelopeStage::Decay, settings.sustain, settings.decay)
            }
            EnvelopeStage::Decay => self.stage = EnvelopeStage::Sustain,
            EnvelopeStage::Release => {
                self.stage = EnvelopeStage::Idle;
                self.level = 0.0;
            }
            EnvelopeStage::Idle | EnvelopeStage::Sustain => {}
        }
    }
}
