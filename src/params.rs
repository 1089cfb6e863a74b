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

//! Instrument parameters shared between the control side and the render thread.
//!
//! Every value lives in its own atomic so writers never block the audio callback.
//! The render engine reads all of them once per block through [`Parameters::snapshot`].

use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicU32, Ordering};

/// Hard cap on the number of voice slots the engine allocates.
pub const MAX_VOICES: usize = 16;

/// Highest chain selector position.
pub const CHAIN_SELECTOR_MAX: u32 = 63;

pub const ATTACK_RANGE: RangeInclusive<f32> = 0.01..=1.0;
pub const DECAY_RANGE: RangeInclusive<f32> = 0.001..=1.0;
pub const SUSTAIN_RANGE: RangeInclusive<f32> = 0.0..=1.0;
pub const RELEASE_RANGE: RangeInclusive<f32> = 0.001..=10.0;
pub const MASTER_GAIN_RANGE: RangeInclusive<f32> = -24.0..=24.0;
pub const GLIDE_TIME_RANGE: RangeInclusive<f32> = 0.0..=1000.0;
pub const GLIDE_STEPS_RANGE: RangeInclusive<u32> = 2..=16;
pub const TRANSPOSE_RANGE: RangeInclusive<f32> = -24.0..=24.0;
pub const FINE_TUNE_RANGE: RangeInclusive<f32> = -100.0..=100.0;

/// Voice counts accepted from configuration. The engine itself tolerates 0..=MAX_VOICES.
pub const VOICE_COUNT_RANGE: RangeInclusive<u32> = 1..=8;

pub const DEFAULT_ATTACK: f32 = 0.02;
pub const DEFAULT_DECAY: f32 = 1.0;
pub const DEFAULT_SUSTAIN: f32 = 1.0;
pub const DEFAULT_RELEASE: f32 = 4.0;
pub const DEFAULT_MASTER_GAIN_DB: f32 = -6.0;
pub const DEFAULT_VOICE_COUNT: u32 = 1;
pub const DEFAULT_GLIDE_TIME_MS: f32 = 100.0;
pub const DEFAULT_GLIDE_STEPS: u32 = 2;

/// An f32 stored as its bit pattern in an [`AtomicU32`].
pub(crate) struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub(crate) fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    #[inline]
    pub(crate) fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    #[inline]
    pub(crate) fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed)
    }
}

impl std::fmt::Debug for AtomicF32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.load())
    }
}

/// Converts decibels to a linear amplitude factor.
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

fn clamp_f32(value: f32, range: &RangeInclusive<f32>) -> f32 {
    if value.is_nan() {
        return *range.start();
    }
    value.clamp(*range.start(), *range.end())
}

/// A consistent view of every parameter, taken once per render block.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParameterSnapshot {
    /// Attack time in seconds.
    pub attack: f32,
    /// Decay time in seconds.
    pub decay: f32,
    /// Sustain level, 0 to 1.
    pub sustain: f32,
    /// Release time in seconds.
    pub release: f32,
    pub master_gain_db: f32,
    pub voice_count: u32,
    pub glide_time_ms: f32,
    pub glide_steps: u32,
    /// Global transpose in semitones.
    pub transpose: f32,
    /// Fine tune in cents.
    pub fine_tune: f32,
    pub chain_selector: u32,
    /// Probability (0 to 1) that a trigger picks a random sample instead of the chain position.
    pub randomization: f32,
}

impl Default for ParameterSnapshot {
    fn default() -> Self {
        Self {
            attack: DEFAULT_ATTACK,
            decay: DEFAULT_DECAY,
            sustain: DEFAULT_SUSTAIN,
            release: DEFAULT_RELEASE,
            master_gain_db: DEFAULT_MASTER_GAIN_DB,
            voice_count: DEFAULT_VOICE_COUNT,
            glide_time_ms: DEFAULT_GLIDE_TIME_MS,
            glide_steps: DEFAULT_GLIDE_STEPS,
            transpose: 0.0,
            fine_tune: 0.0,
            chain_selector: 0,
            randomization: 0.0,
        }
    }
}

/// The live parameter set. Share it behind an `Arc`.
#[derive(Debug)]
pub struct Parameters {
    attack: AtomicF32,
    decay: AtomicF32,
    sustain: AtomicF32,
    release: AtomicF32,
    master_gain_db: AtomicF32,
    voice_count: AtomicU32,
    glide_time_ms: AtomicF32,
    glide_steps: AtomicU32,
    transpose: AtomicF32,
    fine_tune: AtomicF32,
    chain_selector: AtomicU32,
    randomization: AtomicF32,
}

impl Default for Parameters {
    fn default() -> Self {
        Self::from_snapshot(&ParameterSnapshot::default())
    }
}

impl Parameters {
    /// Creates a parameter set holding the product defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a parameter set from the given values, clamping each one.
    pub fn from_snapshot(snapshot: &ParameterSnapshot) -> Self {
        let params = Self {
            attack: AtomicF32::new(DEFAULT_ATTACK),
            decay: AtomicF32::new(DEFAULT_DECAY),
            sustain: AtomicF32::new(DEFAULT_SUSTAIN),
            release: AtomicF32::new(DEFAULT_RELEASE),
            master_gain_db: AtomicF32::new(DEFAULT_MASTER_GAIN_DB),
            voice_count: AtomicU32::new(DEFAULT_VOICE_COUNT),
            glide_time_ms: AtomicF32::new(DEFAULT_GLIDE_TIME_MS),
            glide_steps: AtomicU32::new(DEFAULT_GLIDE_STEPS),
            transpose: AtomicF32::new(0.0),
            fine_tune: AtomicF32::new(0.0),
            chain_selector: AtomicU32::new(0),
            randomization: AtomicF32::new(0.0),
        };
        params.apply(snapshot);
        params
    }

    /// Writes every value of the snapshot into this set.
    pub fn apply(&self, snapshot: &ParameterSnapshot) {
        self.set_attack(snapshot.attack);
        self.set_decay(snapshot.decay);
        self.set_sustain(snapshot.sustain);
        self.set_release(snapshot.release);
        self.set_master_gain_db(snapshot.master_gain_db);
        self.set_voice_count(snapshot.voice_count);
        self.set_glide_time_ms(snapshot.glide_time_ms);
        self.set_glide_steps(snapshot.glide_steps);
        self.set_transpose(snapshot.transpose);
        self.set_fine_tune(snapshot.fine_tune);
        self.set_chain_selector(snapshot.chain_selector);
        self.set_randomization(snapshot.randomization);
    }

    /// Reads all parameters. Each value is read atomically; no lock is taken.
    pub fn snapshot(&self) -> ParameterSnapshot {
        ParameterSnapshot {
            attack: self.attack.load(),
            decay: self.decay.load(),
            sustain: self.sustain.load(),
            release: self.release.load(),
            master_gain_db: self.master_gain_db.load(),
            voice_count: self.voice_count.load(Ordering::Relaxed),
            glide_time_ms: self.glide_time_ms.load(),
            glide_steps: self.glide_steps.load(Ordering::Relaxed),
            transpose: self.transpose.load(),
            fine_tune: self.fine_tune.load(),
            chain_selector: self.chain_selector.load(Ordering::Relaxed),
            randomization: self.randomization.load(),
        }
    }

    pub fn set_attack(&self, seconds: f32) {
        self.attack.store(clamp_f32(seconds, &ATTACK_RANGE));
    }

    pub fn set_decay(&self, seconds: f32) {
        self.decay.store(clamp_f32(seconds, &DECAY_RANGE));
    }

    pub fn set_sustain(&self, level: f32) {
        self.sustain.store(clamp_f32(level, &SUSTAIN_RANGE));
    }

    pub fn set_release(&self, seconds: f32) {
        self.release.store(clamp_f32(seconds, &RELEASE_RANGE));
    }

    pub fn set_master_gain_db(&self, db: f32) {
        self.master_gain_db.store(clamp_f32(db, &MASTER_GAIN_RANGE));
    }

    /// Sets the number of usable voice slots. Zero silences the engine.
    pub fn set_voice_count(&self, count: u32) {
        self.voice_count
            .store(count.min(MAX_VOICES as u32), Ordering::Relaxed);
    }

    pub fn set_glide_time_ms(&self, ms: f32) {
        self.glide_time_ms.store(clamp_f32(ms, &GLIDE_TIME_RANGE));
    }

    pub fn set_glide_steps(&self, steps: u32) {
        self.glide_steps.store(
            steps.clamp(*GLIDE_STEPS_RANGE.start(), *GLIDE_STEPS_RANGE.end()),
            Ordering::Relaxed,
        );
    }

    pub fn set_transpose(&self, semitones: f32) {
        self.transpose.store(clamp_f32(semitones, &TRANSPOSE_RANGE));
    }

    pub fn set_fine_tune(&self, cents: f32) {
        self.fine_tune.store(clamp_f32(cents, &FINE_TUNE_RANGE));
    }

    pub fn set_chain_selector(&self, position: u32) {
        self.chain_selector
            .store(position.min(CHAIN_SELECTOR_MAX), Ordering::Relaxed);
    }

    pub fn set_randomization(&self, amount: f32) {
        self.randomization.store(clamp_f32(amount, &(0.0..=1.0)));
    }
}
