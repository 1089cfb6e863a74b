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
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::time::Duration;

use super::error::LoadError;
use crate::params::AtomicF32;

/// Per-sample gain range in dB.
pub const SAMPLE_GAIN_RANGE: RangeInclusive<f32> = -24.0..=24.0;

/// Per-sample transpose range in semitones.
pub const SAMPLE_TRANSPOSE_RANGE: RangeInclusive<f32> = -12.0..=12.0;

/// Path recorded for the built-in sample in saved state.
pub const BUILTIN_PATH: &str = "Built-in";

/// Where a record's audio came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SampleSource {
    File(PathBuf),
    Builtin,
}

impl fmt::Display for SampleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleSource::File(path) => write!(f, "{}", path.display()),
            SampleSource::Builtin => write!(f, "{}", BUILTIN_PATH),
        }
    }
}

/// A decoded sample held in memory, already at the engine's sample rate.
///
/// The audio is immutable once created. Gain and transpose can be changed at any
/// time, including while the render thread is reading the record.
pub struct SampleRecord {
    name: String,
    source: SampleSource,
    /// Planar audio, one vector per channel, all of equal length.
    channels: Vec<Vec<f32>>,
    frames: usize,
    sample_rate: u32,
    original_sample_rate: u32,
    gain_db: AtomicF32,
    transpose: AtomicF32,
}

impl SampleRecord {
    /// Creates a record. Fails if the channels are not all the same length.
    pub fn new(
        name: impl Into<String>,
        source: SampleSource,
        channels: Vec<Vec<f32>>,
        sample_rate: u32,
        original_sample_rate: u32,
    ) -> Result<Self, LoadError> {
        let name = name.into();
        let frames = channels.first().map(Vec::len).unwrap_or(0);
        if channels.iter().any(|channel| channel.len() != frames) {
            return Err(LoadError::ChannelLengthMismatch(name));
        }
        Ok(Self {
            name,
            source,
            channels,
            frames,
            sample_rate,
            original_sample_rate,
            gain_db: AtomicF32::new(0.0),
            transpose: AtomicF32::new(0.0),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &SampleSource {
        &self.source
    }

    /// The planar audio data.
    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Length of each channel in samples.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// The rate the audio is stored at.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// The rate the audio was decoded at, before resampling.
    pub fn original_sample_rate(&self) -> u32 {
        self.original_sample_rate
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames as f64 / self.sample_rate as f64)
    }

    pub fn gain_db(&self) -> f32 {
        self.gain_db.load()
    }

    /// Sets the gain, clamped to ±24 dB.
    pub fn set_gain_db(&self, db: f32) {
        self.gain_db.store(clamp(db, &SAMPLE_GAIN_RANGE));
    }

    pub fn transpose(&self) -> f32 {
        self.transpose.load()
    }

    /// Sets the transpose, clamped to ±12 semitones.
    pub fn set_transpose(&self, semitones: f32) {
        self.transpose
            .store(clamp(semitones, &SAMPLE_TRANSPOSE_RANGE));
    }

    /// Returns the memory size of the audio in bytes.
    pub fn memory_size(&self) -> usize {
        self.frames * self.channels.len() * std::mem::size_of::<f32>()
    }
}

fn clamp(value: f32, range: &RangeInclusive<f32>) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(*range.start(), *range.end())
}

impl fmt::Debug for SampleRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SampleRecord")
            .field("name", &self.name)
            .field("source", &self.source)
            .field("channels", &self.channels.len())
            .field("frames", &self.frames)
            .field("sample_rate", &self.sample_rate)
            .field("gain_db", &self.gain_db)
            .field("transpose", &self.transpose)
            .finish()
    }
}
