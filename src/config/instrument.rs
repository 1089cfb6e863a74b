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


use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use duration_string::DurationString;
use serde::Deserialize;
use tracing::info;

use super::error::ConfigError;
use crate::params::{ParameterSnapshot, VOICE_COUNT_RANGE};
use crate::samples::BUILTIN_PATH;

const DEFAULT_SAMPLE_RATE: u32 = 48000;
const DEFAULT_OUTPUT_CHANNELS: u16 = 2;
const DEFAULT_BLOCK_SIZE: usize = 512;

/// Whether notes share one voice or are spread across several.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VoiceMode {
    /// Every note retriggers voice 0.
    #[default]
    Mono,
    /// Notes take free voices, stealing the oldest when all are busy.
    Poly,
}

/// A sample to load, with its per-sample settings.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct SampleEntry {
    /// File path, or `Built-in` for the bundled sample.
    path: PathBuf,

    /// Sample gain in dB.
    #[serde(default)]
    gain_db: f32,

    /// Sample transpose in semitones.
    #[serde(default)]
    transpose: f32,
}

impl SampleEntry {
    pub fn new(path: PathBuf, gain_db: f32, transpose: f32) -> SampleEntry {
        SampleEntry {
            path,
            gain_db,
            transpose,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn gain_db(&self) -> f32 {
        self.gain_db
    }

    pub fn transpose(&self) -> f32 {
        self.transpose
    }

    /// Whether this entry names the built-in sample rather than a file.
    pub fn is_builtin(&self) -> bool {
        self.path == Path::new(BUILTIN_PATH)
    }

    /// Makes a relative path relative to `base` instead.
    fn resolve(&self, base: &Path) -> SampleEntry {
        if self.is_builtin() || self.path.is_absolute() {
            return self.clone();
        }
        SampleEntry {
            path: base.join(&self.path),
            ..self.clone()
        }
    }
}

/// Initial parameter values. Anything left out keeps its default.
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ParametersConfig {
    /// Attack time as a duration string, e.g. `20ms`.
    attack: Option<String>,
    decay: Option<String>,
    sustain: Option<f32>,
    release: Option<String>,
    master_gain_db: Option<f32>,
    voices: Option<u32>,
    glide_time: Option<String>,
    glide_steps: Option<u32>,
    transpose: Option<f32>,
    fine_tune: Option<f32>,
    chain_selector: Option<u32>,
    randomization: Option<f32>,
}

impl ParametersConfig {
    /// Builds the parameter snapshot these settings describe.
    ///
    /// Values are passed through unclamped; `Parameters` clamps them when applied.
    pub fn to_snapshot(&self) -> Result<ParameterSnapshot, ConfigError> {
        let mut snapshot = ParameterSnapshot::default();
        if let Some(voices) = self.voices {
            if !VOICE_COUNT_RANGE.contains(&voices) {
                return Err(ConfigError::Invalid(format!(
                    "voices must be between {} and {}, got {}",
                    VOICE_COUNT_RANGE.start(),
                    VOICE_COUNT_RANGE.end(),
                    voices
                )));
            }
            snapshot.voice_count = voices;
        }
        if let Some(attack) = duration("attack", &self.attack)? {
            snapshot.attack = attack.as_secs_f32();
        }
        if let Some(decay) = duration("decay", &self.decay)? {
            snapshot.decay = decay.as_secs_f32();
        }
        if let Some(release) = duration("release", &self.release)? {
            snapshot.release = release.as_secs_f32();
        }
        if let Some(glide_time) = duration("glide_time", &self.glide_time)? {
            snapshot.glide_time_ms = glide_time.as_secs_f32() * 1000.0;
        }
        snapshot.sustain = self.sustain.unwrap_or(snapshot.sustain);
        snapshot.master_gain_db = self.master_gain_db.unwrap_or(snapshot.master_gain_db);
        snapshot.glide_steps = self.glide_steps.unwrap_or(snapshot.glide_steps);
        snapshot.transpose = self.transpose.unwrap_or(snapshot.transpose);
        snapshot.fine_tune = self.fine_tune.unwrap_or(snapshot.fine_tune);
        snapshot.chain_selector = self.chain_selector.unwrap_or(snapshot.chain_selector);
        snapshot.randomization = self.randomization.unwrap_or(snapshot.randomization);
        Ok(snapshot)
    }
}

fn duration(field: &'static str, value: &Option<String>) -> Result<Option<Duration>, ConfigError> {
    match value {
        Some(value) => match DurationString::from_string(value.clone()) {
            Ok(duration) => Ok(Some(duration.into())),
            Err(e) => Err(ConfigError::InvalidDuration {
                field,
                reason: e.to_string(),
            }),
        },
        None => Ok(None),
    }
}

/// A YAML representation of an instrument.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct InstrumentConfig {
    /// Output sample rate in Hz (default: 48000).
    sample_rate: Option<u32>,

    /// Number of interleaved output channels (default: 2).
    output_channels: Option<u16>,

    /// Frames per block when rendering offline (default: 512).
    block_size: Option<usize>,

    #[serde(default)]
    voice_mode: VoiceMode,

    /// Output device name. The host default is used when unset.
    audio_device: Option<String>,

    /// MIDI input port name, matched as a substring.
    midi_device: Option<String>,

    /// Only accept notes on this MIDI channel (1-16). All channels when unset.
    midi_channel: Option<u8>,

    #[serde(default)]
    parameters: ParametersConfig,

    #[serde(default)]
    samples: Vec<SampleEntry>,

    /// Where relative sample paths are resolved from.
    #[serde(skip)]
    base_dir: PathBuf,
}

impl InstrumentConfig {
    /// Loads an instrument from a YAML file, applying `GLIDER__*` environment overrides.
    pub fn deserialize(path: &Path) -> Result<InstrumentConfig, ConfigError> {
        let mut instrument = Config::builder()
            .add_source(File::from(path))
            .add_source(
                Environment::with_prefix("GLIDER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<InstrumentConfig>()?;
        instrument.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        instrument.validate()?;
        info!(
            path = ?path,
            samples = instrument.samples.len(),
            voice_mode = ?instrument.voice_mode,
            "Loaded instrument"
        );
        Ok(instrument)
    }

    /// Parses an instrument from a YAML string. Relative sample paths resolve against `base_dir`.
    pub fn from_yaml_str(yaml: &str, base_dir: &Path) -> Result<InstrumentConfig, ConfigError> {
        let mut instrument = Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?
            .try_deserialize::<InstrumentConfig>()?;
        instrument.base_dir = base_dir.to_path_buf();
        instrument.validate()?;
        Ok(instrument)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == Some(0) {
            return Err(ConfigError::Invalid("sample_rate must be above zero".into()));
        }
        if self.output_channels == Some(0) {
            return Err(ConfigError::Invalid(
                "output_channels must be above zero".into(),
            ));
        }
        if self.block_size == Some(0) {
            return Err(ConfigError::Invalid("block_size must be above zero".into()));
        }
        if let Some(channel) = self.midi_channel {
            if !(1..=16).contains(&channel) {
                return Err(ConfigError::Invalid(format!(
                    "midi_channel must be between 1 and 16, got {}",
                    channel
                )));
            }
        }
        self.parameters.to_snapshot()?;
        Ok(())
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE)
    }

    pub fn output_channels(&self) -> u16 {
        self.output_channels.unwrap_or(DEFAULT_OUTPUT_CHANNELS)
    }

    pub fn block_size(&self) -> usize {
        self.block_size.unwrap_or(DEFAULT_BLOCK_SIZE)
    }

    pub fn voice_mode(&self) -> VoiceMode {
        self.voice_mode
    }

    pub fn audio_device(&self) -> Option<&str> {
        self.audio_device.as_deref()
    }

    pub fn midi_device(&self) -> Option<&str> {
        self.midi_device.as_deref()
    }

    /// The MIDI channel filter, zero-based.
    pub fn midi_channel(&self) -> Option<u8> {
        self.midi_channel.map(|channel| channel - 1)
    }

    /// The initial parameter values.
    pub fn parameters(&self) -> Result<ParameterSnapshot, ConfigError> {
        self.parameters.to_snapshot()
    }

    /// The sample list with relative paths resolved.
    pub fn samples(&self) -> Vec<SampleEntry> {
        self.samples
            .iter()
            .map(|entry| entry.resolve(&self.base_dir))
            .collect()
    }
}
