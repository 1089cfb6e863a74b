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


//! Offline rendering of note scripts.
//!
//! A note script is a YAML file listing notes with a start time and length:
//!
//! ```yaml
//! notes:
//!   - at: 0s
//!     note: 60
//!     velocity: 100
//!     length: 500ms
//!   - at: 250ms
//!     note: 67
//!     length: 1s
//! tail: 2s
//! ```
//!
//! The script is turned into a frame-accurate timeline and rendered through the same
//! block-splitting path the audio callback uses.

use std::path::Path;
use std::time::Duration;

use duration_string::DurationString;
use hound::{SampleFormat, WavSpec, WavWriter};
use serde::Deserialize;
use tracing::info;

use crate::midi::MIDDLE_C;
use crate::samples::{NoteEvent, SynthEngine, TimedEvent};

const DEFAULT_VELOCITY: u8 = 100;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Unable to read note script: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unable to parse note script: {0}")]
    Parse(#[from] serde_yml::Error),

    #[error("Invalid duration for {field}: {reason}")]
    InvalidDuration { field: &'static str, reason: String },

    #[error("Invalid note {note}: {reason}")]
    InvalidNote { note: u8, reason: &'static str },

    #[error("Unable to write WAV file: {0}")]
    Wav(#[from] hound::Error),
}

fn default_velocity() -> u8 {
    DEFAULT_VELOCITY
}

/// One note in a script.
#[derive(Deserialize, Debug, Clone)]
pub struct ScriptNote {
    /// Start time as a duration string.
    at: String,
    /// MIDI key. 60 plays samples at their recorded pitch.
    note: u8,
    /// MIDI velocity, 1 to 127 (default: 100).
    #[serde(default = "default_velocity")]
    velocity: u8,
    /// How long the note is held before its release starts.
    length: String,
}

/// A list of notes to render.
#[derive(Deserialize, Debug, Clone)]
pub struct NoteScript {
    notes: Vec<ScriptNote>,
    /// Extra time rendered after the last note-off (default: none).
    #[serde(default)]
    tail: Option<String>,
}

/// Note events placed on absolute frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    events: Vec<(u64, NoteEvent)>,
    frames: u64,
}

impl Timeline {
    pub fn events(&self) -> &[(u64, NoteEvent)] {
        &self.events
    }

    /// Total length in frames.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

fn parse_duration(field: &'static str, value: &str) -> Result<Duration, RenderError> {
    DurationString::from_string(value.to_string())
        .map(Duration::from)
        .map_err(|e| RenderError::InvalidDuration {
            field,
            reason: e.to_string(),
        })
}

fn to_frames(duration: Duration, sample_rate: u32) -> u64 {
    (duration.as_secs_f64() * sample_rate as f64).round() as u64
}

impl NoteScript {
    pub fn deserialize(path: &Path) -> Result<NoteScript, RenderError> {
        Self::from_yaml_str(&std::fs::read_to_string(path)?)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<NoteScript, RenderError> {
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Places every note-on and note-off on a frame at `sample_rate`.
    ///
    /// Events are ordered by frame. On a shared frame, note-offs come first so that a
    /// note ending where the next one begins doesn't release it.
    pub fn timeline(&self, sample_rate: u32) -> Result<Timeline, RenderError> {
        let mut events = Vec::with_capacity(self.notes.len() * 2);
        let mut end = 0u64;
        for note in &self.notes {
            if note.note > 127 {
                return Err(RenderError::InvalidNote {
                    note: note.note,
                    reason: "keys go up to 127",
                });
            }
            if note.velocity == 0 || note.velocity > 127 {
                return Err(RenderError::InvalidNote {
                    note: note.note,
                    reason: "velocity must be between 1 and 127",
                });
            }

            let start = to_frames(parse_duration("at", &note.at)?, sample_rate);
            let stop = start + to_frames(parse_duration("length", &note.length)?, sample_rate);
            let pitch = note.note as f32 - MIDDLE_C as f32;
            events.push((
                start,
                NoteEvent::NoteOn {
                    pitch,
                    velocity: note.velocity as f32 / 127.0,
                },
            ));
            events.push((stop, NoteEvent::NoteOff { pitch: Some(pitch) }));
            end = end.max(stop);
        }

        events.sort_by_key(|(frame, event)| (*frame, matches!(event, NoteEvent::NoteOn { .. })));
        let tail = match &self.tail {
            Some(tail) => to_frames(parse_duration("tail", tail)?, sample_rate),
            None => 0,
        };
        Ok(Timeline {
            events,
            frames: end + tail,
        })
    }
}

/// Renders a timeline into interleaved audio, `block_size` frames at a time.
pub fn render_timeline(
    engine: &mut SynthEngine,
    timeline: &Timeline,
    channels: usize,
    block_size: usize,
) -> Vec<f32> {
    let channels = channels.max(1);
    let block_size = block_size.max(1);
    let mut output = vec![0.0f32; timeline.frames as usize * channels];
    let mut block_events = Vec::new();
    let mut next = 0;

    for (block_index, block) in output.chunks_mut(block_size * channels).enumerate() {
        let start = (block_index * block_size) as u64;
        let end = start + (block.len() / channels) as u64;
        block_events.clear();
        while let Some((frame, event)) = timeline.events.get(next) {
            if *frame >= end {
                break;
            }
            block_events.push(TimedEvent::new((*frame - start) as usize, *event));
            next += 1;
        }
        engine.process(block, channels, &block_events);
    }

    info!(
        frames = timeline.frames,
        channels,
        events = timeline.events.len(),
        "Rendered note script"
    );
    output
}

/// Writes interleaved audio as a 32-bit float WAV file.
pub fn write_wav(
    path: &Path,
    interleaved: &[f32],
    channels: u16,
    sample_rate: u32,
) -> Result<(), RenderError> {
    let mut writer = WavWriter::create(
        path,
        WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        },
    )?;
    for sample in interleaved {
        writer.write_sample(*sample)?;
    }
    writer.finalize()?;
    info!(path = ?path, channels, sample_rate, "Wrote WAV file");
    Ok(())
}
