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

//! Sample playback.
//!
//! This module provides:
//! - The sample bank, loaded off the audio thread and handed over as snapshots
//! - Resampling to the output rate and the built-in fallback sample
//! - Voices with envelope, stepped glide and retrigger crossfade
//! - The render engine that drives them from timed note events

mod allocator;
mod builtin;
mod crossfade;
mod engine;
mod envelope;
mod error;
mod event;
mod glide;
mod loader;
mod playhead;
mod record;
mod resample;
mod selection;
mod store;
mod voice;

pub use allocator::{Allocation, VoiceAllocator};
pub use builtin::{builtin_resource, BUILTIN_NAME};
pub use crossfade::CROSSFADE_LENGTH;
pub use engine::{EngineStatus, SynthEngine};
pub use envelope::{Envelope, EnvelopeSettings, EnvelopeStage};
pub use error::LoadError;
pub use event::{NoteEvent, TimedEvent};
pub use glide::SteppedGlide;
pub use loader::SampleLoader;
pub use playhead::{pitch_ratio, Playhead};
pub use record::{
    SampleRecord, SampleSource, BUILTIN_PATH, SAMPLE_GAIN_RANGE, SAMPLE_TRANSPOSE_RANGE,
};
pub use resample::resample_linear;
pub use selection::{chain_index, SampleSelector};
pub use store::{BankReader, BankSnapshot, Refresh, SampleStore};
pub use voice::{Voice, VoiceState, VoiceStep};
