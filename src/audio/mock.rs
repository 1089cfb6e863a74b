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
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use super::decoder::{AudioResource, DecodedAudio, SampleDecoder, SymphoniaDecoder};
use super::error::DecodeError;

/// A decoder that serves canned audio for file paths. In-memory resources are
/// decoded for real so the built-in sample still works.
#[derive(Default)]
pub struct MockDecoder {
    files: Mutex<HashMap<PathBuf, DecodedAudio>>,
    calls: AtomicUsize,
}

impl MockDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers audio to return for the given path.
    pub fn with_file(self, path: impl AsRef<Path>, audio: DecodedAudio) -> Self {
        self.files.lock().insert(path.as_ref().to_path_buf(), audio);
        self
    }

    /// Returns how many times decode was called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SampleDecoder for MockDecoder {
    fn decode(&self, resource: &AudioResource) -> Result<DecodedAudio, DecodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match resource {
            AudioResource::File(path) => self
                .files
                .lock()
                .get(path)
                .cloned()
                .ok_or_else(|| DecodeError::Unsupported(path.display().to_string())),
            AudioResource::Memory { .. } => SymphoniaDecoder.decode(resource),
        }
    }
}

/// Mono audio holding the given samples.
pub fn mono(samples: Vec<f32>, sample_rate: u32) -> DecodedAudio {
    DecodedAudio {
        channels: vec![samples],
        sample_rate,
    }
}
