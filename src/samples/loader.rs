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

//! Turns audio resources into sample records at the engine's sample rate.
//!
//! Samples are decoded entirely into memory so the render thread never touches disk.

use std::sync::Arc;

use tracing::info;

use super::error::LoadError;
use super::record::{SampleRecord, SampleSource};
use super::resample::{needs_resampling, resample_linear};
use crate::audio::{AudioResource, SampleDecoder};

/// Decodes and resamples audio for the sample bank.
#[derive(Clone)]
pub struct SampleLoader {
    decoder: Arc<dyn SampleDecoder>,
    /// Target sample rate, matching the audio output.
    target_sample_rate: u32,
}

impl SampleLoader {
    /// Creates a new sample loader.
    pub fn new(decoder: Arc<dyn SampleDecoder>, target_sample_rate: u32) -> Self {
        Self {
            decoder,
            target_sample_rate,
        }
    }

    pub fn target_sample_rate(&self) -> u32 {
        self.target_sample_rate
    }

    /// Returns a loader for the same decoder at a different rate.
    pub fn with_sample_rate(&self, target_sample_rate: u32) -> Self {
        Self {
            decoder: self.decoder.clone(),
            target_sample_rate,
        }
    }

    /// Decodes the resource and resamples it to the target rate if needed.
    pub fn load(
        &self,
        resource: &AudioResource,
        source: SampleSource,
    ) -> Result<SampleRecord, LoadError> {
        let name = resource.name();
        info!(resource = %name, "Loading sample into memory");

        let decoded = self
            .decoder
            .decode(resource)
            .map_err(|source| LoadError::Decode {
                name: name.clone(),
                source,
            })?;
        if decoded.channels.is_empty() || decoded.frames() == 0 {
            return Err(LoadError::Empty(name));
        }

        let source_rate = decoded.sample_rate;
        let channels = if needs_resampling(source_rate as f64, self.target_sample_rate as f64) {
            info!(
                source_rate,
                target_rate = self.target_sample_rate,
                "Resampling sample"
            );
            decoded
                .channels
                .iter()
                .map(|channel| {
                    resample_linear(
                        channel,
                        source_rate as f64,
                        self.target_sample_rate as f64,
                    )
                })
                .collect()
        } else {
            decoded.channels
        };

        let record = SampleRecord::new(
            name,
            source,
            channels,
            self.target_sample_rate,
            source_rate,
        )?;

        info!(
            resource = record.name(),
            channels = record.channel_count(),
            sample_rate = record.sample_rate(),
            duration_ms = record.duration().as_millis() as u64,
            memory_kb = record.memory_size() / 1024,
            "Sample loaded"
        );
        Ok(record)
    }
}

impl std::fmt::Debug for SampleLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleLoader")
            .field("target_sample_rate", &self.target_sample_rate)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::audio::mock::{mono, MockDecoder};
    use crate::audio::DecodedAudio;

    fn file(path: &str) -> (AudioResource, SampleSource) {
        (
            AudioResource::File(PathBuf::from(path)),
            SampleSource::File(PathBuf::from(path)),
        )
    }

    #[test]
    fn test_load_resamples_to_target() {
        let decoder = MockDecoder::new().with_file("/s/pad.wav", mono(vec![0.25; 88200], 44100));
        let loader = SampleLoader::new(Arc::new(decoder), 48000);

        let (resource, source) = file("/s/pad.wav");
        let record = loader.load(&resource, source).unwrap();
        assert_eq!(record.name(), "pad");
        assert_eq!(record.sample_rate(), 48000);
        assert_eq!(record.original_sample_rate(), 44100);
        assert!((record.frames() as i64 - 96000).abs() <= 1);
    }

    #[test]
    fn test_load_same_rate_keeps_audio() {
        let samples: Vec<f32> = (0..64).map(|i| i as f32 / 64.0).collect();
        let decoder = MockDecoder::new().with_file(
            "/s/stereo.wav",
            DecodedAudio {
                channels: vec![samples.clone(), samples.clone()],
                sample_rate: 48000,
            },
        );
        let loader = SampleLoader::new(Arc::new(decoder), 48000);

        let (resource, source) = file("/s/stereo.wav");
        let record = loader.load(&resource, source).unwrap();
        assert_eq!(record.channel_count(), 2);
        assert_eq!(record.channels()[1], samples);
    }

    #[test]
    fn test_load_empty_is_rejected() {
        let decoder = MockDecoder::new().with_file("/s/empty.wav", mono(vec![], 48000));
        let loader = SampleLoader::new(Arc::new(decoder), 48000);

        let (resource, source) = file("/s/empty.wav");
        assert!(matches!(
            loader.load(&resource, source),
            Err(LoadError::Empty(_))
        ));
    }

    #[test]
    fn test_load_decode_failure() {
        let loader = SampleLoader::new(Arc::new(MockDecoder::new()), 48000);
        let (resource, source) = file("/s/missing.wav");
        assert!(matches!(
            loader.load(&resource, source),
            Err(LoadError::Decode { .. })
        ));
    }
}
