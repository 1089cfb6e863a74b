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
use std::fs::File;
use std::io::{Cursor, ErrorKind};
use std::path::PathBuf;
use std::sync::Arc;

use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::get_codecs;
use symphonia::default::get_probe;
use tracing::{debug, warn};

use super::error::DecodeError;

/// Something the decoder can read audio from.
#[derive(Clone, Debug)]
pub enum AudioResource {
    /// An audio file on disk.
    File(PathBuf),
    /// An encoded file held in memory. The extension is used as a format hint.
    Memory {
        name: String,
        bytes: Arc<[u8]>,
        extension: Option<String>,
    },
}

impl AudioResource {
    /// A human readable name: the file stem for files, the given name otherwise.
    pub fn name(&self) -> String {
        match self {
            AudioResource::File(path) => path
                .file_stem()
                .map(|stem| stem.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string()),
            AudioResource::Memory { name, .. } => name.clone(),
        }
    }

    fn extension(&self) -> Option<String> {
        match self {
            AudioResource::File(path) => path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(str::to_string),
            AudioResource::Memory { extension, .. } => extension.clone(),
        }
    }
}

/// Fully decoded planar audio.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedAudio {
    /// One vector of samples per channel.
    pub channels: Vec<Vec<f32>>,
    pub sample_rate: u32,
}

impl DecodedAudio {
    /// Number of frames in the longest channel.
    pub fn frames(&self) -> usize {
        self.channels.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// Decodes an audio resource into memory. Never called from the render thread.
pub trait SampleDecoder: Send + Sync {
    fn decode(&self, resource: &AudioResource) -> Result<DecodedAudio, DecodeError>;
}

/// Decodes WAV, FLAC, MP3, OGG and the other formats symphonia supports.
#[derive(Clone, Copy, Debug, Default)]
pub struct SymphoniaDecoder;

impl SampleDecoder for SymphoniaDecoder {
    fn decode(&self, resource: &AudioResource) -> Result<DecodedAudio, DecodeError> {
        let name = resource.name();
        let source: Box<dyn MediaSource> = match resource {
            AudioResource::File(path) => {
                // Include the path in the error so the user sees which file failed.
                let file = File::open(path).map_err(|e| {
                    DecodeError::IoError(std::io::Error::new(
                        e.kind(),
                        format!("{}: {}", path.display(), e),
                    ))
                })?;
                Box::new(file)
            }
            AudioResource::Memory { bytes, .. } => Box::new(Cursor::new(bytes.clone())),
        };
        let mss = MediaSourceStream::new(source, Default::default());

        let mut hint = Hint::new();
        if let Some(extension) = resource.extension() {
            hint.with_extension(&extension);
        }

        let meta_opts: MetadataOptions = Default::default();
        let fmt_opts: FormatOptions = Default::default();
        let probed = get_probe()
            .format(&hint, mss, &fmt_opts, &meta_opts)
            .map_err(|e| DecodeError::Unsupported(format!("'{}': {}", name, e)))?;
        let mut format_reader = probed.format;

        let track = format_reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| DecodeError::NoTrack(name.clone()))?;
        let track_id = track.id;
        let mut sample_rate = track.codec_params.sample_rate;
        let mut decoder = get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

        let mut channels: Vec<Vec<f32>> = Vec::new();
        loop {
            let packet = match format_reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
                Err(SymphoniaError::ResetRequired) => {
                    decoder.reset();
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    if sample_rate.is_none() {
                        sample_rate = Some(decoded.spec().rate);
                    }
                    append_planar(decoded, &mut channels);
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!(resource = %name, error = e, "Skipping undecodable packet");
                }
                Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }
        }

        let sample_rate = sample_rate.ok_or_else(|| DecodeError::MissingSampleRate(name.clone()))?;
        debug!(
            resource = %name,
            channels = channels.len(),
            sample_rate,
            "Decoded audio resource"
        );
        Ok(DecodedAudio {
            channels,
            sample_rate,
        })
    }
}

/// Appends a decoded buffer of any sample format to the planar output, scaled to [-1, 1].
fn append_planar(decoded: AudioBufferRef, channels: &mut Vec<Vec<f32>>) {
    match decoded {
        AudioBufferRef::F32(buf) => extend_planar(&buf, channels, |sample| sample),
        AudioBufferRef::F64(buf) => extend_planar(&buf, channels, |sample| sample as f32),
        AudioBufferRef::S8(buf) => extend_planar(&buf, channels, scale_s8),
        AudioBufferRef::S16(buf) => extend_planar(&buf, channels, scale_s16),
        AudioBufferRef::S24(buf) => {
            extend_planar(&buf, channels, |sample| scale_s24(sample.inner()))
        }
        AudioBufferRef::S32(buf) => extend_planar(&buf, channels, scale_s32),
        AudioBufferRef::U8(buf) => extend_planar(&buf, channels, scale_u8),
        AudioBufferRef::U16(buf) => extend_planar(&buf, channels, scale_u16),
        AudioBufferRef::U24(buf) => {
            extend_planar(&buf, channels, |sample| scale_u24(sample.inner()))
        }
        AudioBufferRef::U32(buf) => extend_planar(&buf, channels, scale_u32),
    }
}

fn extend_planar<T, F>(buf: &AudioBuffer<T>, channels: &mut Vec<Vec<f32>>, convert: F)
where
    T: symphonia::core::sample::Sample,
    F: Fn(T) -> f32,
{
    let count = buf.spec().channels.count();
    if channels.len() < count {
        channels.resize_with(count, Vec::new);
    }
    let frames = buf.frames();
    let planes = buf.planes();
    for (plane, channel) in planes.planes().iter().zip(channels.iter_mut()) {
        channel.extend(plane[..frames].iter().map(|sample| convert(*sample)));
    }
}

#[inline]
pub(crate) fn scale_s8(sample: i8) -> f32 {
    sample as f32 / (1i64 << 7) as f32
}

#[inline]
pub(crate) fn scale_s16(sample: i16) -> f32 {
    sample as f32 / (1i64 << 15) as f32
}

#[inline]
pub(crate) fn scale_s24(sample: i32) -> f32 {
    sample as f32 / (1i64 << 23) as f32
}

#[inline]
pub(crate) fn scale_s32(sample: i32) -> f32 {
    sample as f32 / (1i64 << 31) as f32
}

#[inline]
pub(crate) fn scale_u8(sample: u8) -> f32 {
    (sample as f32 / u8::MAX as f32) * 2.0 - 1.0
}

#[inline]
pub(crate) fn scale_u16(sample: u16) -> f32 {
    (sample as f32 / u16::MAX as f32) * 2.0 - 1.0
}

#[inline]
pub(crate) fn scale_u24(sample: u32) -> f32 {
    let max = (1u32 << 24) - 1;
    (sample as f32 / max as f32) * 2.0 - 1.0
}

#[inline]
pub(crate) fn scale_u32(sample: u32) -> f32 {
    (sample as f32 / u32::MAX as f32) * 2.0 - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::audio::write_wav;

    #[test]
    fn test_decode_stereo_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_wav(
            path.clone(),
            vec![vec![0.25f32, 0.5, 0.75], vec![-0.25f32, -0.5, -0.75]],
            44100,
        )
        .unwrap();

        let decoded = SymphoniaDecoder
            .decode(&AudioResource::File(path))
            .unwrap();
        assert_eq!(decoded.sample_rate, 44100);
        assert_eq!(decoded.channels.len(), 2);
        assert_eq!(decoded.frames(), 3);
        assert!((decoded.channels[0][1] - 0.5).abs() < 1e-6);
        assert!((decoded.channels[1][2] + 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_decode_missing_file() {
        let result = SymphoniaDecoder.decode(&AudioResource::File(PathBuf::from(
            "/definitely/not/here.wav",
        )));
        match result {
            Err(DecodeError::IoError(e)) => assert!(e.to_string().contains("here.wav")),
            other => panic!("expected IO error, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_garbage_bytes() {
        let resource = AudioResource::Memory {
            name: "garbage".into(),
            bytes: Arc::from(vec![1u8, 2, 3, 4, 5, 6, 7, 8].into_boxed_slice()),
            extension: Some("wav".into()),
        };
        assert!(SymphoniaDecoder.decode(&resource).is_err());
    }

    #[test]
    fn test_resource_name() {
        assert_eq!(
            AudioResource::File(PathBuf::from("/samples/pad.wav")).name(),
            "pad"
        );
    }

    #[test]
    fn test_scaling() {
        assert_eq!(scale_s16(i16::MIN), -1.0);
        assert_eq!(scale_s16(0), 0.0);
        assert_eq!(scale_u8(0), -1.0);
        assert!((scale_u8(u8::MAX) - 1.0).abs() < 1e-6);
        assert_eq!(scale_s24(1 << 22), 0.5);
    }
}
