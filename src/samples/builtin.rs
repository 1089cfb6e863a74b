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

//! The sample loaded when the bank would otherwise be empty.
//!
//! It is generated as an in-memory 16-bit WAV and decoded through the same path as
//! files on disk, so it is resampled and stored exactly like any other sample.

use std::io::Cursor;
use std::sync::Arc;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::audio::AudioResource;

pub const BUILTIN_NAME: &str = "Gliding Squares";
pub const BUILTIN_SAMPLE_RATE: u32 = 44100;

/// Middle C, so MIDI note 60 plays the sample at its recorded pitch.
const FUNDAMENTAL_HZ: f64 = 261.625_565;
const LENGTH_SECONDS: f64 = 2.0;
const AMPLITUDE: f64 = 0.5;
const EDGE_FADE_SECONDS: f64 = 0.005;

/// Renders the built-in square wave as WAV bytes.
pub fn builtin_wav() -> Result<Vec<u8>, hound::Error> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: BUILTIN_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let rate = BUILTIN_SAMPLE_RATE as f64;
    let frames = (LENGTH_SECONDS * rate) as usize;
    let fade = (EDGE_FADE_SECONDS * rate) as usize;

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for i in 0..frames {
            let cycle = (i as f64 * FUNDAMENTAL_HZ / rate).fract();
            let square = if cycle < 0.5 { AMPLITUDE } else { -AMPLITUDE };
            // Short ramps at both ends keep the edges from clicking.
            let edge = i.min(frames - 1 - i);
            let gain = if edge < fade {
                edge as f64 / fade as f64
            } else {
                1.0
            };
            writer.write_sample((square * gain * i16::MAX as f64) as i16)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

/// The built-in sample as a decodable resource.
pub fn builtin_resource() -> Result<AudioResource, hound::Error> {
    Ok(AudioResource::Memory {
        name: BUILTIN_NAME.to_string(),
        bytes: Arc::from(builtin_wav()?.into_boxed_slice()),
        extension: Some("wav".to_string()),
    })
}
