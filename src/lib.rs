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


//! A monophonic sample-playback instrument.
//!
//! Samples are decoded and resampled off the audio thread into a [`samples::SampleStore`].
//! The render thread reads the bank through a wait-free snapshot and plays it through
//! [`samples::SynthEngine`], which adds an envelope, stepped glide and retrigger
//! crossfade on top of pitched sample playback.

pub mod audio;
pub mod config;
pub mod diagnostics;
pub mod midi;
pub mod params;
pub mod render;
pub mod samples;
#[cfg(test)]
mod testutil;
