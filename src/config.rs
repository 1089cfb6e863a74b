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


//! Instrument configuration.
//!
//! An instrument is described by a YAML file: output settings, the parameter set and
//! the list of samples to load. Any value can be overridden from the environment with
//! `GLIDER__<KEY>`, e.g. `GLIDER__SAMPLE_RATE=44100`.

mod error;
mod instrument;

pub use error::ConfigError;
pub use instrument::{InstrumentConfig, ParametersConfig, SampleEntry, VoiceMode};
