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
use crate::audio::DecodeError;

/// Why a sample could not be added to the bank. The bank is unchanged in every case.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to decode sample {name}: {source}")]
    Decode {
        name: String,
        #[source]
        source: DecodeError,
    },

    #[error("Sample {0} contains no audio")]
    Empty(String),

    #[error("Sample {0} has channels of different lengths")]
    ChannelLengthMismatch(String),

    #[error("Unable to generate the built-in sample: {0}")]
    Builtin(#[from] hound::Error),
}
