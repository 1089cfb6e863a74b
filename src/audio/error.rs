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

/// Errors produced while decoding an audio resource into memory.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Unsupported audio format for {0}")]
    Unsupported(String),

    #[error("No audio track found in {0}")]
    NoTrack(String),

    #[error("Sample rate not specified for {0}")]
    MissingSampleRate(String),

    #[error("Audio file error: {0}")]
    AudioError(#[from] symphonia::core::errors::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors produced while opening the audio output.
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("No output device named {0}")]
    DeviceNotFound(String),

    #[error("No default output device available")]
    NoDefaultDevice,

    #[error("Audio device error: {0}")]
    Device(String),

    #[error("Unable to enumerate devices: {0}")]
    Devices(#[from] cpal::DevicesError),

    #[error("Audio host unavailable: {0}")]
    HostUnavailable(#[from] cpal::HostUnavailable),

    #[error("Unable to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("Unable to start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}
