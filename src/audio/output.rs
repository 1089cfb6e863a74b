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

//! cpal output host for the synth engine.

use std::fmt;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::Receiver;
use tracing::{error, info};

use super::error::AudioError;
use super::thread_priority::{
    callback_thread_priority, configure_audio_thread_priority, rt_audio_enabled,
};
use crate::samples::{NoteEvent, SynthEngine, TimedEvent};

/// Upper bound on note events applied in a single callback.
const MAX_EVENTS_PER_CALLBACK: usize = 256;

/// An output device known to cpal.
pub struct OutputDevice {
    pub name: String,
    pub host: String,
    pub max_channels: u16,
}

impl fmt::Display for OutputDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Channels={}) ({})",
            self.name, self.max_channels, self.host
        )
    }
}

/// Lists output devices across every available cpal host.
pub fn list_devices() -> Result<Vec<OutputDevice>, AudioError> {
    let mut devices = Vec::new();
    for host_id in cpal::available_hosts() {
        let host_devices = match cpal::host_from_id(host_id)?.devices() {
            Ok(host_devices) => host_devices,
            Err(e) => {
                error!(
                    err = e.to_string(),
                    host = host_id.name(),
                    "Unable to list devices for host"
                );
                continue;
            }
        };

        for device in host_devices {
            let Ok(output_configs) = device.supported_output_configs() else {
                continue;
            };
            let max_channels = output_configs
                .map(|config| config.channels())
                .max()
                .unwrap_or(0);
            if max_channels == 0 {
                continue;
            }
            devices.push(OutputDevice {
                name: device
                    .name()
                    .map_err(|e| AudioError::Device(e.to_string()))?,
                host: host_id.name().to_string(),
                max_channels,
            });
        }
    }
    devices.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(devices)
}

fn find_device(name: Option<&str>) -> Result<cpal::Device, AudioError> {
    let host = cpal::default_host();
    match name {
        None => host.default_output_device().ok_or(AudioError::NoDefaultDevice),
        Some(name) => {
            for device in host.output_devices()? {
                if device.name().map(|n| n == name).unwrap_or(false) {
                    return Ok(device);
                }
            }
            Err(AudioError::DeviceNotFound(name.to_string()))
        }
    }
}

/// Opens an f32 output stream that renders the engine in the callback.
///
/// Note events received on `notes` are applied at the start of the next block.
/// The returned stream must be kept alive for playback to continue.
pub fn start(
    device_name: Option<&str>,
    sample_rate: u32,
    channels: u16,
    mut engine: SynthEngine,
    notes: Receiver<NoteEvent>,
) -> Result<cpal::Stream, AudioError> {
    let device = find_device(device_name)?;
    let config = cpal::StreamConfig {
        channels,
        sample_rate,
        buffer_size: cpal::BufferSize::Default,
    };

    let priority = callback_thread_priority();
    let rt_audio = rt_audio_enabled();
    let mut priority_set = false;
    let mut pending: Vec<TimedEvent> = Vec::with_capacity(MAX_EVENTS_PER_CALLBACK);
    let channel_count = channels as usize;

    let stream = device.build_output_stream(
        &config,
        move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
            configure_audio_thread_priority(priority, rt_audio, &mut priority_set);

            pending.clear();
            while pending.len() < MAX_EVENTS_PER_CALLBACK {
                match notes.try_recv() {
                    Ok(event) => pending.push(TimedEvent::new(0, event)),
                    Err(_) => break,
                }
            }
            engine.process(data, channel_count, &pending);
        },
        |err| error!("CPAL output stream error: {}", err),
        None,
    )?;
    stream.play()?;

    info!(
        device = device_name.unwrap_or("default"),
        sample_rate, channels, "Output stream started"
    );
    Ok(stream)
}
