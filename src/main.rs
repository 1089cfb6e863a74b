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

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::{crate_version, Parser, Subcommand};
use tracing::{info, warn};

use glider::audio::{self, SymphoniaDecoder};
use glider::config::InstrumentConfig;
use glider::diagnostics::{self, DiagnosticsReceiver};
use glider::midi;
use glider::params::Parameters;
use glider::render::{self, NoteScript};
use glider::samples::{SampleStore, SynthEngine};

/// Capacity of the queue between MIDI input and the audio callback.
const NOTE_QUEUE_CAPACITY: usize = 1024;

/// How often the control loop drains diagnostics and frees retired banks.
const CONTROL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A gliding sample-playback instrument."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists the available audio output devices.
    Devices {},
    /// Lists the available MIDI input devices.
    MidiDevices {},
    /// Plays the instrument live from MIDI input.
    Play {
        /// The path to the instrument configuration.
        config: PathBuf,
    },
    /// Renders a note script to a WAV file.
    Render {
        /// The path to the instrument configuration.
        config: PathBuf,
        /// The path to the note script.
        script: PathBuf,
        /// Where to write the rendered audio.
        output: PathBuf,
    },
}

/// Everything needed to run an instrument.
struct Instrument {
    config: InstrumentConfig,
    store: SampleStore,
    engine: SynthEngine,
    diagnostics: DiagnosticsReceiver,
}

fn load_instrument(path: &Path) -> Result<Instrument, Box<dyn Error>> {
    let config = InstrumentConfig::deserialize(path)?;
    let store = SampleStore::new(Arc::new(SymphoniaDecoder), config.sample_rate());
    for error in store.restore(&config.samples()) {
        warn!(err = %error, "Sample not loaded");
    }
    info!(samples = ?store.names(), "Sample bank ready");

    let params = Arc::new(Parameters::from_snapshot(&config.parameters()?));
    let (diagnostics_tx, diagnostics) = diagnostics::channel(diagnostics::DEFAULT_CAPACITY);
    let engine = SynthEngine::new(
        config.sample_rate(),
        config.voice_mode(),
        params,
        store.reader(),
        diagnostics_tx,
    );
    Ok(Instrument {
        config,
        store,
        engine,
        diagnostics,
    })
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Devices {} => {
            let devices = audio::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::MidiDevices {} => {
            let devices = midi::list()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::Play { config } => {
            let instrument = load_instrument(&config)?;
            let config = instrument.config;
            let (notes_tx, notes_rx) = crossbeam_channel::bounded(NOTE_QUEUE_CAPACITY);
            let status = instrument.engine.status();

            let _stream = audio::output::start(
                config.audio_device(),
                config.sample_rate(),
                config.output_channels(),
                instrument.engine,
                notes_rx,
            )?;

            let _connection = match config.midi_device() {
                Some(name) => Some(midi::get(name)?.watch_events(config.midi_channel(), notes_tx)?),
                None => {
                    warn!("No MIDI device configured, nothing will trigger notes.");
                    None
                }
            };

            let mut last_sample = None;
            loop {
                thread::sleep(CONTROL_INTERVAL);
                instrument.diagnostics.drain();
                instrument.store.collect_retired();

                let current = status.current_sample();
                if current != last_sample {
                    let name = current
                        .and_then(|index| instrument.store.record(index))
                        .map(|record| record.name().to_string());
                    info!(sample = ?name, "Now playing");
                    last_sample = current;
                }
            }
        }
        Commands::Render {
            config,
            script,
            output,
        } => {
            let mut instrument = load_instrument(&config)?;
            let channels = instrument.config.output_channels();
            let sample_rate = instrument.config.sample_rate();

            let timeline = NoteScript::deserialize(&script)?.timeline(sample_rate)?;
            let audio = render::render_timeline(
                &mut instrument.engine,
                &timeline,
                channels as usize,
                instrument.config.block_size(),
            );
            instrument.diagnostics.drain();
            render::write_wav(&output, &audio, channels, sample_rate)?;
            println!("Wrote {}", output.display());
        }
    };

    Ok(())
}
