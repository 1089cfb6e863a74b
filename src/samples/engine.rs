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

//! The render engine: turns note events and the current bank into audio.
//!
//! `SynthEngine` lives on the audio callback thread. It never allocates, blocks or logs
//! while rendering. Bank changes arrive through a [`BankReader`], parameters through
//! atomic loads, and anything worth logging goes out through the diagnostics channel.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::allocator::VoiceAllocator;
use super::crossfade::CROSSFADE_LENGTH;
use super::envelope::EnvelopeSettings;
use super::event::{NoteEvent, TimedEvent};
use super::glide::SteppedGlide;
use super::selection::SampleSelector;
use super::store::{BankReader, Refresh};
use super::voice::{NoteStart, Voice, VoiceContext, VoiceStep};
use crate::config::VoiceMode;
use crate::diagnostics::{DiagnosticsSender, RenderEvent};
use crate::params::{db_to_linear, ParameterSnapshot, Parameters, MAX_VOICES};

const NO_SAMPLE: usize = usize::MAX;

/// Read-only engine state for display, updated once per block.
#[derive(Debug)]
pub struct EngineStatus {
    current_sample: AtomicUsize,
    active_voices: AtomicUsize,
}

impl Default for EngineStatus {
    fn default() -> Self {
        Self {
            current_sample: AtomicUsize::new(NO_SAMPLE),
            active_voices: AtomicUsize::new(0),
        }
    }
}

impl EngineStatus {
    /// Index of the sample the last trigger selected.
    pub fn current_sample(&self) -> Option<usize> {
        match self.current_sample.load(Ordering::Relaxed) {
            NO_SAMPLE => None,
            index => Some(index),
        }
    }

    pub fn active_voices(&self) -> usize {
        self.active_voices.load(Ordering::Relaxed)
    }

    fn set_current_sample(&self, index: Option<usize>) {
        self.current_sample
            .store(index.unwrap_or(NO_SAMPLE), Ordering::Relaxed);
    }
}

/// The synthesis core.
pub struct SynthEngine {
    sample_rate: f64,
    mode: VoiceMode,
    params: Arc<Parameters>,
    bank: BankReader,
    selector: SampleSelector,
    voices: Vec<Voice>,
    allocator: VoiceAllocator,
    /// Pitch of the most recent note-on, where the next glide starts.
    last_pitch: Option<f32>,
    status: Arc<EngineStatus>,
    diagnostics: DiagnosticsSender,
    crossfade_length: u32,
    /// Parameters for the block being rendered.
    block: ParameterSnapshot,
    envelope: EnvelopeSettings,
}

impl SynthEngine {
    pub fn new(
        sample_rate: u32,
        mode: VoiceMode,
        params: Arc<Parameters>,
        bank: BankReader,
        diagnostics: DiagnosticsSender,
    ) -> Self {
        let sample_rate = sample_rate.max(1) as f64;
        let block = params.snapshot();
        Self {
            sample_rate,
            mode,
            params,
            bank,
            selector: SampleSelector::new(),
            voices: vec![Voice::new(); MAX_VOICES],
            allocator: VoiceAllocator::new(),
            last_pitch: None,
            status: Arc::new(EngineStatus::default()),
            diagnostics,
            crossfade_length: CROSSFADE_LENGTH,
            envelope: EnvelopeSettings::from_params(&block, sample_rate),
            block,
        }
    }

    /// Replaces the sample selector, e.g. with a seeded one.
    pub fn with_selector(mut self, selector: SampleSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn status(&self) -> Arc<EngineStatus> {
        self.status.clone()
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn mode(&self) -> VoiceMode {
        self.mode
    }

    /// Starts a note immediately, outside of block rendering.
    pub fn note_on(&mut self, pitch: f32, velocity: f32) {
        self.load_params();
        self.start_note(pitch, velocity);
    }

    /// Releases every sounding voice.
    pub fn note_off(&mut self) {
        self.load_params();
        self.release(None);
    }

    pub fn handle(&mut self, event: NoteEvent) {
        self.load_params();
        self.dispatch(event);
    }

    /// Renders one block of interleaved audio into `output`, overwriting it.
    ///
    /// The block is split at each event offset so that note-ons and note-offs land on
    /// their exact frame. Offsets are clamped into the block and never move backwards.
    pub fn process(&mut self, output: &mut [f32], channels: usize, events: &[TimedEvent]) {
        if channels == 0 {
            output.fill(0.0);
            return;
        }
        self.refresh_bank();
        self.load_params();

        let frames = output.len() / channels;
        let (body, partial) = output.split_at_mut(frames * channels);
        partial.fill(0.0);

        let mut cursor = 0;
        for timed in events {
            let offset = timed.offset.clamp(cursor, frames);
            self.render_segment(&mut body[cursor * channels..offset * channels], channels);
            cursor = offset;
            self.dispatch(timed.event);
        }
        self.render_segment(&mut body[cursor * channels..], channels);

        let active = self.voices.iter().filter(|voice| voice.is_active()).count();
        self.status.active_voices.store(active, Ordering::Relaxed);
    }

    fn load_params(&mut self) {
        self.block = self.params.snapshot();
        self.envelope = EnvelopeSettings::from_params(&self.block, self.sample_rate);
    }

    fn refresh_bank(&mut self) {
        if let Refresh::Swapped { retired } = self.bank.refresh() {
            let samples = self.bank.current().len();
            self.selector.clamp_to(samples);
            self.status.set_current_sample(self.selector.current());
            self.diagnostics.report(RenderEvent::BankSwapped { samples });
            if !retired {
                self.diagnostics
                    .report(RenderEvent::SnapshotDroppedOnRenderThread);
            }
        }
    }

    fn dispatch(&mut self, event: NoteEvent) {
        match event {
            NoteEvent::NoteOn { pitch, velocity } => self.start_note(pitch, velocity),
            NoteEvent::NoteOff { pitch } => self.release(pitch),
        }
    }

    fn start_note(&mut self, pitch: f32, velocity: f32) {
        let samples = self.bank.current().len();
        let voice_count = (self.block.voice_count as usize).min(MAX_VOICES);
        if samples == 0 || voice_count == 0 {
            self.diagnostics.report(RenderEvent::NoteIgnored);
            return;
        }

        self.selector.invalidate();
        let selected = self.selector.select_current(
            samples,
            self.block.chain_selector,
            self.block.randomization,
        );
        self.status.set_current_sample(selected);
        let pitch_offset = selected
            .and_then(|index| self.bank.current().get(index))
            .map_or(0.0, |record| self.pitch_offset(record.transpose()));

        let (index, start_order) = match self.mode {
            VoiceMode::Mono => (0, self.allocator.next_start_order()),
            VoiceMode::Poly => match self.allocator.allocate(&self.voices, voice_count) {
                Some(allocation) => {
                    if allocation.stolen {
                        self.diagnostics.report(RenderEvent::VoiceStolen {
                            voice: allocation.index,
                        });
                    }
                    (allocation.index, allocation.start_order)
                }
                None => {
                    self.diagnostics.report(RenderEvent::NoteIgnored);
                    return;
                }
            },
        };

        let glide = match self.last_pitch {
            Some(from) if self.block.glide_time_ms > 0.0 && from != pitch => {
                let steps = self.block.glide_steps;
                let samples_per_step = SteppedGlide::samples_per_step(
                    self.block.glide_time_ms,
                    steps,
                    self.sample_rate,
                );
                Some(SteppedGlide::new(from, pitch, steps, samples_per_step))
            }
            _ => None,
        };

        self.voices[index].start(
            NoteStart {
                pitch,
                velocity,
                glide,
                pitch_offset,
                start_order,
            },
            &self.envelope,
            self.crossfade_length,
        );
        self.last_pitch = Some(pitch);
    }

    /// Releases the sounding voice in mono mode. In poly mode only voices playing
    /// `pitch` release, or all of them when it is `None`.
    fn release(&mut self, pitch: Option<f32>) {
        let pitch = match self.mode {
            VoiceMode::Mono => None,
            VoiceMode::Poly => pitch,
        };
        for voice in self.voices.iter_mut() {
            let matches = match (pitch, voice.note_pitch()) {
                (_, None) => false,
                (None, Some(_)) => true,
                (Some(released), Some(playing)) => released == playing,
            };
            if matches {
                voice.release(&self.envelope);
            }
        }
    }

    /// Sample transpose, global transpose and fine tune, in semitones.
    fn pitch_offset(&self, sample_transpose: f32) -> f32 {
        sample_transpose + self.block.transpose + self.block.fine_tune / 100.0
    }

    fn render_segment(&mut self, segment: &mut [f32], channels: usize) {
        segment.fill(0.0);
        if segment.is_empty() || self.block.voice_count == 0 {
            return;
        }
        let Some(index) = self.selector.current() else {
            return;
        };
        let Some(record) = self.bank.current().get(index) else {
            return;
        };
        if record.channel_count() == 0 || record.frames() == 0 {
            return;
        }

        let ctx = VoiceContext {
            data: record.channels(),
            frames: record.frames(),
            pitch_offset: self.pitch_offset(record.transpose()),
            gain: db_to_linear(self.block.master_gain_db) * db_to_linear(record.gain_db()),
            envelope: self.envelope,
        };

        for (voice_index, voice) in self.voices.iter_mut().enumerate() {
            if !voice.is_active() {
                continue;
            }
            for frame in segment.chunks_exact_mut(channels) {
                match voice.render_into(frame, &ctx) {
                    VoiceStep::Playing => {}
                    VoiceStep::SampleEnded => {
                        self.diagnostics
                            .report(RenderEvent::SampleEnded { voice: voice_index });
                        break;
                    }
                    VoiceStep::Released | VoiceStep::Idle => break,
                }
            }
        }
    }
}

impl std::fmt::Debug for SynthEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynthEngine")
            .field("sample_rate", &self.sample_rate)
            .field("mode", &self.mode)
            .field("samples", &self.bank.current().len())
            .field("active_voices", &self.status.active_voices())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::mock::{mono, MockDecoder};
    use crate::diagnostics::{self, DiagnosticsReceiver};
    use crate::samples::envelope::EnvelopeStage;
    use crate::samples::store::SampleStore;
    use crate::samples::voice::{PitchState, VoiceState};

    const RATE: u32 = 48000;

    struct Fixture {
        store: SampleStore,
        params: Arc<Parameters>,
        engine: SynthEngine,
        diagnostics: DiagnosticsReceiver,
    }

    fn fixture(mode: VoiceMode, samples: &[Vec<f32>]) -> Fixture {
        let mut decoder = MockDecoder::new();
        for (i, data) in samples.iter().enumerate() {
            decoder = decoder.with_file(format!("sample{}.wav", i), mono(data.clone(), RATE));
        }
        let store = SampleStore::new(Arc::new(decoder), RATE);
        for i in 0..samples.len() {
            store.load(format!("sample{}.wav", i)).unwrap();
        }

        let params = Arc::new(Parameters::new());
        params.set_attack(0.01);
        params.set_master_gain_db(0.0);
        params.set_glide_time_ms(0.0);
        let (tx, rx) = diagnostics::channel(64);
        let engine = SynthEngine::new(RATE, mode, params.clone(), store.reader(), tx)
            .with_selector(SampleSelector::with_seed(7));
        Fixture {
            store,
            params,
            engine,
            diagnostics: rx,
        }
    }

    fn on(offset: usize, pitch: f32) -> TimedEvent {
        TimedEvent::new(
            offset,
            NoteEvent::NoteOn {
                pitch,
                velocity: 1.0,
            },
        )
    }

    #[test]
    fn test_empty_bank_renders_silence() {
        let mut fx = fixture(VoiceMode::Mono, &[]);
        let mut out = vec![1.0f32; 512];
        fx.engine.process(&mut out, 2, &[on(0, 0.0)]);
        assert!(out.iter().all(|s| *s == 0.0));
        assert_eq!(fx.engine.status().active_voices(), 0);
        assert!(fx.diagnostics.drain().contains(&RenderEvent::NoteIgnored));
    }

    #[test]
    fn test_mono_retrigger_stays_in_slot_zero() {
        let mut fx = fixture(VoiceMode::Mono, &[vec![0.5; 48000]]);
        let mut out = vec![0.0f32; 256];
        for pitch in [0.0, 3.0, 7.0, 12.0, 0.0] {
            fx.engine.process(&mut out, 1, &[on(10, pitch)]);
            assert!(fx.engine.voices()[0].is_active());
            assert!(fx.engine.voices()[1..].iter().all(|v| !v.is_active()));
            assert_eq!(fx.engine.voices()[0].note_pitch(), Some(pitch));
        }
        assert_eq!(fx.engine.status().active_voices(), 1);
    }

    #[test]
    fn test_mono_retrigger_crossfades_and_glides() {
        let ramp: Vec<f32> = (0..48000).map(|i| i as f32).collect();
        let mut fx = fixture(VoiceMode::Mono, &[ramp]);
        fx.params.set_glide_time_ms(100.0);
        fx.params.set_glide_steps(2);

        // The attack is over by frame 480 and sustain is 1, so the level stays at 1.
        let mut out = vec![0.0f32; 700];
        fx.engine.process(&mut out, 1, &[on(0, 0.0), on(600, 7.0)]);

        assert!(fx.engine.voices()[1..].iter().all(|v| !v.is_active()));
        let VoiceState::Active(active) = fx.engine.voices()[0].state() else {
            panic!("voice should be active");
        };
        assert!(matches!(active.pitch(), PitchState::Gliding(_)));
        assert_eq!(active.pitch().current(), 0.0);
        assert_eq!(active.playhead().position, 100.0);
        let fade = active.crossfade().expect("crossfade should still be running");
        assert_eq!(fade.outgoing().position, 700.0);

        assert_eq!(out[599], 599.0);
        assert_eq!(out[600], 600.0);
        // One step into the window: mostly the old playhead, a little of the new one.
        let expected = 601.0 * (255.0 / 256.0) + 1.0 / 256.0;
        assert!((out[601] - expected).abs() < 1e-3, "{}", out[601]);
    }

    #[test]
    fn test_note_lands_on_its_frame() {
        let mut fx = fixture(VoiceMode::Mono, &[vec![1.0; 48000]]);
        let mut out = vec![0.0f32; 256 * 2];
        fx.engine.process(&mut out, 2, &[on(100, 0.0)]);

        for frame in 0..100 {
            assert_eq!(out[frame * 2], 0.0, "frame {}", frame);
            assert_eq!(out[frame * 2 + 1], 0.0, "frame {}", frame);
        }
        assert!(out[200] > 0.0);
        assert_eq!(out[200], out[201]);
        // Still in the attack, so the level keeps rising.
        assert!(out[255 * 2] > out[200]);
    }

    #[test]
    fn test_note_off_releases_and_goes_idle() {
        let mut fx = fixture(VoiceMode::Mono, &[vec![1.0; 48000]]);
        fx.params.set_release(0.001);
        let mut out = vec![0.0f32; 1024];
        fx.engine.process(
            &mut out,
            1,
            &[
                on(0, 0.0),
                TimedEvent::new(600, NoteEvent::NoteOff { pitch: Some(0.0) }),
            ],
        );
        // 48 samples of release after frame 600.
        assert!(out[599] > 0.0);
        assert!(out[700..].iter().all(|s| *s == 0.0));
        assert!(!fx.engine.voices()[0].is_active());
    }

    #[test]
    fn test_mono_note_off_releases_whatever_is_playing() {
        let mut fx = fixture(VoiceMode::Mono, &[vec![1.0; 48000]]);
        fx.engine.handle(NoteEvent::NoteOn {
            pitch: 0.0,
            velocity: 1.0,
        });
        fx.engine.handle(NoteEvent::NoteOn {
            pitch: 5.0,
            velocity: 1.0,
        });
        fx.engine.handle(NoteEvent::NoteOff { pitch: Some(0.0) });
        assert_eq!(fx.engine.voices()[0].note_pitch(), Some(5.0));
        assert_eq!(fx.engine.voices()[0].envelope_stage(), EnvelopeStage::Release);
    }

    #[test]
    fn test_poly_note_off_releases_matching_pitch() {
        let mut fx = fixture(VoiceMode::Poly, &[vec![1.0; 48000]]);
        fx.params.set_voice_count(2);
        fx.engine.note_on(0.0, 1.0);
        fx.engine.note_on(5.0, 1.0);
        fx.engine.handle(NoteEvent::NoteOff { pitch: Some(0.0) });
        assert_eq!(fx.engine.voices()[0].envelope_stage(), EnvelopeStage::Release);
        assert_eq!(fx.engine.voices()[1].envelope_stage(), EnvelopeStage::Attack);

        fx.engine.note_off();
        assert_eq!(fx.engine.voices()[1].envelope_stage(), EnvelopeStage::Release);
    }

    #[test]
    fn test_zero_voice_count_renders_silence() {
        let mut fx = fixture(VoiceMode::Mono, &[vec![1.0; 48000]]);
        let mut out = vec![0.0f32; 256];
        fx.engine.process(&mut out, 1, &[on(0, 0.0)]);
        assert!(out.iter().any(|s| *s != 0.0));

        fx.params.set_voice_count(0);
        fx.engine.process(&mut out, 1, &[]);
        assert!(out.iter().all(|s| *s == 0.0));
        // Voice state is left alone.
        assert!(fx.engine.voices()[0].is_active());
    }

    #[test]
    fn test_sample_end_deactivates_voice() {
        let mut fx = fixture(VoiceMode::Mono, &[vec![1.0; 100]]);
        let mut out = vec![0.0f32; 256];
        fx.engine.process(&mut out, 1, &[on(0, 0.0)]);
        assert!(out[99] > 0.0);
        assert!(out[100..].iter().all(|s| *s == 0.0));
        assert!(!fx.engine.voices()[0].is_active());
        assert!(fx
            .diagnostics
            .drain()
            .contains(&RenderEvent::SampleEnded { voice: 0 }));
    }

    #[test]
    fn test_glide_moves_playback_rate() {
        let ramp: Vec<f32> = (0..48000).map(|i| i as f32 / 48000.0).collect();
        let mut fx = fixture(VoiceMode::Mono, &[ramp]);
        fx.params.set_glide_time_ms(100.0);
        fx.params.set_glide_steps(2);
        fx.params.set_attack(0.01);

        fx.engine.note_on(0.0, 1.0);
        fx.engine.note_on(12.0, 1.0);
        let VoiceState::Active(active) = fx.engine.voices()[0].state() else {
            panic!("voice should be active");
        };
        // Starts on the previous pitch and holds it for the first step.
        assert_eq!(active.pitch().current(), 0.0);

        let mut out = vec![0.0f32; 2400];
        fx.engine.process(&mut out, 1, &[]);
        let VoiceState::Active(active) = fx.engine.voices()[0].state() else {
            panic!("voice should be active");
        };
        assert_eq!(active.pitch().current(), 12.0);
        assert_eq!(active.playhead().position, 2400.0);
    }

    #[test]
    fn test_poly_steals_oldest_voice() {
        let mut fx = fixture(VoiceMode::Poly, &[vec![0.25; 48000]]);
        fx.params.set_voice_count(2);
        let mut out = vec![0.0f32; 64];
        fx.engine
            .process(&mut out, 1, &[on(0, 0.0), on(1, 4.0), on(2, 7.0)]);

        let pitches: Vec<Option<f32>> =
            fx.engine.voices()[..3].iter().map(|v| v.note_pitch()).collect();
        assert_eq!(pitches, vec![Some(7.0), Some(4.0), None]);
        assert!(fx
            .diagnostics
            .drain()
            .contains(&RenderEvent::VoiceStolen { voice: 0 }));
        assert_eq!(fx.engine.status().active_voices(), 2);
    }

    #[test]
    fn test_bank_updates_reach_the_engine() {
        let mut fx = fixture(VoiceMode::Mono, &[vec![1.0; 48000]]);
        let mut out = vec![0.0f32; 64];
        fx.engine.process(&mut out, 1, &[on(0, 0.0)]);
        assert_eq!(fx.engine.status().current_sample(), Some(0));

        fx.store.clear();
        fx.engine.process(&mut out, 1, &[]);
        assert!(out.iter().all(|s| *s == 0.0));
        assert_eq!(fx.engine.status().current_sample(), None);
        assert!(fx
            .diagnostics
            .drain()
            .contains(&RenderEvent::BankSwapped { samples: 0 }));
        assert_eq!(fx.store.collect_retired(), 1);
    }

    #[test]
    fn test_chain_selector_picks_sample() {
        let mut fx = fixture(
            VoiceMode::Mono,
            &[vec![0.1; 1000], vec![0.2; 1000], vec![0.3; 1000]],
        );
        fx.params.set_chain_selector(63);
        fx.engine.note_on(0.0, 1.0);
        assert_eq!(fx.engine.status().current_sample(), Some(2));

        fx.params.set_chain_selector(32);
        fx.engine.note_on(0.0, 1.0);
        assert_eq!(fx.engine.status().current_sample(), Some(1));
    }

    #[test]
    fn test_zero_channels_and_partial_frames() {
        let mut fx = fixture(VoiceMode::Mono, &[vec![1.0; 48000]]);
        let mut out = vec![1.0f32; 7];
        fx.engine.process(&mut out, 0, &[on(0, 0.0)]);
        assert!(out.iter().all(|s| *s == 0.0));

        let mut out = vec![1.0f32; 7];
        fx.engine.process(&mut out, 2, &[on(0, 0.0)]);
        assert_eq!(out[6], 0.0);
        assert!(out[0] > 0.0);
    }
}
