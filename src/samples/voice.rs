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

//! Per-voice playback state.
//!
//! A voice is either idle or playing. A playing voice owns its playhead, envelope,
//! pitch (steady or gliding) and an optional crossfade from whatever it was playing
//! before it was retriggered.

use super::crossfade::Crossfade;
use super::envelope::{Envelope, EnvelopeSettings, EnvelopeStage};
use super::glide::SteppedGlide;
use super::playhead::{pitch_ratio, Playhead};

/// The note pitch of a playing voice, before transposition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PitchState {
    Steady(f32),
    Gliding(SteppedGlide),
}

impl PitchState {
    #[inline]
    pub fn current(&self) -> f32 {
        match self {
            PitchState::Steady(pitch) => *pitch,
            PitchState::Gliding(glide) => glide.pitch(),
        }
    }

    #[inline]
    fn advance(&mut self) {
        if let PitchState::Gliding(glide) = self {
            if glide.advance() {
                let target = glide.target();
                *self = PitchState::Steady(target);
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct ActiveVoice {
    /// The pitch this note was triggered with, used to match note-offs.
    note_pitch: f32,
    velocity: f32,
    pitch: PitchState,
    playhead: Playhead,
    /// The effective pitch the playhead ratio was last computed for.
    ratio_pitch: f32,
    crossfade: Option<Crossfade>,
    envelope: Envelope,
    start_order: u64,
}

impl ActiveVoice {
    pub fn pitch(&self) -> &PitchState {
        &self.pitch
    }

    pub fn playhead(&self) -> &Playhead {
        &self.playhead
    }

    pub fn crossfade(&self) -> Option<&Crossfade> {
        self.crossfade.as_ref()
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }
}

#[derive(Clone, Debug, Default)]
pub enum VoiceState {
    #[default]
    Idle,
    Active(ActiveVoice),
}

/// Everything needed to start a note on a voice.
#[derive(Clone, Copy, Debug)]
pub struct NoteStart {
    pub pitch: f32,
    pub velocity: f32,
    pub glide: Option<SteppedGlide>,
    /// Transpose and fine tune in effect when the note starts, in semitones.
    pub pitch_offset: f32,
    pub start_order: u64,
}

/// Per-segment values shared by every voice while rendering.
pub struct VoiceContext<'a> {
    /// Planar audio of the selected sample. Every channel holds `frames` samples.
    pub data: &'a [Vec<f32>],
    pub frames: usize,
    /// Sample transpose, global transpose and fine tune, in semitones.
    pub pitch_offset: f32,
    /// Master gain times sample gain, as a linear factor.
    pub gain: f32,
    pub envelope: EnvelopeSettings,
}

/// The outcome of rendering one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoiceStep {
    Idle,
    Playing,
    /// The playhead ran past the end of the sample and the voice stopped.
    SampleEnded,
    /// The release finished and the voice stopped.
    Released,
}

#[derive(Clone, Debug, Default)]
pub struct Voice {
    state: VoiceState,
}

impl Voice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &VoiceState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, VoiceState::Active(_))
    }

    pub fn start_order(&self) -> Option<u64> {
        match &self.state {
            VoiceState::Active(voice) => Some(voice.start_order),
            VoiceState::Idle => None,
        }
    }

    pub fn note_pitch(&self) -> Option<f32> {
        match &self.state {
            VoiceState::Active(voice) => Some(voice.note_pitch),
            VoiceState::Idle => None,
        }
    }

    pub fn envelope_stage(&self) -> EnvelopeStage {
        match &self.state {
            VoiceState::Active(voice) => voice.envelope.stage(),
            VoiceState::Idle => EnvelopeStage::Idle,
        }
    }

    /// Starts a note, replacing whatever was playing.
    ///
    /// The phase restarts at zero. If the voice was sounding, its playhead becomes the
    /// outgoing side of a crossfade and the envelope restarts from its current level.
    pub fn start(&mut self, note: NoteStart, envelope: &EnvelopeSettings, crossfade_length: u32) {
        let (outgoing, mut env) = match std::mem::take(&mut self.state) {
            VoiceState::Active(previous) => (Some(previous.playhead), previous.envelope),
            VoiceState::Idle => (None, Envelope::new()),
        };
        env.note_on(envelope);

        let pitch = match note.glide {
            Some(glide) => PitchState::Gliding(glide),
            None => PitchState::Steady(note.pitch),
        };
        // A retrigger before the first rendered frame still hands over a real ratio.
        let ratio_pitch = pitch.current() + note.pitch_offset;
        self.state = VoiceState::Active(ActiveVoice {
            note_pitch: note.pitch,
            velocity: note.velocity.clamp(0.0, 1.0),
            pitch,
            playhead: Playhead::new(pitch_ratio(ratio_pitch)),
            ratio_pitch,
            crossfade: outgoing.map(|playhead| Crossfade::new(playhead, crossfade_length)),
            envelope: env,
            start_order: note.start_order,
        });
    }

    /// Moves the envelope into release.
    pub fn release(&mut self, envelope: &EnvelopeSettings) {
        if let VoiceState::Active(voice) = &mut self.state {
            voice.envelope.note_off(envelope);
        }
    }

    /// Stops the voice immediately.
    pub fn stop(&mut self) {
        self.state = VoiceState::Idle;
    }

    /// Renders one frame, adding it into `frame` (one value per output channel).
    ///
    /// Output channels beyond the sample's channel count read its last channel.
    #[inline]
    pub fn render_into(&mut self, frame: &mut [f32], ctx: &VoiceContext) -> VoiceStep {
        let VoiceState::Active(voice) = &mut self.state else {
            return VoiceStep::Idle;
        };
        if voice.playhead.is_past(ctx.frames) {
            self.state = VoiceState::Idle;
            return VoiceStep::SampleEnded;
        }

        let pitch = voice.pitch.current() + ctx.pitch_offset;
        if pitch != voice.ratio_pitch {
            voice.playhead.ratio = pitch_ratio(pitch);
            voice.ratio_pitch = pitch;
        }

        let amplitude = ctx.gain * voice.velocity * voice.envelope.next_sample(&ctx.envelope);
        let last_channel = ctx.data.len() - 1;
        for (channel, out) in frame.iter_mut().enumerate() {
            let data = &ctx.data[channel.min(last_channel)];
            let mut value = voice.playhead.read(data);
            if let Some(fade) = &voice.crossfade {
                let (old_weight, new_weight) = fade.weights();
                value = fade.outgoing().read(data) * old_weight + value * new_weight;
            }
            *out += value * amplitude;
        }

        voice.playhead.advance();
        if let Some(fade) = &mut voice.crossfade {
            if fade.advance() {
                voice.crossfade = None;
            }
        }
        voice.pitch.advance();

        if !voice.envelope.is_active() {
            self.state = VoiceState::Idle;
            return VoiceStep::Released;
        }
        VoiceStep::Playing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples::crossfade::CROSSFADE_LENGTH;

    fn instant_envelope() -> EnvelopeSettings {
        // One-sample attack and decay into full sustain.
        EnvelopeSettings {
            attack: 1,
            decay: 1,
            sustain: 1.0,
            release: 10,
        }
    }

    fn note(pitch: f32, start_order: u64) -> NoteStart {
        NoteStart {
            pitch,
            velocity: 1.0,
            glide: None,
            pitch_offset: 0.0,
            start_order,
        }
    }

    fn context(data: &[Vec<f32>]) -> VoiceContext<'_> {
        VoiceContext {
            data,
            frames: data[0].len(),
            pitch_offset: 0.0,
            gain: 1.0,
            envelope: instant_envelope(),
        }
    }

    #[test]
    fn test_unity_pitch_plays_sample_for_sample() {
        let data = vec![(0..64).map(|i| i as f32 / 64.0).collect::<Vec<f32>>()];
        let ctx = context(&data);
        let mut voice = Voice::new();
        voice.start(note(0.0, 0), &ctx.envelope, CROSSFADE_LENGTH);

        for expected in &data[0] {
            let mut frame = [0.0f32];
            assert_eq!(voice.render_into(&mut frame, &ctx), VoiceStep::Playing);
            assert_eq!(frame[0], *expected);
        }
        let mut frame = [0.0f32];
        assert_eq!(voice.render_into(&mut frame, &ctx), VoiceStep::SampleEnded);
        assert!(!voice.is_active());
    }

    #[test]
    fn test_octave_up_skips_every_other_sample() {
        let data = vec![(0..64).map(|i| i as f32).collect::<Vec<f32>>()];
        let ctx = context(&data);
        let mut voice = Voice::new();
        voice.start(note(12.0, 0), &ctx.envelope, CROSSFADE_LENGTH);

        let mut rendered = Vec::new();
        while voice.is_active() {
            let mut frame = [0.0f32];
            if voice.render_into(&mut frame, &ctx) == VoiceStep::Playing {
                rendered.push(frame[0]);
            }
        }
        assert_eq!(rendered.len(), 32);
        assert_eq!(rendered[5], 10.0);
    }

    #[test]
    fn test_mono_sample_fills_every_output_channel() {
        let data = vec![vec![0.5f32; 8]];
        let ctx = context(&data);
        let mut voice = Voice::new();
        voice.start(note(0.0, 0), &ctx.envelope, CROSSFADE_LENGTH);

        let mut frame = [0.0f32; 2];
        voice.render_into(&mut frame, &ctx);
        assert_eq!(frame, [0.5, 0.5]);
    }

    #[test]
    fn test_retrigger_crossfades_from_old_playhead() {
        let data = vec![(0..4096).map(|i| i as f32).collect::<Vec<f32>>()];
        let ctx = context(&data);
        let mut voice = Voice::new();
        voice.start(note(0.0, 0), &ctx.envelope, 4);
        for _ in 0..100 {
            voice.render_into(&mut [0.0f32], &ctx);
        }

        voice.start(note(0.0, 1), &ctx.envelope, 4);
        let VoiceState::Active(active) = voice.state() else {
            panic!("voice should be active");
        };
        assert_eq!(active.playhead().position, 0.0);
        assert_eq!(active.crossfade().unwrap().outgoing().position, 100.0);

        // First frame is all outgoing signal; the window then moves to the new playhead.
        let mut frame = [0.0f32];
        voice.render_into(&mut frame, &ctx);
        assert_eq!(frame[0], 100.0);
        for _ in 0..3 {
            voice.render_into(&mut [0.0f32], &ctx);
        }
        let VoiceState::Active(active) = voice.state() else {
            panic!("voice should be active");
        };
        assert!(active.crossfade().is_none());
        let mut frame = [0.0f32];
        voice.render_into(&mut frame, &ctx);
        assert_eq!(frame[0], 4.0);
    }

    #[test]
    fn test_retrigger_before_first_frame_keeps_outgoing_ratio() {
        let mut voice = Voice::new();
        voice.start(
            NoteStart {
                pitch: 5.0,
                velocity: 1.0,
                glide: None,
                pitch_offset: 7.0,
                start_order: 0,
            },
            &instant_envelope(),
            CROSSFADE_LENGTH,
        );
        voice.start(note(0.0, 1), &instant_envelope(), CROSSFADE_LENGTH);

        let VoiceState::Active(active) = voice.state() else {
            panic!("voice should be active");
        };
        assert_eq!(active.crossfade().unwrap().outgoing().ratio, 2.0);
        assert_eq!(active.playhead().ratio, 1.0);
    }

    #[test]
    fn test_start_from_idle_has_no_crossfade() {
        let mut voice = Voice::new();
        voice.start(note(0.0, 0), &instant_envelope(), CROSSFADE_LENGTH);
        let VoiceState::Active(active) = voice.state() else {
            panic!("voice should be active");
        };
        assert!(active.crossfade().is_none());
        assert_eq!(voice.start_order(), Some(0));
        assert_eq!(voice.note_pitch(), Some(0.0));
    }

    #[test]
    fn test_glide_changes_pitch_then_settles() {
        let data = vec![vec![0.0f32; 10_000]];
        let ctx = context(&data);
        let mut voice = Voice::new();
        voice.start(
            NoteStart {
                pitch: 12.0,
                velocity: 1.0,
                glide: Some(SteppedGlide::new(0.0, 12.0, 2, 10)),
                pitch_offset: 0.0,
                start_order: 0,
            },
            &ctx.envelope,
            CROSSFADE_LENGTH,
        );

        for _ in 0..10 {
            voice.render_into(&mut [0.0f32], &ctx);
        }
        let VoiceState::Active(active) = voice.state() else {
            panic!("voice should be active");
        };
        assert_eq!(active.pitch(), &PitchState::Steady(12.0));
        assert_eq!(active.playhead().position, 10.0);
    }

    #[test]
    fn test_release_deactivates() {
        let data = vec![vec![1.0f32; 10_000]];
        let ctx = context(&data);
        let mut voice = Voice::new();
        voice.start(note(0.0, 0), &ctx.envelope, CROSSFADE_LENGTH);
        for _ in 0..5 {
            voice.render_into(&mut [0.0f32], &ctx);
        }
        voice.release(&ctx.envelope);
        assert_eq!(voice.envelope_stage(), EnvelopeStage::Release);

        let mut steps = Vec::new();
        for _ in 0..10 {
            steps.push(voice.render_into(&mut [0.0f32], &ctx));
        }
        assert_eq!(steps[9], VoiceStep::Released);
        assert!(!voice.is_active());
    }

    #[test]
    fn test_gain_velocity_and_envelope_multiply() {
        let data = vec![vec![1.0f32; 100]];
        let mut ctx = context(&data);
        ctx.gain = 0.5;
        let mut voice = Voice::new();
        voice.start(
            NoteStart {
                pitch: 0.0,
                velocity: 0.5,
                glide: None,
                pitch_offset: 0.0,
                start_order: 0,
            },
            &ctx.envelope,
            CROSSFADE_LENGTH,
        );
        let mut frame = [0.0f32];
        voice.render_into(&mut frame, &ctx);
        assert_eq!(frame[0], 0.25);
    }
}
