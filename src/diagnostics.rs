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

//! Events from the render thread, logged elsewhere.
//!
//! The render thread must not log. It reports through a bounded channel with
//! `try_send`, dropping events when the channel is full, and a control thread drains
//! them into `tracing`.

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, warn};

/// Default capacity of the diagnostics channel.
pub const DEFAULT_CAPACITY: usize = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderEvent {
    /// A note-on arrived with no sample to play or no voice to play it on.
    NoteIgnored,
    VoiceStolen { voice: usize },
    SampleEnded { voice: usize },
    BankSwapped { samples: usize },
    /// A replaced bank snapshot was freed on the render thread.
    SnapshotDroppedOnRenderThread,
}

/// The render thread's end. Never blocks.
#[derive(Clone, Debug)]
pub struct DiagnosticsSender {
    tx: Sender<RenderEvent>,
}

impl DiagnosticsSender {
    #[inline]
    pub fn report(&self, event: RenderEvent) {
        let _ = self.tx.try_send(event);
    }
}

/// The control thread's end.
#[derive(Debug)]
pub struct DiagnosticsReceiver {
    rx: Receiver<RenderEvent>,
}

impl DiagnosticsReceiver {
    /// Logs every pending event and returns them.
    pub fn drain(&self) -> Vec<RenderEvent> {
        let events: Vec<RenderEvent> = self.rx.try_iter().collect();
        for event in &events {
            match event {
                RenderEvent::NoteIgnored => debug!("Note ignored, nothing to play"),
                RenderEvent::VoiceStolen { voice } => {
                    warn!(voice, "Voice limit reached, stealing oldest")
                }
                RenderEvent::SampleEnded { voice } => debug!(voice, "Sample ended"),
                RenderEvent::BankSwapped { samples } => debug!(samples, "Render bank updated"),
                RenderEvent::SnapshotDroppedOnRenderThread => {
                    warn!("Sample bank snapshot freed on the render thread")
                }
            }
        }
        events
    }
}

/// Creates a diagnostics channel holding at most `capacity` undrained events.
pub fn channel(capacity: usize) -> (DiagnosticsSender, DiagnosticsReceiver) {
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    (DiagnosticsSender { tx }, DiagnosticsReceiver { rx })
}
