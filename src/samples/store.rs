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

//! The sample bank and its handoff to the render thread.
//!
//! Control-side callers (loading, removing, UI reads) serialize on one mutex.
//! Every mutation publishes an immutable [`BankSnapshot`] into a single-slot handoff.
//! The render thread picks it up with a `try_lock` at the start of a block and sends
//! the snapshot it replaced back over a channel, so sample memory is freed here and
//! not on the audio thread.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::builtin::builtin_resource;
use super::error::LoadError;
use super::loader::SampleLoader;
use super::record::{SampleRecord, SampleSource};
use crate::audio::{AudioResource, SampleDecoder};
use crate::config::SampleEntry;

/// How many replaced snapshots can wait to be freed on the control side.
const RETIRED_CAPACITY: usize = 64;

/// An immutable view of the bank as the render thread sees it.
#[derive(Debug, Default)]
pub struct BankSnapshot {
    records: Vec<Arc<SampleRecord>>,
}

impl BankSnapshot {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SampleRecord> {
        self.records.get(index).map(Arc::as_ref)
    }
}

struct Handoff {
    pending: Mutex<Option<Arc<BankSnapshot>>>,
}

/// What happened when the render thread checked for a new bank.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Refresh {
    Unchanged,
    /// A new snapshot is current. `retired` is false if the old one had to be
    /// dropped on the calling thread because the return channel was full.
    Swapped { retired: bool },
}

/// The render thread's handle on the bank.
pub struct BankReader {
    handoff: Arc<Handoff>,
    current: Arc<BankSnapshot>,
    retired: Sender<Arc<BankSnapshot>>,
}

impl BankReader {
    /// Picks up a newly published snapshot, if any. Never blocks.
    pub fn refresh(&mut self) -> Refresh {
        let next = match self.handoff.pending.try_lock() {
            Some(mut slot) => slot.take(),
            None => None,
        };
        let Some(next) = next else {
            return Refresh::Unchanged;
        };

        let old = std::mem::replace(&mut self.current, next);
        let retired = match self.retired.try_send(old) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => false,
        };
        Refresh::Swapped { retired }
    }

    pub fn current(&self) -> &BankSnapshot {
        &self.current
    }
}

struct StoreState {
    records: Vec<Arc<SampleRecord>>,
    loader: SampleLoader,
}

/// Owns the sample bank.
pub struct SampleStore {
    state: Mutex<StoreState>,
    handoff: Arc<Handoff>,
    retired_tx: Sender<Arc<BankSnapshot>>,
    retired_rx: Receiver<Arc<BankSnapshot>>,
}

impl SampleStore {
    /// Creates an empty store that stores samples at `sample_rate`.
    pub fn new(decoder: Arc<dyn SampleDecoder>, sample_rate: u32) -> Self {
        let (retired_tx, retired_rx) = crossbeam_channel::bounded(RETIRED_CAPACITY);
        Self {
            state: Mutex::new(StoreState {
                records: Vec::new(),
                loader: SampleLoader::new(decoder, sample_rate),
            }),
            handoff: Arc::new(Handoff {
                pending: Mutex::new(None),
            }),
            retired_tx,
            retired_rx,
        }
    }

    /// Creates a reader for the render thread, starting at the current bank.
    pub fn reader(&self) -> BankReader {
        let state = self.state.lock();
        BankReader {
            handoff: self.handoff.clone(),
            current: Arc::new(BankSnapshot {
                records: state.records.clone(),
            }),
            retired: self.retired_tx.clone(),
        }
    }

    /// Loads a file and appends it to the bank, returning its index.
    /// On failure the bank is unchanged.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<usize, LoadError> {
        let path = path.as_ref().to_path_buf();
        self.load_resource(
            &AudioResource::File(path.clone()),
            SampleSource::File(path),
        )
    }

    /// Loads the built-in sample and appends it to the bank.
    pub fn load_default(&self) -> Result<usize, LoadError> {
        self.load_resource(&builtin_resource()?, SampleSource::Builtin)
    }

    /// Decodes any resource and appends it to the bank.
    pub fn load_resource(
        &self,
        resource: &AudioResource,
        source: SampleSource,
    ) -> Result<usize, LoadError> {
        let mut state = self.state.lock();
        let record = match state.loader.load(resource, source) {
            Ok(record) => record,
            Err(e) => {
                warn!(resource = %resource.name(), error = %e, "Failed to load sample");
                return Err(e);
            }
        };
        state.records.push(Arc::new(record));
        let index = state.records.len() - 1;
        self.publish(&state);
        Ok(index)
    }

    /// Removes the sample at `index`. Returns false if there is no such sample.
    pub fn remove(&self, index: usize) -> bool {
        let mut state = self.state.lock();
        if index >= state.records.len() {
            return false;
        }
        let removed = state.records.remove(index);
        info!(sample = removed.name(), index, "Removed sample");
        self.publish(&state);
        true
    }

    /// Removes every sample.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.records.clear();
        info!("Cleared sample bank");
        self.publish(&state);
    }

    pub fn len(&self) -> usize {
        self.state.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().records.is_empty()
    }

    /// The record at `index`, for display.
    pub fn record(&self, index: usize) -> Option<Arc<SampleRecord>> {
        self.state.lock().records.get(index).cloned()
    }

    /// The names of every sample, in bank order.
    pub fn names(&self) -> Vec<String> {
        self.state
            .lock()
            .records
            .iter()
            .map(|record| record.name().to_string())
            .collect()
    }

    /// The per-sample gain in dB, or 0 for an unknown index.
    pub fn gain(&self, index: usize) -> f32 {
        self.record(index).map(|r| r.gain_db()).unwrap_or(0.0)
    }

    /// Sets the per-sample gain. Returns false for an unknown index.
    pub fn set_gain(&self, index: usize, db: f32) -> bool {
        match self.record(index) {
            Some(record) => {
                record.set_gain_db(db);
                true
            }
            None => false,
        }
    }

    /// The per-sample transpose in semitones, or 0 for an unknown index.
    pub fn transpose(&self, index: usize) -> f32 {
        self.record(index).map(|r| r.transpose()).unwrap_or(0.0)
    }

    /// Sets the per-sample transpose. Returns false for an unknown index.
    pub fn set_transpose(&self, index: usize, semitones: f32) -> bool {
        match self.record(index) {
            Some(record) => {
                record.set_transpose(semitones);
                true
            }
            None => false,
        }
    }

    /// The rate samples are stored at.
    pub fn sample_rate(&self) -> u32 {
        self.state.lock().loader.target_sample_rate()
    }

    /// Changes the storage rate and reloads every sample from its source.
    ///
    /// Gain and transpose carry over. A sample that fails to reload keeps its old
    /// audio and the error is returned.
    pub fn set_sample_rate(&self, sample_rate: u32) -> Vec<LoadError> {
        let mut state = self.state.lock();
        if state.loader.target_sample_rate() == sample_rate {
            return Vec::new();
        }
        info!(
            from = state.loader.target_sample_rate(),
            to = sample_rate,
            "Reloading samples at new sample rate"
        );
        state.loader = state.loader.with_sample_rate(sample_rate);

        let mut errors = Vec::new();
        let mut reloaded = Vec::with_capacity(state.records.len());
        for record in &state.records {
            let resource = match record.source() {
                SampleSource::File(path) => Ok(AudioResource::File(path.clone())),
                SampleSource::Builtin => builtin_resource().map_err(LoadError::from),
            };
            let result = resource.and_then(|resource| {
                state.loader.load(&resource, record.source().clone())
            });
            match result {
                Ok(new_record) => {
                    new_record.set_gain_db(record.gain_db());
                    new_record.set_transpose(record.transpose());
                    reloaded.push(Arc::new(new_record));
                }
                Err(e) => {
                    warn!(sample = record.name(), error = %e, "Failed to reload sample");
                    errors.push(e);
                    reloaded.push(record.clone());
                }
            }
        }
        state.records = reloaded;
        self.publish(&state);
        errors
    }

    /// Replaces the bank with the given entries, applying their gain and transpose.
    ///
    /// Entries that fail to load are skipped and their errors returned. If nothing
    /// loads, the built-in sample is loaded so the instrument always makes sound.
    pub fn restore(&self, entries: &[SampleEntry]) -> Vec<LoadError> {
        self.clear();
        let mut errors = Vec::new();
        for entry in entries {
            let result = if entry.is_builtin() {
                self.load_default()
            } else {
                self.load(entry.path())
            };
            match result {
                Ok(index) => {
                    self.set_gain(index, entry.gain_db());
                    self.set_transpose(index, entry.transpose());
                }
                Err(e) => errors.push(e),
            }
        }

        if self.is_empty() {
            info!("No samples restored, loading the built-in sample");
            if let Err(e) = self.load_default() {
                errors.push(e);
            }
        }
        errors
    }

    /// Describes the bank as entries that [`SampleStore::restore`] accepts.
    pub fn entries(&self) -> Vec<SampleEntry> {
        self.state
            .lock()
            .records
            .iter()
            .map(|record| {
                let path = match record.source() {
                    SampleSource::File(path) => path.clone(),
                    SampleSource::Builtin => PathBuf::from(super::record::BUILTIN_PATH),
                };
                SampleEntry::new(path, record.gain_db(), record.transpose())
            })
            .collect()
    }

    /// Frees snapshots the render thread has handed back. Returns how many.
    pub fn collect_retired(&self) -> usize {
        let mut count = 0;
        while self.retired_rx.try_recv().is_ok() {
            count += 1;
        }
        count
    }

    fn publish(&self, state: &StoreState) {
        let snapshot = Arc::new(BankSnapshot {
            records: state.records.clone(),
        });
        // A snapshot the render thread never picked up is dropped here.
        let _ = self.handoff.pending.lock().replace(snapshot);
        let retired = self.collect_retired();
        debug!(
            samples = state.records.len(),
            retired, "Published sample bank"
        );
    }
}

impl std::fmt::Debug for SampleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SampleStore")
            .field("samples", &state.records.len())
            .field("sample_rate", &state.loader.target_sample_rate())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::mock::{mono, MockDecoder};
    use crate::samples::builtin::BUILTIN_NAME;

    fn store_with(files: &[(&str, Vec<f32>, u32)]) -> SampleStore {
        let mut decoder = MockDecoder::new();
        for (path, samples, rate) in files {
            decoder = decoder.with_file(path, mono(samples.clone(), *rate));
        }
        SampleStore::new(Arc::new(decoder), 48000)
    }

    #[test]
    fn test_load_appends_in_order() {
        let store = store_with(&[
            ("/s/a.wav", vec![0.1; 10], 48000),
            ("/s/b.wav", vec![0.2; 20], 48000),
        ]);
        assert_eq!(store.load("/s/a.wav").unwrap(), 0);
        assert_eq!(store.load("/s/b.wav").unwrap(), 1);
        assert_eq!(store.names(), vec!["a", "b"]);
    }

    #[test]
    fn test_failed_load_leaves_bank_unchanged() {
        let store = store_with(&[("/s/a.wav", vec![0.1; 10], 48000)]);
        store.load("/s/a.wav").unwrap();
        let mut reader = store.reader();

        assert!(store.load("/s/nope.wav").is_err());
        assert_eq!(store.len(), 1);
        assert_eq!(reader.refresh(), Refresh::Unchanged);
    }

    #[test]
    fn test_load_default() {
        let store = SampleStore::new(Arc::new(MockDecoder::new()), 48000);
        let index = store.load_default().unwrap();
        let record = store.record(index).unwrap();
        assert_eq!(record.name(), BUILTIN_NAME);
        assert_eq!(record.source(), &SampleSource::Builtin);
        assert_eq!(record.sample_rate(), 48000);
        assert!((record.frames() as i64 - 96000).abs() <= 1);
    }

    #[test]
    fn test_remove_and_clear() {
        let store = store_with(&[
            ("/s/a.wav", vec![0.1; 10], 48000),
            ("/s/b.wav", vec![0.2; 20], 48000),
        ]);
        store.load("/s/a.wav").unwrap();
        store.load("/s/b.wav").unwrap();

        assert!(!store.remove(5));
        assert!(store.remove(0));
        assert_eq!(store.names(), vec!["b"]);

        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_gain_and_transpose_accessors() {
        let store = store_with(&[("/s/a.wav", vec![0.1; 10], 48000)]);
        store.load("/s/a.wav").unwrap();

        assert!(store.set_gain(0, 30.0));
        assert!(store.set_transpose(0, 5.0));
        assert_eq!(store.gain(0), 24.0);
        assert_eq!(store.transpose(0), 5.0);

        assert!(!store.set_gain(3, 1.0));
        assert_eq!(store.gain(3), 0.0);
        assert_eq!(store.transpose(3), 0.0);
    }

    #[test]
    fn test_reader_sees_published_snapshots() {
        let store = store_with(&[("/s/a.wav", vec![0.1; 10], 48000)]);
        let mut reader = store.reader();
        assert!(reader.current().is_empty());

        store.load("/s/a.wav").unwrap();
        assert_eq!(reader.refresh(), Refresh::Swapped { retired: true });
        assert_eq!(reader.current().len(), 1);
        assert_eq!(reader.refresh(), Refresh::Unchanged);

        // The replaced snapshot comes back to be freed here.
        assert_eq!(store.collect_retired(), 1);
    }

    #[test]
    fn test_reader_only_sees_latest_of_several_mutations() {
        let store = store_with(&[("/s/a.wav", vec![0.1; 10], 48000)]);
        let mut reader = store.reader();
        store.load("/s/a.wav").unwrap();
        store.load("/s/a.wav").unwrap();
        store.remove(0);

        assert!(matches!(reader.refresh(), Refresh::Swapped { .. }));
        assert_eq!(reader.current().len(), 1);
    }

    #[test]
    fn test_refresh_skips_when_handoff_locked() {
        let store = store_with(&[("/s/a.wav", vec![0.1; 10], 48000)]);
        let mut reader = store.reader();
        store.load("/s/a.wav").unwrap();

        let guard = store.handoff.pending.lock();
        assert_eq!(reader.refresh(), Refresh::Unchanged);
        drop(guard);
        assert!(matches!(reader.refresh(), Refresh::Swapped { .. }));
    }

    #[test]
    fn test_restore_applies_entries() {
        let store = store_with(&[
            ("/s/a.wav", vec![0.1; 10], 48000),
            ("/s/b.wav", vec![0.2; 10], 48000),
        ]);
        let errors = store.restore(&[
            SampleEntry::new(PathBuf::from("/s/a.wav"), -3.0, 2.0),
            SampleEntry::new(PathBuf::from("/s/missing.wav"), 0.0, 0.0),
            SampleEntry::new(PathBuf::from("/s/b.wav"), 6.0, -12.0),
        ]);
        assert_eq!(errors.len(), 1);
        assert_eq!(store.names(), vec!["a", "b"]);
        assert_eq!(store.gain(0), -3.0);
        assert_eq!(store.transpose(1), -12.0);

        let entries = store.entries();
        assert_eq!(entries[0].path(), Path::new("/s/a.wav"));
        assert_eq!(entries[1].gain_db(), 6.0);
    }

    #[test]
    fn test_restore_falls_back_to_builtin() {
        let store = store_with(&[]);
        let errors = store.restore(&[SampleEntry::new(PathBuf::from("/s/none.wav"), 0.0, 0.0)]);
        assert_eq!(errors.len(), 1);
        assert_eq!(store.names(), vec![BUILTIN_NAME]);
        assert!(store.entries()[0].is_builtin());
    }

    #[test]
    fn test_set_sample_rate_reloads_and_keeps_settings() {
        let store = store_with(&[("/s/a.wav", vec![0.1; 4800], 48000)]);
        store.load("/s/a.wav").unwrap();
        store.set_gain(0, -6.0);
        store.set_transpose(0, 3.0);

        let errors = store.set_sample_rate(96000);
        assert!(errors.is_empty());
        let record = store.record(0).unwrap();
        assert_eq!(record.sample_rate(), 96000);
        assert_eq!(record.frames(), 9600);
        assert_eq!(record.gain_db(), -6.0);
        assert_eq!(record.transpose(), 3.0);
        assert_eq!(store.sample_rate(), 96000);
    }
}
