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

//! Chooses which sample in the bank a trigger plays.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::params::CHAIN_SELECTOR_MAX;

/// Maps a chain position (0 to 63) proportionally onto a bank of `len` samples.
pub fn chain_index(position: u32, len: usize) -> usize {
    if len <= 1 {
        return 0;
    }
    let position = position.min(CHAIN_SELECTOR_MAX) as f64;
    let index = (position / CHAIN_SELECTOR_MAX as f64 * (len - 1) as f64 + 0.5) as usize;
    index.min(len - 1)
}

/// The selection policy with its per-trigger cache.
///
/// A decision holds until [`SampleSelector::invalidate`] is called, so a random pick
/// stays put for the whole note. Owned by the render thread; never allocates.
pub struct SampleSelector {
    cached: Option<usize>,
    rng: StdRng,
}

impl Default for SampleSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleSelector {
    pub fn new() -> Self {
        Self {
            cached: None,
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates a selector with a deterministic random sequence.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            cached: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Returns the selected index, deciding it first if nothing is cached.
    ///
    /// With a non-zero `randomization`, a uniform draw below that probability picks a
    /// random sample; otherwise the chain position decides.
    pub fn select_current(
        &mut self,
        len: usize,
        chain_position: u32,
        randomization: f32,
    ) -> Option<usize> {
        if len == 0 {
            self.cached = None;
            return None;
        }
        if let Some(index) = self.cached.filter(|index| *index < len) {
            return Some(index);
        }

        let index = if randomization > 0.0 && self.rng.gen::<f32>() < randomization {
            self.rng.gen_range(0..len)
        } else {
            chain_index(chain_position, len)
        };
        self.cached = Some(index);
        Some(index)
    }

    /// The cached decision, if any.
    pub fn current(&self) -> Option<usize> {
        self.cached
    }

    /// Forgets the cached decision so the next trigger decides again.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    /// Keeps the cached index inside a bank that now holds `len` samples.
    pub fn clamp_to(&mut self, len: usize) {
        self.cached = match self.cached {
            Some(_) if len == 0 => None,
            Some(index) => Some(index.min(len - 1)),
            None => None,
        };
    }
}

impl std::fmt::Debug for SampleSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleSelector")
            .field("cached", &self.cached)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_index_maps_proportionally() {
        assert_eq!(chain_index(0, 4), 0);
        assert_eq!(chain_index(63, 4), 3);
        assert_eq!(chain_index(21, 4), 1);
        assert_eq!(chain_index(42, 4), 2);
        assert_eq!(chain_index(32, 3), 1);
        assert_eq!(chain_index(40, 1), 0);
        assert_eq!(chain_index(40, 0), 0);
    }

    #[test]
    fn test_selection_is_cached_until_invalidated() {
        let mut selector = SampleSelector::with_seed(7);
        assert_eq!(selector.select_current(4, 63, 0.0), Some(3));
        // A changed chain position does not move a cached decision.
        assert_eq!(selector.select_current(4, 0, 0.0), Some(3));

        selector.invalidate();
        assert_eq!(selector.select_current(4, 0, 0.0), Some(0));
    }

    #[test]
    fn test_full_randomization_stays_in_range_and_varies() {
        let mut selector = SampleSelector::with_seed(42);
        let mut seen = [false; 8];
        for _ in 0..500 {
            selector.invalidate();
            let index = selector.select_current(8, 0, 1.0).unwrap();
            assert!(index < 8);
            seen[index] = true;
        }
        assert!(seen.iter().filter(|s| **s).count() > 1);
    }

    #[test]
    fn test_random_pick_is_cached() {
        let mut selector = SampleSelector::with_seed(3);
        let first = selector.select_current(16, 0, 1.0);
        for _ in 0..10 {
            assert_eq!(selector.select_current(16, 0, 1.0), first);
        }
    }

    #[test]
    fn test_empty_bank_selects_nothing() {
        let mut selector = SampleSelector::with_seed(1);
        assert_eq!(selector.select_current(0, 10, 0.5), None);
        assert_eq!(selector.current(), None);
    }

    #[test]
    fn test_clamp_to_smaller_bank() {
        let mut selector = SampleSelector::with_seed(1);
        selector.select_current(5, 63, 0.0);
        assert_eq!(selector.current(), Some(4));

        selector.clamp_to(2);
        assert_eq!(selector.current(), Some(1));

        selector.clamp_to(0);
        assert_eq!(selector.current(), None);
    }
}
