// Dweve Reprise - Re-entrant Test Execution Core
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Shrink candidates and per-node search state.
//!
//! A shrinker is a lazy iterator of values that are simpler than the one it
//! was seeded from. The runner pulls candidates one at a time, replays the
//! test with each, and reseeds from any candidate that still fails.

use std::collections::VecDeque;

/// Lazy sequence of simpler candidate values.
pub type Shrinker<T> = Box<dyn Iterator<Item = T>>;

/// Bounded memory of values already tried during one shrink search.
///
/// Oldest entries are evicted first once the capacity is reached.
#[derive(Debug, Clone)]
pub struct TriedCache<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T: PartialEq> TriedCache<T> {
    /// Empty cache holding at most `capacity` values (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        TriedCache {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Whether `value` was recorded and not yet evicted.
    pub fn contains(&self, value: &T) -> bool {
        self.entries.iter().any(|v| v == value)
    }

    /// Record `value`, evicting the oldest entry when full.
    pub fn insert(&mut self, value: T) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(value);
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of remembered values.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is remembered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// An active shrink search on one generator node.
pub(crate) struct ShrinkSearch<T> {
    /// Last value known to fail
    pub(crate) baseline: T,
    pub(crate) candidates: Shrinker<T>,
    /// Number of times a candidate replaced the baseline
    pub(crate) rebased: usize,
}

impl<T> ShrinkSearch<T> {
    pub(crate) fn new(baseline: T, candidates: Shrinker<T>) -> Self {
        ShrinkSearch {
            baseline,
            candidates,
            rebased: 0,
        }
    }
}

/// Candidates for an integer, in order of preference.
///
/// For a positive value: `0`, `1`, `2`, half the value, then each value
/// counting down from `value - 1` to `3`. Negative values mirror this towards
/// zero. Every candidate is strictly closer to zero than the seed; zero
/// itself has no candidates.
#[derive(Debug, Clone)]
pub struct IntegerCandidates {
    value: i128,
    cursor: i128,
    stage: u8,
}

impl IntegerCandidates {
    /// Candidates for `value`.
    pub fn new(value: i128) -> Self {
        IntegerCandidates {
            value,
            cursor: value,
            stage: 0,
        }
    }
}

impl Iterator for IntegerCandidates {
    type Item = i128;

    fn next(&mut self) -> Option<i128> {
        let v = self.value;
        loop {
            match self.stage {
                0 => {
                    self.stage = 1;
                    if v != 0 {
                        return Some(0);
                    }
                }
                1 => {
                    self.stage = 2;
                    if v > 1 {
                        return Some(1);
                    }
                    if v < -1 {
                        return Some(-1);
                    }
                }
                2 => {
                    self.stage = 3;
                    if v > 2 {
                        return Some(2);
                    }
                    if v < -2 {
                        return Some(-2);
                    }
                }
                3 => {
                    self.stage = 4;
                    if !(-5..=5).contains(&v) {
                        return Some(v / 2);
                    }
                }
                _ => {
                    if self.cursor > 3 {
                        self.cursor -= 1;
                        return Some(self.cursor);
                    }
                    if self.cursor < -3 {
                        self.cursor += 1;
                        return Some(self.cursor);
                    }
                    return None;
                }
            }
        }
    }
}

/// Candidates for a sequence of `len` items that must keep at least
/// `min_len`: truncate to the minimum, truncate to half, then drop each item
/// in turn. Produced as index lists so strings and vectors can share it.
pub(crate) fn shorter_sequences(
    len: usize,
    min_len: usize,
) -> Box<dyn Iterator<Item = Vec<usize>>> {
    if len <= min_len {
        return Box::new(std::iter::empty());
    }
    let truncated = std::iter::once((0..min_len).collect::<Vec<_>>());
    let half = len / 2;
    let halved = (half > min_len).then(move || (0..half).collect::<Vec<_>>());
    let dropped = (0..len).map(move |skip| (0..len).filter(|&i| i != skip).collect::<Vec<_>>());
    Box::new(truncated.chain(halved).chain(dropped))
}
