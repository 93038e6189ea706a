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

//! Value generators and the node state that drives them.
//!
//! A [`Generator`] describes how to produce values: how many, what the value
//! at each index is, and optionally how to simplify a failing value. A
//! [`GeneratorNode`] binds one generator to one execution node and keeps the
//! per-node state across passes: the RNG, the value for the current index,
//! the value last served to the test body, and any active shrink search.
//!
//! # Built-in generators
//!
//! | Constructor | Values | Shrinks |
//! |-------------|--------|---------|
//! | [`values_of`] | uniform integers in a range | yes |
//! | [`strings`] | strings over a charset | yes |
//! | [`vecs_of`] | vectors of another generator's values | yes |
//! | [`from_values`] | an explicit list, one per pass | no |
//! | [`inclusive_range`] | every integer in a range, one per pass | no |
//! | [`Generator::times`] | any generator, a fixed number of passes | delegates |

mod values;

pub use values::{
    charsets, from_values, inclusive_range, strings, values_of, vecs_of, FromValues,
    InclusiveRange, Integer, Repeat, StringsOf, ValuesOf, VecsOf,
};

use crate::error::{RepriseError, RepriseResult};
use crate::random::RandomNumberGenerator;
use crate::shrink::{ShrinkSearch, Shrinker, TriedCache};
use std::any::Any;
use std::fmt;

/// A source of values for a generator call site.
pub trait Generator: 'static {
    /// The produced value type.
    type Value: Clone + PartialEq + fmt::Debug + 'static;

    /// Number of values, or `None` to use the runner's default repetitions.
    fn size(&self) -> Option<usize> {
        None
    }

    /// Value for repetition `index`. Indices are requested in order starting
    /// from zero after every RNG reset, and are always below the node size.
    fn generate_at(&self, index: usize, rng: &mut RandomNumberGenerator) -> Self::Value;

    /// Simpler candidates for a failing `value`, or `None` if this generator
    /// cannot shrink.
    fn shrink(&self, _value: &Self::Value) -> Option<Shrinker<Self::Value>> {
        None
    }

    /// Produce values from this generator for exactly `times` passes.
    fn times(self, times: usize) -> Repeat<Self>
    where
        Self: Sized,
    {
        Repeat::new(times, self)
    }
}

/// Type-erased view of a [`GeneratorNode`] held by the execution tree.
pub trait DynGenerator {
    /// Number of repetitions.
    fn size(&self) -> usize;
    /// Rewind the RNG and regenerate the first value.
    fn move_first(&mut self);
    /// Generate the value for `index`.
    fn move_to(&mut self, index: usize);
    /// Debug rendering of the served value.
    fn describe(&self) -> String;
    /// Whether the served value can be shrunk.
    fn is_shrinkable(&self) -> bool;
    /// Begin a search from the served value. False if it cannot shrink.
    fn start_shrinking(&mut self) -> bool;
    /// Serve the next untried candidate. False when exhausted.
    fn next_shrink_candidate(&mut self) -> bool;
    /// Accept the served candidate as the new baseline.
    fn rebase_shrink(&mut self);
    /// End the search, serving the last failing value. True if it changed.
    fn stop_shrinking(&mut self) -> bool;
    /// Downcast support.
    fn as_any(&self) -> &dyn Any;
    /// Mutable downcast support.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Per-node state for one generator.
pub struct GeneratorNode<G: Generator> {
    generator: G,
    rng: RandomNumberGenerator,
    size: usize,
    current: G::Value,
    served: G::Value,
    search: Option<ShrinkSearch<G::Value>>,
    tried: TriedCache<G::Value>,
}

impl<G: Generator> GeneratorNode<G> {
    /// Bind `generator` to a node, generating its first value.
    ///
    /// # Errors
    ///
    /// Returns [`RepriseError::EmptyGenerator`] if the generator has no values.
    pub fn new(
        name: &str,
        generator: G,
        rng: RandomNumberGenerator,
        default_repetitions: usize,
        tried_capacity: usize,
    ) -> RepriseResult<Self> {
        let size = generator.size().unwrap_or(default_repetitions);
        if size == 0 {
            return Err(RepriseError::EmptyGenerator {
                name: name.to_string(),
            });
        }
        let mut rng = rng;
        rng.reset();
        let current = generator.generate_at(0, &mut rng);
        Ok(GeneratorNode {
            generator,
            rng,
            size,
            served: current.clone(),
            current,
            search: None,
            tried: TriedCache::new(tried_capacity),
        })
    }

    /// Value for the node's current repetition index.
    pub fn current_value(&self) -> &G::Value {
        &self.current
    }

    /// Value most recently handed to the test body, or the shrink candidate
    /// under trial.
    pub fn served_value(&self) -> &G::Value {
        &self.served
    }

    /// Hand the current value to the test body.
    pub(crate) fn serve(&mut self) -> G::Value {
        self.served = self.current.clone();
        self.served.clone()
    }

    /// True while a shrink search is active.
    pub fn is_shrinking(&self) -> bool {
        self.search.is_some()
    }
}

impl<G: Generator> DynGenerator for GeneratorNode<G> {
    fn size(&self) -> usize {
        self.size
    }

    fn move_first(&mut self) {
        self.rng.reset();
        self.current = self.generator.generate_at(0, &mut self.rng);
    }

    fn move_to(&mut self, index: usize) {
        self.current = self.generator.generate_at(index, &mut self.rng);
    }

    fn describe(&self) -> String {
        format!("{:?}", self.served)
    }

    fn is_shrinkable(&self) -> bool {
        self.generator.shrink(&self.served).is_some()
    }

    fn start_shrinking(&mut self) -> bool {
        match self.generator.shrink(&self.served) {
            Some(candidates) => {
                self.tried.clear();
                self.tried.insert(self.served.clone());
                self.search = Some(ShrinkSearch::new(self.served.clone(), candidates));
                true
            }
            None => false,
        }
    }

    fn next_shrink_candidate(&mut self) -> bool {
        let Some(search) = self.search.as_mut() else {
            return false;
        };
        for candidate in search.candidates.by_ref() {
            if self.tried.contains(&candidate) {
                continue;
            }
            self.tried.insert(candidate.clone());
            self.served = candidate;
            return true;
        }
        self.served = search.baseline.clone();
        false
    }

    fn rebase_shrink(&mut self) {
        let Some(search) = self.search.as_mut() else {
            return;
        };
        search.baseline = self.served.clone();
        search.rebased += 1;
        search.candidates = self
            .generator
            .shrink(&search.baseline)
            .unwrap_or_else(|| Box::new(std::iter::empty()));
    }

    fn stop_shrinking(&mut self) -> bool {
        match self.search.take() {
            Some(search) => {
                self.served = search.baseline;
                search.rebased > 0
            }
            None => false,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl<G: Generator> fmt::Debug for GeneratorNode<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorNode")
            .field("size", &self.size)
            .field("current", &self.current)
            .field("served", &self.served)
            .field("shrinking", &self.search.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node<G: Generator>(generator: G) -> GeneratorNode<G> {
        GeneratorNode::new("g", generator, RandomNumberGenerator::new(3), 100, 8).unwrap()
    }

    // ==================== Sequencing tests ====================

    #[test]
    fn test_first_value_generated_on_creation() {
        let g = node(from_values(vec![10, 20, 30]));
        assert_eq!(*g.current_value(), 10);
        assert_eq!(DynGenerator::size(&g), 3);
    }

    #[test]
    fn test_move_to_and_first() {
        let mut g = node(from_values(vec!['a', 'b']));
        g.move_to(1);
        assert_eq!(*g.current_value(), 'b');
        g.move_first();
        assert_eq!(*g.current_value(), 'a');
    }

    #[test]
    fn test_random_sequence_replays_after_reset() {
        let mut g = node(values_of::<u32>().up_to(1_000_000));
        let first: Vec<u32> = (1..10)
            .map(|i| {
                g.move_to(i);
                *g.current_value()
            })
            .collect();
        g.move_first();
        let second: Vec<u32> = (1..10)
            .map(|i| {
                g.move_to(i);
                *g.current_value()
            })
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_default_repetitions_used() {
        let g = node(values_of::<i8>());
        assert_eq!(DynGenerator::size(&g), 100);
    }

    #[test]
    fn test_empty_generator_rejected() {
        let err = GeneratorNode::new(
            "empty",
            from_values(Vec::<i32>::new()),
            RandomNumberGenerator::new(0),
            100,
            8,
        )
        .unwrap_err();
        assert_eq!(
            err,
            RepriseError::EmptyGenerator {
                name: "empty".to_string()
            }
        );
    }

    // ==================== Serving tests ====================

    #[test]
    fn test_served_value_survives_advance() {
        let mut g = node(from_values(vec![1, 2, 3]));
        assert_eq!(g.serve(), 1);
        g.move_to(1);
        assert_eq!(*g.current_value(), 2);
        assert_eq!(*g.served_value(), 1);
        assert_eq!(g.describe(), "1");
    }

    // ==================== Shrinking tests ====================

    #[test]
    fn test_unshrinkable_generator() {
        let mut g = node(from_values(vec![5]));
        assert!(!g.is_shrinkable());
        assert!(!g.start_shrinking());
        assert!(!g.next_shrink_candidate());
        assert!(!g.stop_shrinking());
    }

    #[test]
    fn test_shrink_at_lower_bound_has_no_candidates() {
        let mut g = node(values_of::<i32>().at_least(4).up_to(4));
        g.serve();
        assert!(g.start_shrinking());
        assert!(!g.next_shrink_candidate());
        assert!(!g.stop_shrinking());
        assert_eq!(*g.served_value(), 4);
    }

    #[test]
    fn test_shrink_search_accepts_failing_candidates() {
        let mut g = node(values_of::<u32>());
        g.current = 13;
        g.serve();
        assert!(g.start_shrinking());
        // anything above 7 keeps failing
        while g.next_shrink_candidate() {
            if *g.served_value() > 7 {
                g.rebase_shrink();
            }
        }
        assert!(g.stop_shrinking());
        assert_eq!(*g.served_value(), 8);
        assert_eq!(*g.current_value(), 13);
        assert!(!g.is_shrinking());
    }

    #[test]
    fn test_exhausted_search_serves_baseline() {
        let mut g = node(values_of::<u32>());
        g.current = 5;
        g.serve();
        assert!(g.start_shrinking());
        while g.next_shrink_candidate() {}
        assert_eq!(*g.served_value(), 5);
        assert!(!g.stop_shrinking());
    }
}
