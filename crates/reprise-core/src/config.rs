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

//! Runner configuration.

use crate::error::{RepriseError, RepriseResult};

/// Seed used when none is supplied.
pub const DEFAULT_SEED: u64 = 0x5EED_CA7C_4023_0001;

/// Repetitions for generators that do not report their own size.
pub const DEFAULT_REPETITIONS: usize = 100;

/// Configuration for a [`Runner`](crate::Runner).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Repetitions for open-ended random generators (default: 100).
    pub default_repetitions: usize,
    /// Base seed mixed into every generator node's seed (default: [`DEFAULT_SEED`]).
    pub seed: u64,
    /// Run the shrink search when a pass fails (default: true).
    pub shrink: bool,
    /// Maximum passes before a test is declared stuck (default: 1M).
    pub max_passes: usize,
    /// Maximum candidate replays per shrinking node (default: 10k).
    pub max_shrink_attempts: usize,
    /// Capacity of each node's tried-value cache (default: 32).
    pub tried_cache_capacity: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            default_repetitions: DEFAULT_REPETITIONS,
            seed: DEFAULT_SEED,
            shrink: true,
            max_passes: 1_000_000,
            max_shrink_attempts: 10_000,
            tried_cache_capacity: 32,
        }
    }
}

impl RunnerConfig {
    /// Default configuration with a seed drawn from the thread RNG.
    pub fn with_random_seed() -> Self {
        Self {
            seed: rand::random(),
            ..Self::default()
        }
    }

    /// Replace the base seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Replace the default generator repetitions.
    pub fn repetitions(mut self, repetitions: usize) -> Self {
        self.default_repetitions = repetitions;
        self
    }

    /// Enable or disable shrinking.
    pub fn shrinking(mut self, enabled: bool) -> Self {
        self.shrink = enabled;
        self
    }

    /// Replace the pass limit.
    pub fn max_passes(mut self, limit: usize) -> Self {
        self.max_passes = limit;
        self
    }

    /// Check that every limit is usable.
    ///
    /// # Errors
    ///
    /// Returns [`RepriseError::InvalidConfig`] when a count that must be
    /// positive is zero.
    pub fn validate(&self) -> RepriseResult<()> {
        if self.default_repetitions == 0 {
            return Err(RepriseError::InvalidConfig(
                "default_repetitions must be at least 1".to_string(),
            ));
        }
        if self.max_passes == 0 {
            return Err(RepriseError::InvalidConfig(
                "max_passes must be at least 1".to_string(),
            ));
        }
        if self.tried_cache_capacity == 0 {
            return Err(RepriseError::InvalidConfig(
                "tried_cache_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
