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

//! Seedable random source for generator nodes.

use rand::distributions::uniform::SampleUniform;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hash::{Hash, Hasher};

/// A random number generator that can rewind to its seed.
///
/// Every generator node owns one. Rewinding on reset makes a node replay the
/// same value sequence each time its parent restarts it.
#[derive(Debug, Clone)]
pub struct RandomNumberGenerator {
    seed: u64,
    rng: StdRng,
}

impl RandomNumberGenerator {
    /// Create a generator positioned at the start of `seed`'s sequence.
    pub fn new(seed: u64) -> Self {
        RandomNumberGenerator {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Derive a generator from a base seed and a stable key.
    ///
    /// The key is hashed with FNV-1a, so a seed reproduces the same values
    /// across toolchains and platforms.
    pub fn derived<K: Hash + ?Sized>(base: u64, key: &K) -> Self {
        let mut hasher = Fnv1a::default();
        base.hash(&mut hasher);
        key.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// The seed this generator rewinds to.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Rewind to the start of the sequence.
    pub fn reset(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
    }

    /// Uniform value in `[from, to]`. Returns `from` when the range is empty
    /// or a single point.
    pub fn generate<T>(&mut self, from: T, to: T) -> T
    where
        T: SampleUniform + PartialOrd + Copy,
    {
        if from >= to {
            return from;
        }
        self.rng.gen_range(from..=to)
    }

    /// Uniform index below `len`; zero for an empty range.
    pub fn index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        self.rng.gen_range(0..len)
    }
}

/// 64-bit FNV-1a with integers fed little-endian.
struct Fnv1a(u64);

impl Default for Fnv1a {
    fn default() -> Self {
        Fnv1a(0xcbf2_9ce4_8422_2325)
    }
}

impl Hasher for Fnv1a {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.0 ^= u64::from(byte);
            self.0 = self.0.wrapping_mul(0x0000_0100_0000_01b3);
        }
    }

    fn write_u16(&mut self, i: u16) {
        self.write(&i.to_le_bytes());
    }

    fn write_u32(&mut self, i: u32) {
        self.write(&i.to_le_bytes());
    }

    fn write_u64(&mut self, i: u64) {
        self.write(&i.to_le_bytes());
    }

    fn write_usize(&mut self, i: usize) {
        self.write_u64(i as u64);
    }
}
