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

//! Built-in generators.

use super::Generator;
use crate::random::RandomNumberGenerator;
use crate::shrink::{shorter_sequences, IntegerCandidates, Shrinker};
use rand::distributions::uniform::SampleUniform;
use std::fmt;

/// Character sets for [`StringsOf`].
pub mod charsets {
    /// `a` to `z`
    pub const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
    /// `A` to `Z`
    pub const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    /// Upper and lower case letters
    pub const ALPHA: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
    /// Decimal digits
    pub const NUMBERS: &str = "0123456789";
    /// Letters and digits
    pub const ALPHANUMERIC: &str =
        "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    /// Letters, digits and space
    pub const WORD_CHARS: &str =
        "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789 ";
    /// ASCII punctuation
    pub const SYMBOLS: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";
    /// Every printable ASCII character including space
    pub const PRINTABLE_ASCII: &str = " !\"#$%&'()*+,-./0123456789:;<=>?@ABCDEFGHIJKLMNOPQRSTUVWXYZ[\\]^_`abcdefghijklmnopqrstuvwxyz{|}~";
}

/// Primitive integers usable with [`values_of`] and [`inclusive_range`].
pub trait Integer:
    Copy + PartialOrd + fmt::Debug + SampleUniform + 'static
{
    /// Smallest value
    const MIN: Self;
    /// Largest value
    const MAX: Self;
    /// Zero
    const ZERO: Self;
    /// Lossless widening
    fn to_i128(self) -> i128;
    /// Narrowing, `None` when out of range
    fn from_i128(value: i128) -> Option<Self>;
}

macro_rules! impl_integer {
    ($($t:ty),*) => {
        $(
            impl Integer for $t {
                const MIN: Self = <$t>::MIN;
                const MAX: Self = <$t>::MAX;
                const ZERO: Self = 0;

                fn to_i128(self) -> i128 {
                    self as i128
                }

                fn from_i128(value: i128) -> Option<Self> {
                    <$t>::try_from(value).ok()
                }
            }
        )*
    };
}

impl_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

/// Uniformly distributed integers in `[at_least, up_to]`.
///
/// Values are drawn freshly on every pass; the number of passes comes from
/// the runner's default repetitions. Failing values shrink towards zero,
/// staying inside the bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValuesOf<T> {
    at_least: T,
    up_to: T,
}

/// Integers of type `T` from zero up to `T::MAX`.
///
/// # Examples
///
/// ```
/// use reprise_core::generator::values_of;
///
/// let dice = values_of::<u8>().at_least(1).up_to(6);
/// # let _ = dice;
/// ```
pub fn values_of<T: Integer>() -> ValuesOf<T> {
    ValuesOf {
        at_least: T::ZERO,
        up_to: T::MAX,
    }
}

impl<T: Integer> ValuesOf<T> {
    /// Lower bound, inclusive.
    pub fn at_least(mut self, value: T) -> Self {
        self.at_least = value;
        self
    }

    /// Upper bound, inclusive.
    pub fn up_to(mut self, value: T) -> Self {
        self.up_to = value;
        self
    }

    /// Full range of the type, negative values included.
    pub fn full_range(self) -> Self {
        self.at_least(T::MIN).up_to(T::MAX)
    }
}

impl<T: Integer + PartialEq> Generator for ValuesOf<T> {
    type Value = T;

    fn generate_at(&self, _index: usize, rng: &mut RandomNumberGenerator) -> T {
        rng.generate(self.at_least, self.up_to)
    }

    fn shrink(&self, value: &T) -> Option<Shrinker<T>> {
        let (low, high) = (self.at_least, self.up_to);
        Some(Box::new(
            IntegerCandidates::new(value.to_i128())
                .filter_map(T::from_i128)
                .filter(move |c| *c >= low && *c <= high),
        ))
    }
}

/// Random strings with a length in `[min_len, max_len]` over a charset.
#[derive(Debug, Clone, PartialEq)]
pub struct StringsOf {
    min_len: usize,
    max_len: usize,
    charset: Vec<char>,
}

/// Strings of up to 65 word characters.
pub fn strings() -> StringsOf {
    StringsOf {
        min_len: 0,
        max_len: 65,
        charset: charsets::WORD_CHARS.chars().collect(),
    }
}

impl StringsOf {
    /// Minimum length in characters.
    pub fn min_len(mut self, len: usize) -> Self {
        self.min_len = len;
        self
    }

    /// Maximum length in characters.
    pub fn max_len(mut self, len: usize) -> Self {
        self.max_len = len;
        self
    }

    /// Characters to draw from. An empty set falls back to word characters.
    pub fn charset(mut self, chars: &str) -> Self {
        self.charset = if chars.is_empty() {
            charsets::WORD_CHARS.chars().collect()
        } else {
            chars.chars().collect()
        };
        self
    }
}

impl Generator for StringsOf {
    type Value = String;

    fn generate_at(&self, _index: usize, rng: &mut RandomNumberGenerator) -> String {
        let len = rng.generate(self.min_len, self.max_len.max(self.min_len));
        (0..len)
            .map(|_| self.charset[rng.index(self.charset.len())])
            .collect()
    }

    fn shrink(&self, value: &String) -> Option<Shrinker<String>> {
        let chars: Vec<char> = value.chars().collect();
        Some(Box::new(
            shorter_sequences(chars.len(), self.min_len)
                .map(move |indices| indices.into_iter().map(|i| chars[i]).collect()),
        ))
    }
}

/// Random vectors of another generator's values.
#[derive(Debug, Clone)]
pub struct VecsOf<G> {
    min_size: usize,
    max_size: usize,
    element: G,
}

/// Vectors of up to 16 elements drawn from `element`.
pub fn vecs_of<G: Generator>(element: G) -> VecsOf<G> {
    VecsOf {
        min_size: 0,
        max_size: 16,
        element,
    }
}

impl<G: Generator> VecsOf<G> {
    /// Minimum number of elements.
    pub fn min_size(mut self, size: usize) -> Self {
        self.min_size = size;
        self
    }

    /// Maximum number of elements.
    pub fn max_size(mut self, size: usize) -> Self {
        self.max_size = size;
        self
    }
}

impl<G: Generator> Generator for VecsOf<G> {
    type Value = Vec<G::Value>;

    fn generate_at(&self, _index: usize, rng: &mut RandomNumberGenerator) -> Vec<G::Value> {
        let element_size = self.element.size();
        if element_size == Some(0) {
            return Vec::new();
        }
        let len = rng.generate(self.min_size, self.max_size.max(self.min_size));
        (0..len)
            .map(|position| {
                // sized elements are drawn from their own index range
                let index = match element_size {
                    Some(size) => rng.index(size),
                    None => position,
                };
                self.element.generate_at(index, rng)
            })
            .collect()
    }

    fn shrink(&self, value: &Vec<G::Value>) -> Option<Shrinker<Vec<G::Value>>> {
        let items = value.clone();
        Some(Box::new(
            shorter_sequences(items.len(), self.min_size)
                .map(move |indices| indices.into_iter().map(|i| items[i].clone()).collect()),
        ))
    }
}

/// An explicit list of values, one per pass, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct FromValues<T> {
    values: Vec<T>,
}

/// One pass per element of `values`.
pub fn from_values<T>(values: Vec<T>) -> FromValues<T> {
    FromValues { values }
}

impl<T: Clone + PartialEq + fmt::Debug + 'static> Generator for FromValues<T> {
    type Value = T;

    fn size(&self) -> Option<usize> {
        Some(self.values.len())
    }

    /// Indices past the end wrap around. Never called for an empty list,
    /// which the node rejects as having no values.
    fn generate_at(&self, index: usize, _rng: &mut RandomNumberGenerator) -> T {
        self.values[index % self.values.len()].clone()
    }
}

/// Every integer in `[from, to]`, one per pass, ascending.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InclusiveRange<T> {
    from: T,
    to: T,
}

/// One pass per integer in `[from, to]`. An inverted range has no values.
pub fn inclusive_range<T: Integer>(from: T, to: T) -> InclusiveRange<T> {
    InclusiveRange { from, to }
}

impl<T: Integer + PartialEq> Generator for InclusiveRange<T> {
    type Value = T;

    fn size(&self) -> Option<usize> {
        let span = self.to.to_i128() - self.from.to_i128();
        if span < 0 {
            return Some(0);
        }
        Some(usize::try_from(span + 1).unwrap_or(usize::MAX))
    }

    fn generate_at(&self, index: usize, _rng: &mut RandomNumberGenerator) -> T {
        let offset = i128::try_from(index).unwrap_or(i128::MAX);
        T::from_i128(self.from.to_i128().saturating_add(offset)).unwrap_or(self.to)
    }
}

/// Another generator run for a fixed number of passes.
#[derive(Debug, Clone)]
pub struct Repeat<G> {
    times: usize,
    inner: G,
}

impl<G> Repeat<G> {
    pub(crate) fn new(times: usize, inner: G) -> Self {
        Repeat { times, inner }
    }
}

impl<G: Generator> Generator for Repeat<G> {
    type Value = G::Value;

    fn size(&self) -> Option<usize> {
        match self.inner.size() {
            Some(0) => Some(0),
            _ => Some(self.times),
        }
    }

    /// A sized inner generator cycles through its values.
    fn generate_at(&self, index: usize, rng: &mut RandomNumberGenerator) -> G::Value {
        let index = match self.inner.size() {
            Some(size) if size > 0 => index % size,
            _ => index,
        };
        self.inner.generate_at(index, rng)
    }

    fn shrink(&self, value: &G::Value) -> Option<Shrinker<G::Value>> {
        self.inner.shrink(value)
    }
}
