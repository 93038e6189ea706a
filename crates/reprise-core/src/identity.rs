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

//! Node identity.
//!
//! A node is recognised across passes by where it was declared, not by what
//! it is called. Call sites are either captured source locations (via
//! `#[track_caller]`) or explicit string keys for call sites that run in a
//! loop or are produced by generated code.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::panic::Location;

/// A position in a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SourceLocation {
    /// Source file path as reported by the compiler
    pub file: &'static str,
    /// 1-based line
    pub line: u32,
    /// 1-based column
    pub column: u32,
}

impl SourceLocation {
    /// Location of the caller of the enclosing `#[track_caller]` function.
    #[track_caller]
    pub fn caller() -> Self {
        Location::caller().into()
    }
}

impl From<&'static Location<'static>> for SourceLocation {
    fn from(location: &'static Location<'static>) -> Self {
        SourceLocation {
            file: location.file(),
            line: location.line(),
            column: location.column(),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// The stable key of a call site.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CallSite {
    /// Captured source position
    Source(SourceLocation),
    /// Caller-supplied key
    Key(String),
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallSite::Source(location) => write!(f, "{}", location),
            CallSite::Key(key) => write!(f, "key '{}'", key),
        }
    }
}

/// Identity of an execution node: a declared name plus its call site.
///
/// Equality and hashing consider the call site only. Two call sites that
/// share a name are distinct nodes; a single call site maps to the same node
/// on every pass.
///
/// # Examples
///
/// ```
/// use reprise_core::NodeId;
///
/// let a = NodeId::keyed("first", "k");
/// let b = NodeId::keyed("second", "k");
/// assert_eq!(a, b);
/// assert_ne!(NodeId::new("x"), NodeId::new("x"));
/// ```
#[derive(Debug, Clone)]
pub struct NodeId {
    name: String,
    call_site: CallSite,
}

impl NodeId {
    /// Identity anchored at the caller's source location.
    #[track_caller]
    pub fn new(name: impl Into<String>) -> Self {
        NodeId {
            name: name.into(),
            call_site: CallSite::Source(SourceLocation::caller()),
        }
    }

    /// Identity anchored at an explicit source location.
    pub fn at(name: impl Into<String>, location: SourceLocation) -> Self {
        NodeId {
            name: name.into(),
            call_site: CallSite::Source(location),
        }
    }

    /// Identity anchored at a caller-supplied key.
    pub fn keyed(name: impl Into<String>, key: impl Into<String>) -> Self {
        NodeId {
            name: name.into(),
            call_site: CallSite::Key(key.into()),
        }
    }

    /// Declared name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Call-site key used for equality.
    pub fn call_site(&self) -> &CallSite {
        &self.call_site
    }

    /// True when both identities share a call site and a name.
    pub fn matches_exactly(&self, other: &NodeId) -> bool {
        self.call_site == other.call_site && self.name == other.name
    }
}

impl PartialEq for NodeId {
    fn eq(&self, other: &Self) -> bool {
        self.call_site == other.call_site
    }
}

impl Eq for NodeId {}

impl Hash for NodeId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.call_site.hash(state);
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' at {}", self.name, self.call_site)
    }
}
