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

//! Error types for the Reprise execution core.
//!
//! Test failures are not errors: they are recorded as data on the
//! [`Outcome`](crate::Outcome). The variants here describe misuse of the
//! execution tree or the registry, and abort the run that hit them.

use crate::node::NodeState;
use thiserror::Error;

/// Errors raised by the execution tree, the runner and the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepriseError {
    /// A node was asked to enter or exit from a state that does not allow it.
    #[error("cannot {action} node '{node}' while it is {state}")]
    InvalidTransition {
        /// Declared name of the node
        node: String,
        /// The attempted transition (`enter`, `exit`, ...)
        action: &'static str,
        /// State the node was in
        state: NodeState,
    },

    /// Two call sites claimed the same identity, or one call site changed its
    /// name or kind between passes.
    #[error("identity collision at {call_site}: {existing} already registered, got {requested}")]
    IdentityCollision {
        /// Rendered call site
        call_site: String,
        /// Kind and name recorded when the node was created
        existing: String,
        /// Kind and name presented by the colliding call
        requested: String,
    },

    /// A generator reported zero values.
    #[error("generator '{name}' has no values to produce")]
    EmptyGenerator {
        /// Declared name of the generator
        name: String,
    },

    /// The root node did not complete within the configured number of passes.
    #[error("test '{test}' was not fully explored after {limit} passes")]
    PassLimitExceeded {
        /// Test name
        test: String,
        /// Configured pass limit
        limit: usize,
    },

    /// The runner configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A test with this name is already registered.
    #[error("duplicate test name '{0}'")]
    DuplicateTest(String),

    /// No registered test has this name.
    #[error("no test named '{0}'")]
    UnknownTest(String),

    /// A tag specification could not be parsed.
    #[error("invalid tag specification '{spec}': {reason}")]
    InvalidTags {
        /// The offending specification
        spec: String,
        /// What is wrong with it
        reason: String,
    },

    /// A node index from another tree, or out of range.
    #[error("node index {0} does not belong to this tree")]
    UnknownNode(usize),
}

impl RepriseError {
    pub(crate) fn invalid_transition(
        node: impl Into<String>,
        action: &'static str,
        state: NodeState,
    ) -> Self {
        RepriseError::InvalidTransition {
            node: node.into(),
            action,
            state,
        }
    }

    /// Returns true for errors caused by misuse of the node protocol.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            RepriseError::InvalidTransition { .. } | RepriseError::IdentityCollision { .. }
        )
    }
}

/// Result type for Reprise operations.
pub type RepriseResult<T> = Result<T, RepriseError>;
