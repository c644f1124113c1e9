// SPDX-FileCopyrightText: 2026 Parallel Tokyo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Two-phase tracking of a single optimistic write.
//!
//! A write starts `Pending` under a placeholder id, then ends exactly once in
//! either `Committed` (the server assigned a durable id) or `RolledBack`.

use ptokyo_core::PtokyoError;

/// Prefix of every placeholder id handed out by the store.
pub const PLACEHOLDER_PREFIX: &str = "temp-";

/// States of an optimistic write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteState {
    /// Applied locally, waiting for the remote acknowledgment.
    Pending,
    /// The remote accepted the write under `durable_id`.
    Committed { durable_id: String },
    /// The remote rejected the write; local state was reverted.
    RolledBack,
}

impl std::fmt::Display for WriteState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteState::Pending => write!(f, "pending"),
            WriteState::Committed { .. } => write!(f, "committed"),
            WriteState::RolledBack => write!(f, "rolled_back"),
        }
    }
}

/// One in-flight optimistic insert.
#[derive(Debug, Clone)]
pub struct PendingWrite {
    placeholder_id: String,
    state: WriteState,
}

impl PendingWrite {
    /// Starts a write under a fresh placeholder id.
    pub fn begin() -> Self {
        Self {
            placeholder_id: format!("{PLACEHOLDER_PREFIX}{}", uuid::Uuid::new_v4()),
            state: WriteState::Pending,
        }
    }

    pub fn placeholder_id(&self) -> &str {
        &self.placeholder_id
    }

    pub fn state(&self) -> &WriteState {
        &self.state
    }

    /// Pending -> Committed.
    pub fn commit(&mut self, durable_id: impl Into<String>) -> Result<(), PtokyoError> {
        let next = WriteState::Committed {
            durable_id: durable_id.into(),
        };
        self.transition(next)
    }

    /// Pending -> RolledBack.
    pub fn roll_back(&mut self) -> Result<(), PtokyoError> {
        self.transition(WriteState::RolledBack)
    }

    fn transition(&mut self, next: WriteState) -> Result<(), PtokyoError> {
        if self.state != WriteState::Pending {
            return Err(PtokyoError::InvalidTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        self.state = next;
        Ok(())
    }
}

/// Whether `id` was issued as a placeholder and has no server counterpart yet.
pub fn is_placeholder(id: &str) -> bool {
    id.starts_with(PLACEHOLDER_PREFIX)
}
