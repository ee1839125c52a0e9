//=========================================================================
// State History
//=========================================================================
//
// Bounded linear undo/redo history over state snapshots.
//
// Layout:
//   entries: [s0, s1, s2, s3]   (s0 seeded from the initial state)
//                    ^cursor
//
// Recording truncates everything past the cursor, appends, then evicts
// from the front while over capacity. The cursor always points at the
// entry matching the store's current state, so eviction and truncation
// can never disagree at the capacity boundary.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::VecDeque;
use std::time::SystemTime;

use log::error;
use serde::{Deserialize, Serialize};
use serde_json::Value;

//=== Internal Dependencies ===============================================

use super::state::AppState;
use super::store::StoreError;

//=== Constants ===========================================================

/// Maximum number of history entries retained, oldest evicted first.
pub const HISTORY_CAPACITY: usize = 50;

/// Version tag stamped into every snapshot. Bump when the state tree
/// changes shape incompatibly.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Synthetic action kind recorded for the seeded initial entry.
pub const INIT_KIND: &str = "@@INIT";

//=== Snapshot ============================================================

/// A structurally independent copy of the state at one point in time.
///
/// Snapshots go through an explicit serialization round-trip rather than a
/// generic deep clone, so any value the state tree cannot represent in
/// JSON is a compile- or capture-time error instead of a silent drop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    version: u32,
    state: Value,
}

impl Snapshot {
    pub fn capture(state: &AppState) -> Result<Self, StoreError> {
        let state = serde_json::to_value(state)
            .map_err(|e| StoreError::Snapshot(e.to_string()))?;
        Ok(Self {
            version: SNAPSHOT_VERSION,
            state,
        })
    }

    pub fn restore(&self) -> Result<AppState, StoreError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(StoreError::Snapshot(format!(
                "snapshot version {} does not match current version {}",
                self.version, SNAPSHOT_VERSION
            )));
        }
        serde_json::from_value(self.state.clone())
            .map_err(|e| StoreError::Snapshot(e.to_string()))
    }
}

//=== History Entry =======================================================

#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub action_kind: String,
    pub snapshot: Snapshot,
    pub timestamp: SystemTime,
}

//=== History =============================================================

/// Linear undo/redo history with FIFO eviction at capacity.
///
/// Branching timelines are not supported: dispatching after an undo
/// discards every entry past the cursor before appending.
pub struct History {
    entries: VecDeque<HistoryEntry>,
    cursor: usize,
}

impl History {
    /// Creates a history seeded with the given state, so a single undo
    /// after the first action reaches the pre-action state.
    pub fn new(initial: &AppState) -> Result<Self, StoreError> {
        let mut history = Self {
            entries: VecDeque::new(),
            cursor: 0,
        };
        history.seed(initial)?;
        Ok(history)
    }

    /// Creates an empty history with nothing to undo or redo.
    ///
    /// Fallback for the store when the initial snapshot cannot be
    /// captured; the first recorded action becomes the oldest entry.
    pub fn unseeded() -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: 0,
        }
    }

    fn seed(&mut self, state: &AppState) -> Result<(), StoreError> {
        self.entries.push_back(HistoryEntry {
            action_kind: INIT_KIND.to_string(),
            snapshot: Snapshot::capture(state)?,
            timestamp: SystemTime::now(),
        });
        self.cursor = 0;
        Ok(())
    }

    //--- Recording --------------------------------------------------------

    /// Appends a post-action snapshot, discarding any redo future and
    /// evicting the oldest entries while over capacity.
    pub fn record(&mut self, action_kind: &str, state: &AppState) -> Result<(), StoreError> {
        let snapshot = Snapshot::capture(state)?;

        self.entries.truncate(self.cursor + 1);
        self.entries.push_back(HistoryEntry {
            action_kind: action_kind.to_string(),
            snapshot,
            timestamp: SystemTime::now(),
        });

        while self.entries.len() > HISTORY_CAPACITY {
            self.entries.pop_front();
        }
        self.cursor = self.entries.len() - 1;
        Ok(())
    }

    /// Drops all entries and reseeds from the given state.
    pub fn reset(&mut self, state: &AppState) -> Result<(), StoreError> {
        self.entries.clear();
        self.seed(state)
    }

    //--- Cursor Movement --------------------------------------------------

    /// Steps the cursor back one entry and returns that entry's state.
    /// Returns `None` at the oldest entry.
    pub fn undo(&mut self) -> Option<AppState> {
        if self.cursor == 0 {
            return None;
        }

        match self.entries[self.cursor - 1].snapshot.restore() {
            Ok(state) => {
                self.cursor -= 1;
                Some(state)
            }
            Err(e) => {
                error!("History: undo snapshot restore failed: {}", e);
                None
            }
        }
    }

    /// Steps the cursor forward one entry and returns that entry's state.
    /// Returns `None` at the newest entry.
    pub fn redo(&mut self) -> Option<AppState> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }

        match self.entries[self.cursor + 1].snapshot.restore() {
            Ok(state) => {
                self.cursor += 1;
                Some(state)
            }
            Err(e) => {
                error!("History: redo snapshot restore failed: {}", e);
                None
            }
        }
    }

    //--- Query API --------------------------------------------------------

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Read-only view of the recorded entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }
}

//=========================================================================
// Tests
//=========================================================================
