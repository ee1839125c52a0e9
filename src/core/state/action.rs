//=========================================================================
// Actions
//=========================================================================
//
// The unit of state change: a kind string plus an optional JSON payload.
// An empty kind is a contract violation and is rejected by the store
// before any middleware runs.
//
//=========================================================================

//=== External Dependencies ===============================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

//=== Action Kinds ========================================================

/// Action kinds understood by the built-in reducer.
pub mod kinds {
    pub const APP_INITIALIZE: &str = "APP_INITIALIZE";
    pub const SET_VIEWPORT: &str = "SET_VIEWPORT";
    pub const SET_ERROR: &str = "SET_ERROR";
    pub const SET_LOADING: &str = "SET_LOADING";

    pub const UPDATE_PROFILE: &str = "UPDATE_PROFILE";
    pub const UPDATE_PREFERENCES: &str = "UPDATE_PREFERENCES";
    pub const UPDATE_PROGRESS: &str = "UPDATE_PROGRESS";

    pub const CHANGE_SCENE: &str = "CHANGE_SCENE";
    pub const GAME_START: &str = "GAME_START";
    pub const GAME_END: &str = "GAME_END";
    pub const GAME_PAUSE: &str = "GAME_PAUSE";
    pub const GAME_RESUME: &str = "GAME_RESUME";

    pub const SHOW_MODAL: &str = "SHOW_MODAL";
    pub const HIDE_MODAL: &str = "HIDE_MODAL";
    pub const SHOW_NOTIFICATION: &str = "SHOW_NOTIFICATION";
    pub const HIDE_NOTIFICATION: &str = "HIDE_NOTIFICATION";
}

//=== Action ==============================================================

/// A dispatched state transition request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Non-empty action kind. Matched by the reducer; unrecognized kinds
    /// leave the state untouched.
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl Action {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload: None,
        }
    }

    pub fn with_payload(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload: Some(payload),
        }
    }

    /// Whether the action satisfies the dispatch contract.
    pub fn is_valid(&self) -> bool {
        !self.kind.is_empty()
    }
}

//=========================================================================
// Tests
//=========================================================================
