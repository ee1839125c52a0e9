//=========================================================================
// Application State Tree
//=========================================================================
//
// The single shared state tree, owned by the StateStore and updated only
// through the reducer. Immutable by convention: readers hold an
// Rc<AppState> and never mutate through it; the reducer produces a fresh
// tree for every change.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

//=== Root ================================================================

/// Root of the application state tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    pub app: AppSection,
    pub user: UserSection,
    pub game: GameSection,
    pub ui: UiSection,
}

//=== App Section =========================================================

/// Process-level flags and the last error surfaced to the UI layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppSection {
    pub initialized: bool,
    pub loading: bool,
    pub last_error: Option<String>,
    pub viewport: Viewport,
}

/// Logical viewport size reported by the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

//=== User Section ========================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserSection {
    pub profile: Profile,
    pub preferences: Preferences,
    pub progress: Progress,
}

/// Identity of the local player. Everything is client-local, so the id is
/// whatever the embedding assigned (or nothing at all).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub locale: String,
    pub sound_enabled: bool,
    pub music_enabled: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            locale: "en".to_string(),
            sound_enabled: true,
            music_enabled: true,
        }
    }
}

/// Per-player learning progress. Scores are keyed by level id; a BTreeMap
/// keeps serialization order stable for snapshot comparisons.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub completed_levels: Vec<String>,
    pub scores: BTreeMap<String, u32>,
    pub achievements: Vec<String>,
}

//=== Game Section ========================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameSection {
    pub current_scene: Option<String>,
    pub previous_scene: Option<String>,

    /// Payload handed to the next scene on transition.
    pub scene_payload: Option<Value>,

    pub is_paused: bool,
    pub is_game_active: bool,
}

//=== UI Section ==========================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiSection {
    pub modal: Option<ModalState>,
    pub notification: Option<NotificationState>,
    pub loading: bool,
}

/// Descriptor of the currently open modal, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalState {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationState {
    pub message: String,
    #[serde(default)]
    pub severity: Severity,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

//=========================================================================
// Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_inactive() {
        let state = AppState::default();
        assert!(!state.app.initialized);
        assert!(!state.game.is_game_active);
        assert!(!state.game.is_paused);
        assert!(state.ui.modal.is_none());
    }

    #[test]
    fn default_preferences_enable_audio() {
        let prefs = Preferences::default();
        assert_eq!(prefs.locale, "en");
        assert!(prefs.sound_enabled);
        assert!(prefs.music_enabled);
    }

    #[test]
    fn state_round_trips_through_json() {
        let mut state = AppState::default();
        state.user.progress.completed_levels.push("vowels-1".to_string());
        state.user.progress.scores.insert("vowels-1".to_string(), 80);
        state.game.current_scene = Some("menu".to_string());

        let json = serde_json::to_string(&state).unwrap();
        let back: AppState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
