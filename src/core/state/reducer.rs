//=========================================================================
// Built-in Reducer
//=========================================================================
//
// The pure transition function for the application state tree. Every
// recognized action produces a fresh tree with only the affected branch
// replaced; unrecognized kinds and undecodable payloads hand back the
// input Rc unchanged, so no listener fires and no history is recorded.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::rc::Rc;

use log::warn;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

//=== Internal Dependencies ===============================================

use super::action::{kinds, Action};
use super::state::{AppState, ModalState, NotificationState, Viewport};

//=== Payload Shapes ======================================================

#[derive(Debug, Deserialize)]
struct ProfilePatch {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PreferencesPatch {
    #[serde(default)]
    locale: Option<String>,
    #[serde(default)]
    sound_enabled: Option<bool>,
    #[serde(default)]
    music_enabled: Option<bool>,
}

/// Incremental progress update. Fields compose, so one action can mark a
/// level complete and record its score at the same time.
#[derive(Debug, Deserialize)]
struct ProgressPatch {
    #[serde(default)]
    completed_level: Option<String>,
    #[serde(default)]
    score: Option<ScoreEntry>,
    #[serde(default)]
    achievement: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScoreEntry {
    level: String,
    value: u32,
}

#[derive(Debug, Deserialize)]
struct SceneChange {
    scene: String,
    #[serde(default)]
    payload: Option<Value>,
}

//=== Reducer =============================================================

/// Applies `action` to `state`, returning the next state.
///
/// Returns the same `Rc` (pointer-identical) when the action does not
/// change anything; the store relies on that identity to skip
/// notification and history recording.
pub fn reduce(state: &Rc<AppState>, action: &Action) -> Rc<AppState> {
    match action.kind.as_str() {
        kinds::APP_INITIALIZE => {
            let mut next = (**state).clone();
            next.app.initialized = true;
            Rc::new(next)
        }

        kinds::SET_VIEWPORT => match decode::<Viewport>(action) {
            Some(viewport) => {
                let mut next = (**state).clone();
                next.app.viewport = viewport;
                Rc::new(next)
            }
            None => Rc::clone(state),
        },

        kinds::SET_ERROR => {
            let mut next = (**state).clone();
            next.app.last_error = match &action.payload {
                Some(Value::String(message)) => Some(message.clone()),
                _ => None,
            };
            Rc::new(next)
        }

        kinds::SET_LOADING => match decode::<bool>(action) {
            Some(loading) => {
                let mut next = (**state).clone();
                next.app.loading = loading;
                next.ui.loading = loading;
                Rc::new(next)
            }
            None => Rc::clone(state),
        },

        kinds::UPDATE_PROFILE => match decode::<ProfilePatch>(action) {
            Some(patch) => {
                let mut next = (**state).clone();
                if let Some(id) = patch.id {
                    next.user.profile.id = Some(id);
                }
                if let Some(name) = patch.display_name {
                    next.user.profile.display_name = Some(name);
                }
                Rc::new(next)
            }
            None => Rc::clone(state),
        },

        kinds::UPDATE_PREFERENCES => match decode::<PreferencesPatch>(action) {
            Some(patch) => {
                let mut next = (**state).clone();
                if let Some(locale) = patch.locale {
                    next.user.preferences.locale = locale;
                }
                if let Some(sound) = patch.sound_enabled {
                    next.user.preferences.sound_enabled = sound;
                }
                if let Some(music) = patch.music_enabled {
                    next.user.preferences.music_enabled = music;
                }
                Rc::new(next)
            }
            None => Rc::clone(state),
        },

        kinds::UPDATE_PROGRESS => match decode::<ProgressPatch>(action) {
            Some(patch) => {
                let mut next = (**state).clone();
                let progress = &mut next.user.progress;
                if let Some(level) = patch.completed_level {
                    if !progress.completed_levels.contains(&level) {
                        progress.completed_levels.push(level);
                    }
                }
                if let Some(score) = patch.score {
                    progress.scores.insert(score.level, score.value);
                }
                if let Some(achievement) = patch.achievement {
                    if !progress.achievements.contains(&achievement) {
                        progress.achievements.push(achievement);
                    }
                }
                Rc::new(next)
            }
            None => Rc::clone(state),
        },

        kinds::CHANGE_SCENE => match decode::<SceneChange>(action) {
            Some(change) => {
                let mut next = (**state).clone();
                next.game.previous_scene = next.game.current_scene.take();
                next.game.current_scene = Some(change.scene);
                next.game.scene_payload = change.payload;
                Rc::new(next)
            }
            None => Rc::clone(state),
        },

        kinds::GAME_START => {
            let mut next = (**state).clone();
            next.game.is_game_active = true;
            next.game.is_paused = false;
            Rc::new(next)
        }

        kinds::GAME_END => {
            let mut next = (**state).clone();
            next.game.is_game_active = false;
            next.game.is_paused = false;
            Rc::new(next)
        }

        kinds::GAME_PAUSE => {
            let mut next = (**state).clone();
            next.game.is_paused = true;
            Rc::new(next)
        }

        kinds::GAME_RESUME => {
            let mut next = (**state).clone();
            next.game.is_paused = false;
            Rc::new(next)
        }

        kinds::SHOW_MODAL => match decode::<ModalState>(action) {
            Some(modal) => {
                let mut next = (**state).clone();
                next.ui.modal = Some(modal);
                Rc::new(next)
            }
            None => Rc::clone(state),
        },

        kinds::HIDE_MODAL => {
            let mut next = (**state).clone();
            next.ui.modal = None;
            Rc::new(next)
        }

        kinds::SHOW_NOTIFICATION => match decode::<NotificationState>(action) {
            Some(notification) => {
                let mut next = (**state).clone();
                next.ui.notification = Some(notification);
                Rc::new(next)
            }
            None => Rc::clone(state),
        },

        kinds::HIDE_NOTIFICATION => {
            let mut next = (**state).clone();
            next.ui.notification = None;
            Rc::new(next)
        }

        _ => Rc::clone(state),
    }
}

/// Decodes the action payload, treating a missing or malformed payload as
/// no-change (logged, never fatal).
fn decode<T: DeserializeOwned>(action: &Action) -> Option<T> {
    let Some(payload) = action.payload.clone() else {
        warn!("Reducer: '{}' dispatched without a payload", action.kind);
        return None;
    };

    match serde_json::from_value(payload) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            warn!("Reducer: malformed payload for '{}': {}", action.kind, e);
            None
        }
    }
}

//=========================================================================
// Tests
//=========================================================================
