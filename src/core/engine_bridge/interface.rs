//=========================================================================
// Engine Bridge Interface
//=========================================================================
//
// Engine-to-runtime contract (control calls, events, and errors).
//
// The rendering engine is an external collaborator. The runtime drives
// it through EngineHandle and hears back through EngineEvents delivered
// over a channel, so engine backends can be swapped without touching the
// runtime.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;

use serde_json::Value;

//=== EngineEvent =========================================================

/// Events the engine pushes into the runtime's channel.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The viewport was resized.
    Resized { width: u32, height: u32 },

    /// An uncaught error escaped to the global error surface.
    UncaughtError(String),

    /// An asynchronous operation was rejected with nobody awaiting it.
    UnhandledRejection(String),
}

//=== EngineError =========================================================

/// Engine control-call failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A scene operation failed (unknown key, engine-side failure).
    Scene { key: String, cause: String },

    /// Installing the global error hooks failed.
    ErrorHooks(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scene { key, cause } => write!(f, "Scene operation on '{}' failed: {}", key, cause),
            Self::ErrorHooks(cause) => write!(f, "Failed to install global error hooks: {}", cause),
        }
    }
}

impl std::error::Error for EngineError {}

//=== EngineHandle ========================================================

/// Narrow control surface of the external engine.
///
/// All calls are synchronous requests; asynchronous outcomes (loader
/// signals, resize, uncaught errors) come back as [`EngineEvent`]s.
pub trait EngineHandle {
    fn add_scene(&self, key: &str) -> Result<(), EngineError>;

    fn start_scene(&self, key: &str, payload: Option<Value>) -> Result<(), EngineError>;

    fn remove_scene(&self, key: &str) -> Result<(), EngineError>;

    fn pause(&self);

    fn resume(&self);

    fn is_paused(&self) -> bool;

    /// Hooks the embedding's uncaught-error and unhandled-rejection
    /// surfaces up to the engine event channel.
    fn install_error_hooks(&self) -> Result<(), EngineError>;
}
