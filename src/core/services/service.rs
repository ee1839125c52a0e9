//=========================================================================
// Service Trait
//=========================================================================
//
// Contract for anything the registry can hold: audio backends, input
// wrappers, i18n lookups, analytics bridges. Lifecycle hooks are async
// because service setup routinely waits on the engine or the network.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use futures::future::{self, FutureExt, LocalBoxFuture};

//=== ServiceError ========================================================

/// Failures surfaced by service registration, resolution, or lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// A factory's construction synchronously re-entered itself, directly
    /// or through another pending factory.
    CircularDependency(String),

    /// Registering over a name whose singleton result is already cached.
    /// Unregister the name first if replacement is intended.
    SingletonOverride(String),

    /// A factory failed to produce its service.
    Construction { name: String, cause: String },

    /// An `initialize` or `destroy` hook failed.
    Hook { name: String, cause: String },
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CircularDependency(name) => {
                write!(f, "Circular dependency while constructing service '{}'", name)
            }
            Self::SingletonOverride(name) => {
                write!(f, "Service '{}' already resolved as a singleton; unregister it first", name)
            }
            Self::Construction { name, cause } => {
                write!(f, "Failed to construct service '{}': {}", name, cause)
            }
            Self::Hook { name, cause } => {
                write!(f, "Lifecycle hook of service '{}' failed: {}", name, cause)
            }
        }
    }
}

impl std::error::Error for ServiceError {}

//=== Service =============================================================

/// A named runtime collaborator managed by the registry.
///
/// `as_any_rc` enables typed lookups; every implementation is the same
/// one-liner:
///
/// ```rust
/// # use std::any::Any;
/// # use std::rc::Rc;
/// # use kalike_runtime::core::services::Service;
/// struct AudioService;
///
/// impl Service for AudioService {
///     fn as_any_rc(self: Rc<Self>) -> Rc<dyn Any> {
///         self
///     }
/// }
/// ```
pub trait Service: 'static {
    /// Upcast for [`ServiceRegistry::get_as`](super::ServiceRegistry::get_as).
    fn as_any_rc(self: Rc<Self>) -> Rc<dyn Any>;

    /// Optional async setup, run by `initialize_all`.
    fn initialize(&self) -> LocalBoxFuture<'_, Result<(), ServiceError>> {
        future::ready(Ok(())).boxed_local()
    }

    /// Optional async teardown, run by `destroy_all`.
    fn destroy(&self) -> LocalBoxFuture<'_, Result<(), ServiceError>> {
        future::ready(Ok(())).boxed_local()
    }
}
