//=========================================================================
// Service System
//=========================================================================
//
// Dependency-injection container for runtime collaborators.
//
// Architecture:
//   ServiceRegistry
//     ├─ register()            eager instances
//     ├─ register_factory()    built on every lookup
//     └─ register_singleton()  built once, then cached
//
// Flow:
//   get(name) → instance | factory(registry) → service
//
//=========================================================================

//=== Module Declarations =================================================

mod registry;
mod service;

//=== Public API ==========================================================

pub use registry::{ServiceFactory, ServiceRegistry};
pub use service::{Service, ServiceError};
