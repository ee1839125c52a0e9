//=========================================================================
// Kalike Runtime — Library Root
//
// This crate defines the application runtime core for the Kalike
// language-learning game suite.
//
// Responsibilities:
// - Expose the top-level `Runtime` facade and its builder
// - Provide the core subsystems (state store, service registry, event
//   bus, lazy loaders) for direct use where the facade is too coarse
// - Keep the rendering engine behind the narrow `engine_bridge` contract
//
// Typical usage:
// ```no_run
// # use std::rc::Rc;
// # use kalike_runtime::prelude::*;
// # fn engine_parts() -> (Rc<dyn EngineHandle>,
// #     crossbeam_channel::Receiver<EngineEvent>) { unimplemented!() }
// let (engine, engine_events) = engine_parts();
//
// let runtime = RuntimeBuilder::new()
//     .with_locale("kn")
//     .with_engine(engine, engine_events)
//     .with_store(Rc::new(StateStore::new()))
//     .build();
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------
//
// `core` contains the runtime subsystems (state, services, loaders,
// event bus, engine bridge, storage). It is exposed publicly for
// composition-root wiring, but most application code goes through the
// top-level `Runtime` facade.
//
pub mod core;

//--- Facade Modules ------------------------------------------------------
//
// `runtime` defines the main runtime entry point: builder, config,
// lifecycle, and the engine event pump.
//
mod runtime;

pub mod prelude;

//--- Public Exports ------------------------------------------------------
//
// Re-exports the facade types as the main entry points, so users can
// `use kalike_runtime::RuntimeBuilder;` without knowing the internal
// module structure.
//
pub use runtime::{events, Runtime, RuntimeBuilder, RuntimeConfig, RuntimeError, VIEWPORT_SERVICE};
