//=========================================================================
// Kalike Runtime
//
// Main entry point and coordinator for the application runtime.
//
// Architecture:
// ```text
//     RuntimeBuilder  ──build()──>  Runtime
//         │                          ├─ EventBus          (pub/sub)
//         ├─ with_debug()            ├─ ServiceRegistry   (DI)
//         ├─ with_locale()           ├─ StateStore        (state)
//         ├─ with_engine()           └─ EventPump         (engine feed)
//         └─ with_store()
// ```
//
// The runtime is an explicitly constructed instance owned by the
// composition root and passed by reference to collaborators. Single
// instance per process is a wiring convention, not a hidden global.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::Cell;
use std::rc::Rc;

use crossbeam_channel::Receiver;
use log::{error, info, warn};
use serde_json::{json, Value};

//=== Internal Dependencies ===============================================

use crate::core::engine_bridge::{EngineError, EngineEvent, EngineHandle, EventPump, PumpControl};
use crate::core::event_bus::{EventBus, SubscriptionId};
use crate::core::services::{Service, ServiceError, ServiceRegistry};
use crate::core::state::{kinds, Action, ListenerId, StateStore, StoreError};

//=== Event Names =========================================================

/// Bus events emitted by the runtime itself.
pub mod events {
    pub const INITIALIZED: &str = "runtime.initialized";
    pub const DESTROYED: &str = "runtime.destroyed";
    pub const ERROR: &str = "runtime.error";
    pub const PAUSED: &str = "game.paused";
    pub const RESUMED: &str = "game.resumed";
    pub const SCENE_CHANGED: &str = "scene.changed";
    pub const STATE_CHANGED: &str = "state.changed";
    pub const VIEWPORT_RESIZED: &str = "viewport.resized";
}

/// Service name that opts the runtime into viewport-resize propagation.
pub const VIEWPORT_SERVICE: &str = "viewport";

//=== Configuration =======================================================

/// Runtime options, merged over these defaults by the builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub debug: bool,
    pub locale: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            debug: false,
            locale: "en".to_string(),
        }
    }
}

//=== RuntimeError ========================================================

/// Failures of runtime lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// `initialize` requires a state store to have been attached.
    StoreMissing,

    /// An engine control call failed.
    Engine(EngineError),
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StoreMissing => write!(f, "Runtime requires a state store before initialization"),
            Self::Engine(e) => write!(f, "Engine call failed: {}", e),
        }
    }
}

impl std::error::Error for RuntimeError {}

impl From<EngineError> for RuntimeError {
    fn from(e: EngineError) -> Self {
        Self::Engine(e)
    }
}

//=== RuntimeBuilder ======================================================

/// Builder for configuring and constructing a [`Runtime`].
///
/// # Default Values
///
/// - **debug**: `false`
/// - **locale**: `"en"`
///
/// # Examples
///
/// ```no_run
/// # use std::rc::Rc;
/// # use kalike_runtime::RuntimeBuilder;
/// # use kalike_runtime::core::state::StateStore;
/// # fn engine_parts() -> (Rc<dyn kalike_runtime::core::engine_bridge::EngineHandle>,
/// #     crossbeam_channel::Receiver<kalike_runtime::core::engine_bridge::EngineEvent>) {
/// #     unimplemented!()
/// # }
/// let (engine, engine_events) = engine_parts();
///
/// let runtime = RuntimeBuilder::new()
///     .with_debug(true)
///     .with_locale("kn")
///     .with_engine(engine, engine_events)
///     .with_store(Rc::new(StateStore::new()))
///     .build();
/// ```
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    engine: Option<(Rc<dyn EngineHandle>, Receiver<EngineEvent>)>,
    store: Option<Rc<StateStore>>,
}

impl RuntimeBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            engine: None,
            store: None,
        }
    }

    /// Enables debug tracing on the runtime's event bus.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Sets the UI locale. Default: `"en"`.
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.config.locale = locale.into();
        self
    }

    /// Attaches the engine collaborator and its event channel.
    pub fn with_engine(
        mut self,
        engine: Rc<dyn EngineHandle>,
        events: Receiver<EngineEvent>,
    ) -> Self {
        self.engine = Some((engine, events));
        self
    }

    /// Attaches the state store. Required before `initialize`.
    pub fn with_store(mut self, store: Rc<StateStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Builds the runtime.
    ///
    /// # Panics
    ///
    /// Panics if no engine was attached; the runtime cannot operate
    /// without its engine collaborator.
    pub fn build(self) -> Runtime {
        let Some((engine, events)) = self.engine else {
            panic!("RuntimeBuilder: an engine handle is required, call with_engine()");
        };

        info!(
            "Building runtime (locale: {}, debug: {})",
            self.config.locale, self.config.debug
        );

        let bus = Rc::new(EventBus::new());
        bus.set_debug(self.config.debug);

        Runtime {
            config: self.config,
            engine,
            pump: EventPump::new(events),
            bus,
            services: ServiceRegistry::new(),
            store: self.store,
            store_listener: Cell::new(None),
            initialized: Cell::new(false),
            propagate_resize: Cell::new(false),
        }
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//=== Runtime =============================================================

/// Top-level orchestrator: owns the engine handle, the state store, the
/// service registry, and the event bus, and funnels engine events into
/// one error-handling path.
pub struct Runtime {
    config: RuntimeConfig,
    engine: Rc<dyn EngineHandle>,
    pump: EventPump,
    bus: Rc<EventBus>,
    services: ServiceRegistry,
    store: Option<Rc<StateStore>>,
    store_listener: Cell<Option<ListenerId>>,
    initialized: Cell<bool>,
    propagate_resize: Cell<bool>,
}

impl Runtime {
    //--- Accessors --------------------------------------------------------

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    pub fn store(&self) -> Option<&Rc<StateStore>> {
        self.store.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.get()
    }

    //--- Initialization ---------------------------------------------------

    /// Runs the startup sequence: service initialization, global error
    /// hooks, state-store wiring, viewport propagation.
    ///
    /// Idempotent: a second call while initialized warns and is a no-op.
    /// Any step's failure aborts the sequence and propagates; service
    /// hook failures are the exception, they are isolated per service and
    /// only logged.
    ///
    /// Emits [`events::INITIALIZED`] on success.
    pub async fn initialize(&self) -> Result<(), RuntimeError> {
        if self.initialized.get() {
            warn!("Runtime is already initialized");
            return Ok(());
        }

        info!(
            "Initializing runtime (locale: {}, debug: {})",
            self.config.locale, self.config.debug
        );

        let failures = self.services.initialize_all().await;
        if !failures.is_empty() {
            warn!("{} service(s) failed to initialize", failures.len());
        }

        self.engine.install_error_hooks()?;

        let store = self.store.as_ref().ok_or(RuntimeError::StoreMissing)?;
        let bus = Rc::clone(&self.bus);
        let listener = store.subscribe(move |state| {
            let payload = serde_json::to_value(state.as_ref()).unwrap_or(Value::Null);
            bus.emit(events::STATE_CHANGED, &payload);
        });
        self.store_listener.set(Some(listener));

        if self.services.contains(VIEWPORT_SERVICE) {
            self.propagate_resize.set(true);
        }

        self.initialized.set(true);
        self.bus.emit(events::INITIALIZED, &Value::Null);
        info!("Runtime initialized");
        Ok(())
    }

    //--- Services ---------------------------------------------------------

    /// See [`ServiceRegistry::register`].
    pub fn register_service(&self, name: &str, service: Rc<dyn Service>) -> Result<(), ServiceError> {
        self.services.register(name, service)
    }

    /// See [`ServiceRegistry::get`].
    pub fn get_service(&self, name: &str) -> Result<Option<Rc<dyn Service>>, ServiceError> {
        self.services.get(name)
    }

    //--- State ------------------------------------------------------------

    /// Forwards to the attached state store. Without a store (possible
    /// only before initialization) this warns and drops the action.
    pub fn dispatch(&self, action: Action) -> Result<bool, StoreError> {
        match &self.store {
            Some(store) => store.dispatch(action),
            None => {
                warn!("Runtime: no state store attached, dropping '{}'", action.kind);
                Ok(false)
            }
        }
    }

    fn dispatch_internal(&self, action: Action) {
        if let Err(e) = self.dispatch(action) {
            error!("Runtime: internal dispatch failed: {}", e);
        }
    }

    //--- Event Bus --------------------------------------------------------

    /// See [`EventBus::on`].
    pub fn on<F>(&self, event: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&Value) + 'static,
    {
        self.bus.on(event, handler)
    }

    /// See [`EventBus::off`].
    pub fn off(&self, event: &str, id: SubscriptionId) -> bool {
        self.bus.off(event, id)
    }

    /// See [`EventBus::emit`].
    pub fn emit(&self, event: &str, payload: &Value) -> bool {
        self.bus.emit(event, payload)
    }

    //--- Game Control -----------------------------------------------------

    /// Pauses the engine, records the pause in state, and emits
    /// [`events::PAUSED`]. A no-op when the engine is already paused.
    pub fn pause(&self) {
        if self.engine.is_paused() {
            return;
        }

        self.engine.pause();
        self.dispatch_internal(Action::new(kinds::GAME_PAUSE));
        self.bus.emit(events::PAUSED, &Value::Null);
    }

    /// Resumes the engine, records the resume in state, and emits
    /// [`events::RESUMED`]. A no-op when the engine is already running.
    pub fn resume(&self) {
        if !self.engine.is_paused() {
            return;
        }

        self.engine.resume();
        self.dispatch_internal(Action::new(kinds::GAME_RESUME));
        self.bus.emit(events::RESUMED, &Value::Null);
    }

    /// Switches to another scene: registers and starts it on the engine,
    /// removes the outgoing scene, and records the transition (with its
    /// payload) in state. Emits [`events::SCENE_CHANGED`].
    pub fn change_scene(&self, key: &str, payload: Option<Value>) -> Result<(), RuntimeError> {
        let outgoing = self
            .store
            .as_ref()
            .and_then(|store| store.state().game.current_scene.clone());

        self.engine.add_scene(key)?;
        self.engine.start_scene(key, payload.clone())?;

        if let Some(previous) = outgoing {
            if previous != key {
                self.engine.remove_scene(&previous)?;
            }
        }

        let mut change = json!({ "scene": key });
        if let Some(payload) = payload {
            change["payload"] = payload;
        }
        self.dispatch_internal(Action::with_payload(kinds::CHANGE_SCENE, change));
        self.bus.emit(events::SCENE_CHANGED, &json!({ "scene": key }));
        Ok(())
    }

    //--- Engine Events ----------------------------------------------------

    /// Drains pending engine events and reacts to them. Call once per
    /// frame (or whenever the embedding yields to the runtime).
    pub fn pump_events(&self) -> PumpControl {
        let mut batch = Vec::new();
        let control = self.pump.drain(&mut batch);

        for event in batch {
            self.handle_engine_event(event);
        }
        control
    }

    fn handle_engine_event(&self, event: EngineEvent) {
        match event {
            EngineEvent::Resized { width, height } => {
                if self.propagate_resize.get() {
                    let payload = json!({ "width": width, "height": height });
                    self.dispatch_internal(Action::with_payload(kinds::SET_VIEWPORT, payload.clone()));
                    self.bus.emit(events::VIEWPORT_RESIZED, &payload);
                }
            }
            EngineEvent::UncaughtError(message) | EngineEvent::UnhandledRejection(message) => {
                self.handle_error(&message);
            }
        }
    }

    /// Single error path for everything the global error surface reports.
    fn handle_error(&self, message: &str) {
        error!("Runtime: uncaught error: {}", message);
        self.dispatch_internal(Action::with_payload(
            kinds::SET_ERROR,
            Value::String(message.to_string()),
        ));
        self.bus.emit(events::ERROR, &Value::String(message.to_string()));
    }

    //--- Teardown ---------------------------------------------------------

    /// Destroys every registered service (failures logged, never fatal),
    /// clears all internal collections, and emits [`events::DESTROYED`].
    pub async fn destroy(&self) {
        info!("Destroying runtime");

        let failures = self.services.destroy_all().await;
        if !failures.is_empty() {
            warn!("{} service(s) failed to destroy cleanly", failures.len());
        }

        if let (Some(store), Some(listener)) = (&self.store, self.store_listener.take()) {
            store.unsubscribe(listener);
        }

        self.bus.emit(events::DESTROYED, &Value::Null);
        self.bus.clear_all();
        self.propagate_resize.set(false);
        self.initialized.set(false);
        info!("Runtime destroyed");
    }
}

//=========================================================================
// Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::{unbounded, Sender};
    use futures::executor::block_on;
    use futures::future::{self, FutureExt, LocalBoxFuture};
    use std::any::Any;
    use std::cell::RefCell;

    //--- Test Doubles -----------------------------------------------------

    struct StubEngine {
        paused: Cell<bool>,
        calls: Rc<RefCell<Vec<String>>>,
        fail_hooks: bool,
    }

    impl StubEngine {
        fn new(calls: Rc<RefCell<Vec<String>>>) -> Self {
            Self {
                paused: Cell::new(false),
                calls,
                fail_hooks: false,
            }
        }

        fn failing_hooks(calls: Rc<RefCell<Vec<String>>>) -> Self {
            Self {
                paused: Cell::new(false),
                calls,
                fail_hooks: true,
            }
        }
    }

    impl EngineHandle for StubEngine {
        fn add_scene(&self, key: &str) -> Result<(), EngineError> {
            self.calls.borrow_mut().push(format!("add:{}", key));
            Ok(())
        }

        fn start_scene(&self, key: &str, _payload: Option<Value>) -> Result<(), EngineError> {
            self.calls.borrow_mut().push(format!("start:{}", key));
            Ok(())
        }

        fn remove_scene(&self, key: &str) -> Result<(), EngineError> {
            self.calls.borrow_mut().push(format!("remove:{}", key));
            Ok(())
        }

        fn pause(&self) {
            self.calls.borrow_mut().push("pause".to_string());
            self.paused.set(true);
        }

        fn resume(&self) {
            self.calls.borrow_mut().push("resume".to_string());
            self.paused.set(false);
        }

        fn is_paused(&self) -> bool {
            self.paused.get()
        }

        fn install_error_hooks(&self) -> Result<(), EngineError> {
            self.calls.borrow_mut().push("hooks".to_string());
            if self.fail_hooks {
                Err(EngineError::ErrorHooks("stub refused".to_string()))
            } else {
                Ok(())
            }
        }
    }

    struct NullService;

    impl Service for NullService {
        fn as_any_rc(self: Rc<Self>) -> Rc<dyn Any> {
            self
        }
    }

    struct FailingInitService;

    impl Service for FailingInitService {
        fn as_any_rc(self: Rc<Self>) -> Rc<dyn Any> {
            self
        }

        fn initialize(&self) -> LocalBoxFuture<'_, Result<(), ServiceError>> {
            future::ready(Err(ServiceError::Hook {
                name: "failing".to_string(),
                cause: "setup exploded".to_string(),
            }))
            .boxed_local()
        }
    }

    struct Harness {
        runtime: Runtime,
        engine_tx: Sender<EngineEvent>,
        calls: Rc<RefCell<Vec<String>>>,
    }

    fn harness() -> Harness {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let (tx, rx) = unbounded();
        let engine = Rc::new(StubEngine::new(Rc::clone(&calls)));

        let runtime = RuntimeBuilder::new()
            .with_engine(engine, rx)
            .with_store(Rc::new(StateStore::new()))
            .build();

        Harness {
            runtime,
            engine_tx: tx,
            calls,
        }
    }

    //--- Builder ----------------------------------------------------------

    #[test]
    fn builder_applies_defaults() {
        let h = harness();
        assert_eq!(h.runtime.config().debug, false);
        assert_eq!(h.runtime.config().locale, "en");
    }

    #[test]
    fn builder_merges_options_over_defaults() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let (_tx, rx) = unbounded();
        let runtime = RuntimeBuilder::new()
            .with_debug(true)
            .with_locale("kn")
            .with_engine(Rc::new(StubEngine::new(calls)), rx)
            .build();

        assert!(runtime.config().debug);
        assert_eq!(runtime.config().locale, "kn");
    }

    #[test]
    #[should_panic(expected = "engine handle is required")]
    fn builder_panics_without_engine() {
        RuntimeBuilder::new().build();
    }

    //--- Initialization ---------------------------------------------------

    #[test]
    fn initialize_without_store_fails_fast() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let (_tx, rx) = unbounded();
        let runtime = RuntimeBuilder::new()
            .with_engine(Rc::new(StubEngine::new(calls)), rx)
            .build();

        let result = block_on(runtime.initialize());
        assert_eq!(result, Err(RuntimeError::StoreMissing));
        assert!(!runtime.is_initialized());
    }

    #[test]
    fn initialize_installs_hooks_and_emits_event() {
        let h = harness();
        let initialized = Rc::new(Cell::new(0));
        let probe = Rc::clone(&initialized);
        h.runtime.on(events::INITIALIZED, move |_| probe.set(probe.get() + 1));

        block_on(h.runtime.initialize()).unwrap();

        assert!(h.runtime.is_initialized());
        assert_eq!(initialized.get(), 1);
        assert!(h.calls.borrow().contains(&"hooks".to_string()));
    }

    #[test]
    fn initialize_twice_is_noop() {
        let h = harness();
        let initialized = Rc::new(Cell::new(0));
        let probe = Rc::clone(&initialized);
        h.runtime.on(events::INITIALIZED, move |_| probe.set(probe.get() + 1));

        block_on(h.runtime.initialize()).unwrap();
        block_on(h.runtime.initialize()).unwrap();

        assert_eq!(initialized.get(), 1);
    }

    #[test]
    fn initialize_propagates_hook_installation_failure() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let (_tx, rx) = unbounded();
        let runtime = RuntimeBuilder::new()
            .with_engine(Rc::new(StubEngine::failing_hooks(calls)), rx)
            .with_store(Rc::new(StateStore::new()))
            .build();

        let result = block_on(runtime.initialize());
        assert!(matches!(result, Err(RuntimeError::Engine(_))));
        assert!(!runtime.is_initialized());
    }

    #[test]
    fn initialize_survives_failing_service_hooks() {
        let h = harness();
        h.runtime
            .register_service("flaky", Rc::new(FailingInitService))
            .unwrap();

        block_on(h.runtime.initialize()).unwrap();
        assert!(h.runtime.is_initialized());
    }

    #[test]
    fn state_changes_are_forwarded_to_the_bus() {
        let h = harness();
        block_on(h.runtime.initialize()).unwrap();

        let changes = Rc::new(Cell::new(0));
        let probe = Rc::clone(&changes);
        h.runtime.on(events::STATE_CHANGED, move |_| probe.set(probe.get() + 1));

        h.runtime.dispatch(Action::new(kinds::GAME_START)).unwrap();
        assert_eq!(changes.get(), 1);
    }

    //--- Services ---------------------------------------------------------

    #[test]
    fn service_roundtrip_through_runtime() {
        let h = harness();
        let audio: Rc<dyn Service> = Rc::new(NullService);
        h.runtime.register_service("audio", Rc::clone(&audio)).unwrap();

        let resolved = h.runtime.get_service("audio").unwrap().unwrap();
        assert!(Rc::ptr_eq(&audio, &resolved));
        assert!(h.runtime.get_service("missing").unwrap().is_none());
    }

    //--- Dispatch ---------------------------------------------------------

    #[test]
    fn dispatch_without_store_is_warned_noop() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let (_tx, rx) = unbounded();
        let runtime = RuntimeBuilder::new()
            .with_engine(Rc::new(StubEngine::new(calls)), rx)
            .build();

        let changed = runtime.dispatch(Action::new(kinds::GAME_START)).unwrap();
        assert!(!changed);
    }

    #[test]
    fn dispatch_forwards_to_store() {
        let h = harness();
        h.runtime.dispatch(Action::new(kinds::GAME_START)).unwrap();
        assert!(h.runtime.store().unwrap().state().game.is_game_active);
    }

    //--- Pause / Resume ---------------------------------------------------

    #[test]
    fn pause_is_guarded_by_engine_state() {
        let h = harness();
        let paused_events = Rc::new(Cell::new(0));
        let probe = Rc::clone(&paused_events);
        h.runtime.on(events::PAUSED, move |_| probe.set(probe.get() + 1));

        h.runtime.pause();
        h.runtime.pause();

        let pause_calls = h.calls.borrow().iter().filter(|c| *c == "pause").count();
        assert_eq!(pause_calls, 1);
        assert_eq!(paused_events.get(), 1);
        assert!(h.runtime.store().unwrap().state().game.is_paused);
    }

    #[test]
    fn resume_is_guarded_by_engine_state() {
        let h = harness();

        // Resuming a running engine is a no-op.
        h.runtime.resume();
        assert!(!h.calls.borrow().contains(&"resume".to_string()));

        h.runtime.pause();
        h.runtime.resume();

        assert!(h.calls.borrow().contains(&"resume".to_string()));
        assert!(!h.runtime.store().unwrap().state().game.is_paused);
    }

    //--- Scene Control ----------------------------------------------------

    #[test]
    fn change_scene_drives_engine_and_state() {
        let h = harness();
        let scene_events = Rc::new(RefCell::new(Vec::new()));
        let probe = Rc::clone(&scene_events);
        h.runtime.on(events::SCENE_CHANGED, move |payload| {
            probe.borrow_mut().push(payload.clone());
        });

        h.runtime.change_scene("menu", None).unwrap();
        h.runtime
            .change_scene("vowel-match", Some(json!({ "level": 2 })))
            .unwrap();

        let state = h.runtime.store().unwrap().state();
        assert_eq!(state.game.current_scene.as_deref(), Some("vowel-match"));
        assert_eq!(state.game.previous_scene.as_deref(), Some("menu"));
        assert_eq!(state.game.scene_payload, Some(json!({ "level": 2 })));

        let calls = h.calls.borrow();
        assert!(calls.contains(&"add:menu".to_string()));
        assert!(calls.contains(&"start:vowel-match".to_string()));
        assert!(calls.contains(&"remove:menu".to_string()));
        assert_eq!(scene_events.borrow().len(), 2);
    }

    //--- Engine Events ----------------------------------------------------

    #[test]
    fn resize_is_ignored_without_viewport_service() {
        let h = harness();
        block_on(h.runtime.initialize()).unwrap();

        h.engine_tx
            .send(EngineEvent::Resized { width: 1024, height: 768 })
            .unwrap();
        h.runtime.pump_events();

        let viewport = h.runtime.store().unwrap().state().app.viewport;
        assert_eq!(viewport.width, 0);
        assert_eq!(viewport.height, 0);
    }

    #[test]
    fn resize_propagates_with_viewport_service() {
        let h = harness();
        h.runtime
            .register_service(VIEWPORT_SERVICE, Rc::new(NullService))
            .unwrap();
        block_on(h.runtime.initialize()).unwrap();

        let resizes = Rc::new(RefCell::new(Vec::new()));
        let probe = Rc::clone(&resizes);
        h.runtime.on(events::VIEWPORT_RESIZED, move |payload| {
            probe.borrow_mut().push(payload.clone());
        });

        h.engine_tx
            .send(EngineEvent::Resized { width: 1024, height: 768 })
            .unwrap();
        assert_eq!(h.runtime.pump_events(), PumpControl::Continue);

        let viewport = h.runtime.store().unwrap().state().app.viewport;
        assert_eq!(viewport.width, 1024);
        assert_eq!(viewport.height, 768);
        assert_eq!(*resizes.borrow(), vec![json!({ "width": 1024, "height": 768 })]);
    }

    #[test]
    fn engine_errors_funnel_into_one_path() {
        let h = harness();
        block_on(h.runtime.initialize()).unwrap();

        let errors = Rc::new(RefCell::new(Vec::new()));
        let probe = Rc::clone(&errors);
        h.runtime.on(events::ERROR, move |payload| {
            probe.borrow_mut().push(payload.clone());
        });

        h.engine_tx
            .send(EngineEvent::UncaughtError("null deref".to_string()))
            .unwrap();
        h.engine_tx
            .send(EngineEvent::UnhandledRejection("fetch failed".to_string()))
            .unwrap();
        h.runtime.pump_events();

        assert_eq!(errors.borrow().len(), 2);
        let state = h.runtime.store().unwrap().state();
        assert_eq!(state.app.last_error.as_deref(), Some("fetch failed"));
    }

    #[test]
    fn pump_reports_engine_disconnect() {
        let h = harness();
        drop(h.engine_tx);
        assert_eq!(h.runtime.pump_events(), PumpControl::Disconnected);
    }

    //--- Teardown ---------------------------------------------------------

    #[test]
    fn destroy_clears_collections_and_emits_event() {
        let h = harness();
        h.runtime.register_service("audio", Rc::new(NullService)).unwrap();
        block_on(h.runtime.initialize()).unwrap();

        let destroyed = Rc::new(Cell::new(0));
        let probe = Rc::clone(&destroyed);
        h.runtime.on(events::DESTROYED, move |_| probe.set(probe.get() + 1));

        block_on(h.runtime.destroy());

        assert_eq!(destroyed.get(), 1);
        assert!(!h.runtime.is_initialized());
        assert!(h.runtime.get_service("audio").unwrap().is_none());
        assert!(!h.runtime.bus().has_listeners(events::DESTROYED));

        // The store listener is gone: state changes no longer reach the bus.
        let changes = Rc::new(Cell::new(0));
        let probe = Rc::clone(&changes);
        h.runtime.on(events::STATE_CHANGED, move |_| probe.set(probe.get() + 1));
        h.runtime.dispatch(Action::new(kinds::GAME_START)).unwrap();
        assert_eq!(changes.get(), 0);
    }
}
