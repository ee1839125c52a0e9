//=========================================================================
// Service Registry
//=========================================================================
//
// Dependency-injection container for runtime services.
//
// Architecture:
//   ServiceRegistry
//     ├─ instances: HashMap<String, Rc<dyn Service>>   (built services)
//     ├─ factories: HashMap<String, ServiceFactory>    (lazy builders)
//     ├─ singletons: HashSet<String>                   (cache-on-build)
//     └─ in_construction: HashSet<String>              (cycle detection)
//
// Resolution order: instance → factory (cached back into instances when
// the name is marked singleton). Factories receive the registry itself so
// they can resolve their own dependencies; a construction that re-enters
// a name already being constructed fails with a circular-dependency
// error, and the in-construction mark is cleared on every exit path.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use futures::future::join_all;
use log::{debug, error, warn};

//=== Internal Dependencies ===============================================

use super::service::{Service, ServiceError};

//=== Factory =============================================================

/// Lazy service builder. Invoked with the registry so the factory can
/// resolve the services it depends on.
pub type ServiceFactory = Rc<dyn Fn(&ServiceRegistry) -> Result<Rc<dyn Service>, ServiceError>>;

//=== ServiceRegistry =====================================================

/// Name-keyed container of runtime services.
///
/// Absence is a normal, checked outcome: `get` on an unknown name warns
/// and returns `Ok(None)`. Circular construction and singleton overrides
/// fail loudly instead.
pub struct ServiceRegistry {
    instances: RefCell<HashMap<String, Rc<dyn Service>>>,
    factories: RefCell<HashMap<String, ServiceFactory>>,
    singletons: RefCell<HashSet<String>>,
    in_construction: RefCell<HashSet<String>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self {
            instances: RefCell::new(HashMap::new()),
            factories: RefCell::new(HashMap::new()),
            singletons: RefCell::new(HashSet::new()),
            in_construction: RefCell::new(HashSet::new()),
        }
    }

    //--- Registration -----------------------------------------------------

    /// Stores an already-built service under `name`.
    ///
    /// Re-registering an existing name replaces it with a warning, except
    /// when the name holds a resolved singleton: that is rejected, since
    /// silently replacing a cached singleton would leave earlier resolvers
    /// holding a different instance than later ones. Unregister first.
    pub fn register(&self, name: &str, service: Rc<dyn Service>) -> Result<(), ServiceError> {
        if self.singletons.borrow().contains(name) && self.instances.borrow().contains_key(name) {
            return Err(ServiceError::SingletonOverride(name.to_string()));
        }

        if self
            .instances
            .borrow_mut()
            .insert(name.to_string(), service)
            .is_some()
        {
            warn!("Service '{}' was already registered and has been replaced", name);
        }
        Ok(())
    }

    /// Registers a lazy factory invoked on every resolution of `name`.
    pub fn register_factory<F>(&self, name: &str, factory: F)
    where
        F: Fn(&ServiceRegistry) -> Result<Rc<dyn Service>, ServiceError> + 'static,
    {
        if self
            .factories
            .borrow_mut()
            .insert(name.to_string(), Rc::new(factory))
            .is_some()
        {
            warn!("Factory for '{}' was already registered and has been replaced", name);
        }
    }

    /// Registers a factory whose first result is cached and reused for
    /// every later lookup of `name`.
    pub fn register_singleton<F>(&self, name: &str, factory: F)
    where
        F: Fn(&ServiceRegistry) -> Result<Rc<dyn Service>, ServiceError> + 'static,
    {
        self.register_factory(name, factory);
        self.singletons.borrow_mut().insert(name.to_string());
    }

    /// Removes `name` from every internal map. Returns whether anything
    /// was removed.
    pub fn unregister(&self, name: &str) -> bool {
        let had_instance = self.instances.borrow_mut().remove(name).is_some();
        let had_factory = self.factories.borrow_mut().remove(name).is_some();
        self.singletons.borrow_mut().remove(name);
        had_instance || had_factory
    }

    //--- Resolution -------------------------------------------------------

    /// Resolves `name` to a service.
    ///
    /// Returns `Ok(None)` (with a warning) when the name is unknown.
    /// Fails with [`ServiceError::CircularDependency`] when a factory's
    /// construction synchronously re-enters the same name.
    pub fn get(&self, name: &str) -> Result<Option<Rc<dyn Service>>, ServiceError> {
        if let Some(service) = self.instances.borrow().get(name) {
            return Ok(Some(Rc::clone(service)));
        }

        let factory = self.factories.borrow().get(name).cloned();
        let Some(factory) = factory else {
            warn!("Service '{}' is not registered", name);
            return Ok(None);
        };

        if self.in_construction.borrow().contains(name) {
            return Err(ServiceError::CircularDependency(name.to_string()));
        }

        let service = {
            let _guard = ConstructionGuard::new(self, name);
            factory(self)?
        };

        if self.singletons.borrow().contains(name) {
            debug!("Caching singleton '{}'", name);
            self.instances
                .borrow_mut()
                .insert(name.to_string(), Rc::clone(&service));
        }
        Ok(Some(service))
    }

    /// Resolves `name` and downcasts it to its concrete type.
    ///
    /// A type mismatch is treated like absence: a warning plus `Ok(None)`.
    pub fn get_as<T: Service>(&self, name: &str) -> Result<Option<Rc<T>>, ServiceError> {
        let Some(service) = self.get(name)? else {
            return Ok(None);
        };

        match service.as_any_rc().downcast::<T>() {
            Ok(typed) => Ok(Some(typed)),
            Err(_) => {
                warn!("Service '{}' is registered with a different type", name);
                Ok(None)
            }
        }
    }

    //--- Query API --------------------------------------------------------

    /// Returns true if `name` resolves to anything (built or lazy).
    pub fn contains(&self, name: &str) -> bool {
        self.instances.borrow().contains_key(name) || self.factories.borrow().contains_key(name)
    }

    /// Returns true if `name` is backed by a built service. Resolved
    /// singletons count as built.
    pub fn is_instantiated(&self, name: &str) -> bool {
        self.instances.borrow().contains_key(name)
    }

    //--- Lifecycle --------------------------------------------------------

    /// Concurrently runs the `initialize` hook of every built service,
    /// waiting for all of them to settle. Per-service failures are logged
    /// and returned; they never short-circuit the others.
    pub async fn initialize_all(&self) -> Vec<ServiceError> {
        let services = self.built_services();
        debug!("Initializing {} service(s)", services.len());

        let hooks = services.iter().map(|(name, service)| async move {
            match service.initialize().await {
                Ok(()) => None,
                Err(e) => Some(ServiceError::Hook {
                    name: name.clone(),
                    cause: e.to_string(),
                }),
            }
        });

        let failures: Vec<ServiceError> = join_all(hooks).await.into_iter().flatten().collect();
        for failure in &failures {
            error!("{}", failure);
        }
        failures
    }

    /// Concurrently runs the `destroy` hook of every built service with
    /// the same failure isolation as `initialize_all`, then clears every
    /// internal map.
    pub async fn destroy_all(&self) -> Vec<ServiceError> {
        let services = self.built_services();
        debug!("Destroying {} service(s)", services.len());

        let hooks = services.iter().map(|(name, service)| async move {
            match service.destroy().await {
                Ok(()) => None,
                Err(e) => Some(ServiceError::Hook {
                    name: name.clone(),
                    cause: e.to_string(),
                }),
            }
        });

        let failures: Vec<ServiceError> = join_all(hooks).await.into_iter().flatten().collect();
        for failure in &failures {
            error!("{}", failure);
        }

        self.instances.borrow_mut().clear();
        self.factories.borrow_mut().clear();
        self.singletons.borrow_mut().clear();
        self.in_construction.borrow_mut().clear();
        failures
    }

    fn built_services(&self) -> Vec<(String, Rc<dyn Service>)> {
        self.instances
            .borrow()
            .iter()
            .map(|(name, service)| (name.clone(), Rc::clone(service)))
            .collect()
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

//=== Construction Guard ==================================================

/// Marks a name as in-construction for its lifetime. Dropping the guard
/// clears the mark, so the cleanup holds on success, error, and panic
/// paths alike.
struct ConstructionGuard<'a> {
    registry: &'a ServiceRegistry,
    name: String,
}

impl<'a> ConstructionGuard<'a> {
    fn new(registry: &'a ServiceRegistry, name: &str) -> Self {
        registry
            .in_construction
            .borrow_mut()
            .insert(name.to_string());
        Self {
            registry,
            name: name.to_string(),
        }
    }
}

impl Drop for ConstructionGuard<'_> {
    fn drop(&mut self) {
        self.registry
            .in_construction
            .borrow_mut()
            .remove(&self.name);
    }
}

//=========================================================================
// Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use futures::future::{self, FutureExt, LocalBoxFuture};
    use std::any::Any;
    use std::cell::Cell;

    struct AudioService {
        volume: u32,
    }

    impl Service for AudioService {
        fn as_any_rc(self: Rc<Self>) -> Rc<dyn Any> {
            self
        }
    }

    struct HookedService {
        init_runs: Rc<Cell<u32>>,
        destroy_runs: Rc<Cell<u32>>,
        fail: bool,
    }

    impl HookedService {
        fn new(init_runs: Rc<Cell<u32>>, destroy_runs: Rc<Cell<u32>>, fail: bool) -> Self {
            Self {
                init_runs,
                destroy_runs,
                fail,
            }
        }
    }

    impl Service for HookedService {
        fn as_any_rc(self: Rc<Self>) -> Rc<dyn Any> {
            self
        }

        fn initialize(&self) -> LocalBoxFuture<'_, Result<(), ServiceError>> {
            self.init_runs.set(self.init_runs.get() + 1);
            let result = if self.fail {
                Err(ServiceError::Hook {
                    name: "hooked".to_string(),
                    cause: "boom".to_string(),
                })
            } else {
                Ok(())
            };
            future::ready(result).boxed_local()
        }

        fn destroy(&self) -> LocalBoxFuture<'_, Result<(), ServiceError>> {
            self.destroy_runs.set(self.destroy_runs.get() + 1);
            future::ready(Ok(())).boxed_local()
        }
    }

    #[test]
    fn register_then_get_returns_same_instance() {
        let registry = ServiceRegistry::new();
        let audio: Rc<dyn Service> = Rc::new(AudioService { volume: 80 });
        registry.register("audio", Rc::clone(&audio)).unwrap();

        let resolved = registry.get("audio").unwrap().unwrap();
        assert!(Rc::ptr_eq(&audio, &resolved));
    }

    #[test]
    fn get_missing_returns_none_without_error() {
        let registry = ServiceRegistry::new();
        assert!(registry.get("missing").unwrap().is_none());
    }

    #[test]
    fn register_overwrites_with_warning() {
        let registry = ServiceRegistry::new();
        registry.register("audio", Rc::new(AudioService { volume: 10 })).unwrap();
        registry.register("audio", Rc::new(AudioService { volume: 99 })).unwrap();

        let resolved = registry.get_as::<AudioService>("audio").unwrap().unwrap();
        assert_eq!(resolved.volume, 99);
    }

    #[test]
    fn get_as_downcasts_to_concrete_type() {
        let registry = ServiceRegistry::new();
        registry.register("audio", Rc::new(AudioService { volume: 42 })).unwrap();

        let typed = registry.get_as::<AudioService>("audio").unwrap().unwrap();
        assert_eq!(typed.volume, 42);
    }

    #[test]
    fn get_as_with_wrong_type_returns_none() {
        let registry = ServiceRegistry::new();
        registry.register("audio", Rc::new(AudioService { volume: 42 })).unwrap();

        let typed = registry.get_as::<HookedService>("audio").unwrap();
        assert!(typed.is_none());
    }

    #[test]
    fn plain_factory_builds_on_every_resolution() {
        let registry = ServiceRegistry::new();
        let builds = Rc::new(Cell::new(0));

        let counter = Rc::clone(&builds);
        registry.register_factory("audio", move |_| {
            counter.set(counter.get() + 1);
            Ok(Rc::new(AudioService { volume: 50 }) as Rc<dyn Service>)
        });

        registry.get("audio").unwrap().unwrap();
        registry.get("audio").unwrap().unwrap();
        assert_eq!(builds.get(), 2);
    }

    #[test]
    fn singleton_factory_builds_exactly_once() {
        let registry = ServiceRegistry::new();
        let builds = Rc::new(Cell::new(0));

        let counter = Rc::clone(&builds);
        registry.register_singleton("audio", move |_| {
            counter.set(counter.get() + 1);
            Ok(Rc::new(AudioService { volume: 50 }) as Rc<dyn Service>)
        });

        let first = registry.get("audio").unwrap().unwrap();
        let second = registry.get("audio").unwrap().unwrap();

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(builds.get(), 1);
        assert!(registry.is_instantiated("audio"));
    }

    #[test]
    fn resolved_singleton_rejects_re_registration() {
        let registry = ServiceRegistry::new();
        registry.register_singleton("audio", |_| {
            Ok(Rc::new(AudioService { volume: 50 }) as Rc<dyn Service>)
        });
        registry.get("audio").unwrap();

        let result = registry.register("audio", Rc::new(AudioService { volume: 1 }));
        assert_eq!(result, Err(ServiceError::SingletonOverride("audio".to_string())));

        // Explicit unregistration reopens the name.
        assert!(registry.unregister("audio"));
        registry.register("audio", Rc::new(AudioService { volume: 1 })).unwrap();
    }

    #[test]
    fn factory_can_resolve_its_dependencies() {
        let registry = ServiceRegistry::new();
        registry.register("audio", Rc::new(AudioService { volume: 30 })).unwrap();

        registry.register_factory("speech", |registry| {
            let audio = registry
                .get_as::<AudioService>("audio")?
                .ok_or_else(|| ServiceError::Construction {
                    name: "speech".to_string(),
                    cause: "audio service missing".to_string(),
                })?;
            Ok(Rc::new(AudioService { volume: audio.volume * 2 }) as Rc<dyn Service>)
        });

        let speech = registry.get_as::<AudioService>("speech").unwrap().unwrap();
        assert_eq!(speech.volume, 60);
    }

    #[test]
    fn direct_self_dependency_is_detected() {
        let registry = ServiceRegistry::new();
        registry.register_factory("audio", |registry| {
            registry.get("audio")?;
            Ok(Rc::new(AudioService { volume: 0 }) as Rc<dyn Service>)
        });

        let result = registry.get("audio");
        assert_eq!(result, Err(ServiceError::CircularDependency("audio".to_string())));
    }

    #[test]
    fn transitive_cycle_names_the_reentered_service() {
        let registry = ServiceRegistry::new();
        registry.register_factory("a", |registry| {
            registry.get("b")?;
            Ok(Rc::new(AudioService { volume: 0 }) as Rc<dyn Service>)
        });
        registry.register_factory("b", |registry| {
            registry.get("a")?;
            Ok(Rc::new(AudioService { volume: 0 }) as Rc<dyn Service>)
        });

        let result = registry.get("a");
        assert_eq!(result, Err(ServiceError::CircularDependency("a".to_string())));
    }

    #[test]
    fn failed_construction_leaves_no_lock() {
        let registry = ServiceRegistry::new();
        registry.register_factory("a", |registry| {
            registry.get("b")?;
            Ok(Rc::new(AudioService { volume: 0 }) as Rc<dyn Service>)
        });
        registry.register_factory("b", |registry| {
            registry.get("a")?;
            Ok(Rc::new(AudioService { volume: 0 }) as Rc<dyn Service>)
        });

        assert!(registry.get("a").is_err());

        // Break the cycle; 'a' must now resolve normally.
        registry.register_factory("b", |_| {
            Ok(Rc::new(AudioService { volume: 5 }) as Rc<dyn Service>)
        });
        assert!(registry.get("a").unwrap().is_some());
    }

    #[test]
    fn initialize_all_isolates_failures() {
        let registry = ServiceRegistry::new();
        let ok_runs = Rc::new(Cell::new(0));
        let bad_runs = Rc::new(Cell::new(0));
        let unused = Rc::new(Cell::new(0));

        registry
            .register(
                "good",
                Rc::new(HookedService::new(Rc::clone(&ok_runs), Rc::clone(&unused), false)),
            )
            .unwrap();
        registry
            .register(
                "bad",
                Rc::new(HookedService::new(Rc::clone(&bad_runs), Rc::clone(&unused), true)),
            )
            .unwrap();

        let failures = block_on(registry.initialize_all());

        assert_eq!(failures.len(), 1);
        assert_eq!(ok_runs.get(), 1);
        assert_eq!(bad_runs.get(), 1);
    }

    #[test]
    fn destroy_all_runs_hooks_and_clears_everything() {
        let registry = ServiceRegistry::new();
        let unused = Rc::new(Cell::new(0));
        let destroys = Rc::new(Cell::new(0));

        registry
            .register(
                "hooked",
                Rc::new(HookedService::new(Rc::clone(&unused), Rc::clone(&destroys), false)),
            )
            .unwrap();
        registry.register_singleton("audio", |_| {
            Ok(Rc::new(AudioService { volume: 1 }) as Rc<dyn Service>)
        });

        let failures = block_on(registry.destroy_all());

        assert!(failures.is_empty());
        assert_eq!(destroys.get(), 1);
        assert!(!registry.contains("hooked"));
        assert!(!registry.contains("audio"));
        assert!(registry.get("hooked").unwrap().is_none());
    }
}
