use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::HandlerError;

/// Caches exactly one shared instance per owning type.
///
/// Stateful handlers of the same type share a single instance, so repeated
/// registrations (and every later dispatch) observe the same state. The
/// pool is only mutated during registry construction, which is
/// single-threaded by design, so it needs no internal locking.
#[derive(Default)]
pub struct InstancePool {
    instances: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl InstancePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached instance for `S`, constructing it via `factory`
    /// on first use.
    ///
    /// The factory runs at most once per type for the pool's lifetime. A
    /// factory failure propagates to the caller and nothing is cached for
    /// the type, so registration errors never resurface at dispatch time.
    pub fn get_or_create<S, F>(&mut self, factory: F) -> Result<Arc<S>, HandlerError>
    where
        S: Send + Sync + 'static,
        F: FnOnce() -> Result<S, HandlerError>,
    {
        let type_id = TypeId::of::<S>();
        if let Some(existing) = self.instances.get(&type_id) {
            let instance = existing
                .clone()
                .downcast::<S>()
                .expect("instance pool entries are keyed by TypeId");
            return Ok(instance);
        }

        let instance = Arc::new(factory()?);
        self.instances
            .insert(type_id, Arc::clone(&instance) as Arc<dyn Any + Send + Sync>);
        Ok(instance)
    }

    /// Number of distinct owning types with a cached instance.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

impl std::fmt::Debug for InstancePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstancePool")
            .field("types", &self.instances.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    struct Counter {
        hits: AtomicU32,
    }

    impl Counter {
        fn build() -> Result<Self, HandlerError> {
            Ok(Self {
                hits: AtomicU32::new(0),
            })
        }
    }

    #[test]
    fn constructs_exactly_once_per_type() {
        let constructions = Arc::new(AtomicU32::new(0));
        let factory = || {
            let constructions = constructions.clone();
            move || {
                constructions.fetch_add(1, Ordering::SeqCst);
                Counter::build()
            }
        };

        let mut pool = InstancePool::new();
        let first = pool.get_or_create(factory()).unwrap();
        let second = pool.get_or_create(factory()).unwrap();
        let third = pool.get_or_create(factory()).unwrap();

        assert_eq!(constructions.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&second, &third));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn instances_share_state_across_returns() {
        let mut pool = InstancePool::new();

        let first: Arc<Counter> = pool.get_or_create(Counter::build).unwrap();
        first.hits.fetch_add(3, Ordering::SeqCst);

        let second: Arc<Counter> = pool.get_or_create(Counter::build).unwrap();
        assert_eq!(second.hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn distinct_types_get_distinct_instances() {
        struct Alpha;
        struct Beta;

        let mut pool = InstancePool::new();
        let _: Arc<Alpha> = pool.get_or_create(|| Ok(Alpha)).unwrap();
        let _: Arc<Beta> = pool.get_or_create(|| Ok(Beta)).unwrap();

        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn factory_failure_caches_nothing() {
        #[derive(Debug)]
        struct Fallible;

        let mut pool = InstancePool::new();
        let err = pool
            .get_or_create::<Fallible, _>(|| Err("no zero-argument construction path".into()))
            .unwrap_err();

        assert_eq!(err.to_string(), "no zero-argument construction path");
        assert!(pool.is_empty());

        // A later, working factory still runs.
        let _: Arc<Fallible> = pool.get_or_create(|| Ok(Fallible)).unwrap();
        assert_eq!(pool.len(), 1);
    }
}
