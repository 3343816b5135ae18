//! Per-method observer registries.
//!
//! Each watched method owns an ordered map from observer id to callback.
//! Global observers are stored in every method's map under one shared id, so
//! removal by id works the same way for both scopes.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use scry_core::{IdSequence, IdSet, ObserverError, ObserverId, Scope, Value};

/// Callback of an observer registered on one method.
pub type Callback = Arc<dyn Fn(&[Value]) -> Result<(), ObserverError> + Send + Sync>;

/// Callback of an observer registered on every watched method; receives the
/// name of the method that was called before its arguments.
pub type GlobalCallback = Arc<dyn Fn(&str, &[Value]) -> Result<(), ObserverError> + Send + Sync>;

#[derive(Clone)]
pub(crate) enum Observer {
    Regular(Callback),
    Global(GlobalCallback),
}

impl Observer {
    fn notify(&self, method: &str, args: &[Value]) -> Result<(), ObserverError> {
        match self {
            Observer::Regular(cb) => cb(args),
            Observer::Global(cb) => cb(method, args),
        }
    }
}

/// Notify `observers` in order; the first failure stops delivery.
///
/// An observer removed from `registry` after the snapshot was taken is
/// skipped. The lock is only held for that check, never around a callback.
pub(crate) fn deliver(
    registry: &Mutex<Registry>,
    method: &str,
    observers: &[(ObserverId, Observer)],
    args: &[Value],
) -> Result<(), ObserverError> {
    for (id, observer) in observers {
        let live = lock(registry).contains(method, id);
        if !live {
            continue;
        }
        observer.notify(method, args)?;
    }
    Ok(())
}

#[derive(Default)]
pub(crate) struct Registry {
    ids: IdSequence,
    observers: BTreeMap<String, BTreeMap<ObserverId, Observer>>,
}

impl Registry {
    pub(crate) fn new<'a>(methods: impl IntoIterator<Item = &'a String>) -> Self {
        Self {
            ids: IdSequence::new(),
            observers: methods
                .into_iter()
                .map(|m| (m.clone(), BTreeMap::new()))
                .collect(),
        }
    }

    /// Register `callback` on `method`; `None` if the method is not watched.
    pub(crate) fn insert(&mut self, method: &str, callback: Callback) -> Option<ObserverId> {
        let entries = self.observers.get_mut(method)?;
        let id = self.ids.next(Scope::Regular);
        entries.insert(id, Observer::Regular(callback));
        Some(id)
    }

    pub(crate) fn insert_global(&mut self, callback: GlobalCallback) -> ObserverId {
        let id = self.ids.next(Scope::Global);
        for entries in self.observers.values_mut() {
            entries.insert(id, Observer::Global(Arc::clone(&callback)));
        }
        id
    }

    pub(crate) fn remove(&mut self, ids: &IdSet) {
        for entries in self.observers.values_mut() {
            for id in ids.iter() {
                entries.remove(id);
            }
        }
    }

    /// Clear one method's observers, or every method's when `method` is `None`.
    /// An unwatched name is ignored.
    pub(crate) fn clear(&mut self, method: Option<&str>) {
        match method {
            None => self.observers.values_mut().for_each(BTreeMap::clear),
            Some(m) => {
                if let Some(entries) = self.observers.get_mut(m) {
                    entries.clear();
                }
            }
        }
    }

    pub(crate) fn contains(&self, method: &str, id: &ObserverId) -> bool {
        self.observers
            .get(method)
            .is_some_and(|entries| entries.contains_key(id))
    }

    pub(crate) fn len(&self, method: &str) -> Option<usize> {
        self.observers.get(method).map(BTreeMap::len)
    }

    /// Observers of `method` in delivery order, minus `excluded`.
    pub(crate) fn snapshot(&self, method: &str, excluded: &IdSet) -> Vec<(ObserverId, Observer)> {
        self.observers
            .get(method)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|(id, _)| !excluded.contains(id))
                    .map(|(id, observer)| (*id, observer.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Lock a shared registry.
///
/// No callback ever runs while the lock is held, so a poisoned lock still
/// guards consistent data and is recovered rather than reported.
pub(crate) fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn watch_list(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn cb<F>(f: F) -> Callback
    where
        F: Fn(&[Value]) -> Result<(), ObserverError> + Send + Sync + 'static,
    {
        Arc::new(f)
    }

    fn global<F>(f: F) -> GlobalCallback
    where
        F: Fn(&str, &[Value]) -> Result<(), ObserverError> + Send + Sync + 'static,
    {
        Arc::new(f)
    }

    fn noop() -> Callback {
        cb(|_| Ok(()))
    }

    #[test]
    fn regular_ids_follow_one_counter_shared_with_globals() {
        let names = watch_list(&["setA", "getA"]);
        let mut registry = Registry::new(&names);

        let first = registry.insert("setA", noop()).unwrap();
        let global = registry.insert_global(global(|_, _| Ok(())));
        let second = registry.insert("getA", noop()).unwrap();

        assert_eq!(first, ObserverId::new(0, Scope::Regular));
        assert_eq!(global, ObserverId::new(1, Scope::Global));
        assert_eq!(second, ObserverId::new(2, Scope::Regular));
        assert_eq!(registry.len("setA"), Some(2));
        assert_eq!(registry.len("getA"), Some(2));
    }

    #[test]
    fn unwatched_method_is_rejected() {
        let names = watch_list(&["setA"]);
        let mut registry = Registry::new(&names);
        assert!(registry.insert("admire", noop()).is_none());
        assert_eq!(registry.len("admire"), None);
    }

    #[test]
    fn removing_a_global_id_clears_it_everywhere() {
        let names = watch_list(&["a", "b", "c"]);
        let mut registry = Registry::new(&names);
        let keep = registry.insert("a", noop()).unwrap();
        let global = registry.insert_global(global(|_, _| Ok(())));

        registry.remove(&IdSet::from(global));

        assert_eq!(registry.len("a"), Some(1));
        assert_eq!(registry.len("b"), Some(0));
        assert_eq!(registry.len("c"), Some(0));
        registry.remove(&IdSet::from(vec![keep, global]));
        assert_eq!(registry.len("a"), Some(0));
    }

    #[test]
    fn clear_ignores_unknown_method() {
        let names = watch_list(&["a", "b"]);
        let mut registry = Registry::new(&names);
        registry.insert("a", noop());
        registry.insert("b", noop());

        registry.clear(Some("zzz"));
        assert_eq!(registry.len("a"), Some(1));

        registry.clear(Some("a"));
        assert_eq!(registry.len("a"), Some(0));
        assert_eq!(registry.len("b"), Some(1));

        registry.clear(None);
        assert_eq!(registry.len("b"), Some(0));
    }

    #[test]
    fn delivery_stops_at_first_failure() {
        let names = watch_list(&["m"]);
        let registry = Mutex::new(Registry::new(&names));
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = |calls: Arc<AtomicUsize>| {
            cb(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        };
        {
            let mut r = lock(&registry);
            r.insert("m", counted(calls.clone()));
            r.insert("m", cb(|_| Err(ObserverError::failed("boom"))));
            r.insert("m", counted(calls.clone()));
        }

        let observers = lock(&registry).snapshot("m", &IdSet::empty());
        let result = deliver(&registry, "m", &observers, &[]);

        assert_eq!(result, Err(ObserverError::failed("boom")));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn snapshot_respects_exclusions_and_order() {
        let names = watch_list(&["m"]);
        let registry = Mutex::new(Registry::new(&names));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut ids = Vec::new();
        for tag in 0..3 {
            let seen = seen.clone();
            ids.push(
                lock(&registry)
                    .insert(
                        "m",
                        cb(move |_| {
                            seen.lock().unwrap().push(tag);
                            Ok(())
                        }),
                    )
                    .unwrap(),
            );
        }

        let observers = lock(&registry).snapshot("m", &IdSet::from(ids[1]));
        deliver(&registry, "m", &observers, &[]).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![0, 2]);
        assert!(lock(&registry).snapshot("other", &IdSet::empty()).is_empty());
    }

    #[test]
    fn observers_removed_after_the_snapshot_are_skipped() {
        let names = watch_list(&["m"]);
        let registry = Arc::new(Mutex::new(Registry::new(&names)));
        let later_id = Arc::new(Mutex::new(None));
        let later_calls = Arc::new(AtomicUsize::new(0));

        let (r, target) = (registry.clone(), later_id.clone());
        lock(&registry).insert(
            "m",
            cb(move |_| {
                if let Some(id) = *target.lock().unwrap() {
                    lock(&r).remove(&IdSet::from(id));
                }
                Ok(())
            }),
        );
        let c = later_calls.clone();
        let id = lock(&registry)
            .insert(
                "m",
                cb(move |_| {
                    c.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }),
            )
            .unwrap();
        *later_id.lock().unwrap() = Some(id);

        let observers = lock(&registry).snapshot("m", &IdSet::empty());
        assert_eq!(observers.len(), 2);
        deliver(&registry, "m", &observers, &[]).unwrap();

        assert_eq!(later_calls.load(Ordering::SeqCst), 0);
        assert!(!lock(&registry).contains("m", &id));
    }
}
