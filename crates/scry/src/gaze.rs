//! Setup: wrap the watched methods of a target and install its surface.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use scry_core::{GazeError, IdSet, Value};

use crate::registry::{self, Registry, deliver};
use crate::surface::{Surface, SurfaceName};
use crate::target::{Method, Target};

/// Make `methods` of `target` observable and install a control surface
/// under `surface`.
///
/// Each watched slot is replaced by a wrapper that runs the slot's current
/// implementation, then notifies the surface's observers with the same
/// arguments, then returns the implementation's result. The target is
/// changed in place and handed back.
///
/// Running setup again under another surface name composes: the second
/// surface captures the first one's wrappers as its originals, so a call
/// notifies the first surface's observers, then the second's. Reusing a name
/// that already holds a surface is rejected. `Named(".")` and `Named("")`
/// resolve to the inline and the default surface.
pub fn gaze<'t, S, I, N>(
    target: &'t mut Target<S>,
    methods: I,
    surface: SurfaceName,
) -> Result<&'t mut Target<S>, GazeError>
where
    S: Send + 'static,
    I: IntoIterator<Item = N>,
    N: Into<String>,
{
    let surface = surface.normalized();
    let watch_list: Vec<String> = methods.into_iter().map(Into::into).collect();
    validate(target, &watch_list, &surface)?;

    let registry = Arc::new(Mutex::new(Registry::new(&watch_list)));
    let mut originals = BTreeMap::new();

    for name in &watch_list {
        let Some(original) = target.slot(name).cloned() else {
            return Err(GazeError::UnknownMethod(name.clone()));
        };
        originals.insert(name.clone(), Arc::clone(&original));
        target.replace_slot(name, wrap(name.clone(), original, Arc::clone(&registry)));
    }

    tracing::debug!(methods = ?watch_list, surface = %surface, "target methods wrapped");
    target.install_surface(surface, Surface::new(watch_list, originals, registry));
    Ok(target)
}

fn validate<S>(
    target: &Target<S>,
    watch_list: &[String],
    surface: &SurfaceName,
) -> Result<(), GazeError> {
    if target.has_surface(surface) {
        return Err(GazeError::SurfaceTaken(surface.to_string()));
    }
    if watch_list.is_empty() {
        return Err(GazeError::EmptyWatchList);
    }

    let mut seen = BTreeSet::new();
    for name in watch_list {
        if !seen.insert(name.as_str()) {
            return Err(GazeError::DuplicateMethod(name.clone()));
        }
        if !target.has_method(name) {
            return Err(GazeError::UnknownMethod(name.clone()));
        }
    }
    Ok(())
}

fn wrap<S: 'static>(method: String, original: Method<S>, registry: Arc<Mutex<Registry>>) -> Method<S> {
    Arc::new(move |target: &Target<S>, args: &[Value]| {
        let ret = original(target, args)?;
        let observers = registry::lock(&registry).snapshot(&method, &IdSet::empty());
        deliver(&registry, &method, &observers, args)?;
        Ok(ret)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Scry;
    use scry_core::{CallError, MethodError, ObserverError, ObserverId, Scope};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct Pair {
        a: i64,
    }

    fn pair() -> Target<Pair> {
        Target::builder(Pair::default())
            .method("setA", |p: &mut Pair, args: &[Value]| {
                p.a = scry_core::value::arg_i64(args, 0)?;
                Ok(json!(p.a))
            })
            .method("getA", |p: &mut Pair, _: &[Value]| Ok(json!(p.a)))
            .method("explode", |_: &mut Pair, _: &[Value]| {
                Err(MethodError::failed("kaboom"))
            })
            .build()
    }

    #[test]
    fn rejects_bad_watch_lists_without_touching_the_target() {
        let mut target = pair();
        let none: [&str; 0] = [];
        assert_eq!(
            gaze(&mut target, none, SurfaceName::default()).err(),
            Some(GazeError::EmptyWatchList)
        );
        assert_eq!(
            gaze(&mut target, ["setA", "setA"], SurfaceName::default()).err(),
            Some(GazeError::DuplicateMethod("setA".into()))
        );
        assert_eq!(
            gaze(&mut target, ["setA", "setB"], SurfaceName::default()).err(),
            Some(GazeError::UnknownMethod("setB".into()))
        );
        assert!(target.surface("scry").is_none());
    }

    #[test]
    fn same_surface_name_twice_is_rejected() {
        let mut target = pair();
        gaze(&mut target, ["setA"], SurfaceName::default()).unwrap();
        assert_eq!(
            gaze(&mut target, ["getA"], SurfaceName::default()).err(),
            Some(GazeError::SurfaceTaken("scry".into()))
        );
        gaze(&mut target, ["getA"], SurfaceName::Inline).unwrap();
        assert_eq!(
            gaze(&mut target, ["setA"], SurfaceName::Inline).err(),
            Some(GazeError::SurfaceTaken(".".into()))
        );
    }

    #[test]
    fn reserved_named_surfaces_stay_reachable() {
        let mut target = pair();
        gaze(&mut target, ["setA"], SurfaceName::Named(".".into())).unwrap();
        assert!(target.surface(".").is_some());
        assert_eq!(target.surface_names().count(), 0);
        assert!(target.watch("setA", |_| Ok(())).is_some());

        gaze(&mut target, ["getA"], SurfaceName::Named(String::new())).unwrap();
        assert!(target.surface("scry").is_some());
        assert_eq!(
            gaze(&mut target, ["setA"], SurfaceName::Named(".".into())).err(),
            Some(GazeError::SurfaceTaken(".".into()))
        );
    }

    #[test]
    fn second_surface_composes_with_the_first() {
        let mut target = pair();
        gaze(&mut target, ["setA"], SurfaceName::default()).unwrap();
        gaze(&mut target, ["setA"], SurfaceName::from("spy")).unwrap();

        let order = Arc::new(Mutex::new(Vec::new()));
        for name in ["spy", "scry"] {
            let order = order.clone();
            target
                .surface(name)
                .unwrap()
                .watch("setA", move |_| {
                    order.lock().unwrap().push(name);
                    Ok(())
                })
                .unwrap();
        }

        target.call("setA", &[json!(1)]).unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["scry", "spy"]);

        // The outer surface's original is the inner wrapper.
        order.lock().unwrap().clear();
        target.surface("spy").unwrap().silently("setA", &[json!(2)]).unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["scry"]);
    }

    #[test]
    fn failing_original_notifies_nobody() {
        let mut target = pair();
        gaze(&mut target, ["explode"], SurfaceName::default()).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        target.surface("scry").unwrap().watch("explode", move |_| {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert_eq!(
            target.call("explode", &[]),
            Err(CallError::Method(MethodError::failed("kaboom")))
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn failing_observer_propagates_after_the_original_ran() {
        let mut target = pair();
        gaze(&mut target, ["setA"], SurfaceName::Inline).unwrap();
        target.watch("setA", |_| Err(ObserverError::failed("nope")));

        assert_eq!(
            target.call("setA", &[json!(9)]),
            Err(CallError::Observer(ObserverError::failed("nope")))
        );
        assert_eq!(target.with_state(|p| p.a), Ok(9));
    }

    #[test]
    fn first_watch_gets_sequence_zero() {
        let mut target = pair();
        gaze(&mut target, ["setA", "getA"], SurfaceName::default()).unwrap();
        let scry = target.surface("scry").unwrap();
        assert_eq!(
            scry.watch("setA", |_| Ok(())),
            Some(ObserverId::new(0, Scope::Regular))
        );
        assert_eq!(scry.watch_all(|_, _| Ok(())).scope(), Scope::Global);
    }
}
