//! Observable targets: a state value plus a table of named methods.
//!
//! A `Target` is the object being observed. Its methods live in named slots
//! so that setup can swap an implementation for a notifying wrapper without
//! changing how callers reach it: `target.call("move", &args)` keeps working
//! the same way before and after.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use scry_core::{CallError, MethodError, Value};

use crate::surface::{INLINE_MARKER, Surface, SurfaceName, SurfaceRef};

/// A method slot.
///
/// Slots receive the whole target rather than the state so that a wrapper
/// can run the original (which takes the state lock) and then notify
/// observers with the lock released.
pub(crate) type Method<S> =
    Arc<dyn Fn(&Target<S>, &[Value]) -> Result<Value, CallError> + Send + Sync>;

/// An object whose methods can be observed.
pub struct Target<S> {
    state: Mutex<S>,
    slots: BTreeMap<String, Method<S>>,
    surfaces: BTreeMap<String, Surface<S>>,
    /// Surface merged into the target itself; empty until installed.
    inline: Surface<S>,
}

impl<S> Target<S> {
    pub fn builder(state: S) -> TargetBuilder<S> {
        TargetBuilder {
            state,
            slots: BTreeMap::new(),
        }
    }

    /// Invoke the method in slot `method` (wrapped or not) with `args`.
    pub fn call(&self, method: &str, args: &[Value]) -> Result<Value, CallError> {
        let slot = self
            .slots
            .get(method)
            .ok_or_else(|| CallError::NoSuchMethod(method.to_string()))?;
        slot(self, args)
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    /// Read the state under its lock.
    pub fn with_state<R>(&self, f: impl FnOnce(&S) -> R) -> Result<R, CallError> {
        let state = self.lock_state()?;
        Ok(f(&state))
    }

    /// Control surface installed under `name`.
    ///
    /// `"."` addresses the inline surface, which only exists once setup was
    /// run with `SurfaceName::Inline`.
    pub fn surface(&self, name: &str) -> Option<SurfaceRef<'_, S>> {
        let surface = if name == INLINE_MARKER {
            Some(&self.inline).filter(|s| s.is_installed())?
        } else {
            self.surfaces.get(name)?
        };
        Some(SurfaceRef::new(self, surface))
    }

    /// Names of the surfaces installed as separate slots (never the inline one).
    pub fn surface_names(&self) -> impl Iterator<Item = &str> {
        self.surfaces.keys().map(String::as_str)
    }

    pub(crate) fn lock_state(&self) -> Result<MutexGuard<'_, S>, CallError> {
        self.state.lock().map_err(|_| CallError::Poisoned)
    }

    pub(crate) fn slot(&self, name: &str) -> Option<&Method<S>> {
        self.slots.get(name)
    }

    pub(crate) fn replace_slot(&mut self, name: &str, method: Method<S>) {
        self.slots.insert(name.to_string(), method);
    }

    pub(crate) fn inline(&self) -> &Surface<S> {
        &self.inline
    }

    pub(crate) fn has_surface(&self, name: &SurfaceName) -> bool {
        match name {
            SurfaceName::Inline => self.inline.is_installed(),
            SurfaceName::Named(n) => self.surfaces.contains_key(n),
        }
    }

    pub(crate) fn install_surface(&mut self, name: SurfaceName, surface: Surface<S>) {
        match name {
            SurfaceName::Inline => self.inline = surface,
            SurfaceName::Named(n) => {
                self.surfaces.insert(n, surface);
            }
        }
    }
}

impl<S: core::fmt::Debug> core::fmt::Debug for Target<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Target")
            .field("state", &self.state)
            .field("methods", &self.slots.keys().collect::<Vec<_>>())
            .field("surfaces", &self.surfaces.keys().collect::<Vec<_>>())
            .field("inline", &self.inline.methods())
            .finish()
    }
}

/// Builds a `Target` from a state value and its method implementations.
pub struct TargetBuilder<S> {
    state: S,
    slots: BTreeMap<String, Method<S>>,
}

impl<S: Send + 'static> TargetBuilder<S> {
    /// Define method `name`. A later definition with the same name replaces
    /// the earlier one.
    pub fn method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut S, &[Value]) -> Result<Value, MethodError> + Send + Sync + 'static,
    {
        let method: Method<S> = Arc::new(move |target: &Target<S>, args: &[Value]| {
            let mut state = target.lock_state()?;
            f(&mut state, args).map_err(CallError::from)
        });
        self.slots.insert(name.into(), method);
        self
    }

    pub fn build(self) -> Target<S> {
        Target {
            state: Mutex::new(self.state),
            slots: self.slots,
            surfaces: BTreeMap::new(),
            inline: Surface::empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scry_core::value::arg_i64;
    use serde_json::json;

    fn counter() -> Target<i64> {
        Target::builder(0)
            .method("add", |n: &mut i64, args: &[Value]| {
                *n += arg_i64(args, 0)?;
                Ok(json!(*n))
            })
            .method("get", |n: &mut i64, _: &[Value]| Ok(json!(*n)))
            .build()
    }

    #[test]
    fn calls_reach_the_state() {
        let target = counter();
        assert_eq!(target.call("add", &[json!(2)]), Ok(json!(2)));
        assert_eq!(target.call("add", &[json!(3)]), Ok(json!(5)));
        assert_eq!(target.with_state(|n| *n), Ok(5));
    }

    #[test]
    fn unknown_method_is_reported() {
        let target = counter();
        assert_eq!(
            target.call("reset", &[]),
            Err(CallError::NoSuchMethod("reset".into()))
        );
    }

    #[test]
    fn method_errors_propagate_unchanged() {
        let target = counter();
        assert_eq!(
            target.call("add", &[json!("x")]),
            Err(CallError::Method(MethodError::invalid_argument(
                "argument 0 must be an integer"
            )))
        );
        assert_eq!(target.with_state(|n| *n), Ok(0));
    }

    #[test]
    fn fresh_target_has_no_surfaces() {
        let target = counter();
        assert!(target.surface("scry").is_none());
        assert!(target.surface(".").is_none());
        assert_eq!(target.surface_names().count(), 0);
        assert_eq!(target.method_names().collect::<Vec<_>>(), vec!["add", "get"]);
    }
}
