//! Control surfaces: the operations a caller uses to observe a target.
//!
//! A surface owns the watch list, the captured originals and the shared
//! observer registry of one setup call. It is reached either through a
//! named slot (`target.surface("scry")`) or, when installed inline, through
//! the target itself via the [`Scry`] trait.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use scry_core::{CallError, IdSet, ObserverError, ObserverId, Value};

use crate::registry::{self, Callback, GlobalCallback, Registry, deliver};
use crate::target::{Method, Target};

/// Surface name given when none is chosen.
pub const DEFAULT_SURFACE: &str = "scry";

/// Name that addresses the inline surface.
pub const INLINE_MARKER: &str = ".";

/// Where setup installs the control surface.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceName {
    /// Merge the control operations into the target itself.
    Inline,
    /// Install them under a separate name.
    Named(String),
}

impl SurfaceName {
    pub fn as_str(&self) -> &str {
        match self {
            SurfaceName::Inline => INLINE_MARKER,
            SurfaceName::Named(n) => n,
        }
    }

    /// Resolve the reserved names: `Named(".")` is the inline surface and
    /// `Named("")` the default one, as when parsed from a string.
    pub fn normalized(self) -> Self {
        match self {
            SurfaceName::Named(n) if n == INLINE_MARKER || n.is_empty() => {
                SurfaceName::from(n.as_str())
            }
            other => other,
        }
    }
}

impl Default for SurfaceName {
    fn default() -> Self {
        SurfaceName::Named(DEFAULT_SURFACE.to_string())
    }
}

impl core::fmt::Display for SurfaceName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SurfaceName {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl From<&str> for SurfaceName {
    fn from(value: &str) -> Self {
        match value {
            INLINE_MARKER => SurfaceName::Inline,
            "" => SurfaceName::default(),
            other => SurfaceName::Named(other.to_string()),
        }
    }
}

/// Operations of a control surface.
///
/// Every operation that names a method rejects names outside the watch list
/// with a sentinel (`None` / `Ok(None)`) instead of an error.
pub trait Scry {
    /// The watch list, in setup order.
    fn methods(&self) -> &[String];

    /// Observe calls to `method`. `None` when `method` is not watched.
    fn watch<F>(&self, method: &str, callback: F) -> Option<ObserverId>
    where
        F: Fn(&[Value]) -> Result<(), ObserverError> + Send + Sync + 'static;

    /// Observe calls to every watched method under one id. The callback
    /// receives the called method's name before its arguments.
    fn watch_all<F>(&self, callback: F) -> ObserverId
    where
        F: Fn(&str, &[Value]) -> Result<(), ObserverError> + Send + Sync + 'static;

    /// Remove observers by id. Unknown ids are ignored.
    fn unwatch<I: Into<IdSet>>(&self, ids: I);

    /// Remove every observer of `method`, or of all methods when `None`.
    fn unwatch_all(&self, method: Option<&str>);

    /// Call the original of `method` without notifying anyone.
    fn silently(&self, method: &str, args: &[Value]) -> Result<Option<Value>, CallError>;

    /// Call the original of `method`, then notify every observer except
    /// `excluded`.
    fn quietly<I: Into<IdSet>>(
        &self,
        method: &str,
        excluded: I,
        args: &[Value],
    ) -> Result<Option<Value>, CallError>;

    /// Number of live observers on `method`; `None` when not watched.
    fn observer_count(&self, method: &str) -> Option<usize>;
}

/// State of one installed surface.
pub(crate) struct Surface<S> {
    watch_list: Vec<String>,
    originals: BTreeMap<String, Method<S>>,
    registry: Arc<Mutex<Registry>>,
}

impl<S> Surface<S> {
    pub(crate) fn new(
        watch_list: Vec<String>,
        originals: BTreeMap<String, Method<S>>,
        registry: Arc<Mutex<Registry>>,
    ) -> Self {
        Self {
            watch_list,
            originals,
            registry,
        }
    }

    /// Placeholder for a target with no inline surface: watches nothing.
    pub(crate) fn empty() -> Self {
        Self::new(Vec::new(), BTreeMap::new(), Arc::new(Mutex::new(Registry::default())))
    }

    pub(crate) fn is_installed(&self) -> bool {
        !self.watch_list.is_empty()
    }

    pub(crate) fn methods(&self) -> &[String] {
        &self.watch_list
    }
}

/// A surface borrowed together with the target it controls.
pub struct SurfaceRef<'a, S> {
    target: &'a Target<S>,
    surface: &'a Surface<S>,
}

impl<'a, S> SurfaceRef<'a, S> {
    pub(crate) fn new(target: &'a Target<S>, surface: &'a Surface<S>) -> Self {
        Self { target, surface }
    }

    pub fn target(&self) -> &'a Target<S> {
        self.target
    }

    fn registry(&self) -> std::sync::MutexGuard<'_, Registry> {
        registry::lock(&self.surface.registry)
    }
}

impl<S> Scry for SurfaceRef<'_, S> {
    fn methods(&self) -> &[String] {
        self.surface.methods()
    }

    fn watch<F>(&self, method: &str, callback: F) -> Option<ObserverId>
    where
        F: Fn(&[Value]) -> Result<(), ObserverError> + Send + Sync + 'static,
    {
        let callback: Callback = Arc::new(callback);
        let id = self.registry().insert(method, callback);
        match id {
            Some(id) => tracing::trace!(method, %id, "observer registered"),
            None => tracing::trace!(method, "watch rejected: method not watched"),
        }
        id
    }

    fn watch_all<F>(&self, callback: F) -> ObserverId
    where
        F: Fn(&str, &[Value]) -> Result<(), ObserverError> + Send + Sync + 'static,
    {
        let callback: GlobalCallback = Arc::new(callback);
        let id = self.registry().insert_global(callback);
        tracing::trace!(%id, "global observer registered");
        id
    }

    fn unwatch<I: Into<IdSet>>(&self, ids: I) {
        let ids = ids.into();
        self.registry().remove(&ids);
        tracing::trace!(?ids, "observers removed");
    }

    fn unwatch_all(&self, method: Option<&str>) {
        self.registry().clear(method);
        tracing::trace!(?method, "observers cleared");
    }

    fn silently(&self, method: &str, args: &[Value]) -> Result<Option<Value>, CallError> {
        let Some(original) = self.surface.originals.get(method) else {
            return Ok(None);
        };
        original(self.target, args).map(Some)
    }

    fn quietly<I: Into<IdSet>>(
        &self,
        method: &str,
        excluded: I,
        args: &[Value],
    ) -> Result<Option<Value>, CallError> {
        let Some(original) = self.surface.originals.get(method) else {
            return Ok(None);
        };
        let ret = original(self.target, args)?;
        let observers = self.registry().snapshot(method, &excluded.into());
        deliver(&self.surface.registry, method, &observers, args)?;
        Ok(Some(ret))
    }

    fn observer_count(&self, method: &str) -> Option<usize> {
        self.registry().len(method)
    }
}

/// The target is its own surface when setup ran with `SurfaceName::Inline`.
/// Without an inline surface it watches nothing and every operation returns
/// its sentinel.
impl<S> Scry for Target<S> {
    fn methods(&self) -> &[String] {
        self.inline().methods()
    }

    fn watch<F>(&self, method: &str, callback: F) -> Option<ObserverId>
    where
        F: Fn(&[Value]) -> Result<(), ObserverError> + Send + Sync + 'static,
    {
        SurfaceRef::new(self, self.inline()).watch(method, callback)
    }

    fn watch_all<F>(&self, callback: F) -> ObserverId
    where
        F: Fn(&str, &[Value]) -> Result<(), ObserverError> + Send + Sync + 'static,
    {
        SurfaceRef::new(self, self.inline()).watch_all(callback)
    }

    fn unwatch<I: Into<IdSet>>(&self, ids: I) {
        SurfaceRef::new(self, self.inline()).unwatch(ids)
    }

    fn unwatch_all(&self, method: Option<&str>) {
        SurfaceRef::new(self, self.inline()).unwatch_all(method)
    }

    fn silently(&self, method: &str, args: &[Value]) -> Result<Option<Value>, CallError> {
        SurfaceRef::new(self, self.inline()).silently(method, args)
    }

    fn quietly<I: Into<IdSet>>(
        &self,
        method: &str,
        excluded: I,
        args: &[Value],
    ) -> Result<Option<Value>, CallError> {
        SurfaceRef::new(self, self.inline()).quietly(method, excluded, args)
    }

    fn observer_count(&self, method: &str) -> Option<usize> {
        SurfaceRef::new(self, self.inline()).observer_count(method)
    }
}
