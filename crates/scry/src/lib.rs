//! `scry`: observe calls to selected methods of an object.
//!
//! Setup ([`gaze`]) replaces the named methods of a [`Target`] with wrappers
//! that run the original and then notify registered observers with the same
//! arguments. The returned control surface ([`Scry`]) registers and removes
//! observers and can call a method while bypassing all or some of them,
//! which is how an observer acts on the target without hearing about its own
//! action.
//!
//! ```
//! use scry::{Scry, SurfaceName, Target, gaze};
//! use serde_json::json;
//!
//! let mut ball = Target::builder(false)
//!     .method("polish", |polished: &mut bool, _: &[scry::Value]| {
//!         *polished = true;
//!         Ok(json!(null))
//!     })
//!     .build();
//! gaze(&mut ball, ["polish"], SurfaceName::default()).unwrap();
//!
//! let scry = ball.surface("scry").unwrap();
//! let id = scry.watch("polish", |_| Ok(())).unwrap();
//! ball.call("polish", &[]).unwrap();
//! scry.unwatch(id);
//! ```
//!
//! Delivery is synchronous and in registration order. Observers may call
//! back into the target or the surface. An observer added during a delivery
//! is first notified on the next call; one removed during a delivery is not
//! notified again, even later in the same delivery.

pub mod gaze;
pub mod registry;
pub mod surface;
pub mod target;

pub use gaze::gaze;
pub use registry::{Callback, GlobalCallback};
pub use surface::{DEFAULT_SURFACE, INLINE_MARKER, Scry, SurfaceName, SurfaceRef};
pub use target::{Target, TargetBuilder};

pub use scry_core::{
    CallError, GazeError, IdSet, MethodError, ObserverError, ObserverId, Scope, Value,
};
