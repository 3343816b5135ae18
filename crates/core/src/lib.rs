//! `scry-core`: building blocks shared by the observation facility.
//!
//! This crate contains identifiers, the error taxonomy and the dynamic
//! argument value type (no dispatch logic).

pub mod error;
pub mod id;
pub mod value;

pub use error::{CallError, GazeError, MethodError, ObserverError};
pub use id::{IdSequence, IdSet, ObserverId, Scope};
pub use value::Value;
