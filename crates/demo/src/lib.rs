//! Crystal-ball scenario: a witch, a cat and a clumsy wizard observing one
//! object through a `scry` surface.

pub mod config;
pub mod crystal_ball;
pub mod narrator;
pub mod scenario;

pub use config::{ConfigError, DemoConfig};
pub use crystal_ball::{CrystalBall, WATCHED};
pub use narrator::Narrator;
pub use scenario::{Outcome, ScenarioError, run};
