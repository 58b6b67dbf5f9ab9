//! Headless session orchestration module.

mod orchestrator;
mod script;
mod stats;
mod surface;

pub use orchestrator::{Session, SessionConfig};
pub use script::{ScriptStep, SessionScript};
pub use stats::SessionStats;
pub use surface::ScriptedSurface;
