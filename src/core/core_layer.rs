// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "brainrot/mod.rs"]
pub mod brainrot;
