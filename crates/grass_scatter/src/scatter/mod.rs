//! Whole-request scattering: tiling, guards, progress events and the runner tying them
//! together.
pub mod events;
pub mod guard;
pub mod runner;
pub mod tiling;
