//! Contagion core — stochastic epidemic propagation over a contact graph.
//!
//! The engine owns a state store and a seeded RNG bank, borrows a
//! topology from its caller, and advances one transition model a tick
//! at a time, emitting a snapshot after every step.

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod model;
pub mod observer;
pub mod rng;
pub mod si_model;
pub mod sirs_model;
pub mod snapshot;
pub mod state;
pub mod types;
