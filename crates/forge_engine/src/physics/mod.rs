//! Physics integration

pub mod simulation;

pub use simulation::{PhysicsConfig, PhysicsSystem};
