//! Infrastructure configuration and wiring.

mod container;

pub use container::Engine;
