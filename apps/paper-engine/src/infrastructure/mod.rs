//! Infrastructure Layer
//!
//! This module contains the adapters (implementations) for the ports defined
//! in the application layer:
//!
//! - `persistence/`: Store adapters (in-memory)
//! - `config/`: Dependency wiring

pub mod config;
pub mod persistence;
