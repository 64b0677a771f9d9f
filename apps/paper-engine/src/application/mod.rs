//! Application Layer
//!
//! It defines:
//!
//! - **Ports**: Interfaces for interacting with external systems
//! - **DTOs**: Data transfer objects for API boundaries

pub mod dto;
pub mod ports;

pub use dto::*;
pub use ports::*;
