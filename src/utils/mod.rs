//! Utils Module - Helper Functions & Shared Utilities
//!
//! Constants, time source and session telemetry.

pub mod clock;
pub mod constants;
pub mod telemetry;

pub use clock::*;
pub use constants::*;
pub use telemetry::*;
