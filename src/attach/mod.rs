//! Attach Module
//!
//! Node-local device path allocation and the attach orchestration
//! state machine.

pub mod allocator;
pub mod orchestrator;

pub use allocator::*;
pub use orchestrator::*;
