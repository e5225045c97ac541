//! Volume Catalog Module
//!
//! Decodes cloud volume descriptions into structured descriptors and is the
//! single choke point for both candidate listing and attach-status polling.

pub mod query;
pub mod tags;
pub mod volume;

pub use query::*;
pub use tags::*;
pub use volume::*;
