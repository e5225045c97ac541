//! Domain Module
//!
//! Trait boundaries and wire types shared with the external cloud client.

pub mod ports;
