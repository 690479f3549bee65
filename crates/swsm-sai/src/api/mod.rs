//! Hardware programming API traits, one per object category.
//!
//! Backends implement these traits against the real hardware ABI; tests
//! implement them against an in-memory store.

pub mod buffer;
pub mod qos;
