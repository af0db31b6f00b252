//! Procedural meshes for the machine parts on the bench.

pub mod parts;

pub use parts::*;
