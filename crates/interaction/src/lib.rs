//! Object manipulation and placement: picking up loose objects, carrying
//! them in front of the viewer or across surfaces, and snapping them into
//! placement zones.

pub mod aim;
pub mod config;
pub mod controller;
pub mod holdable;
pub mod registry;
pub mod zone;

pub use aim::*;
pub use config::*;
pub use controller::*;
pub use holdable::*;
pub use registry::*;
pub use zone::*;
