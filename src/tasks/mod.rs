//! Background Tasks Module
//!
//! Contains background tasks that run periodically during service operation.
//!
//! # Tasks
//! - Expiry sweep: removes expired parameter entries at configured intervals

mod sweep;

pub use sweep::{spawn_sweep_every, spawn_sweep_task};
