//! Background Tasks Module

mod cleanup;

pub use cleanup::spawn_sweep_task;
