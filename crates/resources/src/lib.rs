#![deny(clippy::pedantic, unsafe_code)]

//! Resource management utilities for kiln
//!
//! This crate provides centralized resource management for coordinating
//! concurrent fetches: the fetch semaphore and the limits it is sized from.

pub mod limits;
pub mod manager;
pub mod semaphore;

pub use limits::{ResourceAvailability, ResourceLimits};
pub use manager::ResourceManager;
pub use semaphore::{acquire_semaphore_permit, create_semaphore};
