//! Store adapters implementing the repository contracts of the application
//! layer.

pub mod memory;
pub mod postgres;
