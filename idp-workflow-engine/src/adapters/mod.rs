//! HTTP adapters implementing the workflow ports against the control plane
//! and the execution workers. Constructed in `main`; never referenced from
//! workflow code.

pub mod control_plane;
pub mod execution_workers;
