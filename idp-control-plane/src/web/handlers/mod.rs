//! HTTP handlers for the command and query surface.

pub mod applications;
pub mod environments;
pub mod health;
pub mod queries;
pub mod repositories;
pub mod secrets;
pub mod teams;
