//! # IDP Execution Workers
//!
//! Side-effect surface of the control layer. Each endpoint is a single
//! idempotent operation against an external provider, addressed by a
//! caller-supplied resource id; the worker holds no state of its own.

pub mod config;
pub mod github;
pub mod harbor;
pub mod web;
