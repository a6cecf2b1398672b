//! # IDP Control Plane (Command API)
//!
//! Authoritative store of platform resource state. Enforces every domain
//! invariant and state-machine transition, exposes commands (mutations) and
//! queries (reads), and performs no outbound calls: side effects belong to the
//! execution workers, orchestration to the workflow engine.

pub mod adapters;
pub mod application;
pub mod domain;
pub mod web;
