//! # IDP Workflow Engine
//!
//! Durable orchestrator for the platform's lifecycle workflows: application
//! onboarding and activation, application-environment provisioning and secret
//! rotation. State transitions are delegated to the control plane (the single
//! authority on domain state), side effects to the execution workers; the
//! engine contributes durability, retries, signal waits and the error
//! classification between them.

pub mod adapters;
pub mod engine;
pub mod ports;
pub mod runtime;
pub mod web;
pub mod workflows;
