//! # checkerstack-common
//!
//! Shared types, error definitions, the provisioning context, and constants
//! used across the checkerstack workspace.
//!
//! This crate is the leaf of the dependency graph: it depends on no other
//! internal crate.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
