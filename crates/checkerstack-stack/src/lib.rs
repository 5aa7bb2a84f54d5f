//! # checkerstack-stack
//!
//! Declarative model of the Essay Checker deployment.
//!
//! Handles:
//! - **Resources**: Typed property shapes for storage, queue, IAM, compute, and gateway.
//! - **Intrinsics**: Values the backend resolves at deploy time.
//! - **Routes**: `nom` parser for HTTP API route keys.
//! - **Graph**: Dependency graph construction and topological resolution.
//! - **Builder**: Assembly of the full stack for a provisioning context.
//! - **Validator**: Ordering, reference, and exposure checks.
//! - **Template**: JSON and YAML synthesis.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used, clippy::panic))]

pub mod builder;
pub mod graph;
pub mod intrinsic;
pub mod resource;
pub mod route;
pub mod stack;
pub mod template;
pub mod validator;

pub use builder::{DescriptorBuilder, build_stack};
pub use stack::{Output, Stack};
pub use template::{OutputFormat, synthesize};
