//! # checkerstack-asset
//!
//! Container image asset handling for the API handler function.
//!
//! Handles:
//! - **Exclude**: Build-context paths left out of the image.
//! - **Hashing**: SHA-256 fingerprint of a build context, used as image tag.
//! - **Reference**: Registry URI of the image by content-addressed tag.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod exclude;
pub mod hash;
pub mod reference;
