//! Maskforge Core - Foundational types for the mask asset pipeline
//!
//! This crate provides the types every other Maskforge crate depends on:
//! - `AssetId` - Stable, assign-once asset identity
//! - Error types and Result alias

mod error;
mod id;

pub use error::{ForgeError, Result};
pub use id::AssetId;
