//! cani2d Core Library
//!
//! This crate provides the math types, error handling and tracing setup
//! shared across all cani2d components.

pub mod error;
pub mod logging;
pub mod types;

pub use error::{Error, Result, ResultExt};
pub use types::*;
