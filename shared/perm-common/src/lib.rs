//! Permission Common Library
//!
//! Shared types used by the resolution engine and its storage collaborators.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
