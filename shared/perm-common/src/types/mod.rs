//! Shared Types

pub mod context;
pub mod subject;
pub mod tristate;

pub use context::{ContextSet, ContextValue};
pub use subject::SubjectRef;
pub use tristate::Tristate;
