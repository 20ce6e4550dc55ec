//! Calculated subjects and inheritance resolution.

pub mod calculated;
pub mod notifier;
pub mod resolver;

pub use calculated::{BakedSubject, CalculatedSubject};
pub use notifier::{CheckNotifier, NoopNotifier, TracingNotifier};
pub use resolver::{InheritanceGraph, SubjectSource};
