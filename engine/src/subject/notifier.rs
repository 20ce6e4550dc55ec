//! Check notification hooks.
//!
//! Notifiers observe resolution results. They cannot change them.

use perm_common::{ContextSet, SubjectRef, Tristate};
use tracing::debug;

/// Receives every resolved query.
pub trait CheckNotifier: Send + Sync {
    fn on_permission_check(
        &self,
        _subject: &SubjectRef,
        _contexts: &ContextSet,
        _permission: &str,
        _result: Tristate,
    ) {
    }

    fn on_option_check(
        &self,
        _subject: &SubjectRef,
        _contexts: &ContextSet,
        _key: &str,
        _result: Option<&str>,
    ) {
    }

    fn on_parent_check(&self, _subject: &SubjectRef, _contexts: &ContextSet, _parents: &[SubjectRef]) {}
}

/// Ignores every check.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl CheckNotifier for NoopNotifier {}

/// Emits a debug event per check.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl CheckNotifier for TracingNotifier {
    fn on_permission_check(
        &self,
        subject: &SubjectRef,
        contexts: &ContextSet,
        permission: &str,
        result: Tristate,
    ) {
        debug!(%subject, %contexts, permission, %result, "Permission check");
    }

    fn on_option_check(
        &self,
        subject: &SubjectRef,
        contexts: &ContextSet,
        key: &str,
        result: Option<&str>,
    ) {
        debug!(%subject, %contexts, key, ?result, "Option check");
    }

    fn on_parent_check(&self, subject: &SubjectRef, contexts: &ContextSet, parents: &[SubjectRef]) {
        let parents: Vec<String> = parents.iter().map(ToString::to_string).collect();
        debug!(%subject, %contexts, ?parents, "Parent check");
    }
}
