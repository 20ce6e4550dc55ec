//! Permission Engine
//!
//! Context-aware tristate permission resolution: permission trees with
//! prefix fallback, brace patterns, and single-flight subject caching over a
//! pluggable backing store.

pub mod cache;
pub mod config;
pub mod data;
pub mod glob;
pub mod ladder;
pub mod legacy;
pub mod listeners;
pub mod observability;
pub mod service;
pub mod subject;
pub mod tree;

pub use cache::{CacheError, RankLadderCache, SubjectCache};
pub use config::EngineConfig;
pub use data::{DataStore, LoadFailure, MemoryDataStore, SubjectData};
pub use ladder::RankLadder;
pub use listeners::{CacheListenerHolder, ListenerHandle};
pub use service::PermissionService;
pub use subject::CalculatedSubject;
pub use tree::NodeTree;
