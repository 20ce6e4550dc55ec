//! Subject and rank ladder caches.

pub mod error;
pub mod ladder;
mod locks;
pub mod single_flight;
pub mod subject;

pub use error::CacheError;
pub use ladder::RankLadderCache;
pub use single_flight::SingleFlight;
pub use subject::SubjectCache;
