//! Subject data and the backing-store contract.
//!
//! `SubjectData` is immutable: every mutation returns a new value, which the
//! subject cache persists and swaps in wholesale.

pub mod error;
pub mod memory;
pub mod store;
pub mod subject_data;

pub use error::LoadFailure;
pub use memory::MemoryDataStore;
pub use store::DataStore;
pub use subject_data::{Segment, SubjectData};
