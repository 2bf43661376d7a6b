//! Settings store implementations.

mod file;
mod memory;

pub use file::{FileStore, StoreHeader};
pub use memory::MemoryStore;
