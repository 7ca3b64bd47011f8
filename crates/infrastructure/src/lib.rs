//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_directory;
mod system_clock;

pub use in_memory_directory::InMemoryDirectory;
pub use system_clock::SystemClock;
