//! Storage bridge for folio
//!
//! The engine reads and writes content through the narrow [`Bridge`] contract
//! only: `get`, `put` and `glob` over forward-slash paths, plus `delete` and
//! `exists`. Two implementations ship here:
//!
//! - [`MemoryBridge`]: ordered in-memory map, for tests and ephemeral use
//! - [`FsBridge`]: files under a root directory, written atomically

pub mod bridge;
pub mod error;
pub mod fs;
pub mod memory;

pub use bridge::Bridge;
pub use error::{BridgeError, Result};
pub use fs::FsBridge;
pub use memory::MemoryBridge;
