#[cfg(test)]
pub mod faulty;
pub mod memory;
pub mod mongo;
pub mod traits;
pub mod types;

pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use traits::DocumentStore;
pub use types::{DocumentUpdate, StoreError, WriteOutcome};
