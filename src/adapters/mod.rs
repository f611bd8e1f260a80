// Adapters layer: concrete implementations of the domain ports (storage backends, clocks).

pub mod clock;
pub mod file_store;
pub mod memory_store;
pub mod session_store;

pub use clock::{FixedClock, SystemClock};
pub use file_store::JsonFileStore;
pub use memory_store::MemoryStore;
pub use session_store::{SessionScope, SessionStore};
