//! Small shared utilities: FIFO queue, timer scheduler, TTL cache.

pub mod queue;
pub mod scheduler;
pub mod ttl_cache;

pub use queue::FifoQueue;
pub use scheduler::{Scheduler, TimerId};
pub use ttl_cache::TtlCache;
