//! Various helpers used by the watchtower crates.

pub use self::batched::BatchedReader;

mod batched;
