pub mod engine;
pub mod phase;
pub mod result;
pub mod snapshot;
