//! Opponent modelling for computer seats.
//!
//! - `tracker`: what has been played and which seats are known void.
//! - `sampler`: deals hidden cards into a concrete world consistent with the tracker.

mod sampler;
mod tracker;

pub use sampler::determinize;
pub use tracker::CardTracker;
