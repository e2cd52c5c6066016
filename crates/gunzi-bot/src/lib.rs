pub mod bot;
pub mod policy;

use gunzi_core::CardTracker;
use parking_lot::RwLock;
use std::sync::Arc;

pub use bot::{RolloutSearch, SearchConfig, SearchStats, TrickView, generate_candidates};
pub use policy::{
    Difficulty, EasyStrategy, HardStrategy, MediumStrategy, Strategy, UnknownDifficulty,
};

/// Card memory shared by every computer seat at one table. The table writes
/// after each play; strategies only read.
pub type SharedTracker = Arc<RwLock<CardTracker>>;
