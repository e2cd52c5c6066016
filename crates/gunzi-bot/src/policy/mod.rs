mod easy;
mod hard;
mod medium;

pub use easy::EasyStrategy;
pub use hard::HardStrategy;
pub use medium::MediumStrategy;

use crate::SharedTracker;
use crate::bot::SearchConfig;
use gunzi_core::{Card, GameEngine, Rank, Seat, Suit, TrumpInfo};
use std::fmt;
use std::str::FromStr;

/// Decisions a computer seat makes over a round.
pub trait Strategy: Send {
    /// A suit to declare with `target_rank` as level, or `None` to pass.
    fn choose_trump_suit(&mut self, hand: &[Card], target_rank: Rank) -> Option<Suit>;

    /// Exactly `kitty.len()` cards from `hand` to bury.
    fn choose_kitty_cards(&mut self, hand: &[Card], kitty: &[Card], trump: &TrumpInfo) -> Vec<Card>;

    /// A play for `seat` that `engine` accepts.
    fn choose_cards(&mut self, seat: Seat, engine: &GameEngine) -> Vec<Card>;

    fn difficulty(&self) -> Difficulty;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub const fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// Builds the strategy for this tier. Easy seeds its rng from `search.seed`.
    pub fn build(self, tracker: SharedTracker, search: SearchConfig) -> Box<dyn Strategy> {
        match self {
            Difficulty::Easy => Box::new(EasyStrategy::with_seed(search.seed)),
            Difficulty::Medium => Box::new(MediumStrategy::new(tracker)),
            Difficulty::Hard => Box::new(HardStrategy::new(tracker, search)),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDifficulty(pub String);

impl fmt::Display for UnknownDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown difficulty '{}' (expected easy, medium or hard)", self.0)
    }
}

impl std::error::Error for UnknownDifficulty {}

impl FromStr for Difficulty {
    type Err = UnknownDifficulty;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" | "normal" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(UnknownDifficulty(raw.to_string())),
        }
    }
}
