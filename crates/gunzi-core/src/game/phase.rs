use core::fmt;
use serde::{Deserialize, Serialize};

/// Round lifecycle. Within a round phases only move forward; after
/// `RoundEnd` the next round starts over at `Dealing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    RoundEnd,
    Dealing,
    DeclaringTrump,
    PreparingKitty,
    Playing,
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GamePhase::RoundEnd => "round end",
            GamePhase::Dealing => "dealing",
            GamePhase::DeclaringTrump => "trump declaration",
            GamePhase::PreparingKitty => "kitty preparation",
            GamePhase::Playing => "play",
        };
        f.write_str(label)
    }
}
