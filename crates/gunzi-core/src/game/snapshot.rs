use crate::game::phase::GamePhase;
use crate::model::card::Card;
use crate::model::play_type::PlayType;
use crate::model::player::Seat;
use crate::model::rank::Rank;
use crate::model::trump::TrumpInfo;
use serde::{Deserialize, Serialize};

/// Owned, read-only view of the table for observers. Hidden hands are
/// reduced to their sizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub phase: GamePhase,
    pub round_number: u32,
    pub dealer: Seat,
    pub current_player: Seat,
    pub trump: Option<TrumpInfo>,
    pub hand_sizes: [usize; 4],
    pub kitty_size: usize,
    pub trick: [Vec<Card>; 4],
    pub trick_leader: Seat,
    pub trick_play_type: Option<PlayType>,
    pub trick_plays: usize,
    pub defender_points: u32,
    pub team_levels: [Rank; 2],
}
