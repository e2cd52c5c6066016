use crate::model::card::Card;
use crate::model::rank::Rank;
use crate::model::suit::Suit;
use core::fmt;
use serde::{Deserialize, Serialize};

const BIG_JOKER: u32 = 1000;
const SMALL_JOKER: u32 = 999;
const LEVEL_IN_TRUMP_SUIT: u32 = 998;
const LEVEL_OFF_SUIT: u32 = 997;
const TRUMP_SUIT_BASE: u32 = 900;

/// The declared trump for one round.
///
/// Trump cards are both jokers, every card of the level rank regardless of
/// suit, and every card of the trump suit. Trump cards have no effective suit
/// for follow purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrumpInfo {
    pub trump_suit: Suit,
    pub trump_rank: Rank,
}

impl TrumpInfo {
    pub const fn new(trump_suit: Suit, trump_rank: Rank) -> Self {
        Self {
            trump_suit,
            trump_rank,
        }
    }

    pub fn is_trump(&self, card: Card) -> bool {
        card.is_joker() || card.rank == self.trump_rank || card.suit == Some(self.trump_suit)
    }

    /// Total order for trick comparison; larger wins.
    pub fn card_strength(&self, card: Card) -> u32 {
        let base = card.rank.effective_rank_strength();
        match card.rank {
            Rank::BigJoker => BIG_JOKER,
            Rank::SmallJoker => SMALL_JOKER,
            rank if rank == self.trump_rank => {
                if card.suit == Some(self.trump_suit) {
                    LEVEL_IN_TRUMP_SUIT
                } else {
                    LEVEL_OFF_SUIT
                }
            }
            _ if card.suit == Some(self.trump_suit) => TRUMP_SUIT_BASE + base,
            _ => base,
        }
    }

    /// Suit used for following; `None` for any trump card.
    pub fn effective_suit(&self, card: Card) -> Option<Suit> {
        if self.is_trump(card) {
            None
        } else {
            card.suit
        }
    }
}

impl fmt::Display for TrumpInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.trump_suit, self.trump_rank)
    }
}
