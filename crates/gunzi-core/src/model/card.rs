use crate::model::rank::Rank;
use crate::model::suit::Suit;
use core::fmt;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// A physical card. Several deck copies share the same face, so identity is
/// carried by `id` alone.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Card {
    pub suit: Option<Suit>,
    pub rank: Rank,
    pub id: u32,
}

impl Card {
    pub const fn new(suit: Suit, rank: Rank, id: u32) -> Self {
        Self {
            suit: Some(suit),
            rank,
            id,
        }
    }

    pub const fn joker(rank: Rank, id: u32) -> Self {
        Self {
            suit: None,
            rank,
            id,
        }
    }

    pub const fn points(self) -> u32 {
        self.rank.points()
    }

    pub const fn is_joker(self) -> bool {
        self.rank.is_joker()
    }

    pub const fn is_big_joker(self) -> bool {
        matches!(self.rank, Rank::BigJoker)
    }

    /// Same suit and rank, regardless of which deck copy the card came from.
    pub fn same_face(self, other: Card) -> bool {
        self.suit == other.suit && self.rank == other.rank
    }

    /// Stable key for grouping cards by face.
    pub fn face_key(self) -> (u8, u8) {
        let suit = self.suit.map(|s| s as u8).unwrap_or(u8::MAX);
        (suit, self.rank as u8)
    }
}

impl PartialEq for Card {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Card {}

impl Hash for Card {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.suit {
            Some(suit) => write!(f, "{}{}", suit, self.rank),
            None => write!(f, "{}", self.rank),
        }
    }
}
