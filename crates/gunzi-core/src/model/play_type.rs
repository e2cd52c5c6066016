use crate::model::card::Card;
use core::fmt;
use serde::{Deserialize, Serialize};

/// Shapes a lead may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayType {
    Single,
    /// Two physical cards of the same face.
    Bang,
    /// Three physical cards of the same face.
    Gunzi,
}

impl PlayType {
    pub const fn card_count(self) -> usize {
        match self {
            PlayType::Single => 1,
            PlayType::Bang => 2,
            PlayType::Gunzi => 3,
        }
    }

    pub const fn from_count(count: usize) -> Option<Self> {
        match count {
            1 => Some(PlayType::Single),
            2 => Some(PlayType::Bang),
            3 => Some(PlayType::Gunzi),
            _ => None,
        }
    }

    /// `None` unless the cards are 1-3 distinct physical copies of one face.
    pub fn classify(cards: &[Card]) -> Option<PlayType> {
        let play_type = PlayType::from_count(cards.len())?;
        let first = cards[0];
        let uniform = cards.iter().all(|card| card.same_face(first));
        let distinct = cards
            .iter()
            .enumerate()
            .all(|(i, card)| cards[..i].iter().all(|earlier| earlier.id != card.id));
        (uniform && distinct).then_some(play_type)
    }
}

impl fmt::Display for PlayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PlayType::Single => "single",
            PlayType::Bang => "bang",
            PlayType::Gunzi => "gunzi",
        };
        f.write_str(label)
    }
}
