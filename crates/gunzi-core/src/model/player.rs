use crate::model::card::Card;
use crate::model::suit::Suit;
use crate::model::trump::TrumpInfo;
use core::fmt;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Seat {
    North = 0,
    East = 1,
    South = 2,
    West = 3,
}

impl Seat {
    pub const LOOP: [Seat; 4] = [Seat::North, Seat::East, Seat::South, Seat::West];

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Seat::North),
            1 => Some(Seat::East),
            2 => Some(Seat::South),
            3 => Some(Seat::West),
            _ => None,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn next(self) -> Seat {
        match self {
            Seat::North => Seat::East,
            Seat::East => Seat::South,
            Seat::South => Seat::West,
            Seat::West => Seat::North,
        }
    }

    pub const fn previous(self) -> Seat {
        match self {
            Seat::North => Seat::West,
            Seat::East => Seat::North,
            Seat::South => Seat::East,
            Seat::West => Seat::South,
        }
    }

    pub const fn partner(self) -> Seat {
        match self {
            Seat::North => Seat::South,
            Seat::East => Seat::West,
            Seat::South => Seat::North,
            Seat::West => Seat::East,
        }
    }

    /// The seat `steps` places clockwise from this one.
    pub const fn offset(self, steps: usize) -> Seat {
        match Seat::from_index((self.index() + steps) % 4) {
            Some(seat) => seat,
            None => self,
        }
    }

    pub const fn team(self) -> Team {
        if self.index() % 2 == 0 {
            Team::NorthSouth
        } else {
            Team::EastWest
        }
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Seat::North => "North",
            Seat::East => "East",
            Seat::South => "South",
            Seat::West => "West",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Team {
    NorthSouth = 0,
    EastWest = 1,
}

impl Team {
    pub const BOTH: [Team; 2] = [Team::NorthSouth, Team::EastWest];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn other(self) -> Team {
        match self {
            Team::NorthSouth => Team::EastWest,
            Team::EastWest => Team::NorthSouth,
        }
    }

    /// Seats in index order; the first one receives tribute.
    pub const fn seats(self) -> [Seat; 2] {
        match self {
            Team::NorthSouth => [Seat::North, Seat::South],
            Team::EastWest => [Seat::East, Seat::West],
        }
    }

    pub const fn first_seat(self) -> Seat {
        self.seats()[0]
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Team::NorthSouth => f.write_str("North/South"),
            Team::EastWest => f.write_str("East/West"),
        }
    }
}

/// One seat at the table and the cards it currently holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Player {
    seat: Seat,
    name: String,
    hand: Vec<Card>,
    is_human: bool,
}

impl Player {
    pub fn new(seat: Seat, name: impl Into<String>, is_human: bool) -> Self {
        Self {
            seat,
            name: name.into(),
            hand: Vec::new(),
            is_human,
        }
    }

    pub fn seat(&self) -> Seat {
        self.seat
    }

    pub fn team(&self) -> Team {
        self.seat.team()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn is_human(&self) -> bool {
        self.is_human
    }

    pub fn set_human(&mut self, is_human: bool) {
        self.is_human = is_human;
    }

    pub fn hand(&self) -> &[Card] {
        &self.hand
    }

    pub fn len(&self) -> usize {
        self.hand.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hand.is_empty()
    }

    pub fn holds(&self, card: Card) -> bool {
        self.hand.contains(&card)
    }

    pub fn holds_all(&self, cards: &[Card]) -> bool {
        cards.iter().all(|card| self.holds(*card))
    }

    pub fn add_cards(&mut self, cards: impl IntoIterator<Item = Card>) {
        self.hand.extend(cards);
    }

    pub fn clear(&mut self) -> Vec<Card> {
        std::mem::take(&mut self.hand)
    }

    /// Removes every listed card or none of them.
    pub fn remove_cards(&mut self, cards: &[Card]) -> bool {
        if !self.holds_all(cards) {
            return false;
        }
        self.hand.retain(|card| !cards.contains(card));
        true
    }

    pub fn remove_card(&mut self, card: Card) -> bool {
        self.remove_cards(&[card])
    }

    /// Cards whose effective suit is `suit`; `None` selects trump.
    pub fn cards_of_suit(&self, suit: Option<Suit>, trump: &TrumpInfo) -> Vec<Card> {
        self.hand
            .iter()
            .copied()
            .filter(|card| trump.effective_suit(*card) == suit)
            .collect()
    }

    pub fn count_of_suit(&self, suit: Option<Suit>, trump: &TrumpInfo) -> usize {
        self.hand
            .iter()
            .filter(|card| trump.effective_suit(**card) == suit)
            .count()
    }

    pub fn trump_cards(&self, trump: &TrumpInfo) -> Vec<Card> {
        self.cards_of_suit(None, trump)
    }

    /// Strongest first; ties keep a stable face order.
    pub fn sort_by_strength(&mut self, trump: &TrumpInfo) {
        self.hand
            .sort_by_key(|card| (Reverse(trump.card_strength(*card)), card.face_key(), card.id));
    }

    pub(crate) fn hand_mut(&mut self) -> &mut Vec<Card> {
        &mut self.hand
    }
}
