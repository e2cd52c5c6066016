use core::fmt;
use serde::{Deserialize, Serialize};

/// Card ranks in this game's climbing order: 3 is the lowest level, 2 sits
/// above the Ace and the jokers top everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[repr(u8)]
pub enum Rank {
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
    Two,
    SmallJoker,
    BigJoker,
}

/// Outcome of moving a team up the level ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LevelAdvance {
    Reached(Rank),
    MatchWon,
}

impl Rank {
    /// The thirteen ranks printed on suited cards.
    pub const SUITED: [Rank; 13] = [
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
        Rank::Two,
    ];

    pub const FIRST_LEVEL: Rank = Rank::Three;
    pub const FINAL_LEVEL: Rank = Rank::Ten;

    pub const fn from_value(value: u8) -> Option<Self> {
        match value {
            2 => Some(Rank::Two),
            3 => Some(Rank::Three),
            4 => Some(Rank::Four),
            5 => Some(Rank::Five),
            6 => Some(Rank::Six),
            7 => Some(Rank::Seven),
            8 => Some(Rank::Eight),
            9 => Some(Rank::Nine),
            10 => Some(Rank::Ten),
            11 => Some(Rank::Jack),
            12 => Some(Rank::Queen),
            13 => Some(Rank::King),
            14 => Some(Rank::Ace),
            15 => Some(Rank::SmallJoker),
            16 => Some(Rank::BigJoker),
            _ => None,
        }
    }

    /// Face value: 2 counts as 2 here, see [`Rank::effective_rank_strength`].
    pub const fn value(self) -> u8 {
        match self {
            Rank::Two => 2,
            Rank::Three => 3,
            Rank::Four => 4,
            Rank::Five => 5,
            Rank::Six => 6,
            Rank::Seven => 7,
            Rank::Eight => 8,
            Rank::Nine => 9,
            Rank::Ten => 10,
            Rank::Jack => 11,
            Rank::Queen => 12,
            Rank::King => 13,
            Rank::Ace => 14,
            Rank::SmallJoker => 15,
            Rank::BigJoker => 16,
        }
    }

    pub const fn points(self) -> u32 {
        match self {
            Rank::Five => 5,
            Rank::Ten | Rank::King => 10,
            _ => 0,
        }
    }

    /// Strength with 2 ranked above the Ace; jokers stay on top.
    pub const fn effective_rank_strength(self) -> u32 {
        match self {
            Rank::Two => 15,
            Rank::SmallJoker => 16,
            Rank::BigJoker => 17,
            other => other.value() as u32,
        }
    }

    pub const fn is_joker(self) -> bool {
        matches!(self, Rank::SmallJoker | Rank::BigJoker)
    }

    /// Moves a level up by `steps`; levels run from Three to Ten.
    pub fn advance_level(self, steps: u8) -> LevelAdvance {
        let target = self.value() as u16 + steps as u16;
        if target > Rank::FINAL_LEVEL.value() as u16 {
            return LevelAdvance::MatchWon;
        }
        match Rank::from_value(target as u8) {
            Some(rank) if rank >= Rank::FIRST_LEVEL => LevelAdvance::Reached(rank),
            _ => LevelAdvance::Reached(Rank::FIRST_LEVEL),
        }
    }

    pub const fn short_name(self) -> &'static str {
        match self {
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
            Rank::Ace => "A",
            Rank::SmallJoker => "SJ",
            Rank::BigJoker => "BJ",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}
