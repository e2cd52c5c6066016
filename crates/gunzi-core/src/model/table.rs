use serde::{Deserialize, Serialize};

/// Table variant: how many deck copies are mixed and how they are split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    pub deck_copies: u8,
    pub hand_size: usize,
    pub kitty_size: usize,
}

impl TableConfig {
    /// 162 cards: 39 per seat and a kitty of 6.
    pub const fn three_deck() -> Self {
        Self {
            deck_copies: 3,
            hand_size: 39,
            kitty_size: 6,
        }
    }

    /// 108 cards: 25 per seat and a kitty of 8.
    pub const fn two_deck() -> Self {
        Self {
            deck_copies: 2,
            hand_size: 25,
            kitty_size: 8,
        }
    }

    pub const fn deck_size(&self) -> usize {
        // 52 suited cards plus one small and one big joker per copy.
        self.deck_copies as usize * 54
    }

    pub const fn is_consistent(&self) -> bool {
        self.deck_copies > 0 && self.hand_size * 4 + self.kitty_size == self.deck_size()
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self::three_deck()
    }
}
