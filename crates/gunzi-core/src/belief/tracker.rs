//! Round-scoped memory of played cards and revealed voids.

use crate::model::card::Card;
use crate::model::player::Seat;
use crate::model::rank::Rank;
use crate::model::suit::Suit;
use crate::model::table::TableConfig;
use crate::model::trump::TrumpInfo;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct CardTracker {
    config: TableConfig,
    played: HashSet<Card>,
    void_suits: [HashSet<Suit>; 4],
    trump_void: [bool; 4],
}

impl CardTracker {
    pub fn new(config: TableConfig) -> Self {
        Self {
            config,
            played: HashSet::with_capacity(config.deck_size()),
            void_suits: Default::default(),
            trump_void: [false; 4],
        }
    }

    /// Forgets everything; called at the start of every round.
    pub fn reset(&mut self) {
        self.played.clear();
        for voids in self.void_suits.iter_mut() {
            voids.clear();
        }
        self.trump_void = [false; 4];
    }

    pub fn card_played(&mut self, card: Card, _seat: Seat) {
        self.played.insert(card);
    }

    pub fn mark_void(&mut self, seat: Seat, suit: Suit) {
        self.void_suits[seat.index()].insert(suit);
    }

    pub fn mark_trump_void(&mut self, seat: Seat) {
        self.trump_void[seat.index()] = true;
    }

    /// Records a play. A seat that played fewer lead-suit cards than the
    /// lead required has shown it holds no more of that suit. `lead` is
    /// empty when `seat` is the one leading.
    pub fn observe_play(&mut self, seat: Seat, cards: &[Card], lead: &[Card], trump: &TrumpInfo) {
        for card in cards {
            self.card_played(*card, seat);
        }
        let Some(first) = lead.first() else {
            return;
        };
        let lead_suit = trump.effective_suit(*first);
        let followed = cards
            .iter()
            .filter(|card| trump.effective_suit(**card) == lead_suit)
            .count();
        if followed < lead.len() {
            match lead_suit {
                Some(suit) => self.mark_void(seat, suit),
                None => self.mark_trump_void(seat),
            }
        }
    }

    pub fn is_void(&self, seat: Seat, suit: Suit) -> bool {
        self.void_suits[seat.index()].contains(&suit)
    }

    pub fn is_trump_void(&self, seat: Seat) -> bool {
        self.trump_void[seat.index()]
    }

    /// Void test on an effective suit; `None` asks about trump.
    pub fn is_void_in(&self, seat: Seat, effective_suit: Option<Suit>) -> bool {
        match effective_suit {
            Some(suit) => self.is_void(seat, suit),
            None => self.is_trump_void(seat),
        }
    }

    pub fn voids_of(&self, seat: Seat) -> &HashSet<Suit> {
        &self.void_suits[seat.index()]
    }

    pub fn void_count(&self, seat: Seat) -> usize {
        self.void_suits[seat.index()].len() + usize::from(self.trump_void[seat.index()])
    }

    pub fn has_been_played(&self, card: Card) -> bool {
        self.played.contains(&card)
    }

    pub fn played(&self) -> &HashSet<Card> {
        &self.played
    }

    pub fn played_by_suit(&self, suit: Suit) -> usize {
        self.played
            .iter()
            .filter(|card| card.suit == Some(suit))
            .count()
    }

    /// Unplayed printed-suit cards, including ones in the asker's own hand.
    pub fn remaining_in_suit(&self, suit: Suit) -> usize {
        let total = self.config.deck_copies as usize * Rank::SUITED.len();
        total.saturating_sub(self.played_by_suit(suit))
    }

    /// Unplayed copies of one face; pass `None` for jokers.
    pub fn remaining_of_rank(&self, suit: Option<Suit>, rank: Rank) -> usize {
        let played = self
            .played
            .iter()
            .filter(|card| card.suit == suit && card.rank == rank)
            .count();
        (self.config.deck_copies as usize).saturating_sub(played)
    }

    pub fn remaining_total(&self) -> usize {
        self.config.deck_size().saturating_sub(self.played.len())
    }
}

impl Default for CardTracker {
    fn default() -> Self {
        Self::new(TableConfig::default())
    }
}
