use crate::error::EngineError;
use crate::model::card::Card;
use crate::model::rank::Rank;
use crate::model::suit::Suit;
use crate::model::table::TableConfig;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Several standard decks shuffled together, dealt front to back.
#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
    dealt: usize,
}

impl Deck {
    /// Unshuffled deck. Ids are assigned copy by copy, then small jokers,
    /// then big jokers.
    pub fn new(copies: u8) -> Self {
        let copies = copies as usize;
        let mut cards = Vec::with_capacity(copies * 54);
        let mut id = 0u32;
        for _ in 0..copies {
            for suit in Suit::ALL {
                for rank in Rank::SUITED {
                    cards.push(Card::new(suit, rank, id));
                    id += 1;
                }
            }
        }
        for joker in [Rank::SmallJoker, Rank::BigJoker] {
            for _ in 0..copies {
                cards.push(Card::joker(joker, id));
                id += 1;
            }
        }
        Self { cards, dealt: 0 }
    }

    pub fn for_table(config: &TableConfig) -> Self {
        Self::new(config.deck_copies)
    }

    pub fn shuffled<R: rand::Rng + ?Sized>(copies: u8, rng: &mut R) -> Self {
        let mut deck = Self::new(copies);
        deck.shuffle(rng);
        deck
    }

    pub fn shuffled_with_seed(copies: u8, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::shuffled(copies, &mut rng)
    }

    /// Shuffles the whole deck and restarts dealing from the top.
    pub fn shuffle<R: rand::Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
        self.dealt = 0;
    }

    pub fn deal(&mut self, count: usize) -> Result<Vec<Card>, EngineError> {
        let remaining = self.remaining();
        if count > remaining {
            return Err(EngineError::ResourceExhaustion {
                requested: count,
                remaining,
            });
        }
        let hand = self.cards[self.dealt..self.dealt + count].to_vec();
        self.dealt += count;
        Ok(hand)
    }

    pub fn remaining(&self) -> usize {
        self.cards.len() - self.dealt
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}
