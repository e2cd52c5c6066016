use super::{Difficulty, Strategy};
use crate::bot::{
    TrickView, choose_follow, ensure_legal, face_groups, is_high_face, legal_fallback,
    level_counts, sort_weakest_first,
};
use gunzi_core::{Card, GameEngine, Rank, Seat, Suit, TrumpInfo};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const STRONG_COMBO_CHANCE: f64 = 0.7;
const TRUMP_CLEAR_CHANCE: f64 = 0.25;
/// Trump-suit cards below a Ten are cheap enough to lead away.
const CHEAP_TRUMP_LIMIT: u32 = 900 + 10;

/// Heuristic play with a dash of randomness. Also drives every seat in
/// Hard-tier rollouts.
pub struct EasyStrategy {
    rng: SmallRng,
}

impl EasyStrategy {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    fn choose_lead(&mut self, engine: &GameEngine, seat: Seat, trump: &TrumpInfo) -> Vec<Card> {
        let mut hand = engine.hand(seat).to_vec();
        sort_weakest_first(&mut hand, trump);
        let (trumps, side): (Vec<Card>, Vec<Card>) =
            hand.iter().copied().partition(|card| trump.is_trump(*card));

        let strong = face_groups(&side)
            .into_iter()
            .filter(|group| group.len() >= 2 && is_high_face(group[0]))
            .max_by_key(|group| (group.len(), trump.card_strength(group[0])));
        if let Some(group) = strong {
            if self.rng.gen_bool(STRONG_COMBO_CHANCE) {
                return group.into_iter().take(3).collect();
            }
        }

        let cheap_trump = face_groups(&trumps).into_iter().find(|group| {
            group.len() >= 2
                && !group[0].is_joker()
                && trump.card_strength(group[0]) < CHEAP_TRUMP_LIMIT
        });
        if let Some(group) = cheap_trump {
            if self.rng.gen_bool(TRUMP_CLEAR_CHANCE) {
                return group.into_iter().take(3).collect();
            }
        }

        let mut lengths = [0usize; 4];
        for card in &side {
            if let Some(suit) = trump.effective_suit(*card) {
                lengths[suit.index()] += 1;
            }
        }
        let longest = lengths.iter().copied().max().unwrap_or(0);
        if longest > 0 {
            let suits: Vec<Suit> = Suit::ALL
                .into_iter()
                .filter(|suit| lengths[suit.index()] == longest)
                .collect();
            if let Some(suit) = suits.choose(&mut self.rng) {
                let in_suit: Vec<Card> = side
                    .iter()
                    .copied()
                    .filter(|card| card.suit == Some(*suit))
                    .collect();
                let pick = in_suit
                    .iter()
                    .copied()
                    .find(|card| card.points() == 0)
                    .or_else(|| in_suit.first().copied());
                if let Some(card) = pick {
                    return vec![card];
                }
            }
        }

        trumps.first().map(|card| vec![*card]).unwrap_or_default()
    }
}

impl Default for EasyStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for EasyStrategy {
    fn choose_trump_suit(&mut self, hand: &[Card], target_rank: Rank) -> Option<Suit> {
        let counts = level_counts(hand, target_rank);
        let eligible: Vec<Suit> = Suit::ALL
            .into_iter()
            .filter(|suit| counts[suit.index()] >= 2)
            .collect();
        eligible.choose(&mut self.rng).copied()
    }

    fn choose_kitty_cards(&mut self, hand: &[Card], kitty: &[Card], trump: &TrumpInfo) -> Vec<Card> {
        let count = kitty.len();
        let mut plain: Vec<Card> = hand
            .iter()
            .copied()
            .filter(|card| !trump.is_trump(*card) && card.points() == 0)
            .collect();
        plain.shuffle(&mut self.rng);
        let mut bury: Vec<Card> = plain.into_iter().take(count).collect();

        if bury.len() < count {
            let mut rest: Vec<Card> = hand
                .iter()
                .copied()
                .filter(|card| !bury.contains(card))
                .collect();
            sort_weakest_first(&mut rest, trump);
            // Jokers only go down when nothing else is left.
            rest.sort_by_key(|card| card.is_joker());
            bury.extend(rest.into_iter().take(count - bury.len()));
        }
        bury
    }

    fn choose_cards(&mut self, seat: Seat, engine: &GameEngine) -> Vec<Card> {
        let Some(view) = TrickView::new(engine, seat) else {
            return legal_fallback(engine, seat);
        };
        if view.is_leading() {
            let play = self.choose_lead(engine, seat, &view.trump);
            return ensure_legal(engine, seat, play);
        }
        choose_follow(engine, &view)
    }

    fn difficulty(&self) -> Difficulty {
        Difficulty::Easy
    }
}

#[cfg(test)]
mod tests {
    use super::EasyStrategy;
    use crate::policy::Strategy;
    use gunzi_core::{Card, GameEngine, Rank, Seat, Suit, TableConfig, TrumpInfo};

    #[test]
    fn trump_choice_needs_two_level_cards() {
        let mut easy = EasyStrategy::with_seed(1);
        let hand = vec![
            Card::new(Suit::Heart, Rank::Five, 1),
            Card::new(Suit::Heart, Rank::Five, 2),
            Card::new(Suit::Club, Rank::Five, 3),
        ];
        assert_eq!(easy.choose_trump_suit(&hand, Rank::Five), Some(Suit::Heart));
        assert_eq!(easy.choose_trump_suit(&hand, Rank::Six), None);
    }

    #[test]
    fn kitty_avoids_points_trump_and_jokers() {
        let mut easy = EasyStrategy::with_seed(2);
        let trump = TrumpInfo::new(Suit::Spade, Rank::Three);
        let mut hand: Vec<Card> = (0..4).map(|i| Card::new(Suit::Heart, Rank::Seven, i)).collect();
        hand.push(Card::new(Suit::Heart, Rank::King, 10));
        hand.push(Card::new(Suit::Spade, Rank::Nine, 11));
        hand.push(Card::joker(Rank::BigJoker, 160));
        hand.push(Card::new(Suit::Club, Rank::Five, 12));
        let kitty = vec![Card::new(Suit::Club, Rank::Four, 99); 6];

        let bury = easy.choose_kitty_cards(&hand, &kitty, &trump);
        assert_eq!(bury.len(), 6);
        assert!(!bury.iter().any(|c| c.is_joker()));
        assert_eq!(bury.iter().filter(|c| c.rank == Rank::Seven).count(), 4);
    }

    #[test]
    fn every_play_is_legal_over_a_full_round() {
        let mut engine = GameEngine::with_seed(TableConfig::three_deck(), 31).unwrap();
        engine.start_new_round().unwrap();
        engine.declare_trump(Seat::West, Suit::Diamond).unwrap();
        let mut easy = EasyStrategy::with_seed(4);
        let trump = engine.trump_info().unwrap();
        let kitty = vec![Card::new(Suit::Club, Rank::Four, 999); 6];
        let bury = easy.choose_kitty_cards(engine.hand(Seat::West), &kitty, &trump);
        engine.set_kitty(&bury).unwrap();

        while !engine.is_round_over() {
            for _ in 0..4 {
                let seat = engine.current_player();
                let play = easy.choose_cards(seat, &engine);
                engine.play_cards(seat, &play).unwrap();
            }
            engine.evaluate_trick().unwrap();
        }
        assert!(engine.players().iter().all(|p| p.is_empty()));
    }
}
