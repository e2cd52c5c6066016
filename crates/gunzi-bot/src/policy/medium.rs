use super::{Difficulty, Strategy};
use crate::SharedTracker;
use crate::bot::{
    TrickView, choose_follow, ensure_legal, face_groups, is_high_face, legal_fallback,
    level_counts, sort_weakest_first,
};
use gunzi_core::{Card, CardTracker, GameEngine, Rank, Seat, Suit, TrumpInfo};
use std::cmp::Reverse;

const LENGTH_WEIGHT: i64 = 10;
const OPPONENT_VOID_BONUS: i64 = 20;
const PARTNER_VOID_PENALTY: i64 = 30;

/// Deterministic heuristic play backed by the shared card tracker.
pub struct MediumStrategy {
    tracker: SharedTracker,
}

impl MediumStrategy {
    pub fn new(tracker: SharedTracker) -> Self {
        Self { tracker }
    }

    fn choose_lead(&self, engine: &GameEngine, seat: Seat, trump: &TrumpInfo) -> Vec<Card> {
        let mut hand = engine.hand(seat).to_vec();
        sort_weakest_first(&mut hand, trump);
        let (trumps, side): (Vec<Card>, Vec<Card>) =
            hand.iter().copied().partition(|card| trump.is_trump(*card));

        let strong = face_groups(&side)
            .into_iter()
            .filter(|group| group.len() >= 2 && is_high_face(group[0]))
            .max_by_key(|group| (group.len(), trump.card_strength(group[0])));
        if let Some(group) = strong {
            return group.into_iter().take(3).collect();
        }

        let tracker = self.tracker.read();
        let best_suit = Suit::ALL
            .into_iter()
            .filter_map(|suit| {
                let cards: Vec<Card> = side
                    .iter()
                    .copied()
                    .filter(|card| card.suit == Some(suit))
                    .collect();
                if cards.is_empty() {
                    return None;
                }
                Some((lead_score(&tracker, seat, suit, cards.len()), suit, cards))
            })
            // First suit wins ties.
            .max_by_key(|(score, suit, _)| (*score, Reverse(suit.index())));
        if let Some((_, _, cards)) = best_suit {
            let pick = [Rank::Ace, Rank::King]
                .into_iter()
                .find_map(|rank| cards.iter().copied().find(|card| card.rank == rank))
                .or_else(|| cards.last().copied());
            if let Some(card) = pick {
                return vec![card];
            }
        }

        trumps.first().map(|card| vec![*card]).unwrap_or_default()
    }
}

/// Long suits, suits the opponents cannot follow and suits already thinned
/// out score high; suits the partner is void in score low.
fn lead_score(tracker: &CardTracker, seat: Seat, suit: Suit, length: usize) -> i64 {
    let mut score = length as i64 * LENGTH_WEIGHT;
    for opponent in [seat.next(), seat.previous()] {
        if tracker.is_void(opponent, suit) {
            score += OPPONENT_VOID_BONUS;
        }
    }
    if tracker.is_void(seat.partner(), suit) {
        score -= PARTNER_VOID_PENALTY;
    }
    score + (scarcity_pivot(tracker) - tracker.remaining_in_suit(suit) as i64).max(0)
}

/// Two thirds of one suit across every deck copy.
fn scarcity_pivot(tracker: &CardTracker) -> i64 {
    let per_suit = tracker.remaining_in_suit(Suit::Spade) + tracker.played_by_suit(Suit::Spade);
    (per_suit as i64 * 2) / 3
}

/// How much a card is worth holding on to when burying the kitty.
fn keep_score(card: Card, hand: &[Card], trump: &TrumpInfo) -> u32 {
    if card.is_joker() {
        return u32::MAX;
    }
    let strength = trump.card_strength(card);
    if trump.is_trump(card) {
        return 1000 + strength;
    }
    let suit_len = hand
        .iter()
        .filter(|other| other.suit == card.suit && !trump.is_trump(**other))
        .count() as u32;
    if card.points() > 0 {
        500 + card.points() + suit_len
    } else if suit_len >= 5 {
        200 + strength + suit_len * 10
    } else {
        strength + suit_len * 10
    }
}

impl Strategy for MediumStrategy {
    fn choose_trump_suit(&mut self, hand: &[Card], target_rank: Rank) -> Option<Suit> {
        let counts = level_counts(hand, target_rank);
        Suit::ALL
            .into_iter()
            .filter(|suit| counts[suit.index()] >= 2)
            .map(|suit| {
                let length = hand.iter().filter(|card| card.suit == Some(suit)).count();
                (length + counts[suit.index()], suit)
            })
            .max_by_key(|(score, suit)| (*score, Reverse(suit.index())))
            .map(|(_, suit)| suit)
    }

    fn choose_kitty_cards(&mut self, hand: &[Card], kitty: &[Card], trump: &TrumpInfo) -> Vec<Card> {
        let mut ranked = hand.to_vec();
        ranked.sort_by_key(|card| (keep_score(*card, hand, trump), card.id));
        ranked.truncate(kitty.len());
        ranked
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
        Difficulty::Medium
    }
}
