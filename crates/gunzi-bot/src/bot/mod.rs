mod candidates;
mod follow;
mod search;

pub use candidates::generate_candidates;
pub(crate) use candidates::signature;
pub use follow::choose_follow;
pub use search::{RolloutSearch, SearchConfig, SearchStats};

use gunzi_core::{Card, GameEngine, PlayType, Rank, Seat, Suit, TrumpInfo};
use tracing::debug;

/// The current trick as seen by the seat about to act.
#[derive(Debug, Clone)]
pub struct TrickView {
    pub seat: Seat,
    pub trump: TrumpInfo,
    pub lead_suit: Option<Suit>,
    pub play_type: Option<PlayType>,
    pub required: usize,
    /// Seat currently taking the trick and its comparison value.
    pub winner: Option<(Seat, u32)>,
    pub points: u32,
    pub plays: usize,
}

impl TrickView {
    /// `None` outside of play.
    pub fn new(engine: &GameEngine, seat: Seat) -> Option<Self> {
        let trump = engine.trump_info()?;
        let lead = engine.lead_cards();
        let lead_suit = lead.first().and_then(|card| trump.effective_suit(*card));
        let play_type = engine.trick_play_type();
        let plays = engine.trick_plays();

        let mut winner: Option<(Seat, u32)> = None;
        let leader = engine.trick_leader();
        for seat in (0..plays).map(|step| leader.offset(step)) {
            let cards = engine.trick_cards_of(seat);
            if seat != leader && !matches_shape(play_type, cards) {
                continue;
            }
            if let Some(value) = competing_value(&trump, lead_suit, cards) {
                if winner.is_none_or(|(_, best)| value > best) {
                    winner = Some((seat, value));
                }
            }
        }
        let points = engine
            .trick_cards()
            .iter()
            .flatten()
            .map(|card| card.points())
            .sum();

        Some(Self {
            seat,
            trump,
            lead_suit,
            play_type,
            required: engine.required_count(),
            winner,
            points,
            plays,
        })
    }

    pub fn is_leading(&self) -> bool {
        self.plays == 0
    }

    pub fn is_last_to_play(&self) -> bool {
        self.plays == 3
    }

    pub fn partner_winning(&self) -> bool {
        matches!(self.winner, Some((seat, _)) if seat == self.seat.partner())
    }

    /// Whether playing `cards` now would take over the trick.
    pub fn would_win(&self, cards: &[Card]) -> bool {
        if !matches_shape(self.play_type, cards) {
            return false;
        }
        match (competing_value(&self.trump, self.lead_suit, cards), self.winner) {
            (Some(value), Some((_, best))) => value > best,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}

fn matches_shape(play_type: Option<PlayType>, cards: &[Card]) -> bool {
    match play_type {
        None | Some(PlayType::Single) => true,
        Some(shape) => PlayType::classify(cards) == Some(shape),
    }
}

/// Strongest card of `cards` allowed to compete in a trick led in `lead_suit`.
pub fn competing_value(trump: &TrumpInfo, lead_suit: Option<Suit>, cards: &[Card]) -> Option<u32> {
    cards
        .iter()
        .filter(|card| trump.is_trump(**card) || trump.effective_suit(**card) == lead_suit)
        .map(|card| trump.card_strength(*card))
        .max()
}

pub fn sort_weakest_first(cards: &mut [Card], trump: &TrumpInfo) {
    cards.sort_by_key(|card| (trump.card_strength(*card), card.face_key(), card.id));
}

/// Cards grouped by face, keeping the order in which each face first appears.
pub fn face_groups(cards: &[Card]) -> Vec<Vec<Card>> {
    let mut groups: Vec<Vec<Card>> = Vec::new();
    for card in cards {
        match groups.iter_mut().find(|group| group[0].same_face(*card)) {
            Some(group) => group.push(*card),
            None => groups.push(vec![*card]),
        }
    }
    groups
}

pub fn is_high_face(card: Card) -> bool {
    matches!(card.rank, Rank::Ace | Rank::King | Rank::Two)
}

/// Counts per printed suit of the level-rank cards in `hand`.
pub fn level_counts(hand: &[Card], level: Rank) -> [usize; 4] {
    let mut counts = [0usize; 4];
    for card in hand {
        if let (Some(suit), true) = (card.suit, card.rank == level) {
            counts[suit.index()] += 1;
        }
    }
    counts
}

/// Weakest legal play: forced lead-suit cards first, then the weakest fillers.
pub fn legal_fallback(engine: &GameEngine, seat: Seat) -> Vec<Card> {
    let Some(trump) = engine.trump_info() else {
        return Vec::new();
    };
    let mut hand = engine.hand(seat).to_vec();
    sort_weakest_first(&mut hand, &trump);
    let required = engine.required_count();
    if required == 0 {
        return hand.into_iter().take(1).collect();
    }
    let lead_suit = engine
        .lead_cards()
        .first()
        .and_then(|card| trump.effective_suit(*card));
    let (suit, rest): (Vec<Card>, Vec<Card>) = hand
        .into_iter()
        .partition(|card| trump.effective_suit(*card) == lead_suit);
    suit.into_iter().chain(rest).take(required).collect()
}

/// Returns `play` when the engine accepts it, otherwise the weakest legal play.
pub fn ensure_legal(engine: &GameEngine, seat: Seat, play: Vec<Card>) -> Vec<Card> {
    if engine.is_valid_play(seat, &play) {
        return play;
    }
    debug!(%seat, cards = ?play, "heuristic play rejected, using fallback");
    legal_fallback(engine, seat)
}
