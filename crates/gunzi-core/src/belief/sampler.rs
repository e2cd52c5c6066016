//! Determinization: one concrete deal of the cards a seat cannot see.

use super::CardTracker;
use crate::game::engine::GameEngine;
use crate::model::card::Card;
use crate::model::player::Seat;
use rand::Rng;
use rand::seq::SliceRandom;
use std::cmp::Reverse;

/// Clones `engine` and redeals every card hidden from `perspective`.
///
/// Each other seat keeps its hand size. Seats receive cards outside their
/// known voids first; if the pool cannot satisfy that, the rest is filled
/// from whatever is left. When `perspective` is not the dealer the buried
/// kitty is hidden too and receives the leftovers.
pub fn determinize<R: Rng + ?Sized>(
    engine: &GameEngine,
    perspective: Seat,
    tracker: &CardTracker,
    rng: &mut R,
) -> GameEngine {
    let mut world = engine.clone();
    let trump = engine.trump_info();
    let kitty_hidden = perspective != engine.dealer();

    let mut others: Vec<Seat> = Seat::LOOP
        .into_iter()
        .filter(|seat| *seat != perspective)
        .collect();
    let mut pool: Vec<Card> = Vec::new();
    let mut sizes = [0usize; 4];
    for seat in &others {
        let hand = world.hand_mut(*seat);
        sizes[seat.index()] = hand.len();
        pool.append(hand);
    }
    let kitty_size = if kitty_hidden {
        pool.extend_from_slice(engine.kitty());
        engine.kitty().len()
    } else {
        0
    };
    pool.shuffle(rng);

    // Most constrained seats pick first.
    others.sort_by_key(|seat| Reverse(tracker.void_count(*seat)));
    for seat in others {
        let allowed = |card: &Card| match trump {
            Some(trump) => !tracker.is_void_in(seat, trump.effective_suit(*card)),
            None => card.suit.is_none_or(|suit| !tracker.is_void(seat, suit)),
        };
        let (mut preferred, mut rest): (Vec<Card>, Vec<Card>) =
            pool.into_iter().partition(|card| allowed(card));
        let need = sizes[seat.index()];
        let mut dealt: Vec<Card> = preferred.drain(..need.min(preferred.len())).collect();
        let shortfall = need - dealt.len();
        dealt.extend(rest.drain(..shortfall.min(rest.len())));
        preferred.append(&mut rest);
        pool = preferred;
        if let Some(trump) = trump {
            dealt.sort_by_key(|card| (Reverse(trump.card_strength(*card)), card.face_key(), card.id));
        }
        *world.hand_mut(seat) = dealt;
    }

    if kitty_hidden {
        pool.truncate(kitty_size);
        world.replace_kitty(pool);
    }
    world
}

#[cfg(test)]
mod tests {
    use super::determinize;
    use crate::belief::CardTracker;
    use crate::game::engine::GameEngine;
    use crate::model::card::Card;
    use crate::model::player::Seat;
    use crate::model::rank::Rank;
    use crate::model::suit::Suit;
    use crate::model::table::TableConfig;
    use crate::model::trump::TrumpInfo;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn playing_engine() -> GameEngine {
        let mut engine = GameEngine::with_seed(TableConfig::three_deck(), 21).unwrap();
        engine.start_new_round().unwrap();
        engine.declare_trump(Seat::North, Suit::Spade).unwrap();
        let hand = engine.hand(Seat::North).to_vec();
        engine.set_kitty(&hand[hand.len() - 6..]).unwrap();
        engine
    }

    fn all_ids(engine: &GameEngine) -> HashSet<u32> {
        let mut ids: HashSet<u32> = engine
            .players()
            .iter()
            .flat_map(|p| p.hand().iter().map(|c| c.id))
            .collect();
        ids.extend(engine.kitty().iter().map(|c| c.id));
        ids
    }

    #[test]
    fn perspective_hand_and_sizes_are_preserved() {
        let engine = playing_engine();
        let tracker = CardTracker::new(*engine.config());
        let mut rng = StdRng::seed_from_u64(1);
        let world = determinize(&engine, Seat::East, &tracker, &mut rng);

        assert_eq!(world.hand(Seat::East), engine.hand(Seat::East));
        for seat in Seat::LOOP {
            assert_eq!(world.hand(seat).len(), engine.hand(seat).len());
        }
        assert_eq!(world.kitty().len(), 6);
        assert_eq!(all_ids(&world), all_ids(&engine));
        assert_eq!(world.total_cards_in_play(), 162);
    }

    #[test]
    fn dealer_perspective_keeps_the_kitty() {
        let engine = playing_engine();
        let tracker = CardTracker::new(*engine.config());
        let mut rng = StdRng::seed_from_u64(2);
        let world = determinize(&engine, Seat::North, &tracker, &mut rng);
        assert_eq!(world.kitty(), engine.kitty());
    }

    #[test]
    fn known_voids_are_respected() {
        let trump = TrumpInfo::new(Suit::Spade, Rank::Three);
        let hearts: Vec<Card> = (0..3).map(|i| Card::new(Suit::Heart, Rank::Nine, i)).collect();
        let clubs: Vec<Card> = (3..6).map(|i| Card::new(Suit::Club, Rank::Nine, i)).collect();
        let hands = [
            vec![Card::new(Suit::Diamond, Rank::Ace, 10)],
            hearts.clone(),
            clubs.clone(),
            vec![Card::new(Suit::Diamond, Rank::Four, 11)],
        ];
        let engine = GameEngine::from_hands(
            TableConfig::three_deck(),
            hands,
            vec![],
            trump,
            Seat::North,
            Seat::North,
        );
        let mut tracker = CardTracker::new(*engine.config());
        tracker.mark_void(Seat::East, Suit::Club);
        tracker.mark_void(Seat::South, Suit::Heart);
        tracker.mark_void(Seat::West, Suit::Heart);
        tracker.mark_void(Seat::West, Suit::Club);

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let world = determinize(&engine, Seat::North, &tracker, &mut rng);
            assert!(world.hand(Seat::East).iter().all(|c| c.suit == Some(Suit::Heart)));
            assert!(world.hand(Seat::South).iter().all(|c| c.suit == Some(Suit::Club)));
            assert_eq!(world.hand(Seat::West)[0].suit, Some(Suit::Diamond));
        }
    }
}
