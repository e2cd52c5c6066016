use super::{TrickView, ensure_legal, face_groups, sort_weakest_first};
use gunzi_core::{Card, GameEngine, TrumpInfo};
use std::cmp::Reverse;

const CONTEST_POINTS: u32 = 5;
const TRUMP_IN_POINTS: u32 = 10;

/// Follow-play heuristics shared by the Easy and Medium tiers.
pub fn choose_follow(engine: &GameEngine, view: &TrickView) -> Vec<Card> {
    let hand = engine.hand(view.seat);
    let trump = view.trump;
    let mut suit: Vec<Card> = hand
        .iter()
        .copied()
        .filter(|card| trump.effective_suit(*card) == view.lead_suit)
        .collect();
    sort_weakest_first(&mut suit, &trump);
    let mut others: Vec<Card> = hand
        .iter()
        .copied()
        .filter(|card| trump.effective_suit(*card) != view.lead_suit)
        .collect();
    sort_weakest_first(&mut others, &trump);

    let play = if view.required <= 1 {
        follow_single(&suit, &others, view)
    } else {
        follow_multi(&suit, &others, view)
    };
    ensure_legal(engine, view.seat, play)
}

fn worth_contesting(view: &TrickView) -> bool {
    view.points >= CONTEST_POINTS || view.is_last_to_play()
}

fn follow_single(suit: &[Card], others: &[Card], view: &TrickView) -> Vec<Card> {
    let trump = &view.trump;
    if let Some(lowest) = suit.first() {
        if !view.partner_winning() && worth_contesting(view) {
            if let Some(card) = suit.iter().find(|card| view.would_win(&[**card])) {
                return vec![*card];
            }
        }
        return vec![*lowest];
    }

    if view.partner_winning() {
        return dump_points(others, trump).into_iter().collect();
    }
    if view.points >= TRUMP_IN_POINTS || view.is_last_to_play() {
        let ruff = others
            .iter()
            .filter(|card| trump.is_trump(**card))
            .find(|card| view.would_win(&[**card]));
        if let Some(card) = ruff {
            return vec![*card];
        }
    }
    lowest_non_point(others, trump).into_iter().collect()
}

fn follow_multi(suit: &[Card], others: &[Card], view: &TrickView) -> Vec<Card> {
    let required = view.required;
    let trump = &view.trump;

    if suit.len() >= required {
        if !view.partner_winning() {
            let winning = face_groups(suit)
                .into_iter()
                .filter(|group| group.len() >= required)
                .map(|group| group[..required].to_vec())
                .find(|group| view.would_win(group));
            if let Some(group) = winning {
                return group;
            }
        }
        return suit[..required].to_vec();
    }

    if suit.is_empty()
        && !view.partner_winning()
        && (view.points >= TRUMP_IN_POINTS || view.is_last_to_play())
    {
        let trumps: Vec<Card> = others
            .iter()
            .copied()
            .filter(|card| trump.is_trump(*card))
            .collect();
        let ruff = face_groups(&trumps)
            .into_iter()
            .filter(|group| group.len() >= required)
            .map(|group| group[..required].to_vec())
            .find(|group| view.would_win(group));
        if let Some(group) = ruff {
            return group;
        }
    }

    let mut play = suit.to_vec();
    play.extend(fillers(others, required - suit.len(), view.partner_winning(), trump));
    play
}

/// Off-suit cards to complete a short follow. Side cards go before trump;
/// point cards go first when the partner is winning and last otherwise.
fn fillers(others: &[Card], count: usize, partner_winning: bool, trump: &TrumpInfo) -> Vec<Card> {
    let mut pool = others.to_vec();
    if partner_winning {
        pool.sort_by_key(|card| {
            (
                trump.is_trump(*card),
                Reverse(card.points()),
                trump.card_strength(*card),
            )
        });
    } else {
        pool.sort_by_key(|card| {
            (
                trump.is_trump(*card),
                card.points() > 0,
                trump.card_strength(*card),
            )
        });
    }
    pool.truncate(count);
    pool
}

fn dump_points(cards: &[Card], trump: &TrumpInfo) -> Option<Card> {
    cards
        .iter()
        .copied()
        .filter(|card| !trump.is_trump(*card) && card.points() > 0)
        .max_by_key(|card| (card.points(), Reverse(trump.card_strength(*card))))
        .or_else(|| lowest_non_point(cards, trump))
}

/// `cards` must be sorted weakest first.
fn lowest_non_point(cards: &[Card], trump: &TrumpInfo) -> Option<Card> {
    cards
        .iter()
        .copied()
        .find(|card| !trump.is_trump(*card) && card.points() == 0)
        .or_else(|| cards.iter().copied().find(|card| card.points() == 0))
        .or_else(|| cards.first().copied())
}

#[cfg(test)]
mod tests {
    use super::choose_follow;
    use crate::bot::TrickView;
    use gunzi_core::{Card, GameEngine, Rank, Seat, Suit, TableConfig, TrumpInfo};

    fn trump() -> TrumpInfo {
        TrumpInfo::new(Suit::Spade, Rank::Three)
    }

    fn engine(hands: [Vec<Card>; 4], leader: Seat) -> GameEngine {
        GameEngine::from_hands(TableConfig::three_deck(), hands, vec![], trump(), Seat::North, leader)
    }

    #[test]
    fn plays_low_under_winning_partner() {
        let lead = Card::new(Suit::Heart, Rank::Ace, 1);
        let mut engine = engine(
            [
                vec![lead],
                vec![Card::new(Suit::Heart, Rank::Four, 2)],
                vec![Card::new(Suit::Heart, Rank::King, 3), Card::new(Suit::Heart, Rank::Six, 4)],
                vec![Card::new(Suit::Club, Rank::Four, 5)],
            ],
            Seat::North,
        );
        engine.play_cards(Seat::North, &[lead]).unwrap();
        engine
            .play_cards(Seat::East, &[Card::new(Suit::Heart, Rank::Four, 2)])
            .unwrap();
        let view = TrickView::new(&engine, Seat::South).unwrap();
        assert!(view.partner_winning());
        assert_eq!(
            choose_follow(&engine, &view),
            vec![Card::new(Suit::Heart, Rank::Six, 4)]
        );
    }

    #[test]
    fn ruffs_a_valuable_trick_with_the_smallest_winning_trump() {
        let mut engine = engine(
            [
                vec![Card::new(Suit::Heart, Rank::King, 1)],
                vec![
                    Card::new(Suit::Spade, Rank::Nine, 2),
                    Card::new(Suit::Spade, Rank::Four, 3),
                    Card::new(Suit::Club, Rank::Seven, 4),
                ],
                vec![Card::new(Suit::Heart, Rank::Six, 5)],
                vec![Card::new(Suit::Heart, Rank::Seven, 6)],
            ],
            Seat::North,
        );
        engine
            .play_cards(Seat::North, &[Card::new(Suit::Heart, Rank::King, 1)])
            .unwrap();
        let view = TrickView::new(&engine, Seat::East).unwrap();
        assert_eq!(
            choose_follow(&engine, &view),
            vec![Card::new(Suit::Spade, Rank::Four, 3)]
        );
    }

    #[test]
    fn short_multi_follow_keeps_forced_suit_card() {
        let q1 = Card::new(Suit::Heart, Rank::Queen, 1);
        let q2 = Card::new(Suit::Heart, Rank::Queen, 55);
        let mut engine = engine(
            [
                vec![q1, q2],
                vec![
                    Card::new(Suit::Heart, Rank::Four, 2),
                    Card::new(Suit::Club, Rank::King, 3),
                    Card::new(Suit::Club, Rank::Six, 4),
                ],
                vec![Card::new(Suit::Heart, Rank::Six, 5), Card::new(Suit::Heart, Rank::Seven, 6)],
                vec![Card::new(Suit::Heart, Rank::Eight, 7), Card::new(Suit::Heart, Rank::Nine, 8)],
            ],
            Seat::North,
        );
        engine.play_cards(Seat::North, &[q1, q2]).unwrap();
        let view = TrickView::new(&engine, Seat::East).unwrap();
        let play = choose_follow(&engine, &view);
        assert!(engine.is_valid_play(Seat::East, &play));
        assert!(play.contains(&Card::new(Suit::Heart, Rank::Four, 2)));
        // Opponent is winning, so the point card is held back.
        assert!(play.contains(&Card::new(Suit::Club, Rank::Six, 4)));
    }

    #[test]
    fn contests_with_a_winning_bang() {
        let lead = [Card::new(Suit::Heart, Rank::Nine, 1), Card::new(Suit::Heart, Rank::Nine, 55)];
        let jacks = [Card::new(Suit::Heart, Rank::Jack, 2), Card::new(Suit::Heart, Rank::Jack, 56)];
        let mut engine = engine(
            [
                lead.to_vec(),
                vec![jacks[0], jacks[1], Card::new(Suit::Heart, Rank::Four, 3)],
                vec![Card::new(Suit::Club, Rank::Six, 5), Card::new(Suit::Club, Rank::Seven, 6)],
                vec![Card::new(Suit::Club, Rank::Eight, 7), Card::new(Suit::Club, Rank::Nine, 8)],
            ],
            Seat::North,
        );
        engine.play_cards(Seat::North, &lead).unwrap();
        let view = TrickView::new(&engine, Seat::East).unwrap();
        let play = choose_follow(&engine, &view);
        assert_eq!(play.len(), 2);
        assert!(play.iter().all(|c| c.rank == Rank::Jack));
    }
}
