use crate::model::card::Card;
use crate::model::player::Team;
use crate::model::rank::Rank;
use serde::Serialize;

/// Defender points needed to take the round from the declarers.
pub const DEFENDER_WIN_THRESHOLD: u32 = 120;
const LOPSIDED_LOW: u32 = 80;
const LOPSIDED_HIGH: u32 = 150;

/// Scoring outcome of a finished round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoundResult {
    pub defender_points: u32,
    pub declarer_team: Team,
    pub defender_team: Team,
    pub declarer_wins: bool,
    pub level_change: u32,
    pub winning_team: Team,
    pub tribute_count: u32,
    pub kitty_bloods: u32,
    pub last_trick_captured_by_defender: bool,
}

impl RoundResult {
    pub fn compute(
        defender_points: u32,
        declarer_team: Team,
        kitty: &[Card],
        last_trick_captured_by_defender: bool,
    ) -> Self {
        let defender_team = declarer_team.other();
        let declarer_wins = defender_points < DEFENDER_WIN_THRESHOLD;
        let bloods = kitty_bloods(kitty);

        let level_change = if declarer_wins {
            1 + bloods
        } else if last_trick_captured_by_defender {
            2
        } else {
            1
        };

        Self {
            defender_points,
            declarer_team,
            defender_team,
            declarer_wins,
            level_change,
            winning_team: if declarer_wins {
                declarer_team
            } else {
                defender_team
            },
            tribute_count: lopsided_tribute(defender_points) + bloods,
            kitty_bloods: bloods,
            last_trick_captured_by_defender,
        }
    }
}

/// Two per buried Big Joker, one per buried Small Joker.
pub fn kitty_bloods(kitty: &[Card]) -> u32 {
    kitty
        .iter()
        .map(|card| match card.rank {
            Rank::BigJoker => 2,
            Rank::SmallJoker => 1,
            _ => 0,
        })
        .sum()
}

pub fn kitty_points(kitty: &[Card]) -> u32 {
    kitty.iter().map(|card| card.points()).sum()
}

fn lopsided_tribute(points: u32) -> u32 {
    if points < LOPSIDED_LOW {
        (LOPSIDED_LOW - points) / 10
    } else if points > LOPSIDED_HIGH {
        (points - LOPSIDED_HIGH) / 10
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::{RoundResult, kitty_bloods, kitty_points};
    use crate::model::card::Card;
    use crate::model::player::Team;
    use crate::model::rank::Rank;
    use crate::model::suit::Suit;

    fn plain_kitty() -> Vec<Card> {
        (0..6)
            .map(|i| Card::new(Suit::Club, Rank::Three, i))
            .collect()
    }

    #[test]
    fn shutout_with_two_big_jokers_owes_twelve() {
        let mut kitty = plain_kitty();
        kitty[0] = Card::joker(Rank::BigJoker, 160);
        kitty[1] = Card::joker(Rank::BigJoker, 161);
        let result = RoundResult::compute(0, Team::NorthSouth, &kitty, false);
        assert!(result.declarer_wins);
        assert_eq!(result.kitty_bloods, 4);
        assert_eq!(result.tribute_count, 12);
        assert_eq!(result.level_change, 5);
        assert_eq!(result.winning_team, Team::NorthSouth);
    }

    #[test]
    fn threshold_is_exclusive_for_declarers() {
        let kitty = plain_kitty();
        let below = RoundResult::compute(115, Team::EastWest, &kitty, false);
        assert!(below.declarer_wins);
        assert_eq!(below.level_change, 1);
        assert_eq!(below.tribute_count, 0);

        let at = RoundResult::compute(120, Team::EastWest, &kitty, false);
        assert!(!at.declarer_wins);
        assert_eq!(at.winning_team, Team::NorthSouth);
        assert_eq!(at.defender_team, Team::NorthSouth);
        assert_eq!(at.level_change, 1);
    }

    #[test]
    fn defenders_gain_extra_level_for_last_trick() {
        let mut kitty = plain_kitty();
        kitty[0] = Card::joker(Rank::BigJoker, 160);
        let result = RoundResult::compute(170, Team::NorthSouth, &kitty, true);
        assert!(!result.declarer_wins);
        assert_eq!(result.level_change, 2);
        assert_eq!(result.tribute_count, 2 + 2);
    }

    #[test]
    fn level_change_is_at_least_one() {
        let kitty = plain_kitty();
        for points in (0..=300).step_by(5) {
            for captured in [false, true] {
                let result = RoundResult::compute(points, Team::NorthSouth, &kitty, captured);
                assert!(result.level_change >= 1);
            }
        }
    }

    #[test]
    fn kitty_helpers_count_points_and_jokers() {
        let kitty = vec![
            Card::new(Suit::Heart, Rank::King, 0),
            Card::new(Suit::Heart, Rank::Five, 1),
            Card::joker(Rank::SmallJoker, 2),
        ];
        assert_eq!(kitty_points(&kitty), 15);
        assert_eq!(kitty_bloods(&kitty), 1);
    }
}
