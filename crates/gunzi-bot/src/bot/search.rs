//! Determinized rollout search for the Hard tier.

use crate::policy::{EasyStrategy, Strategy};
use gunzi_core::{Card, CardTracker, EngineError, GameEngine, Seat, determinize};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    pub determinizations: usize,
    pub time_budget: Duration,
    /// Most candidate plays kept per decision.
    pub candidate_cap: usize,
    pub seed: u64,
    /// Safety bound on plays plus trick evaluations in one rollout. Raised to
    /// whatever a full round of the searched table can take.
    pub max_rollout_steps: usize,
    pub workers: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            determinizations: 30,
            time_budget: Duration::from_millis(1500),
            candidate_cap: 20,
            seed: 0x5EED_6A2D,
            max_rollout_steps: 200,
            workers: num_cpus::get(),
        }
    }
}

/// Counters from the most recent decision.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchStats {
    pub candidates: usize,
    pub samples: usize,
    pub rollouts: usize,
    pub rollout_errors: usize,
    pub elapsed: Duration,
    pub timed_out: bool,
    pub best_average: Option<f64>,
}

struct Budget {
    started: Instant,
    deadline: Instant,
}

impl Budget {
    fn new(limit: Duration) -> Self {
        let started = Instant::now();
        Self {
            started,
            deadline: started + limit,
        }
    }

    fn timed_out(&self) -> bool {
        Instant::now() >= self.deadline
    }
}

pub struct RolloutSearch {
    config: SearchConfig,
    pool: Option<rayon::ThreadPool>,
    decisions: u64,
    last_stats: SearchStats,
}

impl RolloutSearch {
    pub fn new(config: SearchConfig) -> Self {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers.max(1))
            .build()
            .ok();
        Self {
            config,
            pool,
            decisions: 0,
            last_stats: SearchStats::default(),
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn last_stats(&self) -> &SearchStats {
        &self.last_stats
    }

    /// Index of the candidate with the best average rollout score, or `None`
    /// when no determinization finished inside the budget.
    pub fn run(
        &mut self,
        engine: &GameEngine,
        seat: Seat,
        tracker: &CardTracker,
        candidates: &[Vec<Card>],
    ) -> Option<usize> {
        self.decisions += 1;
        let budget = Budget::new(self.config.time_budget);
        let base_seed = self
            .config
            .seed
            .wrapping_add(self.decisions.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        let max_steps = self
            .config
            .max_rollout_steps
            .max(full_round_steps(engine.config().hand_size));
        let errors = AtomicUsize::new(0);

        let sample = |index: usize| -> Option<Vec<i64>> {
            if budget.timed_out() {
                return None;
            }
            let mut rng = StdRng::seed_from_u64(base_seed.wrapping_add(index as u64));
            let world = determinize(engine, seat, tracker, &mut rng);
            let scores = candidates
                .iter()
                .map(|play| {
                    rollout(&world, seat, play, rng.r#gen(), max_steps).unwrap_or_else(|err| {
                        debug!(%seat, error = %err, "rollout abandoned");
                        errors.fetch_add(1, Ordering::Relaxed);
                        0
                    })
                })
                .collect();
            Some(scores)
        };
        let samples = 0..self.config.determinizations;
        let results: Vec<Option<Vec<i64>>> = match &self.pool {
            Some(pool) => pool.install(|| samples.into_par_iter().map(&sample).collect()),
            None => samples.map(&sample).collect(),
        };

        let mut totals = vec![0i64; candidates.len()];
        let mut completed = 0usize;
        for scores in results.into_iter().flatten() {
            completed += 1;
            for (total, score) in totals.iter_mut().zip(scores) {
                *total += score;
            }
        }

        let best = (completed > 0).then(|| {
            let mut best = 0;
            for (index, total) in totals.iter().enumerate() {
                if *total > totals[best] {
                    best = index;
                }
            }
            best
        });
        self.last_stats = SearchStats {
            candidates: candidates.len(),
            samples: completed,
            rollouts: completed * candidates.len(),
            rollout_errors: errors.load(Ordering::Relaxed),
            elapsed: budget.started.elapsed(),
            timed_out: completed < self.config.determinizations,
            best_average: best.map(|index| totals[index] as f64 / completed as f64),
        };
        debug!(
            %seat,
            candidates = self.last_stats.candidates,
            samples = completed,
            errors = self.last_stats.rollout_errors,
            elapsed_ms = self.last_stats.elapsed.as_millis() as u64,
            best_average = ?self.last_stats.best_average,
            "rollout search finished"
        );
        best
    }
}

/// Plays `action` for `seat` in a copy of `world`, finishes the round with the
/// Easy policy at every seat and scores the result for `seat`'s team.
fn rollout(
    world: &GameEngine,
    seat: Seat,
    action: &[Card],
    seed: u64,
    max_steps: usize,
) -> Result<i64, EngineError> {
    let mut sim = world.clone();
    sim.play_cards(seat, action)?;
    let mut policy = EasyStrategy::with_seed(seed);
    let mut steps = 0;
    while !sim.is_round_over() && steps < max_steps {
        steps += 1;
        if sim.is_trick_complete() {
            sim.evaluate_trick()?;
            continue;
        }
        let current = sim.current_player();
        let play = policy.choose_cards(current, &sim);
        sim.play_cards(current, &play)?;
    }
    if sim.is_trick_complete() && !sim.is_round_over() {
        sim.evaluate_trick()?;
    }
    if !sim.is_round_over() {
        debug!(%seat, steps, "rollout truncated before the round ended");
    }
    Ok(score_for(&sim, seat))
}

/// Plays plus trick evaluations of a round dealt `hand_size` cards per seat,
/// with single-card tricks as the longest case.
fn full_round_steps(hand_size: usize) -> usize {
    hand_size * (Seat::LOOP.len() + 1) + 8
}

fn score_for(sim: &GameEngine, seat: Seat) -> i64 {
    let points = i64::from(sim.defender_points());
    if seat.team() == sim.declarer_team() {
        -points
    } else {
        points
    }
}

#[cfg(test)]
mod tests {
    use super::{RolloutSearch, SearchConfig, full_round_steps, score_for};
    use crate::bot::generate_candidates;
    use gunzi_core::{Card, CardTracker, GameEngine, Rank, Seat, Suit, TableConfig, TrumpInfo};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::time::Duration;

    fn small_config() -> SearchConfig {
        SearchConfig {
            determinizations: 4,
            time_budget: Duration::from_secs(30),
            candidate_cap: 8,
            seed: 11,
            max_rollout_steps: 200,
            workers: 2,
        }
    }

    fn endgame() -> GameEngine {
        let trump = TrumpInfo::new(Suit::Spade, Rank::Three);
        let hands = [
            vec![Card::new(Suit::Heart, Rank::Ace, 1), Card::new(Suit::Heart, Rank::Four, 2)],
            vec![Card::new(Suit::Heart, Rank::King, 3), Card::new(Suit::Club, Rank::Six, 4)],
            vec![Card::new(Suit::Heart, Rank::Nine, 5), Card::new(Suit::Club, Rank::Eight, 6)],
            vec![Card::new(Suit::Heart, Rank::Ten, 7), Card::new(Suit::Diamond, Rank::Six, 8)],
        ];
        GameEngine::from_hands(TableConfig::three_deck(), hands, vec![], trump, Seat::East, Seat::North)
    }

    #[test]
    fn picks_a_supplied_candidate_and_reports_stats() {
        let engine = endgame();
        let tracker = CardTracker::new(*engine.config());
        let mut rng = StdRng::seed_from_u64(3);
        let candidates = generate_candidates(&engine, Seat::North, 8, &mut rng);
        assert_eq!(candidates.len(), 2);

        let mut search = RolloutSearch::new(small_config());
        let best = search.run(&engine, Seat::North, &tracker, &candidates).unwrap();
        assert!(best < candidates.len());
        let stats = search.last_stats();
        assert_eq!(stats.samples, 4);
        assert_eq!(stats.rollouts, 8);
        assert!(!stats.timed_out);
        assert!(stats.best_average.is_some());
    }

    #[test]
    fn zero_budget_completes_no_samples() {
        let engine = endgame();
        let tracker = CardTracker::new(*engine.config());
        let candidates = vec![
            vec![Card::new(Suit::Heart, Rank::Ace, 1)],
            vec![Card::new(Suit::Heart, Rank::Four, 2)],
        ];
        let mut search = RolloutSearch::new(SearchConfig {
            time_budget: Duration::ZERO,
            ..small_config()
        });
        assert_eq!(search.run(&engine, Seat::North, &tracker, &candidates), None);
        assert_eq!(search.last_stats().samples, 0);
        assert!(search.last_stats().timed_out);
    }

    #[test]
    fn identical_seeds_give_identical_choices() {
        let engine = endgame();
        let tracker = CardTracker::new(*engine.config());
        let candidates = vec![
            vec![Card::new(Suit::Heart, Rank::Ace, 1)],
            vec![Card::new(Suit::Heart, Rank::Four, 2)],
        ];
        let mut a = RolloutSearch::new(small_config());
        let mut b = RolloutSearch::new(SearchConfig {
            workers: 1,
            ..small_config()
        });
        assert_eq!(
            a.run(&engine, Seat::North, &tracker, &candidates),
            b.run(&engine, Seat::North, &tracker, &candidates)
        );
        assert_eq!(a.last_stats().best_average, b.last_stats().best_average);
    }

    #[test]
    fn failing_rollouts_score_zero_and_still_count() {
        let engine = endgame();
        let tracker = CardTracker::new(*engine.config());
        let candidates = vec![
            vec![Card::new(Suit::Heart, Rank::Ace, 1)],
            // Not in North's hand, so every rollout of it is rejected.
            vec![Card::new(Suit::Diamond, Rank::Ace, 99)],
        ];
        let mut search = RolloutSearch::new(small_config());
        let best = search
            .run(&engine, Seat::North, &tracker, &candidates)
            .expect("samples complete despite failing rollouts");
        assert!(best < candidates.len());
        let stats = search.last_stats();
        assert_eq!(stats.samples, 4);
        assert_eq!(stats.rollouts, 8);
        assert_eq!(stats.rollout_errors, 4);
        assert!(!stats.timed_out);
    }

    #[test]
    fn step_bound_covers_a_full_round() {
        for table in [TableConfig::three_deck(), TableConfig::two_deck()] {
            // Single-card tricks: four plays and one evaluation per card held.
            assert!(full_round_steps(table.hand_size) > table.hand_size * 5);
        }
    }

    #[test]
    fn score_sign_follows_team() {
        let engine = endgame();
        assert_eq!(score_for(&engine, Seat::North), 0);
        assert_eq!(score_for(&engine, Seat::East), 0);
    }
}
