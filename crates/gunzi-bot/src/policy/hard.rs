use super::{Difficulty, MediumStrategy, Strategy};
use crate::SharedTracker;
use crate::bot::{RolloutSearch, SearchConfig, SearchStats, ensure_legal, generate_candidates, signature};
use gunzi_core::{Card, GameEngine, Rank, Seat, Suit, TrumpInfo};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, warn};

/// Medium bidding and burial; card play by rollout search over sampled deals.
pub struct HardStrategy {
    tracker: SharedTracker,
    fallback: MediumStrategy,
    search: RolloutSearch,
    rng: StdRng,
}

impl HardStrategy {
    pub fn new(tracker: SharedTracker, config: SearchConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            fallback: MediumStrategy::new(tracker.clone()),
            tracker,
            search: RolloutSearch::new(config),
            rng,
        }
    }

    pub fn search_config(&self) -> &SearchConfig {
        self.search.config()
    }

    /// Statistics of the last searched decision.
    pub fn last_stats(&self) -> &SearchStats {
        self.search.last_stats()
    }
}

impl Strategy for HardStrategy {
    fn choose_trump_suit(&mut self, hand: &[Card], target_rank: Rank) -> Option<Suit> {
        self.fallback.choose_trump_suit(hand, target_rank)
    }

    fn choose_kitty_cards(&mut self, hand: &[Card], kitty: &[Card], trump: &TrumpInfo) -> Vec<Card> {
        self.fallback.choose_kitty_cards(hand, kitty, trump)
    }

    fn choose_cards(&mut self, seat: Seat, engine: &GameEngine) -> Vec<Card> {
        let cap = self.search.config().candidate_cap;
        let mut candidates = generate_candidates(engine, seat, cap, &mut self.rng);
        if candidates.is_empty() {
            return self.fallback.choose_cards(seat, engine);
        }
        // The medium play always competes, replacing the last sampled one at the cap.
        let heuristic = self.fallback.choose_cards(seat, engine);
        let key = signature(&heuristic);
        if engine.is_valid_play(seat, &heuristic) && candidates.iter().all(|play| signature(play) != key) {
            if candidates.len() >= cap.max(2) {
                candidates.pop();
            }
            candidates.push(heuristic);
        }
        if candidates.len() == 1 {
            return candidates.remove(0);
        }

        let choice = {
            let tracker = self.tracker.read();
            self.search.run(engine, seat, &tracker, &candidates)
        };
        match choice {
            Some(index) => {
                debug!(%seat, choice = ?candidates[index], "search picked play");
                ensure_legal(engine, seat, candidates.swap_remove(index))
            }
            None => {
                warn!(%seat, "search finished no samples, falling back to medium play");
                self.fallback.choose_cards(seat, engine)
            }
        }
    }

    fn difficulty(&self) -> Difficulty {
        Difficulty::Hard
    }
}
