use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use gunzi_bot::{Difficulty, SharedTracker, Strategy};
use gunzi_core::{
    Card, CardTracker, EngineError, GameEngine, LevelAdvance, Rank, Seat, Team, TributeExchange,
    TrumpInfo,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{Level, debug, event};

use crate::config::{BenchConfig, ResolvedOutputs, ValidationError};

/// Redeals tolerated after the first round before the kitty decides trump.
const MAX_REDEALS: u32 = 8;

/// Drives whole rounds at one table, streaming one JSONL row per round.
pub struct MatchRunner {
    config: BenchConfig,
    outputs: ResolvedOutputs,
    difficulties: Vec<Difficulty>,
}

/// Totals returned after a run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub rounds_played: usize,
    pub rows_written: usize,
    pub declarer_wins: usize,
    /// Matches won per team, indexed by [`Team::index`].
    pub matches_won: [u32; 2],
    pub final_levels: [Rank; 2],
    pub jsonl_path: PathBuf,
}

/// How trump was settled for a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Declaration {
    LevelPair,
    BigJoker,
    Kitty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatRow {
    pub seat: Seat,
    pub name: String,
    pub difficulty: String,
    pub decisions: u32,
    pub avg_ms_per_decision: f64,
}

/// One finished round as written to the JSONL output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRow {
    pub run_id: String,
    pub round_index: usize,
    pub engine_round: u32,
    pub dealer: Seat,
    pub declaration: Declaration,
    pub redeals: u32,
    pub trump: TrumpInfo,
    pub tribute_exchanges: usize,
    pub tricks: usize,
    pub kitty_points: u32,
    pub kitty_bloods: u32,
    pub defender_points: u32,
    pub declarer_team: Team,
    pub winning_team: Team,
    pub declarer_wins: bool,
    pub level_change: u32,
    pub match_won: bool,
    pub team_levels: [Rank; 2],
    pub seats: Vec<SeatRow>,
}

impl MatchRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: BenchConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        let difficulties = config.difficulties()?;
        if difficulties.len() != Seat::LOOP.len() {
            return Err(RunnerError::SeatCount {
                found: difficulties.len(),
            });
        }
        Ok(Self {
            config,
            outputs,
            difficulties,
        })
    }

    /// Play every configured round, streaming rows to disk.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);

        let table = self.config.table.config();
        let mut engine = GameEngine::with_seed(table, self.config.matches.seed)?;
        for (seat, seat_config) in Seat::LOOP.into_iter().zip(&self.config.seats) {
            engine.player_mut(seat).name(seat_config.name.clone());
        }
        let tracker: SharedTracker = Arc::new(RwLock::new(CardTracker::new(table)));
        let mut seats: Vec<SeatState> = Seat::LOOP
            .into_iter()
            .zip(&self.difficulties)
            .map(|(seat, difficulty)| SeatState {
                seat,
                difficulty: *difficulty,
                strategy: difficulty.build(tracker.clone(), self.config.search_config(seat.index())),
                metrics: DecisionMetrics::default(),
            })
            .collect();

        let mut rows_written = 0usize;
        let mut declarer_wins = 0usize;
        let mut matches_won = [0u32; 2];
        for round_index in 0..self.config.matches.rounds {
            let row = self.play_round(round_index, &mut engine, &tracker, &mut seats)?;
            if row.declarer_wins {
                declarer_wins += 1;
            }
            if row.match_won {
                matches_won[row.winning_team.index()] += 1;
            }
            serde_json::to_writer(&mut writer, &row)?;
            writer.write_all(b"\n")?;
            rows_written += 1;
        }
        writer.flush()?;

        Ok(RunSummary {
            rounds_played: self.config.matches.rounds,
            rows_written,
            declarer_wins,
            matches_won,
            final_levels: engine.team_levels(),
            jsonl_path: self.outputs.jsonl.clone(),
        })
    }

    fn play_round(
        &self,
        round_index: usize,
        engine: &mut GameEngine,
        tracker: &SharedTracker,
        seats: &mut [SeatState],
    ) -> Result<RoundRow, RunnerError> {
        engine.start_new_round()?;
        tracker.write().reset();
        let Settlement {
            declaration,
            redeals,
            kitty,
            tribute,
        } = settle_trump(engine, seats)?;
        let trump = engine
            .trump_info()
            .ok_or_else(|| RunnerError::game("no trump after declaration"))?;
        let dealer = engine.dealer();
        let bury = seats[dealer.index()]
            .strategy
            .choose_kitty_cards(engine.hand(dealer), &kitty, &trump);
        engine.set_kitty(&bury)?;

        for seat in seats.iter_mut() {
            seat.metrics = DecisionMetrics::default();
        }
        while !engine.is_round_over() {
            if engine.is_trick_complete() {
                engine.evaluate_trick()?;
                continue;
            }
            let seat = engine.current_player();
            let state = &mut seats[seat.index()];
            let start = Instant::now();
            let play = state.strategy.choose_cards(seat, engine);
            state.metrics.record(start.elapsed());

            let lead = engine.lead_cards().to_vec();
            engine
                .play_cards(seat, &play)
                .map_err(|source| RunnerError::Play {
                    seat,
                    cards: describe(&play),
                    source,
                })?;
            tracker.write().observe_play(seat, &play, &lead, &trump);
        }

        let result = engine.calculate_round_result()?;
        let advance = engine.advance_team_level(result.winning_team, result.level_change);
        let match_won = advance == LevelAdvance::MatchWon;

        if tracing::enabled!(Level::INFO) {
            event!(
                target: "gunzi_bench::round",
                Level::INFO,
                run_id = %self.config.run_id,
                round_index = round_index as u32,
                dealer = %dealer,
                trump = %trump,
                defender_points = result.defender_points,
                winner = %result.winning_team,
                level_change = result.level_change,
                match_won
            );
        }

        Ok(RoundRow {
            run_id: self.config.run_id.clone(),
            round_index,
            engine_round: engine.round_number(),
            dealer,
            declaration,
            redeals,
            trump,
            tribute_exchanges: tribute.len(),
            tricks: engine.tricks_played(),
            kitty_points: engine.kitty_points(),
            kitty_bloods: engine.kitty_bloods(),
            defender_points: result.defender_points,
            declarer_team: result.declarer_team,
            winning_team: result.winning_team,
            declarer_wins: result.declarer_wins,
            level_change: result.level_change,
            match_won,
            team_levels: engine.team_levels(),
            seats: seats
                .iter()
                .map(|state| SeatRow {
                    seat: state.seat,
                    name: engine.player(state.seat).name().to_string(),
                    difficulty: state.difficulty.to_string(),
                    decisions: state.metrics.decisions,
                    avg_ms_per_decision: state.metrics.average_ms(),
                })
                .collect(),
        })
    }
}

struct Settlement {
    declaration: Declaration,
    redeals: u32,
    /// The kitty as dealt, before the dealer picks it up.
    kitty: Vec<Card>,
    /// Exchanges made on the deal that was finally declared.
    tribute: Vec<TributeExchange>,
}

/// Pays any owed tribute, then offers every seat the declaration starting
/// after the previous dealer. Without a taker the first round falls back to a
/// Big Joker holder and then the kitty; later rounds redeal and pay tribute
/// again on the new hands.
fn settle_trump(engine: &mut GameEngine, seats: &mut [SeatState]) -> Result<Settlement, RunnerError> {
    let mut redeals = 0;
    loop {
        let tribute = engine.perform_auto_tribute()?;
        for exchange in &tribute {
            debug!(
                giver = %exchange.giver,
                receiver = %exchange.receiver,
                tribute = %exchange.tribute,
                returned = %exchange.returned,
                redeals,
                "tribute"
            );
        }
        let kitty = engine.kitty().to_vec();
        let settled = |declaration| Settlement {
            declaration,
            redeals,
            kitty: kitty.clone(),
            tribute: tribute.clone(),
        };
        let first = engine.dealer().next();
        let offer = (0..Seat::LOOP.len()).map(|step| first.offset(step)).find_map(|seat| {
            let level = engine.team_level(seat.team());
            seats[seat.index()]
                .strategy
                .choose_trump_suit(engine.hand(seat), level)
                .filter(|suit| engine.can_declare(seat, *suit))
                .map(|suit| (seat, suit))
        });
        if let Some((seat, suit)) = offer {
            engine.declare_trump(seat, suit)?;
            return Ok(settled(Declaration::LevelPair));
        }

        if engine.is_first_round() {
            if let Some(seat) = Seat::LOOP.into_iter().find(|seat| engine.has_big_joker(*seat)) {
                engine.declare_trump_random_suit(seat)?;
                return Ok(settled(Declaration::BigJoker));
            }
        }
        if engine.is_first_round() || redeals >= MAX_REDEALS {
            engine.declare_trump_from_kitty()?;
            return Ok(settled(Declaration::Kitty));
        }
        engine.redeal()?;
        redeals += 1;
    }
}

fn ensure_parent(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn describe(cards: &[Card]) -> String {
    cards
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

struct SeatState {
    seat: Seat,
    difficulty: Difficulty,
    strategy: Box<dyn Strategy>,
    metrics: DecisionMetrics,
}

#[derive(Default)]
struct DecisionMetrics {
    total: Duration,
    decisions: u32,
}

impl DecisionMetrics {
    fn record(&mut self, duration: Duration) {
        self.total += duration;
        self.decisions += 1;
    }

    fn average_ms(&self) -> f64 {
        if self.decisions == 0 {
            0.0
        } else {
            self.total.as_secs_f64() * 1000.0 / f64::from(self.decisions)
        }
    }
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("{0}")]
    Config(#[from] ValidationError),
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize round row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("engine rejected the driver: {0}")]
    Engine(#[from] EngineError),
    #[error("{seat} chose an illegal play [{cards}]: {source}")]
    Play {
        seat: Seat,
        cards: String,
        source: EngineError,
    },
    #[error("game execution failed: {message}")]
    Game { message: String },
    #[error("configuration requires exactly 4 seats but found {found}")]
    SeatCount { found: usize },
}

impl RunnerError {
    fn game(message: impl Into<String>) -> Self {
        RunnerError::Game {
            message: message.into(),
        }
    }
}
