use crate::error::{EngineError, PlayViolation};
use crate::game::phase::GamePhase;
use crate::game::result::{self, RoundResult};
use crate::game::snapshot::TableSnapshot;
use crate::model::card::Card;
use crate::model::deck::Deck;
use crate::model::play_type::PlayType;
use crate::model::player::{Player, Seat, Team};
use crate::model::rank::{LevelAdvance, Rank};
use crate::model::suit::Suit;
use crate::model::table::TableConfig;
use crate::model::trump::TrumpInfo;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, trace};

/// What a resolved trick produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrickOutcome {
    pub winner: Seat,
    /// Card points in the trick itself.
    pub points: u32,
    /// Doubled kitty points, only on the final trick.
    pub kitty_bonus: u32,
    pub last_trick: bool,
}

impl TrickOutcome {
    pub fn total(&self) -> u32 {
        self.points + self.kitty_bonus
    }
}

/// One card handed up as tribute and the card handed back for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TributeExchange {
    pub giver: Seat,
    pub receiver: Seat,
    pub tribute: Card,
    pub returned: Card,
}

/// Rules state machine for one table. Owns every card; clone it to simulate.
#[derive(Debug, Clone)]
pub struct GameEngine {
    config: TableConfig,
    players: [Player; 4],
    trump_info: Option<TrumpInfo>,
    phase: GamePhase,
    current_player: Seat,
    dealer: Seat,
    kitty: Vec<Card>,
    trick_cards: [Vec<Card>; 4],
    trick_play_type: Option<PlayType>,
    trick_leader: Seat,
    trick_plays: usize,
    cards_played: usize,
    tricks_played: usize,
    defender_points: u32,
    team_levels: [Rank; 2],
    round_number: u32,
    previous_winning_team: Option<Team>,
    pending_tribute: u32,
    /// Exchanges owed for the current round; survives redeals until trump is declared.
    owed_tribute: u32,
    last_trick_winner: Option<Seat>,
    rng: StdRng,
}

impl GameEngine {
    pub fn new(config: TableConfig) -> Result<Self, EngineError> {
        let seed: u64 = rand::random();
        Self::with_seed(config, seed)
    }

    pub fn with_seed(config: TableConfig, seed: u64) -> Result<Self, EngineError> {
        if !config.is_consistent() {
            return Err(EngineError::ResourceExhaustion {
                requested: config.hand_size * 4 + config.kitty_size,
                remaining: config.deck_size(),
            });
        }
        Ok(Self::blank(config, StdRng::seed_from_u64(seed)))
    }

    /// Places an engine directly into `Playing` with the given deal. Cards
    /// absent from the hands and kitty count as already played.
    pub fn from_hands(
        config: TableConfig,
        hands: [Vec<Card>; 4],
        kitty: Vec<Card>,
        trump: TrumpInfo,
        dealer: Seat,
        leader: Seat,
    ) -> Self {
        let mut engine = Self::blank(config, StdRng::seed_from_u64(0));
        for (player, hand) in engine.players.iter_mut().zip(hands) {
            player.add_cards(hand);
            player.sort_by_strength(&trump);
        }
        let held: usize = engine.players.iter().map(Player::len).sum::<usize>() + kitty.len();
        engine.cards_played = config.deck_size().saturating_sub(held);
        engine.kitty = kitty;
        engine.trump_info = Some(trump);
        engine.dealer = dealer;
        engine.team_levels[dealer.team().index()] = trump.trump_rank;
        engine.trick_leader = leader;
        engine.current_player = leader;
        engine.round_number = 1;
        engine.phase = GamePhase::Playing;
        engine
    }

    fn blank(config: TableConfig, rng: StdRng) -> Self {
        Self {
            config,
            players: Seat::LOOP.map(|seat| Player::new(seat, seat.to_string(), false)),
            trump_info: None,
            phase: GamePhase::RoundEnd,
            current_player: Seat::North,
            dealer: Seat::North,
            kitty: Vec::new(),
            trick_cards: Default::default(),
            trick_play_type: None,
            trick_leader: Seat::North,
            trick_plays: 0,
            cards_played: 0,
            tricks_played: 0,
            defender_points: 0,
            team_levels: [Rank::FIRST_LEVEL; 2],
            round_number: 0,
            previous_winning_team: None,
            pending_tribute: 0,
            owed_tribute: 0,
            last_trick_winner: None,
            rng,
        }
    }

    pub fn set_team_levels(&mut self, levels: [Rank; 2]) {
        self.team_levels = levels;
    }

    pub fn player_mut(&mut self, seat: Seat) -> PlayerSettings<'_> {
        PlayerSettings {
            player: &mut self.players[seat.index()],
        }
    }

    // --- round lifecycle -------------------------------------------------

    pub fn start_new_round(&mut self) -> Result<(), EngineError> {
        self.ensure_phase(GamePhase::RoundEnd, "start a new round")?;
        self.round_number += 1;
        self.phase = GamePhase::Dealing;
        self.deal()?;
        self.phase = GamePhase::DeclaringTrump;
        debug!(
            round = self.round_number,
            levels = ?self.team_levels,
            tribute = self.pending_tribute,
            "round dealt"
        );
        Ok(())
    }

    /// Collects and deals again without starting a new round. Used when
    /// nobody declares. Tribute already exchanged on the discarded deal is
    /// owed again on the new one.
    pub fn redeal(&mut self) -> Result<(), EngineError> {
        self.ensure_phase(GamePhase::DeclaringTrump, "redeal")?;
        self.deal()?;
        self.pending_tribute = self.owed_tribute;
        debug!(
            round = self.round_number,
            tribute = self.pending_tribute,
            "redealt after no declaration"
        );
        Ok(())
    }

    fn deal(&mut self) -> Result<(), EngineError> {
        self.reset_round_state();
        let mut deck = Deck::for_table(&self.config);
        deck.shuffle(&mut self.rng);
        for player in self.players.iter_mut() {
            let hand = deck.deal(self.config.hand_size)?;
            player.add_cards(hand);
        }
        self.kitty = deck.deal(self.config.kitty_size)?;
        Ok(())
    }

    fn reset_round_state(&mut self) {
        for player in self.players.iter_mut() {
            player.clear();
        }
        self.trump_info = None;
        self.kitty.clear();
        self.trick_cards = Default::default();
        self.trick_play_type = None;
        self.trick_plays = 0;
        self.cards_played = 0;
        self.tricks_played = 0;
        self.defender_points = 0;
        self.last_trick_winner = None;
    }

    // --- declaration -----------------------------------------------------

    pub fn is_first_round(&self) -> bool {
        self.round_number <= 1
    }

    pub fn has_big_joker(&self, seat: Seat) -> bool {
        self.players[seat.index()]
            .hand()
            .iter()
            .any(|card| card.is_big_joker())
    }

    /// Suits in which `seat` holds at least two cards of its team's level.
    pub fn eligible_trump_suits(&self, seat: Seat) -> Vec<Suit> {
        let level = self.team_levels[seat.team().index()];
        let hand = self.players[seat.index()].hand();
        Suit::ALL
            .into_iter()
            .filter(|suit| {
                hand.iter()
                    .filter(|card| card.suit == Some(*suit) && card.rank == level)
                    .count()
                    >= 2
            })
            .collect()
    }

    pub fn can_declare(&self, seat: Seat, suit: Suit) -> bool {
        self.eligible_trump_suits(seat).contains(&suit)
    }

    pub fn declare_trump(&mut self, seat: Seat, suit: Suit) -> Result<(), EngineError> {
        self.ensure_phase(GamePhase::DeclaringTrump, "declare trump")?;
        self.install_trump(seat, suit);
        Ok(())
    }

    /// First-round declaration: a Big Joker holder names a random suit.
    pub fn declare_trump_random_suit(&mut self, seat: Seat) -> Result<Suit, EngineError> {
        self.ensure_phase(GamePhase::DeclaringTrump, "declare trump")?;
        if !self.has_big_joker(seat) {
            return Err(PlayViolation::NotEligible { seat }.into());
        }
        let suit = Suit::ALL[self.rng.gen_range(0..Suit::ALL.len())];
        self.install_trump(seat, suit);
        Ok(suit)
    }

    /// Nobody declared: trump is the kitty's scarcest suit and the dealer is
    /// drawn at random.
    pub fn declare_trump_from_kitty(&mut self) -> Result<Seat, EngineError> {
        self.ensure_phase(GamePhase::DeclaringTrump, "declare trump")?;
        let mut counts = [0usize; 4];
        for card in &self.kitty {
            if let Some(suit) = card.suit {
                counts[suit.index()] += 1;
            }
        }
        let mut suit = Suit::Spade;
        for candidate in Suit::ALL {
            if counts[candidate.index()] < counts[suit.index()] {
                suit = candidate;
            }
        }
        let dealer = Seat::LOOP[self.rng.gen_range(0..Seat::LOOP.len())];
        self.install_trump(dealer, suit);
        Ok(dealer)
    }

    fn install_trump(&mut self, dealer: Seat, suit: Suit) {
        let trump = TrumpInfo::new(suit, self.team_levels[dealer.team().index()]);
        self.dealer = dealer;
        self.trump_info = Some(trump);
        let kitty = std::mem::take(&mut self.kitty);
        self.players[dealer.index()].add_cards(kitty);
        for player in self.players.iter_mut() {
            player.sort_by_strength(&trump);
        }
        self.current_player = dealer;
        self.pending_tribute = 0;
        self.owed_tribute = 0;
        self.phase = GamePhase::PreparingKitty;
        debug!(round = self.round_number, %dealer, %trump, "trump declared");
    }

    // --- kitty -----------------------------------------------------------

    pub fn set_kitty(&mut self, cards: &[Card]) -> Result<(), EngineError> {
        self.ensure_phase(GamePhase::PreparingKitty, "bury the kitty")?;
        if cards.len() != self.config.kitty_size {
            return Err(EngineError::ResourceExhaustion {
                requested: self.config.kitty_size,
                remaining: cards.len(),
            });
        }
        check_distinct(cards)?;
        let dealer = self.dealer;
        let player = &mut self.players[dealer.index()];
        if let Some(card) = cards.iter().find(|card| !player.holds(**card)) {
            return Err(PlayViolation::CardNotInHand {
                seat: dealer,
                card: *card,
            }
            .into());
        }
        player.remove_cards(cards);
        self.kitty = cards.to_vec();
        self.trick_leader = dealer;
        self.current_player = dealer;
        self.phase = GamePhase::Playing;
        debug!(
            %dealer,
            points = self.kitty_points(),
            bloods = self.kitty_bloods(),
            "kitty buried"
        );
        Ok(())
    }

    // --- play ------------------------------------------------------------

    pub fn is_valid_play(&self, seat: Seat, cards: &[Card]) -> bool {
        self.check_play(seat, cards).is_ok()
    }

    /// Same as [`GameEngine::is_valid_play`] but names the broken rule.
    pub fn check_play(&self, seat: Seat, cards: &[Card]) -> Result<(), EngineError> {
        let trump = self.playing_trump("play cards")?;
        if self.trick_plays >= 4 {
            return Err(PlayViolation::TrickComplete.into());
        }
        if seat != self.current_player {
            return Err(PlayViolation::NotYourTurn {
                expected: self.current_player,
                actual: seat,
            }
            .into());
        }
        if cards.is_empty() {
            return Err(PlayViolation::Empty.into());
        }
        check_distinct(cards)?;
        let player = &self.players[seat.index()];
        if let Some(card) = cards.iter().find(|card| !player.holds(**card)) {
            return Err(PlayViolation::CardNotInHand { seat, card: *card }.into());
        }

        if self.trick_plays == 0 {
            if PlayType::classify(cards).is_none() {
                return Err(PlayViolation::UnrecognizedCombination.into());
            }
            return Ok(());
        }

        let required = self.required_count();
        if cards.len() != required {
            return Err(PlayViolation::WrongCardCount {
                expected: required,
                actual: cards.len(),
            }
            .into());
        }
        let lead_suit = self.lead_suit_with(&trump);
        let held = player.count_of_suit(lead_suit, &trump);
        let played = cards
            .iter()
            .filter(|card| trump.effective_suit(**card) == lead_suit)
            .count();
        if played < held.min(required) {
            return Err(PlayViolation::MustFollowSuit { suit: lead_suit }.into());
        }
        Ok(())
    }

    pub fn play_cards(&mut self, seat: Seat, cards: &[Card]) -> Result<(), EngineError> {
        self.check_play(seat, cards)?;
        if self.trick_plays == 0 {
            self.trick_leader = seat;
            self.trick_play_type = PlayType::classify(cards);
        }
        self.players[seat.index()].remove_cards(cards);
        self.trick_cards[seat.index()] = cards.to_vec();
        self.trick_plays += 1;
        self.cards_played += cards.len();
        if self.trick_plays < 4 {
            self.current_player = seat.next();
        }
        trace!(%seat, cards = ?cards, plays = self.trick_plays, "cards played");
        Ok(())
    }

    pub fn evaluate_trick(&mut self) -> Result<TrickOutcome, EngineError> {
        let trump = self.playing_trump("evaluate a trick")?;
        if self.trick_plays < 4 {
            return Err(EngineError::state("evaluate an unfinished trick", self.phase));
        }

        let leader = self.trick_leader;
        let lead_suit = self.lead_suit_with(&trump);
        let play_type = self.trick_play_type.unwrap_or(PlayType::Single);
        let mut winner = leader;
        let mut best: Option<u32> = None;
        for seat in (0..4).map(|step| leader.offset(step)) {
            let cards = &self.trick_cards[seat.index()];
            if seat != leader
                && play_type != PlayType::Single
                && PlayType::classify(cards) != Some(play_type)
            {
                continue;
            }
            let value = cards
                .iter()
                .filter(|card| trump.is_trump(**card) || trump.effective_suit(**card) == lead_suit)
                .map(|card| trump.card_strength(*card))
                .max();
            if let Some(value) = value {
                if best.is_none_or(|current| value > current) {
                    best = Some(value);
                    winner = seat;
                }
            }
        }

        let points: u32 = self
            .trick_cards
            .iter()
            .flatten()
            .map(|card| card.points())
            .sum();
        let last_trick = self.players.iter().all(Player::is_empty);
        let kitty_bonus = if last_trick { self.kitty_points() * 2 } else { 0 };
        let outcome = TrickOutcome {
            winner,
            points,
            kitty_bonus,
            last_trick,
        };
        if winner.team() != self.declarer_team() {
            self.defender_points += outcome.total();
        }

        self.tricks_played += 1;
        self.trick_cards = Default::default();
        self.trick_play_type = None;
        self.trick_plays = 0;
        self.trick_leader = winner;
        self.current_player = winner;
        if last_trick {
            self.last_trick_winner = Some(winner);
            self.phase = GamePhase::RoundEnd;
        }
        debug!(
            trick = self.tricks_played,
            %winner,
            points,
            kitty_bonus,
            defender_points = self.defender_points,
            "trick resolved"
        );
        Ok(outcome)
    }

    // --- scoring ---------------------------------------------------------

    pub fn calculate_round_result(&mut self) -> Result<RoundResult, EngineError> {
        let last_winner = match (self.phase, self.last_trick_winner) {
            (GamePhase::RoundEnd, Some(seat)) => seat,
            _ => return Err(EngineError::state("score a round", self.phase)),
        };
        let declarer_team = self.declarer_team();
        let result = RoundResult::compute(
            self.defender_points,
            declarer_team,
            &self.kitty,
            last_winner.team() != declarer_team,
        );
        self.previous_winning_team = Some(result.winning_team);
        self.pending_tribute = result.tribute_count;
        self.owed_tribute = result.tribute_count;
        debug!(
            round = self.round_number,
            defender_points = result.defender_points,
            winner = %result.winning_team,
            level_change = result.level_change,
            tribute = result.tribute_count,
            "round scored"
        );
        Ok(result)
    }

    /// Raises `team`'s level. Passing the final level wins the match and
    /// resets both teams to the first level.
    pub fn advance_team_level(&mut self, team: Team, steps: u32) -> LevelAdvance {
        let steps = u8::try_from(steps).unwrap_or(u8::MAX);
        let advance = self.team_levels[team.index()].advance_level(steps);
        match advance {
            LevelAdvance::Reached(rank) => self.team_levels[team.index()] = rank,
            LevelAdvance::MatchWon => {
                debug!(%team, "match won");
                self.team_levels = [Rank::FIRST_LEVEL; 2];
            }
        }
        advance
    }

    // --- tribute ---------------------------------------------------------

    pub fn is_tribute_required(&self) -> bool {
        self.pending_tribute > 0 && self.previous_winning_team.is_some()
    }

    pub fn pending_tribute(&self) -> u32 {
        self.pending_tribute
    }

    pub fn previous_winning_team(&self) -> Option<Team> {
        self.previous_winning_team
    }

    /// Runs every owed exchange: the losing team's strongest card goes up,
    /// the receiver's weakest non-joker comes back.
    pub fn perform_auto_tribute(&mut self) -> Result<Vec<TributeExchange>, EngineError> {
        self.ensure_phase(GamePhase::DeclaringTrump, "perform tribute")?;
        let Some(winners) = self.previous_winning_team.filter(|_| self.is_tribute_required())
        else {
            return Ok(Vec::new());
        };
        let receiver = winners.first_seat();
        let mut exchanges = Vec::with_capacity(self.pending_tribute as usize);
        for _ in 0..self.pending_tribute {
            let Some((giver, tribute)) = self.strongest_tribute_card(winners.other()) else {
                break;
            };
            let Some(returned) = weakest_return_card(self.players[receiver.index()].hand()) else {
                break;
            };
            exchanges.push(self.swap_cards(giver, tribute, receiver, returned));
        }
        self.pending_tribute = 0;
        debug!(count = exchanges.len(), %receiver, "tribute performed");
        Ok(exchanges)
    }

    /// One manual exchange chosen by the players themselves.
    pub fn perform_tribute(
        &mut self,
        giver: Seat,
        tribute: Card,
        returned: Card,
    ) -> Result<TributeExchange, EngineError> {
        self.ensure_phase(GamePhase::DeclaringTrump, "perform tribute")?;
        let winners = match self.previous_winning_team {
            Some(team) if self.pending_tribute > 0 => team,
            _ => return Err(EngineError::state("perform tribute that is not owed", self.phase)),
        };
        if giver.team() == winners {
            return Err(PlayViolation::NotEligible { seat: giver }.into());
        }
        let receiver = winners.first_seat();
        if !self.players[giver.index()].holds(tribute) {
            return Err(PlayViolation::CardNotInHand {
                seat: giver,
                card: tribute,
            }
            .into());
        }
        if !self.players[receiver.index()].holds(returned) {
            return Err(PlayViolation::CardNotInHand {
                seat: receiver,
                card: returned,
            }
            .into());
        }
        self.pending_tribute -= 1;
        Ok(self.swap_cards(giver, tribute, receiver, returned))
    }

    fn strongest_tribute_card(&self, losers: Team) -> Option<(Seat, Card)> {
        let mut best: Option<(Seat, Card)> = None;
        for seat in losers.seats() {
            for card in self.players[seat.index()].hand() {
                let stronger = best.is_none_or(|(_, current)| {
                    card.rank.effective_rank_strength() > current.rank.effective_rank_strength()
                });
                if stronger {
                    best = Some((seat, *card));
                }
            }
        }
        best
    }

    fn swap_cards(
        &mut self,
        giver: Seat,
        tribute: Card,
        receiver: Seat,
        returned: Card,
    ) -> TributeExchange {
        self.players[giver.index()].remove_card(tribute);
        self.players[receiver.index()].remove_card(returned);
        self.players[receiver.index()].add_cards([tribute]);
        self.players[giver.index()].add_cards([returned]);
        trace!(%giver, %receiver, %tribute, %returned, "tribute exchanged");
        TributeExchange {
            giver,
            receiver,
            tribute,
            returned,
        }
    }

    // --- queries ---------------------------------------------------------

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn current_player(&self) -> Seat {
        self.current_player
    }

    pub fn dealer(&self) -> Seat {
        self.dealer
    }

    pub fn declarer_team(&self) -> Team {
        self.dealer.team()
    }

    pub fn trump_info(&self) -> Option<TrumpInfo> {
        self.trump_info
    }

    pub fn kitty(&self) -> &[Card] {
        &self.kitty
    }

    pub fn kitty_points(&self) -> u32 {
        result::kitty_points(&self.kitty)
    }

    pub fn kitty_bloods(&self) -> u32 {
        result::kitty_bloods(&self.kitty)
    }

    pub fn trick_cards(&self) -> &[Vec<Card>; 4] {
        &self.trick_cards
    }

    pub fn trick_cards_of(&self, seat: Seat) -> &[Card] {
        &self.trick_cards[seat.index()]
    }

    /// The cards the current trick was led with; empty before the lead.
    pub fn lead_cards(&self) -> &[Card] {
        if self.trick_plays == 0 {
            &[]
        } else {
            &self.trick_cards[self.trick_leader.index()]
        }
    }

    pub fn trick_leader(&self) -> Seat {
        self.trick_leader
    }

    pub fn trick_play_type(&self) -> Option<PlayType> {
        self.trick_play_type
    }

    pub fn trick_plays(&self) -> usize {
        self.trick_plays
    }

    pub fn is_trick_complete(&self) -> bool {
        self.trick_plays == 4
    }

    /// Cards each follower must play this trick; zero before the lead.
    pub fn required_count(&self) -> usize {
        self.lead_cards().len()
    }

    /// Effective suit of the lead, or `None` when trump was led or nothing
    /// has been led yet.
    pub fn lead_suit(&self) -> Option<Suit> {
        self.trump_info
            .and_then(|trump| self.lead_cards().first().and_then(|c| trump.effective_suit(*c)))
    }

    pub fn cards_played(&self) -> usize {
        self.cards_played
    }

    pub fn tricks_played(&self) -> usize {
        self.tricks_played
    }

    pub fn defender_points(&self) -> u32 {
        self.defender_points
    }

    pub fn team_levels(&self) -> [Rank; 2] {
        self.team_levels
    }

    pub fn team_level(&self, team: Team) -> Rank {
        self.team_levels[team.index()]
    }

    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    pub fn last_trick_winner(&self) -> Option<Seat> {
        self.last_trick_winner
    }

    pub fn players(&self) -> &[Player; 4] {
        &self.players
    }

    pub fn player(&self, seat: Seat) -> &Player {
        &self.players[seat.index()]
    }

    pub fn hand(&self, seat: Seat) -> &[Card] {
        self.players[seat.index()].hand()
    }

    pub fn is_round_over(&self) -> bool {
        self.phase == GamePhase::RoundEnd
    }

    /// Hands, kitty and played cards together; equals the deck size at
    /// every phase boundary of a dealt round.
    pub fn total_cards_in_play(&self) -> usize {
        self.players.iter().map(Player::len).sum::<usize>() + self.kitty.len() + self.cards_played
    }

    pub fn snapshot(&self) -> TableSnapshot {
        TableSnapshot {
            phase: self.phase,
            round_number: self.round_number,
            dealer: self.dealer,
            current_player: self.current_player,
            trump: self.trump_info,
            hand_sizes: self.players.each_ref().map(Player::len),
            kitty_size: self.kitty.len(),
            trick: self.trick_cards.clone(),
            trick_leader: self.trick_leader,
            trick_play_type: self.trick_play_type,
            trick_plays: self.trick_plays,
            defender_points: self.defender_points,
            team_levels: self.team_levels,
        }
    }

    // --- internals -------------------------------------------------------

    pub(crate) fn hand_mut(&mut self, seat: Seat) -> &mut Vec<Card> {
        self.players[seat.index()].hand_mut()
    }

    pub(crate) fn replace_kitty(&mut self, kitty: Vec<Card>) {
        self.kitty = kitty;
    }

    fn ensure_phase(&self, expected: GamePhase, operation: &'static str) -> Result<(), EngineError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(EngineError::state(operation, self.phase))
        }
    }

    fn playing_trump(&self, operation: &'static str) -> Result<TrumpInfo, EngineError> {
        match (self.phase, self.trump_info) {
            (GamePhase::Playing, Some(trump)) => Ok(trump),
            _ => Err(EngineError::state(operation, self.phase)),
        }
    }

    fn lead_suit_with(&self, trump: &TrumpInfo) -> Option<Suit> {
        self.lead_cards()
            .first()
            .and_then(|card| trump.effective_suit(*card))
    }
}

/// Per-seat settings a driver may change between rounds.
pub struct PlayerSettings<'a> {
    player: &'a mut Player,
}

impl PlayerSettings<'_> {
    pub fn name(self, name: impl Into<String>) -> Self {
        self.player.set_name(name);
        self
    }

    pub fn human(self, is_human: bool) -> Self {
        self.player.set_human(is_human);
        self
    }
}

fn check_distinct(cards: &[Card]) -> Result<(), PlayViolation> {
    let mut seen = HashSet::with_capacity(cards.len());
    match cards.iter().find(|card| !seen.insert(**card)) {
        Some(card) => Err(PlayViolation::DuplicateCard(*card)),
        None => Ok(()),
    }
}

fn weakest_return_card(hand: &[Card]) -> Option<Card> {
    let strength = |card: &&Card| card.rank.effective_rank_strength();
    hand.iter()
        .filter(|card| !card.is_joker())
        .min_by_key(strength)
        .or_else(|| hand.iter().min_by_key(strength))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::GameEngine;
    use crate::error::{EngineError, PlayViolation};
    use crate::game::phase::GamePhase;
    use crate::model::card::Card;
    use crate::model::player::{Seat, Team};
    use crate::model::rank::{LevelAdvance, Rank};
    use crate::model::suit::Suit;
    use crate::model::table::TableConfig;
    use crate::model::trump::TrumpInfo;

    fn card(suit: Suit, rank: Rank, id: u32) -> Card {
        Card::new(suit, rank, id)
    }

    fn dealt_engine(seed: u64) -> GameEngine {
        let mut engine = GameEngine::with_seed(TableConfig::three_deck(), seed).unwrap();
        engine.start_new_round().unwrap();
        engine
    }

    #[test]
    fn fresh_engine_waits_at_round_end() {
        let engine = GameEngine::with_seed(TableConfig::default(), 1).unwrap();
        assert_eq!(engine.phase(), GamePhase::RoundEnd);
        assert_eq!(engine.round_number(), 0);
        assert_eq!(engine.team_levels(), [Rank::Three, Rank::Three]);
    }

    #[test]
    fn inconsistent_table_is_rejected() {
        let config = TableConfig {
            deck_copies: 2,
            hand_size: 39,
            kitty_size: 6,
        };
        assert!(matches!(
            GameEngine::with_seed(config, 1),
            Err(EngineError::ResourceExhaustion { .. })
        ));
    }

    #[test]
    fn dealing_fills_hands_and_kitty() {
        let engine = dealt_engine(3);
        assert_eq!(engine.phase(), GamePhase::DeclaringTrump);
        assert_eq!(engine.round_number(), 1);
        for seat in Seat::LOOP {
            assert_eq!(engine.hand(seat).len(), 39);
        }
        assert_eq!(engine.kitty().len(), 6);
        assert_eq!(engine.total_cards_in_play(), 162);
    }

    #[test]
    fn wrong_phase_is_a_state_error() {
        let mut engine = dealt_engine(4);
        assert!(matches!(
            engine.start_new_round(),
            Err(EngineError::State {
                phase: GamePhase::DeclaringTrump,
                ..
            })
        ));
        assert!(matches!(
            engine.set_kitty(&[]),
            Err(EngineError::State { .. })
        ));
        assert!(matches!(
            engine.evaluate_trick(),
            Err(EngineError::State { .. })
        ));
    }

    #[test]
    fn declaring_hands_kitty_to_dealer() {
        let mut engine = dealt_engine(5);
        let kitty: Vec<Card> = engine.kitty().to_vec();
        engine.declare_trump(Seat::East, Suit::Heart).unwrap();
        assert_eq!(engine.phase(), GamePhase::PreparingKitty);
        assert_eq!(engine.dealer(), Seat::East);
        assert_eq!(engine.hand(Seat::East).len(), 45);
        assert!(engine.kitty().is_empty());
        assert!(engine.player(Seat::East).holds_all(&kitty));
        assert_eq!(engine.total_cards_in_play(), 162);
        let trump = engine.trump_info().unwrap();
        assert_eq!(trump, TrumpInfo::new(Suit::Heart, Rank::Three));
    }

    #[test]
    fn random_suit_needs_big_joker() {
        let mut engine = dealt_engine(6);
        let holder = Seat::LOOP.into_iter().find(|s| engine.has_big_joker(*s));
        let without = Seat::LOOP.into_iter().find(|s| !engine.has_big_joker(*s));
        if let Some(seat) = without {
            assert!(matches!(
                engine.declare_trump_random_suit(seat),
                Err(EngineError::IllegalPlay(PlayViolation::NotEligible { .. }))
            ));
            assert_eq!(engine.phase(), GamePhase::DeclaringTrump);
        }
        let seat = holder.unwrap();
        let suit = engine.declare_trump_random_suit(seat).unwrap();
        assert_eq!(engine.trump_info().unwrap().trump_suit, suit);
        assert_eq!(engine.dealer(), seat);
    }

    #[test]
    fn kitty_fallback_picks_scarcest_suit() {
        let mut engine = dealt_engine(7);
        let mut counts = [0usize; 4];
        for c in engine.kitty() {
            if let Some(suit) = c.suit {
                counts[suit.index()] += 1;
            }
        }
        let min = *counts.iter().min().unwrap();
        let expected = Suit::ALL
            .into_iter()
            .find(|s| counts[s.index()] == min)
            .unwrap();
        let dealer = engine.declare_trump_from_kitty().unwrap();
        assert_eq!(engine.dealer(), dealer);
        assert_eq!(engine.trump_info().unwrap().trump_suit, expected);
    }

    #[test]
    fn kitty_burial_validates_count_and_ownership() {
        let mut engine = dealt_engine(8);
        engine.declare_trump(Seat::North, Suit::Spade).unwrap();
        let hand = engine.hand(Seat::North).to_vec();

        assert!(matches!(
            engine.set_kitty(&hand[..5]),
            Err(EngineError::ResourceExhaustion {
                requested: 6,
                remaining: 5
            })
        ));
        let foreign = engine.hand(Seat::East)[0];
        let mut bad = hand[..5].to_vec();
        bad.push(foreign);
        assert!(matches!(
            engine.set_kitty(&bad),
            Err(EngineError::IllegalPlay(PlayViolation::CardNotInHand { .. }))
        ));
        assert_eq!(engine.hand(Seat::North).len(), 45);

        engine.set_kitty(&hand[hand.len() - 6..]).unwrap();
        assert_eq!(engine.phase(), GamePhase::Playing);
        assert_eq!(engine.hand(Seat::North).len(), 39);
        assert_eq!(engine.current_player(), Seat::North);
        assert_eq!(engine.total_cards_in_play(), 162);
    }

    #[test]
    fn following_must_use_lead_suit_cards() {
        let trump = TrumpInfo::new(Suit::Spade, Rank::Three);
        let hands = [
            vec![card(Suit::Heart, Rank::Nine, 1)],
            vec![card(Suit::Heart, Rank::Four, 2), card(Suit::Club, Rank::Four, 3)],
            vec![card(Suit::Club, Rank::Ace, 4)],
            vec![card(Suit::Diamond, Rank::Six, 5)],
        ];
        let mut engine =
            GameEngine::from_hands(TableConfig::three_deck(), hands, vec![], trump, Seat::North, Seat::North);
        engine.play_cards(Seat::North, &[card(Suit::Heart, Rank::Nine, 1)]).unwrap();

        assert!(!engine.is_valid_play(Seat::South, &[card(Suit::Club, Rank::Ace, 4)]));
        let skip = [card(Suit::Club, Rank::Four, 3)];
        assert!(matches!(
            engine.check_play(Seat::East, &skip),
            Err(EngineError::IllegalPlay(PlayViolation::MustFollowSuit {
                suit: Some(Suit::Heart)
            }))
        ));
        assert!(engine.is_valid_play(Seat::East, &[card(Suit::Heart, Rank::Four, 2)]));
    }

    #[test]
    fn short_follower_plays_all_suit_cards_plus_filler() {
        let trump = TrumpInfo::new(Suit::Spade, Rank::Three);
        let q1 = card(Suit::Heart, Rank::Queen, 10);
        let q2 = card(Suit::Heart, Rank::Queen, 64);
        let h7 = card(Suit::Heart, Rank::Seven, 11);
        let c4 = card(Suit::Club, Rank::Four, 12);
        let c5 = card(Suit::Club, Rank::Five, 13);
        let hands = [
            vec![q1, q2],
            vec![h7, c4, c5],
            vec![card(Suit::Diamond, Rank::Four, 20), card(Suit::Diamond, Rank::Six, 21)],
            vec![card(Suit::Heart, Rank::Eight, 30), card(Suit::Heart, Rank::Nine, 31)],
        ];
        let mut engine =
            GameEngine::from_hands(TableConfig::three_deck(), hands, vec![], trump, Seat::North, Seat::North);
        engine.play_cards(Seat::North, &[q1, q2]).unwrap();

        assert!(matches!(
            engine.check_play(Seat::East, &[c4]),
            Err(EngineError::IllegalPlay(PlayViolation::WrongCardCount {
                expected: 2,
                actual: 1
            }))
        ));
        assert!(!engine.is_valid_play(Seat::East, &[c4, c5]));
        assert!(engine.is_valid_play(Seat::East, &[h7, c5]));
    }

    #[test]
    fn out_of_turn_and_foreign_cards_are_rejected() {
        let trump = TrumpInfo::new(Suit::Spade, Rank::Three);
        let hands = [
            vec![card(Suit::Heart, Rank::Nine, 1)],
            vec![card(Suit::Heart, Rank::Four, 2)],
            vec![card(Suit::Club, Rank::Ace, 4)],
            vec![card(Suit::Diamond, Rank::Six, 5)],
        ];
        let engine =
            GameEngine::from_hands(TableConfig::three_deck(), hands, vec![], trump, Seat::North, Seat::North);
        assert!(matches!(
            engine.check_play(Seat::East, &[card(Suit::Heart, Rank::Four, 2)]),
            Err(EngineError::IllegalPlay(PlayViolation::NotYourTurn { .. }))
        ));
        assert!(!engine.is_valid_play(Seat::North, &[card(Suit::Heart, Rank::Four, 2)]));
        assert!(!engine.is_valid_play(Seat::North, &[]));
    }

    #[test]
    fn highest_competing_card_wins_and_ties_favor_earlier() {
        let trump = TrumpInfo::new(Suit::Spade, Rank::Three);
        let hands = [
            vec![card(Suit::Heart, Rank::King, 1), card(Suit::Club, Rank::Four, 9)],
            vec![card(Suit::Heart, Rank::King, 2), card(Suit::Club, Rank::Six, 8)],
            vec![card(Suit::Club, Rank::Ace, 3), card(Suit::Club, Rank::Seven, 7)],
            vec![card(Suit::Heart, Rank::Five, 4), card(Suit::Club, Rank::Eight, 6)],
        ];
        let mut engine =
            GameEngine::from_hands(TableConfig::three_deck(), hands, vec![], trump, Seat::East, Seat::North);
        engine.play_cards(Seat::North, &[card(Suit::Heart, Rank::King, 1)]).unwrap();
        engine.play_cards(Seat::East, &[card(Suit::Heart, Rank::King, 2)]).unwrap();
        engine.play_cards(Seat::South, &[card(Suit::Club, Rank::Ace, 3)]).unwrap();
        engine.play_cards(Seat::West, &[card(Suit::Heart, Rank::Five, 4)]).unwrap();
        let outcome = engine.evaluate_trick().unwrap();

        assert_eq!(outcome.winner, Seat::North);
        assert_eq!(outcome.points, 25);
        assert!(!outcome.last_trick);
        assert_eq!(engine.defender_points(), 25);
        assert_eq!(engine.current_player(), Seat::North);
        assert_eq!(engine.phase(), GamePhase::Playing);
    }

    #[test]
    fn final_trick_doubles_kitty_and_ends_round() {
        let trump = TrumpInfo::new(Suit::Spade, Rank::Three);
        let kitty = vec![card(Suit::Heart, Rank::King, 50), card(Suit::Club, Rank::Five, 51)];
        let hands = [
            vec![card(Suit::Diamond, Rank::Ace, 1)],
            vec![card(Suit::Spade, Rank::Four, 2)],
            vec![card(Suit::Diamond, Rank::Nine, 3)],
            vec![card(Suit::Diamond, Rank::Ten, 4)],
        ];
        let mut engine =
            GameEngine::from_hands(TableConfig::three_deck(), hands, kitty, trump, Seat::North, Seat::North);
        for seat in Seat::LOOP {
            let cards = engine.hand(seat).to_vec();
            engine.play_cards(seat, &cards).unwrap();
        }
        let outcome = engine.evaluate_trick().unwrap();
        assert_eq!(outcome.winner, Seat::East);
        assert!(outcome.last_trick);
        assert_eq!(outcome.kitty_bonus, 30);
        assert_eq!(engine.defender_points(), 40);
        assert_eq!(engine.phase(), GamePhase::RoundEnd);
        assert_eq!(engine.last_trick_winner(), Some(Seat::East));

        let result = engine.calculate_round_result().unwrap();
        assert!(result.declarer_wins);
        assert!(result.last_trick_captured_by_defender);
        assert_eq!(result.tribute_count, 4);
        assert!(engine.is_tribute_required());
    }

    #[test]
    fn level_advance_resets_after_match_win() {
        let mut engine = GameEngine::with_seed(TableConfig::default(), 9).unwrap();
        assert_eq!(
            engine.advance_team_level(Team::EastWest, 3),
            LevelAdvance::Reached(Rank::Six)
        );
        assert_eq!(engine.team_level(Team::EastWest), Rank::Six);
        assert_eq!(engine.advance_team_level(Team::EastWest, 5), LevelAdvance::MatchWon);
        assert_eq!(engine.team_levels(), [Rank::Three, Rank::Three]);
    }

    #[test]
    fn tribute_owed_again_after_redeal_until_declared() {
        let trump = TrumpInfo::new(Suit::Spade, Rank::Three);
        let kitty = vec![card(Suit::Heart, Rank::King, 50), card(Suit::Club, Rank::Five, 51)];
        let hands = [
            vec![card(Suit::Diamond, Rank::Ace, 1)],
            vec![card(Suit::Spade, Rank::Four, 2)],
            vec![card(Suit::Diamond, Rank::Nine, 3)],
            vec![card(Suit::Diamond, Rank::Ten, 4)],
        ];
        let mut engine =
            GameEngine::from_hands(TableConfig::three_deck(), hands, kitty, trump, Seat::North, Seat::North);
        for seat in Seat::LOOP {
            let cards = engine.hand(seat).to_vec();
            engine.play_cards(seat, &cards).unwrap();
        }
        engine.evaluate_trick().unwrap();
        let owed = engine.calculate_round_result().unwrap().tribute_count;
        assert_eq!(owed, 4);

        engine.start_new_round().unwrap();
        assert_eq!(engine.perform_auto_tribute().unwrap().len(), owed as usize);
        assert!(!engine.is_tribute_required());

        engine.redeal().unwrap();
        assert!(engine.is_tribute_required());
        assert_eq!(engine.pending_tribute(), owed);
        assert_eq!(engine.perform_auto_tribute().unwrap().len(), owed as usize);

        engine.redeal().unwrap();
        engine.declare_trump_from_kitty().unwrap();
        assert!(!engine.is_tribute_required());
        assert_eq!(engine.pending_tribute(), 0);
    }

    #[test]
    fn redeal_keeps_round_number() {
        let mut engine = dealt_engine(10);
        let before = engine.hand(Seat::North).to_vec();
        engine.redeal().unwrap();
        assert_eq!(engine.round_number(), 1);
        assert_eq!(engine.phase(), GamePhase::DeclaringTrump);
        assert_eq!(engine.total_cards_in_play(), 162);
        assert_ne!(engine.hand(Seat::North), before.as_slice());
    }

    #[test]
    fn snapshot_is_owned_and_serializable() {
        let engine = dealt_engine(11);
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.hand_sizes, [39; 4]);
        assert_eq!(snapshot.kitty_size, 6);
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"phase\":\"DeclaringTrump\""));
    }
}
