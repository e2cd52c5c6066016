use crate::game::phase::GamePhase;
use crate::model::card::Card;
use crate::model::player::Seat;
use crate::model::suit::Suit;
use thiserror::Error;

/// Failures surfaced by the engine. None of them leave state half-applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("cannot {operation} during {phase}")]
    State {
        operation: &'static str,
        phase: GamePhase,
    },
    #[error("illegal play: {0}")]
    IllegalPlay(#[from] PlayViolation),
    #[error("requested {requested} cards but only {remaining} are available")]
    ResourceExhaustion { requested: usize, remaining: usize },
}

impl EngineError {
    pub(crate) fn state(operation: &'static str, phase: GamePhase) -> Self {
        EngineError::State { operation, phase }
    }
}

/// The specific rule a rejected play broke.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayViolation {
    #[error("expected {expected} to act but got {actual}")]
    NotYourTurn { expected: Seat, actual: Seat },
    #[error("no cards were played")]
    Empty,
    #[error("card {0} appears more than once")]
    DuplicateCard(Card),
    #[error("{seat} does not hold {card}")]
    CardNotInHand { seat: Seat, card: Card },
    #[error("cards do not form a single, bang or gunzi")]
    UnrecognizedCombination,
    #[error("expected {expected} cards but got {actual}")]
    WrongCardCount { expected: usize, actual: usize },
    #[error("must follow {}", describe_suit(.suit))]
    MustFollowSuit { suit: Option<Suit> },
    #[error("{seat} is not eligible for this declaration")]
    NotEligible { seat: Seat },
    #[error("the trick already has four plays")]
    TrickComplete,
}

fn describe_suit(suit: &Option<Suit>) -> String {
    match suit {
        Some(suit) => suit.to_string(),
        None => "trump".to_string(),
    }
}
