pub mod belief;
pub mod error;
pub mod game;
pub mod model;

pub use belief::{CardTracker, determinize};
pub use error::{EngineError, PlayViolation};
pub use game::engine::{GameEngine, TrickOutcome, TributeExchange};
pub use game::phase::GamePhase;
pub use game::result::RoundResult;
pub use game::snapshot::TableSnapshot;
pub use model::card::Card;
pub use model::play_type::PlayType;
pub use model::player::{Seat, Team};
pub use model::rank::{LevelAdvance, Rank};
pub use model::suit::Suit;
pub use model::table::TableConfig;
pub use model::trump::TrumpInfo;
