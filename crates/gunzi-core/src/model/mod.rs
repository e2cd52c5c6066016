pub mod card;
pub mod deck;
pub mod play_type;
pub mod player;
pub mod rank;
pub mod suit;
pub mod table;
pub mod trump;
