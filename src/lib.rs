//! Rock/paper/scissors from hand contours, against an opponent that learns.

pub mod config;
pub mod game;
pub mod geometry;
pub mod gesture;
pub mod history;
pub mod records;
pub mod session;
pub mod stats;
pub mod strategy;
pub mod types;

pub use config::{ConfigError, GameConfig};
pub use game::{Outcome, RoundRecord, RoundResolver};
pub use gesture::GestureClassifier;
pub use session::{GameSession, MatchPhase, SessionEvent};
pub use strategy::OpponentEngine;
pub use types::{AiMode, Contour, Move, Point, Winner};
