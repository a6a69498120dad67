use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::geometry::ShapeFeatures;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        let dx = f64::from(other.x) - f64::from(self.x);
        let dy = f64::from(other.y) - f64::from(self.y);
        (dx * dx + dy * dy).sqrt()
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl FromStr for Point {
    type Err = ParseError;

    /// Parses `x,y`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError {
            kind: "point",
            value: s.to_string(),
        };
        let (x, y) = s.split_once(',').ok_or_else(invalid)?;
        let x = x.trim().parse().map_err(|_| invalid())?;
        let y = y.trim().parse().map_err(|_| invalid())?;
        Ok(Self { x, y })
    }
}

/// Closed polygon supplied by the segmentation collaborator, one per frame.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Contour(Vec<Point>);

impl Contour {
    pub fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    pub fn points(&self) -> &[Point] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Point> for Contour {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl FromStr for Contour {
    type Err = ParseError;

    /// Whitespace separated `x,y` pairs.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split_whitespace().map(str::parse).collect()
    }
}

impl From<&[(i32, i32)]> for Contour {
    fn from(points: &[(i32, i32)]) -> Self {
        points.iter().copied().map(Point::from).collect()
    }
}

/// A gesture label, also used as the move played in a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Move {
    Rock,
    Paper,
    Scissors,
}

impl Move {
    pub const ALL: [Move; 3] = [Move::Rock, Move::Paper, Move::Scissors];

    pub fn beats(self, other: Move) -> bool {
        matches!(
            (self, other),
            (Move::Rock, Move::Scissors) | (Move::Paper, Move::Rock) | (Move::Scissors, Move::Paper)
        )
    }

    /// The move that beats `self`.
    pub fn counter(self) -> Move {
        match self {
            Move::Rock => Move::Paper,
            Move::Paper => Move::Scissors,
            Move::Scissors => Move::Rock,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Move::Rock => 0,
            Move::Paper => 1,
            Move::Scissors => 2,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Move::Rock => "rock",
            Move::Paper => "paper",
            Move::Scissors => "scissors",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Move::Rock => "ROCK",
            Move::Paper => "PAPER",
            Move::Scissors => "SCISSORS",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Move::Rock => "✊ ",
            Move::Paper => "🖐 ",
            Move::Scissors => "✌️ ",
        }
    }

    pub fn tip(&self) -> &'static str {
        match self {
            Move::Rock => "Make a fist (close all fingers)",
            Move::Paper => "Open palm with all fingers extended",
            Move::Scissors => "Extend only index and middle fingers",
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid {kind} `{value}`")]
pub struct ParseError {
    kind: &'static str,
    value: String,
}

impl FromStr for Move {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rock" | "r" => Ok(Move::Rock),
            "paper" | "p" => Ok(Move::Paper),
            "scissors" | "s" => Ok(Move::Scissors),
            other => Err(ParseError {
                kind: "move",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Winner {
    #[serde(rename = "user")]
    Player,
    #[serde(rename = "computer")]
    Computer,
    #[serde(rename = "tie")]
    Tie,
}

impl Winner {
    pub fn key(&self) -> &'static str {
        match self {
            Winner::Player => "user",
            Winner::Computer => "computer",
            Winner::Tie => "tie",
        }
    }

    pub fn round_message(&self) -> &'static str {
        match self {
            Winner::Player => "You win!",
            Winner::Computer => "Computer wins!",
            Winner::Tie => "It's a tie!",
        }
    }

    pub fn match_message(&self) -> &'static str {
        match self {
            Winner::Player => "YOU WIN THE MATCH!",
            Winner::Computer => "COMPUTER WINS THE MATCH!",
            Winner::Tie => "THE MATCH IS A TIE!",
        }
    }
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiMode {
    #[default]
    Random,
    Counter,
    Pattern,
    Adaptive,
}

impl AiMode {
    pub const ALL: [AiMode; 4] = [AiMode::Random, AiMode::Counter, AiMode::Pattern, AiMode::Adaptive];

    pub fn key(&self) -> &'static str {
        match self {
            AiMode::Random => "random",
            AiMode::Counter => "counter",
            AiMode::Pattern => "pattern",
            AiMode::Adaptive => "adaptive",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AiMode::Random => "Random",
            AiMode::Counter => "Counter",
            AiMode::Pattern => "Pattern",
            AiMode::Adaptive => "Adaptive",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AiMode::Random => "AI plays randomly",
            AiMode::Counter => "AI counters your most frequent moves",
            AiMode::Pattern => "AI learns your move patterns",
            AiMode::Adaptive => "AI switches strategy based on streaks",
        }
    }
}

impl fmt::Display for AiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for AiMode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(AiMode::Random),
            "counter" => Ok(AiMode::Counter),
            "pattern" => Ok(AiMode::Pattern),
            "adaptive" => Ok(AiMode::Adaptive),
            other => Err(ParseError {
                kind: "ai mode",
                value: other.to_string(),
            }),
        }
    }
}

/// Per-frame output for the debug overlay.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameResult {
    pub label: Option<Move>,
    pub features: Option<ShapeFeatures>,
    pub raw_fingers: Option<usize>,
    pub smoothed_fingers: Option<usize>,
    pub fingertips: Vec<Point>,
}

impl FrameResult {
    pub fn display_text(&self) -> String {
        match (&self.label, &self.features) {
            (Some(label), Some(features)) => format!(
                "{}{} (fingers {}, solidity {:.2}, circularity {:.2})",
                label.emoji(),
                label.display_name(),
                self.smoothed_fingers.unwrap_or(0),
                features.solidity,
                features.circularity
            ),
            _ => "No hand detected".to_string(),
        }
    }
}
