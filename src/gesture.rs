use std::time::{Duration, Instant};

use crate::{
    geometry::{self, HandShape, ShapeFeatures},
    history::{RingBuffer, most_common},
    types::{Contour, FrameResult, Move},
};

pub const GESTURE_HISTORY_CAPACITY: usize = 10;
const ROCK_MIN_CIRCULARITY: f64 = 0.7;
const ROCK_MIN_SOLIDITY: f64 = 0.8;
const SCISSORS_MAX_CIRCULARITY: f64 = 0.7;
const PAPER_MAX_SOLIDITY: f64 = 0.75;
const STABLE_RUN: usize = 3;
const MAX_MISSED_FRAMES: usize = 10;

pub struct GestureClassifier {
    history: GestureHistory,
}

impl GestureClassifier {
    pub fn new() -> Self {
        Self {
            history: GestureHistory::new(),
        }
    }

    pub fn classify(&mut self, contour: Option<&Contour>) -> Option<Move> {
        self.analyze_frame(contour).label
    }

    /// Classifies one frame and keeps the numbers behind the decision for the overlay.
    pub fn analyze_frame(&mut self, contour: Option<&Contour>) -> FrameResult {
        let Some(contour) = contour else {
            return FrameResult::default();
        };

        let shape = match geometry::analyze(contour) {
            Ok(shape) => shape,
            Err(err) => {
                log::debug!("skipping frame: {err}");
                return FrameResult::default();
            }
        };

        let raw = shape.extended_fingers();
        self.history.push(raw);
        let smoothed = self.history.majority().unwrap_or(raw);
        let label = decide(smoothed, is_scissors(&shape), &shape.features);

        log::debug!(
            "fingers: {smoothed} (raw {raw}), solidity: {:.2}, circularity: {:.2} -> {label}",
            shape.features.solidity,
            shape.features.circularity
        );

        FrameResult {
            label: Some(label),
            features: Some(shape.features),
            raw_fingers: Some(raw),
            smoothed_fingers: Some(smoothed),
            fingertips: shape.fingertips,
        }
    }

    pub fn history(&self) -> &GestureHistory {
        &self.history
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }
}

impl Default for GestureClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Two fingers on this frame alone, with a shape far from round.
fn is_scissors(shape: &HandShape) -> bool {
    shape.extended_fingers() == 2
        && !shape.fingertips.is_empty()
        && shape.features.circularity < SCISSORS_MAX_CIRCULARITY
}

// Conditions overlap on purpose; the order decides boundary cases.
fn decide(smoothed: usize, scissors: bool, features: &ShapeFeatures) -> Move {
    if smoothed <= 1
        || (features.circularity > ROCK_MIN_CIRCULARITY && features.solidity > ROCK_MIN_SOLIDITY)
    {
        Move::Rock
    } else if smoothed == 2 || scissors {
        Move::Scissors
    } else if smoothed >= 4 || (smoothed == 3 && features.solidity < PAPER_MAX_SOLIDITY) {
        Move::Paper
    } else {
        Move::Rock
    }
}

/// Recent raw finger counts; the majority is the count used for classification.
#[derive(Clone, Debug, Default)]
pub struct GestureHistory {
    counts: RingBuffer<usize, GESTURE_HISTORY_CAPACITY>,
}

impl GestureHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fingers: usize) {
        self.counts.push(fingers);
    }

    /// Most frequent count; ties go to the value seen first.
    pub fn majority(&self) -> Option<usize> {
        most_common(self.counts.iter()).map(|(value, _)| value)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetectionFeedback {
    Stable(Move),
    Unstable,
    NoHand,
}

impl DetectionFeedback {
    pub fn message(&self) -> String {
        match self {
            DetectionFeedback::Stable(label) => {
                format!("Good! Keep showing {}", label.display_name())
            }
            DetectionFeedback::Unstable => "Try to keep your gesture stable".to_string(),
            DetectionFeedback::NoHand => "No hand detected! Place your hand in the box.".to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowVerdict {
    Pending,
    Confirmed { label: Move, count: usize },
    /// The window restarted; the caller should ask the player to try again.
    LowConfidence { best: Move, count: usize },
}

/// Collects per-frame labels over one detection window.
#[derive(Clone, Debug)]
pub struct DetectionWindow {
    started: Instant,
    duration: Duration,
    threshold: usize,
    labels: Vec<Move>,
    missed_frames: usize,
}

impl DetectionWindow {
    pub fn new(now: Instant, duration: Duration, threshold: usize) -> Self {
        Self {
            started: now,
            duration,
            threshold,
            labels: Vec::new(),
            missed_frames: 0,
        }
    }

    pub fn observe(&mut self, label: Option<Move>) -> Option<DetectionFeedback> {
        let Some(label) = label else {
            self.missed_frames += 1;
            return (self.missed_frames > MAX_MISSED_FRAMES).then_some(DetectionFeedback::NoHand);
        };

        self.missed_frames = 0;
        self.labels.push(label);
        if self.labels.len() < STABLE_RUN {
            return None;
        }

        let recent = &self.labels[self.labels.len() - STABLE_RUN..];
        if recent.iter().all(|l| *l == recent[0]) {
            Some(DetectionFeedback::Stable(label))
        } else {
            Some(DetectionFeedback::Unstable)
        }
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started)
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.duration.saturating_sub(self.elapsed(now))
    }

    pub fn progress(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed(now).as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    pub fn is_elapsed(&self, now: Instant) -> bool {
        self.elapsed(now) >= self.duration
    }

    pub fn labels(&self) -> &[Move] {
        &self.labels
    }

    /// An elapsed window with no labels keeps waiting for one.
    pub fn conclude(&mut self, now: Instant) -> WindowVerdict {
        if !self.is_elapsed(now) {
            return WindowVerdict::Pending;
        }
        let Some((label, count)) = most_common(self.labels.iter().copied()) else {
            return WindowVerdict::Pending;
        };

        if count >= self.threshold {
            WindowVerdict::Confirmed { label, count }
        } else {
            self.started = now;
            self.labels.clear();
            WindowVerdict::LowConfidence { best: label, count }
        }
    }
}
