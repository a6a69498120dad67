//! Frame-driven match flow: countdown, gesture detection, result display.

use std::time::{Duration, Instant};

use chrono::Local;
use crossbeam_channel::{Receiver, TryRecvError};
use rand::{Rng, rngs::SmallRng};

use crate::{
    config::GameConfig,
    game::{RoundContext, RoundRecord, RoundResolver},
    gesture::{DetectionFeedback, DetectionWindow, GestureClassifier, WindowVerdict},
    strategy::OpponentEngine,
    types::{AiMode, Contour, FrameResult, Move, Winner},
};

const COUNTDOWN_STEP: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchPhase {
    Menu,
    CountingDown { remaining: u32 },
    AwaitingGesture,
    RoundResolved { until: Instant },
    MatchOver,
}

/// Audio cue for whoever plays sounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cue {
    Countdown,
    Win,
    Lose,
    Tie,
    Error,
}

impl Cue {
    pub fn frequency_hz(&self) -> u32 {
        match self {
            Cue::Countdown => 440,
            Cue::Win => 880,
            Cue::Lose => 220,
            Cue::Tie => 660,
            Cue::Error => 110,
        }
    }

    fn for_winner(winner: Winner) -> Self {
        match winner {
            Winner::Player => Cue::Win,
            Winner::Computer => Cue::Lose,
            Winner::Tie => Cue::Tie,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    Countdown(u32),
    DetectionStarted,
    Frame(FrameResult),
    Feedback(DetectionFeedback),
    /// The window closed without a clear winner and restarted.
    LowConfidence,
    RoundResolved(RoundRecord),
    MatchOver(Winner),
    Cue(Cue),
}

pub struct GameSession<R: Rng = SmallRng> {
    config: GameConfig,
    classifier: GestureClassifier,
    engine: OpponentEngine<R>,
    resolver: RoundResolver,
    phase: MatchPhase,
    next_count: Instant,
    window: Option<DetectionWindow>,
    detection_opened: Option<Instant>,
    computer_move: Option<Move>,
    keyboard_mode: bool,
    overrides: Option<Receiver<Move>>,
    events: Vec<SessionEvent>,
}

impl GameSession<SmallRng> {
    pub fn new(config: GameConfig, now: Instant) -> Self {
        let engine = OpponentEngine::new(config.ai_mode, config.ai_difficulty);
        Self::with_engine(config, engine, now)
    }
}

impl<R: Rng> GameSession<R> {
    /// Starts in the menu; call `resume` to begin the first countdown.
    pub fn with_engine(config: GameConfig, engine: OpponentEngine<R>, now: Instant) -> Self {
        let resolver = RoundResolver::new(config.max_rounds);
        Self {
            config,
            classifier: GestureClassifier::new(),
            engine,
            resolver,
            phase: MatchPhase::Menu,
            next_count: now,
            window: None,
            detection_opened: None,
            computer_move: None,
            keyboard_mode: false,
            overrides: None,
            events: Vec::new(),
        }
    }

    /// Moves sent on this channel are played as the player's move while a gesture is awaited.
    pub fn with_overrides(mut self, overrides: Receiver<Move>) -> Self {
        self.overrides = Some(overrides);
        self
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn resolver(&self) -> &RoundResolver {
        &self.resolver
    }

    pub fn window(&self) -> Option<&DetectionWindow> {
        self.window.as_ref()
    }

    pub fn keyboard_mode(&self) -> bool {
        self.keyboard_mode
    }

    /// Advances one frame. `contour` is the segmented hand, if any.
    pub fn tick(&mut self, now: Instant, contour: Option<&Contour>) -> Vec<SessionEvent> {
        self.poll_overrides(now);

        match self.phase {
            MatchPhase::Menu | MatchPhase::MatchOver => {}
            MatchPhase::CountingDown { remaining } => self.count_down(now, remaining),
            MatchPhase::AwaitingGesture => self.detect(now, contour),
            MatchPhase::RoundResolved { until } => {
                if now >= until {
                    if self.resolver.state().is_over() {
                        let winner = self.resolver.state().match_winner();
                        log::info!(
                            "match over: {} ({}-{})",
                            winner,
                            self.resolver.state().score.player,
                            self.resolver.state().score.computer
                        );
                        self.phase = MatchPhase::MatchOver;
                        self.events.push(SessionEvent::MatchOver(winner));
                    } else {
                        self.begin_countdown(now);
                    }
                }
            }
        }

        std::mem::take(&mut self.events)
    }

    /// Plays `mv` for the player if a gesture is currently awaited.
    pub fn select_manual(&mut self, mv: Move, now: Instant) -> bool {
        if self.phase != MatchPhase::AwaitingGesture {
            log::debug!("ignoring {mv}: no round is waiting for a move");
            return false;
        }
        self.resolve_round(mv, now);
        true
    }

    pub fn set_keyboard_mode(&mut self, enabled: bool, now: Instant) {
        if self.keyboard_mode == enabled {
            return;
        }
        self.keyboard_mode = enabled;
        log::info!(
            "switched to {} mode",
            if enabled { "keyboard" } else { "gesture detection" }
        );
        if !enabled && self.phase == MatchPhase::AwaitingGesture {
            self.classifier.reset();
            self.window = Some(self.new_window(now));
        }
    }

    /// Leaves the round in progress; the next `resume` starts a fresh countdown.
    pub fn open_menu(&mut self) {
        self.phase = MatchPhase::Menu;
        self.window = None;
        self.detection_opened = None;
        self.computer_move = None;
    }

    pub fn resume(&mut self, now: Instant) {
        if self.resolver.state().is_over() {
            self.restart_match(now);
        } else {
            self.begin_countdown(now);
        }
    }

    /// Zeroes the score. Move and round histories are kept for the opponent.
    pub fn restart_match(&mut self, now: Instant) {
        self.resolver.set_max_rounds(self.config.max_rounds);
        self.resolver.reset_match();
        self.window = None;
        self.computer_move = None;
        self.begin_countdown(now);
    }

    pub fn set_ai_mode(&mut self, mode: AiMode) {
        self.config.ai_mode = mode;
        self.engine.set_mode(mode);
        log::info!("ai mode: {mode}");
    }

    pub fn raise_difficulty(&mut self) {
        self.config.raise_difficulty();
        self.engine.set_difficulty(self.config.ai_difficulty);
    }

    pub fn lower_difficulty(&mut self) {
        self.config.lower_difficulty();
        self.engine.set_difficulty(self.config.ai_difficulty);
    }

    /// Takes effect from the next detection window.
    pub fn lengthen_detection(&mut self) {
        self.config.lengthen_detection();
    }

    pub fn shorten_detection(&mut self) {
        self.config.shorten_detection();
    }

    fn begin_countdown(&mut self, now: Instant) {
        let remaining = self.config.countdown;
        self.window = None;
        self.detection_opened = None;
        if remaining == 0 {
            self.open_detection(now);
            return;
        }
        self.phase = MatchPhase::CountingDown { remaining };
        self.next_count = now + COUNTDOWN_STEP;
        self.events.push(SessionEvent::Countdown(remaining));
    }

    fn count_down(&mut self, now: Instant, remaining: u32) {
        if now < self.next_count {
            return;
        }
        let remaining = remaining.saturating_sub(1);
        self.next_count = now + COUNTDOWN_STEP;
        self.events.push(SessionEvent::Cue(Cue::Countdown));
        if remaining == 0 {
            self.open_detection(now);
        } else {
            self.phase = MatchPhase::CountingDown { remaining };
            self.events.push(SessionEvent::Countdown(remaining));
        }
    }

    fn open_detection(&mut self, now: Instant) {
        // Committed before the player shows anything.
        let computer = self
            .engine
            .choose_move(self.resolver.player_moves(), self.resolver.rounds());
        self.computer_move = Some(computer);
        self.classifier.reset();
        self.window = Some(self.new_window(now));
        self.detection_opened = Some(now);
        self.phase = MatchPhase::AwaitingGesture;
        self.events.push(SessionEvent::DetectionStarted);
    }

    fn new_window(&self, now: Instant) -> DetectionWindow {
        DetectionWindow::new(
            now,
            self.config.detection_window(),
            self.config.gesture_confidence_threshold,
        )
    }

    fn detect(&mut self, now: Instant, contour: Option<&Contour>) {
        if self.keyboard_mode {
            return;
        }
        let Some(window) = self.window.as_mut() else {
            return;
        };

        let frame = self.classifier.analyze_frame(contour);
        let feedback = window.observe(frame.label);
        let verdict = window.conclude(now);
        self.events.push(SessionEvent::Frame(frame));
        if let Some(feedback) = feedback {
            self.events.push(SessionEvent::Feedback(feedback));
        }

        match verdict {
            WindowVerdict::Pending => {}
            WindowVerdict::Confirmed { label, count } => {
                log::debug!("confirmed {label} with {count} detections");
                self.resolve_round(label, now);
            }
            WindowVerdict::LowConfidence { best, count } => {
                log::info!(
                    "unclear gesture: best was {best} with {count}/{} detections",
                    self.config.gesture_confidence_threshold
                );
                self.events.push(SessionEvent::LowConfidence);
                self.events.push(SessionEvent::Cue(Cue::Error));
            }
        }
    }

    fn poll_overrides(&mut self, now: Instant) {
        let Some(overrides) = self.overrides.as_ref() else {
            return;
        };
        loop {
            match overrides.try_recv() {
                Ok(mv) => {
                    if self.phase == MatchPhase::AwaitingGesture {
                        self.resolve_round(mv, now);
                        return;
                    }
                    log::debug!("dropping {mv} received outside detection");
                }
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => {
                    log::warn!("manual move channel closed");
                    self.overrides = None;
                    return;
                }
            }
        }
    }

    fn resolve_round(&mut self, player: Move, now: Instant) {
        let computer = match self.computer_move.take() {
            Some(mv) => mv,
            None => self
                .engine
                .choose_move(self.resolver.player_moves(), self.resolver.rounds()),
        };
        let decision_time = self
            .detection_opened
            .take()
            .map(|opened| now.saturating_duration_since(opened))
            .unwrap_or_default();

        let ctx = RoundContext {
            ai_mode: self.engine.mode(),
            ai_difficulty: self.engine.difficulty(),
            detection_duration: self.config.detection_window(),
            decision_time,
            timestamp: Local::now(),
        };
        let Some(record) = self.resolver.resolve(player, computer, ctx) else {
            self.window = None;
            self.phase = MatchPhase::MatchOver;
            return;
        };
        log::info!(
            "round {}: {} vs {}, {}",
            record.match_progress,
            player,
            computer,
            record.winner.round_message()
        );

        self.window = None;
        self.phase = MatchPhase::RoundResolved {
            until: now + self.config.result_window(),
        };
        self.events.push(SessionEvent::Cue(Cue::for_winner(record.winner)));
        self.events.push(SessionEvent::RoundResolved(record));
    }
}

#[cfg(test)]
mod tests {
    use crossbeam_channel::unbounded;

    use super::*;

    const FRAME: Duration = Duration::from_millis(100);

    fn fist() -> Contour {
        (0..16)
            .map(|i| {
                let angle = i as f64 * std::f64::consts::PI / 8.0;
                crate::types::Point::new(
                    (100.0 * angle.cos()).round() as i32,
                    (100.0 * angle.sin()).round() as i32,
                )
            })
            .collect()
    }

    fn contour(points: &[(i32, i32)]) -> Contour {
        Contour::from(points)
    }

    fn two_fingers() -> Contour {
        contour(&[(0, 0), (100, 0), (100, 200), (50, 100), (0, 200)])
    }

    fn three_fingers() -> Contour {
        contour(&[(0, 0), (200, 0), (200, 200), (150, 100), (100, 210), (50, 100), (0, 200)])
    }

    fn frame_of(events: &[SessionEvent]) -> Option<&FrameResult> {
        events.iter().find_map(|e| match e {
            SessionEvent::Frame(frame) => Some(frame),
            _ => None,
        })
    }

    fn session(now: Instant) -> GameSession {
        let config = GameConfig {
            ai_mode: AiMode::Random,
            max_rounds: 2,
            ..GameConfig::default()
        };
        let engine = OpponentEngine::seeded(config.ai_mode, config.ai_difficulty, 1);
        GameSession::with_engine(config, engine, now)
    }

    /// Ticks every frame until `until`, collecting every event.
    fn run(
        session: &mut GameSession,
        from: Instant,
        until: Duration,
        contour: Option<&Contour>,
    ) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        let mut now = from;
        while now <= from + until {
            events.extend(session.tick(now, contour));
            now += FRAME;
        }
        events
    }

    #[test]
    fn countdown_then_detection() {
        let start = Instant::now();
        let mut session = session(start);
        assert_eq!(session.phase(), MatchPhase::Menu);

        session.resume(start);
        let events = run(&mut session, start, Duration::from_millis(2950), None);
        let counts: Vec<u32> = events
            .iter()
            .filter_map(|e| match e {
                SessionEvent::Countdown(n) => Some(*n),
                _ => None,
            })
            .collect();
        assert_eq!(counts, vec![3, 2, 1]);
        assert!(matches!(session.phase(), MatchPhase::CountingDown { remaining: 1 }));

        let events = session.tick(start + Duration::from_secs(3), None);
        assert!(events.contains(&SessionEvent::DetectionStarted));
        assert_eq!(session.phase(), MatchPhase::AwaitingGesture);
    }

    #[test]
    fn held_fist_resolves_as_rock() {
        let start = Instant::now();
        let mut session = session(start);
        session.resume(start);
        let opened = start + Duration::from_secs(3);
        run(&mut session, start, Duration::from_secs(3), None);
        assert_eq!(session.phase(), MatchPhase::AwaitingGesture);

        let fist = fist();
        let events = run(&mut session, opened + FRAME, Duration::from_secs(3), Some(&fist));
        let record = events
            .iter()
            .find_map(|e| match e {
                SessionEvent::RoundResolved(record) => Some(record.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(record.player_move, Move::Rock);
        assert_eq!(record.round_number, 1);
        assert!(record.decision_time >= 3.0);
        assert!(events.contains(&SessionEvent::Feedback(DetectionFeedback::Stable(Move::Rock))));
        assert!(matches!(session.phase(), MatchPhase::RoundResolved { .. }));
    }

    #[test]
    fn each_window_starts_with_fresh_finger_history() {
        let start = Instant::now();
        let mut session = session(start);
        session.resume(start);

        let scissors = two_fingers();
        let mut now = start;
        for _ in 0..200 {
            if session.resolver().rounds().len() == 1 {
                break;
            }
            let hand = (session.phase() == MatchPhase::AwaitingGesture).then_some(&scissors);
            session.tick(now, hand);
            now += FRAME;
        }
        assert_eq!(session.resolver().rounds().last().unwrap().player_move, Move::Scissors);
        assert!(!session.classifier.history().is_empty());

        for _ in 0..200 {
            if session.phase() == MatchPhase::AwaitingGesture {
                break;
            }
            session.tick(now, None);
            now += FRAME;
        }
        assert_eq!(session.phase(), MatchPhase::AwaitingGesture);
        assert!(session.classifier.history().is_empty());

        let events = session.tick(now, Some(&three_fingers()));
        let frame = frame_of(&events).unwrap();
        assert_eq!(frame.raw_fingers, Some(3));
        assert_eq!(frame.smoothed_fingers, frame.raw_fingers);
        assert_eq!(frame.label, Some(Move::Paper));
    }

    #[test]
    fn low_confidence_restart_keeps_finger_history() {
        let start = Instant::now();
        let config = GameConfig {
            detection_duration: 0.5,
            gesture_confidence_threshold: 50,
            ..GameConfig::default()
        };
        let engine = OpponentEngine::seeded(AiMode::Random, 0.7, 2);
        let mut session = GameSession::with_engine(config, engine, start);
        session.resume(start);
        run(&mut session, start, Duration::from_secs(3), None);
        assert_eq!(session.phase(), MatchPhase::AwaitingGesture);

        let hand = two_fingers();
        let mut now = start + Duration::from_secs(3) + FRAME;
        let mut restarted = false;
        for _ in 0..20 {
            let before = session.classifier.history().len();
            let events = session.tick(now, Some(&hand));
            now += FRAME;
            if events.contains(&SessionEvent::LowConfidence) {
                assert_eq!(session.classifier.history().len(), before + 1);
                assert!(session.window().unwrap().labels().is_empty());
                restarted = true;
                break;
            }
        }
        assert!(restarted);

        let events = session.tick(now, Some(&hand));
        let frame = frame_of(&events).unwrap();
        assert_eq!(session.window().unwrap().labels().len(), 1);
        assert!(session.classifier.history().len() > 1);
        assert_eq!(frame.smoothed_fingers, Some(2));
    }

    #[test]
    fn missing_hand_keeps_window_open() {
        let start = Instant::now();
        let mut session = session(start);
        session.resume(start);
        run(&mut session, start, Duration::from_secs(3), None);

        let events = run(&mut session, start + Duration::from_secs(3), Duration::from_secs(6), None);
        assert!(events.contains(&SessionEvent::Feedback(DetectionFeedback::NoHand)));
        assert!(!events.iter().any(|e| matches!(e, SessionEvent::RoundResolved(_))));
        assert_eq!(session.phase(), MatchPhase::AwaitingGesture);
    }

    #[test]
    fn keyboard_override_resolves_and_match_ends() {
        let start = Instant::now();
        let (tx, rx) = unbounded();
        let mut session = session(start).with_overrides(rx);
        session.set_keyboard_mode(true, start);
        session.resume(start);

        let mut now = start;
        let mut finished = None;
        for _ in 0..200 {
            if session.phase() == MatchPhase::AwaitingGesture {
                tx.send(Move::Paper).unwrap();
            }
            for event in session.tick(now, None) {
                if let SessionEvent::MatchOver(winner) = event {
                    finished = Some(winner);
                }
            }
            now += FRAME;
        }

        assert!(finished.is_some());
        assert_eq!(session.phase(), MatchPhase::MatchOver);
        assert_eq!(session.resolver().rounds().len(), 2);
        assert!(session.resolver().rounds().iter().all(|r| r.player_move == Move::Paper));

        session.resume(now);
        assert!(matches!(session.phase(), MatchPhase::CountingDown { .. }));
        assert_eq!(session.resolver().state().rounds_played, 0);
        assert_eq!(session.resolver().player_moves().len(), 2);
    }

    #[test]
    fn manual_selection_outside_detection_is_ignored() {
        let start = Instant::now();
        let mut session = session(start);
        assert!(!session.select_manual(Move::Rock, start));
        session.resume(start);
        assert!(!session.select_manual(Move::Rock, start));

        run(&mut session, start, Duration::from_secs(3), None);
        assert!(session.select_manual(Move::Scissors, start + Duration::from_secs(4)));
        let record = session.resolver().rounds().last().unwrap();
        assert_eq!(record.player_move, Move::Scissors);
        assert_eq!(record.decision_time, 1.0);
    }

    #[test]
    fn menu_discards_round_in_progress() {
        let start = Instant::now();
        let mut session = session(start);
        session.resume(start);
        run(&mut session, start, Duration::from_secs(3), None);
        assert!(session.window().is_some());

        session.open_menu();
        assert_eq!(session.phase(), MatchPhase::Menu);
        assert!(session.window().is_none());
        assert!(session.tick(start + Duration::from_secs(10), None).is_empty());
    }

    #[test]
    fn settings_commands_update_engine_and_config() {
        let start = Instant::now();
        let mut session = session(start);
        session.set_ai_mode(AiMode::Adaptive);
        session.raise_difficulty();
        session.shorten_detection();
        assert_eq!(session.config().ai_mode, AiMode::Adaptive);
        assert_eq!(session.config().ai_difficulty, 0.8);
        assert_eq!(session.config().detection_duration, 2.5);
        assert_eq!(Cue::Win.frequency_hz(), 880);
    }
}
