use std::time::{Duration, Instant};

use crossbeam_channel::unbounded;
use rps_vision::{
    AiMode, Contour, GameConfig, GameSession, MatchPhase, Move, OpponentEngine, Point,
    SessionEvent, Winner, records,
    stats::MatchStats,
};

const FRAME: Duration = Duration::from_millis(50);

fn two_fingers() -> Contour {
    [(0, 0), (100, 0), (100, 200), (50, 100), (0, 200)]
        .into_iter()
        .map(Point::from)
        .collect()
}

fn config(max_rounds: u32) -> GameConfig {
    GameConfig {
        ai_mode: AiMode::Pattern,
        ai_difficulty: 1.0,
        detection_duration: 1.0,
        max_rounds,
        ..GameConfig::default()
    }
}

/// Ticks with `contour` until the match ends or `limit` passes.
fn play_out(
    session: &mut GameSession,
    mut now: Instant,
    limit: Duration,
    contour: Option<&Contour>,
) -> Vec<SessionEvent> {
    let end = now + limit;
    let mut events = Vec::new();
    while now < end && session.phase() != MatchPhase::MatchOver {
        events.extend(session.tick(now, contour));
        now += FRAME;
    }
    events
}

#[test]
fn gesture_match_runs_to_completion() {
    let start = Instant::now();
    let engine = OpponentEngine::seeded(AiMode::Pattern, 1.0, 21);
    let mut session = GameSession::with_engine(config(3), engine, start);
    session.resume(start);

    let hand = two_fingers();
    let events = play_out(&mut session, start, Duration::from_secs(60), Some(&hand));
    assert_eq!(session.phase(), MatchPhase::MatchOver);

    let resolved: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::RoundResolved(record) => Some(record),
            _ => None,
        })
        .collect();
    assert_eq!(resolved.len(), 3);
    assert!(resolved.iter().all(|r| r.player_move == Move::Scissors));
    assert_eq!(
        resolved.iter().map(|r| r.match_progress.as_str()).collect::<Vec<_>>(),
        vec!["1/3", "2/3", "3/3"]
    );
    assert!(resolved.iter().all(|r| r.detection_duration == 1.0));
    assert_eq!(resolved[2].previous_player_move, Some(Move::Scissors));

    let state = session.resolver().state();
    let over = events.iter().find_map(|e| match e {
        SessionEvent::MatchOver(winner) => Some(*winner),
        _ => None,
    });
    assert_eq!(over, Some(state.match_winner()));
    assert_eq!(events.iter().filter(|e| **e == SessionEvent::DetectionStarted).count(), 3);
}

#[test]
fn pattern_opponent_learns_across_matches() {
    let start = Instant::now();
    let engine = OpponentEngine::seeded(AiMode::Pattern, 1.0, 3);
    let (tx, rx) = unbounded();
    let mut session = GameSession::with_engine(config(5), engine, start).with_overrides(rx);
    session.set_keyboard_mode(true, start);
    session.resume(start);

    let mut now = start;
    for _ in 0..3 {
        while session.phase() != MatchPhase::MatchOver {
            if session.phase() == MatchPhase::AwaitingGesture {
                tx.send(Move::Rock).unwrap();
            }
            session.tick(now, None);
            now += FRAME;
        }
        session.restart_match(now);
    }

    let rounds = session.resolver().rounds().rounds();
    assert_eq!(rounds.len(), 15);
    assert_eq!(rounds[14].round_number, 5);
    // After three rocks the repeat detector answers with paper every time.
    assert!(rounds[3..].iter().all(|r| r.computer_move == Move::Paper));
    assert!(rounds[3..].iter().all(|r| r.winner == Winner::Computer));

    let stats = MatchStats::from_rounds(rounds);
    assert_eq!(stats.moves(Move::Rock).percent, 100);
    assert!(stats.longest_computer_streak >= 12);
    assert!(stats.summary_lines().iter().any(|l| l.starts_with("Pattern: ")));

    let mut csv = Vec::new();
    records::write_csv(&mut csv, rounds).unwrap();
    assert_eq!(String::from_utf8(csv).unwrap().lines().count(), 16);
}

#[test]
fn unclear_gesture_restarts_detection() {
    let start = Instant::now();
    let engine = OpponentEngine::seeded(AiMode::Random, 1.0, 1);
    let config = GameConfig {
        gesture_confidence_threshold: 50,
        ..config(1)
    };
    let mut session = GameSession::with_engine(config, engine, start);
    session.resume(start);

    let hand = two_fingers();
    let events = play_out(&mut session, start, Duration::from_secs(6), Some(&hand));
    assert!(events.contains(&SessionEvent::LowConfidence));
    assert!(!events.iter().any(|e| matches!(e, SessionEvent::RoundResolved(_))));
    assert_eq!(session.phase(), MatchPhase::AwaitingGesture);
    assert!(session.window().unwrap().labels().len() < 50);
}
