use std::{
    fs,
    io::{self, BufRead, Read},
    path::PathBuf,
    thread,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use crossbeam_channel::{Sender, bounded, select, unbounded};
use rps_vision::{
    AiMode, Contour, GameConfig, GameSession, GestureClassifier, Move, SessionEvent,
    geometry, records,
    stats::MatchStats,
    strategy::{self, PlayerProfile},
};

const FRAME: Duration = Duration::from_millis(33);

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Play a match in the terminal, typing r, p or s each round")]
    Play {
        #[command(flatten)]
        settings: Settings,
        /// Dump the round log to stdout when the session ends.
        #[arg(long, value_enum)]
        export: Option<Export>,
    },
    #[command(about = "Pit every AI mode against scripted players")]
    Simulate {
        #[arg(long, default_value_t = 1000)]
        sequences: usize,
        #[arg(long, default_value_t = 30)]
        rounds: usize,
        #[arg(long, default_value_t = 1.0)]
        difficulty: f64,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Add players with no habit at all.
        #[arg(long)]
        uniform: bool,
        #[arg(long)]
        json: bool,
    },
    #[command(about = "Classify a contour given as whitespace separated x,y pairs")]
    Classify {
        /// Reads stdin when omitted.
        input: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct Settings {
    /// JSON file with game settings.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    mode: Option<AiMode>,
    #[arg(long)]
    difficulty: Option<f64>,
    #[arg(long)]
    rounds: Option<u32>,
    /// Seconds.
    #[arg(long)]
    detection: Option<f64>,
}

impl Settings {
    fn resolve(&self) -> Result<GameConfig> {
        let mut config = match &self.config {
            Some(path) => GameConfig::load(path)?,
            None => GameConfig::default(),
        };
        if let Some(mode) = self.mode {
            config.ai_mode = mode;
        }
        if let Some(difficulty) = self.difficulty {
            config.ai_difficulty = difficulty;
        }
        if let Some(rounds) = self.rounds {
            config.max_rounds = rounds;
        }
        if let Some(detection) = self.detection {
            config.detection_duration = detection;
        }
        config.validate().context("invalid command line settings")?;
        Ok(config)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Export {
    Json,
    Csv,
}

/// Non-move keys typed during play.
enum Input {
    Quit,
    Menu,
    Resume,
    NewMatch,
    Mode(AiMode),
    Harder,
    Easier,
    Longer,
    Shorter,
    Stats,
}

impl Input {
    fn parse(line: &str) -> Option<Self> {
        Some(match line {
            "q" | "quit" => Input::Quit,
            "m" => Input::Menu,
            "c" => Input::Resume,
            "n" => Input::NewMatch,
            "1" => Input::Mode(AiMode::Random),
            "2" => Input::Mode(AiMode::Counter),
            "3" => Input::Mode(AiMode::Pattern),
            "4" => Input::Mode(AiMode::Adaptive),
            "+" | "=" => Input::Harder,
            "-" | "_" => Input::Easier,
            ">" => Input::Longer,
            "<" => Input::Shorter,
            "t" => Input::Stats,
            _ => return None,
        })
    }
}

fn main() -> Result<()> {
    env_logger::init();

    match Cli::parse().command {
        Command::Play { settings, export } => play(settings.resolve()?, export),
        Command::Simulate {
            sequences,
            rounds,
            difficulty,
            seed,
            uniform,
            json,
        } => simulate(sequences, rounds, difficulty, seed, uniform, json),
        Command::Classify { input } => classify(input),
    }
}

fn play(config: GameConfig, export: Option<Export>) -> Result<()> {
    let started = Local::now();
    let (move_tx, move_rx) = unbounded();
    let (input_tx, input_rx) = bounded(16);
    spawn_stdin_reader(move_tx, input_tx);

    println!("{}", help_text());
    for mv in Move::ALL {
        println!("  {} {}: {}", mv.emoji(), mv.display_name(), mv.tip());
    }
    let mut session = GameSession::new(config, Instant::now()).with_overrides(move_rx);
    session.set_keyboard_mode(true, Instant::now());
    session.resume(Instant::now());

    loop {
        let input = select! {
            recv(input_rx) -> input => match input {
                Ok(input) => Some(input),
                // Stdin closed.
                Err(_) => Some(Input::Quit),
            },
            default(FRAME) => None,
        };

        let now = Instant::now();
        match input {
            Some(Input::Quit) => break,
            Some(Input::Menu) => {
                session.open_menu();
                println!("Menu: c to continue, n for a new match, 1-4 AI mode, +/- difficulty, </> detection time, t for stats, q to quit");
            }
            Some(Input::Resume) => session.resume(now),
            Some(Input::NewMatch) => session.restart_match(now),
            Some(Input::Mode(mode)) => {
                session.set_ai_mode(mode);
                println!("AI mode: {} ({})", mode.display_name(), mode.description());
            }
            Some(Input::Harder) => {
                session.raise_difficulty();
                println!("AI difficulty: {:.1}", session.config().ai_difficulty);
            }
            Some(Input::Easier) => {
                session.lower_difficulty();
                println!("AI difficulty: {:.1}", session.config().ai_difficulty);
            }
            Some(Input::Longer) => {
                session.lengthen_detection();
                println!("Detection time: {}s", session.config().detection_duration);
            }
            Some(Input::Shorter) => {
                session.shorten_detection();
                println!("Detection time: {}s", session.config().detection_duration);
            }
            Some(Input::Stats) => {
                print_stats(&MatchStats::from_rounds(session.resolver().rounds().rounds()));
            }
            None => {}
        }

        for event in session.tick(now, None) {
            report(&event);
        }
    }

    let rounds = session.resolver().rounds().rounds();
    match export {
        Some(Export::Json) => {
            let log = records::SessionLog::new(started).with_rounds(rounds);
            records::write_json(io::stdout().lock(), &log).context("failed to write session log")?;
            println!();
        }
        Some(Export::Csv) => {
            records::write_csv(io::stdout().lock(), rounds).context("failed to write round csv")?;
        }
        None => {}
    }
    Ok(())
}

/// Moves go to the session's override channel, everything else to `inputs`.
fn spawn_stdin_reader(moves: Sender<Move>, inputs: Sender<Input>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    log::warn!("stdin read failed: {err}");
                    break;
                }
            };
            let line = line.trim().to_ascii_lowercase();
            if line.is_empty() {
                continue;
            }
            if let Ok(mv) = line.parse::<Move>() {
                if moves.send(mv).is_err() {
                    break;
                }
            } else if let Some(input) = Input::parse(&line) {
                if inputs.send(input).is_err() {
                    break;
                }
            } else {
                println!("Unknown input `{line}`. {}", help_text());
            }
        }
        log::debug!("stdin reader finished");
    });
}

fn help_text() -> &'static str {
    "Type r, p or s (rock, paper, scissors) when asked. m opens the menu, q quits."
}

fn report(event: &SessionEvent) {
    match event {
        SessionEvent::Countdown(n) => println!("{n}..."),
        SessionEvent::DetectionStarted => println!("Your move! (r / p / s)"),
        SessionEvent::Frame(frame) => log::trace!("{}", frame.display_text()),
        SessionEvent::Feedback(feedback) => log::debug!("{}", feedback.message()),
        SessionEvent::LowConfidence => println!("Unclear gesture. Please try again."),
        SessionEvent::RoundResolved(record) => println!(
            "{} You chose {} {}, computer chose {} {}. Score {}-{} ({})",
            record.winner.round_message(),
            record.player_move.emoji(),
            record.player_move,
            record.computer_move.emoji(),
            record.computer_move,
            record.player_score,
            record.computer_score,
            record.match_progress
        ),
        SessionEvent::MatchOver(winner) => {
            println!("{} n for a new match, t for stats, q to quit.", winner.match_message())
        }
        SessionEvent::Cue(cue) => log::trace!("cue at {} Hz", cue.frequency_hz()),
    }
}

fn print_stats(stats: &MatchStats) {
    for line in stats.summary_lines() {
        println!("  {line}");
    }
}

fn simulate(
    sequences: usize,
    rounds: usize,
    difficulty: f64,
    seed: u64,
    uniform: bool,
    json: bool,
) -> Result<()> {
    let mut profiles = PlayerProfile::PREDICTABLE.to_vec();
    if uniform {
        profiles.push(PlayerProfile::Uniform);
    }
    log::info!(
        "simulating against {}",
        profiles.iter().map(PlayerProfile::label).collect::<Vec<_>>().join(", ")
    );

    let reports: Vec<(AiMode, strategy::SimulationReport)> = AiMode::ALL
        .into_iter()
        .map(|mode| (mode, strategy::simulate(mode, difficulty, &profiles, sequences, rounds, seed)))
        .collect();

    if json {
        let value: serde_json::Map<String, serde_json::Value> = reports
            .iter()
            .map(|(mode, report)| Ok((mode.key().to_string(), serde_json::to_value(report)?)))
            .collect::<serde_json::Result<_>>()?;
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{:<10} {:>8} {:>8} {:>8} {:>10}", "mode", "wins", "losses", "ties", "win rate");
    for (mode, report) in reports {
        println!(
            "{:<10} {:>8} {:>8} {:>8} {:>10.3}",
            mode.key(),
            report.computer_wins,
            report.player_wins,
            report.ties,
            report.decisive_win_rate()
        );
    }
    Ok(())
}

fn classify(input: Option<PathBuf>) -> Result<()> {
    let text = match &input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read contour from {}", path.display()))?,
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read contour from stdin")?;
            text
        }
    };
    let contour: Contour = text.parse().context("Failed to parse contour")?;

    let shape = geometry::analyze(&contour).context("Contour is not a usable hand shape")?;
    println!("points:      {}", contour.len());
    println!("area:        {:.1}", shape.features.area);
    println!("hull area:   {:.1}", shape.features.hull_area);
    println!("perimeter:   {:.1}", shape.features.perimeter);
    println!("solidity:    {:.3}", shape.features.solidity);
    println!("circularity: {:.3}", shape.features.circularity);
    println!("defects:     {} ({} valleys)", shape.defects.len(), shape.valleys());

    let frame = GestureClassifier::new().analyze_frame(Some(&contour));
    println!("{}", frame.display_text());
    Ok(())
}
