use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use quizgrid_client::*;
use quizgrid_core::{Board, GameRules, GameSize, LeadDisplay, Outcome, PlayerScore, score_lead};

#[derive(Parser, Debug)]
#[command(version, about = "Plays a quizgrid game between simulated players", long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    #[arg(long, default_value_t = 5)]
    rows: u8,

    #[arg(long, default_value_t = 5)]
    cols: u8,

    /// Number of players, at most 5
    #[arg(short, long, default_value_t = 2)]
    players: u8,

    /// Force a seed instead of random
    #[arg(short, long)]
    seed: Option<u64>,

    /// TOML file overriding the game rules
    #[arg(long)]
    rules: Option<PathBuf>,

    /// JSON question bank to use instead of the bundled one
    #[arg(long)]
    questions: Option<PathBuf>,

    /// Replace questions with a fixed one the bots always answer correctly
    #[arg(long)]
    test_mode: bool,

    /// Chance that a bot answers correctly
    #[arg(long, default_value_t = 0.7)]
    accuracy: f64,

    /// Simulated milliseconds per round
    #[arg(long, default_value_t = 250)]
    step_ms: i64,

    #[arg(long, default_value_t = 50_000)]
    max_rounds: u32,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_default_env()
        .filter_level(args.verbose.log_level_filter())
        .init();

    let seed = args.seed.unwrap_or_else(rand::random);
    log::debug!("seed: {seed}");

    let rules = match &args.rules {
        Some(path) => {
            let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            toml::from_str::<GameRules>(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => GameRules::default(),
    };
    let bank = load_bank(args.questions.as_deref())?;

    let config = SimulationConfig {
        session: SessionConfig {
            rules,
            test_mode: args.test_mode,
        },
        bot: BotConfig {
            accuracy: args.accuracy,
            ..BotConfig::default()
        },
        seed,
        step_ms: args.step_ms,
    };
    let size = GameSize::new(args.rows, args.cols);
    let mut sim = Simulation::start(config, bank, size, args.players)?;
    let finished = sim.run(args.max_rounds);

    let view = sim.view().context("the game was not created")?;
    println!("{}", render_board(&view.last_board));
    for score in &view.last_scores {
        println!("{}", render_score(&view.last_scores, score));
    }
    println!(
        "{} moves, {} questions in {} rounds",
        view.snapshot.moves.len(),
        view.snapshot.questions.len(),
        sim.rounds()
    );

    if !finished {
        println!("Stopped after {} rounds", args.max_rounds);
        return Ok(());
    }
    match &view.outcome {
        Outcome::Draw => println!("Draw"),
        Outcome::Winners(winners) if winners.len() == 1 => println!("Player {} wins", winners[0]),
        Outcome::Winners(winners) => {
            let names: Vec<String> = winners.iter().map(ToString::to_string).collect();
            println!("Players {} win", names.join(", "));
        }
        Outcome::InProgress => {}
    }
    Ok(())
}

/// One row per board row; owned cells show `owner:value`, free ones `.`.
fn render_board(board: &Board) -> String {
    let size = board.size();
    (0..size.rows)
        .map(|x| {
            (0..size.cols)
                .map(|y| match board[(x, y)] {
                    quizgrid_core::Cell {
                        owner: Some(owner),
                        value,
                        ..
                    } => format!("{owner}:{:<3}", value.unwrap_or_default()),
                    _ => format!("{:<5}", "."),
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_score(scores: &[PlayerScore], score: &PlayerScore) -> String {
    let lead = score_lead(scores, score.player)
        .map(|lead| format!(" ({})", LeadDisplay(lead)))
        .unwrap_or_default();
    format!(
        "player {}: {} points, {} cells{lead}",
        score.player, score.score, score.moves
    )
}
