use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use bunnycrush_engine::InputEvent;
use bunnycrush_sim::components::{CascadeMode, ScoreMode};
use bunnycrush_sim::systems::cascade::Rng;
use bunnycrush_sim::{Frontend, GameConfig, GamePhase};
use clap::{ArgAction, Parser, ValueEnum};

#[derive(Parser)]
#[command(name = "bunnycrush", version, about = "Plays Bunny Crush headless with random clicks and prints the board")]
struct Cli {
    /// Grid width (columns)
    width: usize,
    /// Grid height (rows)
    height: usize,
    /// Bunny model file. Checked for readability, never parsed.
    model: PathBuf,
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Frames to simulate
    #[arg(long, default_value_t = 600)]
    frames: u32,
    #[arg(long, value_enum, default_value_t = ScoreArg::PerRun)]
    score_mode: ScoreArg,
    #[arg(long, value_enum, default_value_t = CascadeArg::InPlace)]
    cascade_mode: CascadeArg,
    /// More logging (repeatable)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
    /// Less logging (repeatable)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "verbose")]
    quiet: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ScoreArg {
    /// A cell in a row run and a column run scores twice
    PerRun,
    /// Every matched cell scores once
    PerCell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CascadeArg {
    InPlace,
    Gravity,
}

impl From<ScoreArg> for ScoreMode {
    fn from(arg: ScoreArg) -> Self {
        match arg {
            ScoreArg::PerRun => ScoreMode::PerRunMembership,
            ScoreArg::PerCell => ScoreMode::PerCell,
        }
    }
}

impl From<CascadeArg> for CascadeMode {
    fn from(arg: CascadeArg) -> Self {
        match arg {
            CascadeArg::InPlace => CascadeMode::InPlace,
            CascadeArg::Gravity => CascadeMode::Gravity,
        }
    }
}

/// Default `env_logger` filter for the given -v / -q counts.
fn log_filter(verbose: u8, quiet: u8) -> &'static str {
    match 2 + verbose as i32 - quiet as i32 {
        i32::MIN..=0 => "error",
        1 => "warn",
        2 => "info",
        3 => "debug",
        _ => "trace",
    }
}

fn check_model(path: &Path) -> Result<()> {
    let file = File::open(path).with_context(|| format!("cannot open model file {}", path.display()))?;
    let meta = file
        .metadata()
        .with_context(|| format!("cannot stat model file {}", path.display()))?;
    if !meta.is_file() {
        bail!("{} is not a regular file", path.display());
    }
    log::debug!("model file {} ({} bytes)", path.display(), meta.len());
    Ok(())
}

fn run(cli: &Cli) -> Result<Frontend> {
    check_model(&cli.model)?;

    let config = GameConfig::new(cli.height, cli.width, cli.seed)
        .with_score_mode(cli.score_mode.into())
        .with_cascade_mode(cli.cascade_mode.into());
    let mut frontend = Frontend::new(config).context("cannot start a game")?;

    let rows = frontend.session.grid.rows as u32;
    let cols = frontend.session.grid.cols as u32;
    let mut rng = Rng::new(cli.seed.rotate_left(32) ^ 0x9E37_79B9_7F4A_7C15);

    for frame in 0..cli.frames {
        if frontend.session.phase() == GamePhase::Idle {
            let row = rng.next_int(rows) as usize;
            let col = rng.next_int(cols) as usize;
            let (x, y) = frontend.picker.cell_center(row, col);
            frontend.push(InputEvent::PointerDown { x, y });
        }
        if let Err(err) = frontend.frame() {
            log::error!("frame {frame}: {err}");
            return Err(err).with_context(|| format!("game logic failed on frame {frame}"));
        }
        if frontend.quit_requested() {
            break;
        }
    }
    Ok(frontend)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_filter(cli.verbose, cli.quiet)))
        .init();

    let frontend = run(&cli)?;
    log::info!("finished in phase {:?}", frontend.session.phase());
    println!("{}", frontend.session.overlay_text());
    print!("{}", frontend.session.board_text());
    Ok(())
}
