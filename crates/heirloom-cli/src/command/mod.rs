use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use heirloom_engine::{
    DifficultyTable, GameVariant, RoundOptions, RoundSeed, Tier, source::FamilyArchive,
};
use tracing_subscriber::EnvFilter;

use crate::util;

use self::{auto_play::AutoPlayArg, play::PlayArg, profiles::ProfilesArg};

mod auto_play;
mod play;
mod profiles;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Raise log verbosity (-v debug, -vv trace); `RUST_LOG` takes precedence
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Play a round interactively in the terminal
    Play(#[clap(flatten)] PlayArg),
    /// Play rounds with a simulated player and record the results
    AutoPlay(#[clap(flatten)] AutoPlayArg),
    /// Print the resolved difficulty profile of every variant and tier
    Profiles(#[clap(flatten)] ProfilesArg),
}

/// Options shared by every command that plays a round.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct RoundArg {
    /// Family archive to deal items from (JSON format)
    #[arg(long)]
    archive: PathBuf,
    /// Game to play: matching, recognition, story or sequencing
    #[arg(long)]
    variant: GameVariant,
    /// Difficulty: easy, medium, hard or adaptive (unknown names fall back to medium)
    #[arg(long, default_value = "medium")]
    tier: Tier,
    /// Seed for dealing, as 32 hex digits (random when omitted)
    #[arg(long)]
    seed: Option<RoundSeed>,
    /// Seconds a hint takes off the clock
    #[arg(long, default_value_t = RoundOptions::default().hint_penalty_secs)]
    hint_penalty: u32,
    /// Difficulty table overriding the built-in one (JSON format)
    #[arg(long)]
    difficulty_table: Option<PathBuf>,
}

impl RoundArg {
    fn load_archive(&self) -> anyhow::Result<FamilyArchive> {
        util::read_json_file("archive", &self.archive)
    }

    fn load_table(&self) -> anyhow::Result<DifficultyTable> {
        util::load_difficulty_table(self.difficulty_table.as_deref())
    }

    fn options(&self) -> RoundOptions {
        RoundOptions {
            hint_penalty_secs: self.hint_penalty,
        }
    }

    fn seed(&self) -> RoundSeed {
        self.seed.unwrap_or_else(rand::random)
    }
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    init_tracing(args.verbose);
    match args.mode {
        Mode::Play(arg) => play::run(&arg)?,
        Mode::AutoPlay(arg) => auto_play::run(&arg)?,
        Mode::Profiles(arg) => profiles::run(&arg)?,
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "warn,heirloom_engine=debug,heirloom=debug",
            _ => "warn,heirloom_engine=trace,heirloom=trace",
        })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
