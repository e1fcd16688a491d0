use std::path::PathBuf;

use heirloom_engine::{DifficultyProfile, GameVariant, Tier};

use crate::util::{self, Output};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ProfilesArg {
    /// Difficulty table overriding the built-in one (JSON format)
    #[arg(long)]
    difficulty_table: Option<PathBuf>,
    /// Output file path (stdout when omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &ProfilesArg) -> anyhow::Result<()> {
    let ProfilesArg {
        difficulty_table,
        output,
    } = arg;

    let table = util::load_difficulty_table(difficulty_table.as_deref())?;
    let profiles: Vec<DifficultyProfile> = GameVariant::ALL
        .into_iter()
        .flat_map(|variant| Tier::ALL.map(|tier| table.resolve(tier, variant)))
        .collect();
    Output::save_json(&profiles, output.clone())
}
