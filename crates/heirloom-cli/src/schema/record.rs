use std::{collections::BTreeSet, path::Path};

use chrono::{DateTime, Utc};
use heirloom_engine::{AchievementId, ItemOutcome, RoundResult, RoundSeed, RoundSession};
use serde::Serialize;

use crate::util::Output;

/// A finished round, written for the player's own inspection.
#[derive(Debug, Clone, Serialize)]
pub struct RoundRecord {
    /// Timestamp when the record was created (ISO 8601 format)
    pub recorded_at: DateTime<Utc>,
    /// Seed the items were dealt with; replaying it deals the same round
    pub seed: RoundSeed,
    pub player: PlayerInfo,
    pub result: RoundResult,
    /// Achievements the round earned, sorted by id
    pub achievements: BTreeSet<AchievementId>,
    /// Per-item outcomes in the order they were judged
    pub outcomes: Vec<ItemOutcome>,
}

/// Who played the round.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlayerInfo {
    /// A person at the terminal
    Manual,
    /// The auto-play simulation with its parameters
    Simulated {
        accuracy: f64,
        mean_response_secs: f64,
    },
}

impl RoundRecord {
    /// Builds the record of a session that reached results.
    pub fn new(
        seed: RoundSeed,
        player: PlayerInfo,
        session: &RoundSession,
        achievements: BTreeSet<AchievementId>,
    ) -> Option<Self> {
        Some(Self {
            recorded_at: Utc::now(),
            seed,
            player,
            result: session.result()?.clone(),
            achievements,
            outcomes: session.state().outcomes().to_vec(),
        })
    }

    /// Writes the record into `record_dir` under a timestamped file name.
    pub fn save(&self, record_dir: &Path) -> anyhow::Result<()> {
        let prefix = match &self.player {
            PlayerInfo::Manual => "manual",
            PlayerInfo::Simulated { .. } => "simulated",
        };
        let filename = format!(
            "{prefix}_{}_{}.json",
            self.result.variant,
            self.recorded_at.format("%Y%m%d_%H%M%S")
        );
        let path = record_dir.join(filename);
        Output::create(path.clone())?.write_json(self)?;
        eprintln!("Saved round record to {}", path.display());
        Ok(())
    }
}
