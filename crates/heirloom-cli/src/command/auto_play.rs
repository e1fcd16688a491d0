use std::{cell::RefCell, collections::BTreeSet, path::PathBuf};

use anyhow::Context as _;
use heirloom_engine::{
    AchievementId, AnswerPayload, Command, GameHost, ItemId, Phase, PlayStep, RoundItem,
    RoundSession,
};
use rand::{Rng as _, SeedableRng as _, rngs::StdRng, seq::IndexedRandom as _};
use rand_distr::{Distribution as _, Normal};

use crate::{
    command::RoundArg,
    schema::record::{PlayerInfo, RoundRecord},
    util::Output,
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct AutoPlayArg {
    #[clap(flatten)]
    round: RoundArg,
    /// Number of rounds to play
    #[arg(long, default_value_t = 10)]
    rounds: usize,
    /// Probability of answering an item correctly
    #[arg(long, default_value_t = 0.8)]
    accuracy: f64,
    /// Mean seconds the player takes to answer
    #[arg(long, default_value_t = 3.0)]
    mean_response: f64,
    /// Seed for the player's behaviour (random when omitted)
    #[arg(long)]
    player_seed: Option<u64>,
    /// Output file path for the round records (stdout when omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

/// Answers with a fixed accuracy after a normally distributed delay.
#[derive(Debug)]
struct SimulatedPlayer {
    accuracy: f64,
    response: Normal<f64>,
    rng: StdRng,
}

impl SimulatedPlayer {
    fn new(accuracy: f64, mean_response: f64, seed: Option<u64>) -> anyhow::Result<Self> {
        anyhow::ensure!(
            (0.0..=1.0).contains(&accuracy),
            "accuracy must be between 0 and 1, got {accuracy}"
        );
        let response = Normal::new(mean_response, mean_response / 3.0)
            .with_context(|| format!("Invalid mean response time: {mean_response}"))?;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        Ok(Self {
            accuracy,
            response,
            rng,
        })
    }

    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn response_secs(&mut self) -> u32 {
        let secs = self.response.sample(&mut self.rng).round();
        secs.clamp(0.0, 600.0) as u32
    }

    fn commands(&mut self, session: &RoundSession) -> Vec<Command> {
        if let Phase::Playing(PlayStep::StoryReview { .. }) = session.phase() {
            return vec![Command::ContinueStory];
        }
        let correct = self.rng.random_bool(self.accuracy);
        if let Some(board) = session.board() {
            let hidden: Vec<usize> = (0..board.cards().len())
                .filter(|&index| board.cards()[index].state.is_hidden())
                .collect();
            let Some(&first) = hidden.choose(&mut self.rng) else {
                return vec![];
            };
            let pair = board.cards()[first].card.pair;
            let partner = |same: bool| {
                hidden
                    .iter()
                    .copied()
                    .filter(|&index| {
                        index != first && (board.cards()[index].card.pair == pair) == same
                    })
                    .collect::<Vec<_>>()
            };
            let candidates = if correct {
                partner(true)
            } else {
                Some(partner(false))
                    .filter(|wrong| !wrong.is_empty())
                    .unwrap_or_else(|| partner(true))
            };
            return candidates
                .choose(&mut self.rng)
                .map(|&second| {
                    vec![
                        Command::Answer(AnswerPayload::Flip(first)),
                        Command::Answer(AnswerPayload::Flip(second)),
                    ]
                })
                .unwrap_or_default();
        }

        let answer = match session.current_item() {
            Some(RoundItem::Choice(item)) => {
                let wrong: Vec<&String> = item
                    .options
                    .iter()
                    .filter(|option| **option != item.answer)
                    .collect();
                let option = match wrong.choose(&mut self.rng) {
                    Some(&option) if !correct => option,
                    _ => &item.answer,
                };
                AnswerPayload::Choice(option.clone())
            }
            Some(RoundItem::Sequence(item)) => {
                let mut order: Vec<ItemId> = item.canonical_order().into_iter().cloned().collect();
                if !correct && order.len() > 1 {
                    let at = self.rng.random_range(0..order.len() - 1);
                    order.swap(at, at + 1);
                }
                AnswerPayload::Sequence(order)
            }
            Some(RoundItem::Pair(_)) | None => return vec![],
        };
        vec![Command::Answer(answer)]
    }
}

pub(crate) fn run(arg: &AutoPlayArg) -> anyhow::Result<()> {
    let AutoPlayArg {
        round,
        rounds,
        accuracy,
        mean_response,
        player_seed,
        output,
    } = arg;

    let archive = round.load_archive()?;
    let table = round.load_table()?;
    let mut player = SimulatedPlayer::new(*accuracy, *mean_response, *player_seed)?;
    let info = PlayerInfo::Simulated {
        accuracy: *accuracy,
        mean_response_secs: *mean_response,
    };

    let earned: RefCell<Option<BTreeSet<AchievementId>>> = RefCell::new(None);
    let mut host = GameHost::new(&archive, |_, ids| {
        *earned.borrow_mut() = Some(ids.clone());
    })
    .with_table(table)
    .with_options(round.options());

    let mut records = Vec::with_capacity(*rounds);
    for index in 0..*rounds {
        let seed = match (index, round.seed) {
            (0, Some(seed)) => seed,
            _ => player.rng.random(),
        };
        host.start_round(round.variant, round.tier, seed)
            .with_context(|| format!("Failed to start round {}", index + 1))?;

        let mut wait = player.response_secs();
        while let Some(session) = host.round().filter(|session| session.phase().is_playing()) {
            let commands = if wait == 0 {
                wait = player.response_secs();
                player.commands(session)
            } else {
                wait -= 1;
                vec![]
            };
            host.process_turn(commands, true);
        }

        let Some(session) = host.round() else {
            continue;
        };
        let achievements = earned.borrow_mut().take().unwrap_or_default();
        if let Some(record) = RoundRecord::new(seed, info.clone(), session, achievements) {
            tracing::info!(
                round = index + 1,
                score = record.result.score,
                correct = record.result.correct_count,
                total = record.result.total_count,
                "simulated round finished"
            );
            records.push(record);
        }
    }

    eprintln!(
        "Played {} {} round(s) on {}",
        records.len(),
        round.variant,
        round.tier
    );
    Output::save_json(&records, output.clone())
}
