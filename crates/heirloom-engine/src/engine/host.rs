use std::{collections::BTreeSet, fmt};

use crate::{
    SetupError,
    core::{AnswerPayload, DifficultyTable, GameVariant, Tier},
    source::ItemSource,
};

use super::{
    deck::RoundSeed,
    result::{Achievement, AchievementId, DEFAULT_ACHIEVEMENTS, RoundResult, evaluate},
    session::{Command, RoundEvent, RoundEvents, RoundOptions, RoundSession},
};

type CompletionCallback<'a> = Box<dyn FnMut(&RoundResult, &BTreeSet<AchievementId>) + 'a>;

/// The surface an application drives rounds through.
///
/// Holds at most one round at a time. The completion callback runs exactly
/// once per round that reaches results, with the achievements it earned; a
/// round that is quit or replaced never reports.
pub struct GameHost<'a, S> {
    source: S,
    table: DifficultyTable,
    options: RoundOptions,
    achievements: Vec<Achievement>,
    on_complete: CompletionCallback<'a>,
    round: Option<RoundSession>,
}

impl<S> fmt::Debug for GameHost<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameHost")
            .field("table", &self.table)
            .field("options", &self.options)
            .field("achievements", &self.achievements.len())
            .field("round", &self.round)
            .finish_non_exhaustive()
    }
}

impl<'a, S> GameHost<'a, S>
where
    S: ItemSource,
{
    pub fn new<F>(source: S, on_complete: F) -> Self
    where
        F: FnMut(&RoundResult, &BTreeSet<AchievementId>) + 'a,
    {
        Self {
            source,
            table: DifficultyTable::DEFAULT,
            options: RoundOptions::default(),
            achievements: DEFAULT_ACHIEVEMENTS.to_vec(),
            on_complete: Box::new(on_complete),
            round: None,
        }
    }

    #[must_use]
    pub fn with_table(mut self, table: DifficultyTable) -> Self {
        self.table = table;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: RoundOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_achievements(mut self, achievements: Vec<Achievement>) -> Self {
        self.achievements = achievements;
        self
    }

    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    #[must_use]
    pub const fn table(&self) -> &DifficultyTable {
        &self.table
    }

    /// The current round, including a finished one until the next start.
    #[must_use]
    pub const fn round(&self) -> Option<&RoundSession> {
        self.round.as_ref()
    }

    /// Starts a new round, abandoning the current one if it is still in play.
    pub fn start_round(
        &mut self,
        variant: GameVariant,
        tier: Tier,
        seed: RoundSeed,
    ) -> Result<RoundEvents, SetupError> {
        self.quit();
        let profile = self.table.resolve(tier, variant);
        let mut session = RoundSession::new(profile, self.options);
        let events = session.start(&self.source, seed)?;
        self.round = Some(session);
        Ok(events)
    }

    pub fn submit_answer(&mut self, payload: AnswerPayload) -> RoundEvents {
        self.drive(|session| session.submit_answer(payload))
    }

    pub fn use_hint(&mut self) -> RoundEvents {
        self.drive(RoundSession::use_hint)
    }

    pub fn continue_story(&mut self) -> RoundEvents {
        self.drive(RoundSession::continue_story)
    }

    /// One second of the host's scheduler.
    pub fn tick(&mut self) -> RoundEvents {
        self.drive(RoundSession::tick)
    }

    pub fn process_turn<I>(&mut self, commands: I, tick_due: bool) -> RoundEvents
    where
        I: IntoIterator<Item = Command>,
    {
        self.drive(|session| session.process_turn(commands, tick_due))
    }

    /// Drops the current round. Returns `true` if a round in play was abandoned.
    pub fn quit(&mut self) -> bool {
        let Some(session) = self.round.take() else {
            return false;
        };
        let abandoned = session.phase().is_playing();
        session.quit();
        abandoned
    }

    fn drive<F>(&mut self, f: F) -> RoundEvents
    where
        F: FnOnce(&mut RoundSession) -> RoundEvents,
    {
        let Some(session) = &mut self.round else {
            return vec![];
        };
        let events = f(session);
        for event in &events {
            if let RoundEvent::Completed(result) = event {
                let earned = evaluate(result, &self.achievements);
                tracing::debug!(
                    variant = %result.variant,
                    score = result.score,
                    achievements = earned.len(),
                    "reporting round completion"
                );
                (self.on_complete)(result, &earned);
            }
        }
        events
    }
}
