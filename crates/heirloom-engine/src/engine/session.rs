use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    SetupError,
    core::{
        AnswerPayload, DifficultyProfile, GameVariant, RoundItem, ScoringRule, Validator, Verdict,
    },
    source::ItemSource,
};

use super::{
    clock::{ClockEvent, RoundClock},
    deck::{ItemDeck, RoundSeed},
    matching::{FlipOutcome, MatchingBoard},
    result::{ItemOutcome, RoundResult, finalize},
    state::RoundState,
};

/// Seconds a hint costs unless configured otherwise.
pub const DEFAULT_HINT_PENALTY_SECS: u32 = 3;

/// Host-tunable knobs that are not part of the difficulty profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOptions {
    pub hint_penalty_secs: u32,
}

impl Default for RoundOptions {
    fn default() -> Self {
        Self {
            hint_penalty_secs: DEFAULT_HINT_PENALTY_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::IsVariant)]
pub enum Phase {
    /// Configuration fixed, items not dealt yet.
    Intro,
    Playing(PlayStep),
    /// Terminal. The result has been computed.
    Results,
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::IsVariant)]
pub enum PlayStep {
    AwaitingAnswer,
    /// A story has just been completed and is shown in full; the clock is stopped.
    StoryReview { story_id: String },
}

/// Things that happened during one call into the session, in order.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::IsVariant)]
pub enum RoundEvent {
    Started {
        item_count: usize,
        time_limit_secs: u32,
    },
    ItemPresented {
        index: usize,
    },
    Tick {
        remaining: u32,
    },
    HintApplied {
        remaining: u32,
    },
    CardRevealed {
        index: usize,
    },
    PairMatched {
        first: usize,
        second: usize,
        points: u32,
    },
    PairMismatched {
        first: usize,
        second: usize,
    },
    /// The payload could not be applied (bad card index, wrong payload kind).
    Rejected(AnswerPayload),
    Answered(ItemOutcome),
    Expired,
    StoryReview {
        story_id: String,
    },
    Completed(RoundResult),
}

pub type RoundEvents = Vec<RoundEvent>;

/// Player input applied within one scheduling turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Answer(AnswerPayload),
    Hint,
    ContinueStory,
}

/// State machine of one round: `Intro -> Playing -> Results`.
///
/// The session never schedules anything. The host calls [`RoundSession::tick`]
/// once per second and forwards player input; every call returns the
/// [`RoundEvent`]s it produced. A session is used for exactly one round; a
/// finished session ignores further input.
///
/// # Example
///
/// ```
/// use heirloom_engine::{
///     GameVariant, Phase, RoundEvent, RoundOptions, RoundSeed, RoundSession, Tier, resolve,
///     source::FamilyArchive,
/// };
///
/// let profile = resolve(Tier::Easy, GameVariant::Recognition);
/// let mut session = RoundSession::new(profile, RoundOptions::default());
///
/// // An empty archive cannot feed a round; the session stays in intro.
/// let err = session.start(&FamilyArchive::default(), RoundSeed::from_bytes([0; 16]));
/// assert!(err.is_err());
/// assert_eq!(session.phase(), &Phase::Intro);
/// ```
#[derive(Debug, Clone)]
pub struct RoundSession {
    validator: Validator,
    scoring: ScoringRule,
    options: RoundOptions,
    phase: Phase,
    state: RoundState,
    clock: RoundClock,
    result: Option<RoundResult>,
}

impl RoundSession {
    #[must_use]
    pub fn new(profile: DifficultyProfile, options: RoundOptions) -> Self {
        Self {
            validator: Validator::for_variant(profile.variant),
            scoring: ScoringRule::for_variant(profile.variant),
            options,
            phase: Phase::Intro,
            state: RoundState::new(profile),
            clock: RoundClock::new(),
            result: None,
        }
    }

    #[must_use]
    pub const fn variant(&self) -> GameVariant {
        self.state.profile().variant
    }

    #[must_use]
    pub const fn profile(&self) -> &DifficultyProfile {
        self.state.profile()
    }

    #[must_use]
    pub const fn phase(&self) -> &Phase {
        &self.phase
    }

    #[must_use]
    pub const fn state(&self) -> &RoundState {
        &self.state
    }

    #[must_use]
    pub const fn clock(&self) -> &RoundClock {
        &self.clock
    }

    #[must_use]
    pub const fn remaining_seconds(&self) -> u32 {
        self.clock.remaining()
    }

    #[must_use]
    pub const fn score(&self) -> u32 {
        self.state.cumulative_score()
    }

    #[must_use]
    pub fn board(&self) -> Option<&MatchingBoard> {
        self.state.board()
    }

    /// The item awaiting an answer (or under review), while playing.
    #[must_use]
    pub fn current_item(&self) -> Option<&RoundItem> {
        if !self.phase.is_playing() || self.variant().is_matching() {
            return None;
        }
        self.state.items().get(self.state.current_index())
    }

    #[must_use]
    pub const fn result(&self) -> Option<&RoundResult> {
        self.result.as_ref()
    }

    fn is_awaiting_answer(&self) -> bool {
        matches!(self.phase, Phase::Playing(PlayStep::AwaitingAnswer))
    }

    /// Deals the items and enters play.
    ///
    /// On error the session stays in [`Phase::Intro`] and can be dropped or
    /// retried with another source.
    pub fn start<S>(&mut self, source: &S, seed: RoundSeed) -> Result<RoundEvents, SetupError>
    where
        S: ItemSource + ?Sized,
    {
        if !self.phase.is_intro() {
            return Err(SetupError::AlreadyStarted);
        }
        let profile = *self.state.profile();
        profile.validate().map_err(|err| {
            tracing::debug!(variant = %profile.variant, tier = %profile.tier, %err, "round profile rejected");
            SetupError::InvalidProfile {
                variant: profile.variant,
                source: err,
            }
        })?;
        let mut deck = ItemDeck::with_seed(seed);
        let items = deck
            .deal(&profile, source)
            .and_then(|items| {
                if items.is_empty() {
                    Err(SetupError::InsufficientItems {
                        variant: profile.variant,
                        what: "items",
                        required: 1,
                        available: 0,
                    })
                } else {
                    Ok(items)
                }
            })
            .inspect_err(|err| {
                tracing::debug!(variant = %profile.variant, tier = %profile.tier, %err, "round setup failed");
            })?;

        let board = profile
            .variant
            .is_matching()
            .then(|| MatchingBoard::new(deck.lay_out_cards(&items)));
        let item_count = items.len();
        self.state.begin(items, board, Utc::now());
        self.phase = Phase::Playing(PlayStep::AwaitingAnswer);
        self.clock.start(profile.per_item_time_limit_secs);
        tracing::debug!(
            variant = %profile.variant,
            tier = %profile.tier,
            %seed,
            item_count,
            "round started"
        );

        let mut events = vec![RoundEvent::Started {
            item_count,
            time_limit_secs: profile.per_item_time_limit_secs,
        }];
        if !profile.variant.is_matching() {
            events.push(RoundEvent::ItemPresented { index: 0 });
        }
        Ok(events)
    }

    /// Submits an answer for the current item, or a card flip in matching.
    ///
    /// Ignored unless an answer is awaited.
    pub fn submit_answer(&mut self, payload: AnswerPayload) -> RoundEvents {
        let mut events = vec![];
        if !self.is_awaiting_answer() {
            return events;
        }
        if self.variant().is_matching() {
            self.flip(payload, &mut events);
        } else {
            self.judge(Some(payload), &mut events);
        }
        events
    }

    /// Advances the round clock by one second.
    pub fn tick(&mut self) -> RoundEvents {
        let mut events = vec![];
        if !self.is_awaiting_answer() {
            return events;
        }
        for event in self.clock.tick() {
            match event {
                ClockEvent::Tick { remaining } => {
                    self.state.count_second();
                    tracing::trace!(remaining, "tick");
                    events.push(RoundEvent::Tick { remaining });
                }
                ClockEvent::Expired => {
                    events.push(RoundEvent::Expired);
                    self.expire(&mut events);
                }
            }
        }
        events
    }

    /// Trades [`RoundOptions::hint_penalty_secs`] of the clock for a hint.
    ///
    /// The remaining time never drops below one second.
    pub fn use_hint(&mut self) -> RoundEvents {
        let mut events = vec![];
        if !self.is_awaiting_answer() {
            return events;
        }
        if let Some(remaining) = self.clock.apply_penalty(self.options.hint_penalty_secs) {
            self.state.count_hint();
            events.push(RoundEvent::HintApplied { remaining });
        }
        events
    }

    /// Leaves the story review and presents the next item.
    pub fn continue_story(&mut self) -> RoundEvents {
        let mut events = vec![];
        if matches!(self.phase, Phase::Playing(PlayStep::StoryReview { .. })) {
            self.state.advance();
            self.present(&mut events);
        }
        events
    }

    /// Runs one scheduling turn: every command first, then the tick if one is due.
    ///
    /// An answer that arrives in the same turn as the expiration therefore wins.
    pub fn process_turn<I>(&mut self, commands: I, tick_due: bool) -> RoundEvents
    where
        I: IntoIterator<Item = Command>,
    {
        let mut events = vec![];
        for command in commands {
            events.extend(match command {
                Command::Answer(payload) => self.submit_answer(payload),
                Command::Hint => self.use_hint(),
                Command::ContinueStory => self.continue_story(),
            });
        }
        // A fresh item starts with its full limit; the due second is not
        // charged to it.
        if tick_due && !events.iter().any(RoundEvent::is_item_presented) {
            events.extend(self.tick());
        }
        events
    }

    /// Abandons the round. The clock stops and no result is ever produced.
    pub fn quit(mut self) {
        self.clock.stop();
        if !self.phase.is_results() {
            tracing::debug!(
                variant = %self.variant(),
                judged = self.state.outcomes().len(),
                total = self.state.items().len(),
                "round quit"
            );
        }
    }

    fn flip(&mut self, payload: AnswerPayload, events: &mut RoundEvents) {
        let AnswerPayload::Flip(index) = payload else {
            events.push(RoundEvent::Rejected(payload));
            return;
        };
        let Some(board) = self.state.board_mut() else {
            return;
        };
        match board.flip(index) {
            FlipOutcome::Rejected => events.push(RoundEvent::Rejected(payload)),
            FlipOutcome::Revealed { index } => events.push(RoundEvent::CardRevealed { index }),
            FlipOutcome::Mismatched { first, second } => {
                self.state.break_streak();
                events.push(RoundEvent::PairMismatched { first, second });
            }
            FlipOutcome::Matched {
                first,
                second,
                pair,
            } => {
                let points = self.record(pair, Verdict::Correct, Some(payload));
                events.push(RoundEvent::PairMatched {
                    first,
                    second,
                    points,
                });
                if self.state.board().is_some_and(MatchingBoard::is_complete) {
                    self.finish(events);
                }
            }
        }
    }

    fn judge(&mut self, payload: Option<AnswerPayload>, events: &mut RoundEvents) {
        let index = self.state.current_index();
        let Some(item) = self.state.items().get(index) else {
            return;
        };
        let verdict = self.validator.validate(item, payload.as_ref());
        let story_completed = item
            .as_choice()
            .and_then(|item| item.prompt.completed_story())
            .map(str::to_owned);

        self.record(index, verdict, payload);
        if let Some(outcome) = self.state.outcomes().last() {
            events.push(RoundEvent::Answered(outcome.clone()));
        }
        self.clock.stop();

        if self.state.is_last_item() {
            self.finish(events);
        } else if let Some(story_id) = story_completed {
            events.push(RoundEvent::StoryReview {
                story_id: story_id.clone(),
            });
            self.phase = Phase::Playing(PlayStep::StoryReview { story_id });
        } else {
            self.state.advance();
            self.present(events);
        }
    }

    /// Appends the outcome of item `index` and returns the points awarded.
    fn record(&mut self, index: usize, verdict: Verdict, selected: Option<AnswerPayload>) -> u32 {
        let time_remaining = if selected.is_some() {
            self.clock.remaining()
        } else {
            0
        };
        let points = self.scoring.award(
            verdict,
            time_remaining,
            self.state.profile().score_multiplier,
        );
        let item_id = self.state.items()[index].id().clone();
        self.state.record(ItemOutcome {
            item_id,
            verdict,
            selected,
            time_remaining_at_answer: time_remaining,
            points,
        });
        points
    }

    fn expire(&mut self, events: &mut RoundEvents) {
        if self.variant().is_matching() {
            let unmatched = self
                .state
                .board()
                .map(MatchingBoard::unmatched_pairs)
                .unwrap_or_default();
            for pair in unmatched {
                self.record(pair, Verdict::TimedOut, None);
            }
            self.finish(events);
        } else {
            self.judge(None, events);
        }
    }

    fn present(&mut self, events: &mut RoundEvents) {
        self.phase = Phase::Playing(PlayStep::AwaitingAnswer);
        self.clock.start(self.state.profile().per_item_time_limit_secs);
        events.push(RoundEvent::ItemPresented {
            index: self.state.current_index(),
        });
    }

    fn finish(&mut self, events: &mut RoundEvents) {
        debug_assert!(self.state.is_fully_judged());
        debug_assert!(self.result.is_none());
        self.clock.stop();
        self.phase = Phase::Results;
        let result = finalize(&self.state, Utc::now());
        tracing::debug!(
            variant = %result.variant,
            tier = %result.tier,
            score = result.score,
            correct = result.correct_count,
            total = result.total_count,
            "round finished"
        );
        self.result = Some(result.clone());
        events.push(RoundEvent::Completed(result));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::{ChoicePrompt, Tier, resolve},
        engine::deck::tests::family,
        source::FamilyArchive,
    };

    const SEED: RoundSeed = RoundSeed::from_bytes([42; 16]);

    fn started(variant: GameVariant, tier: Tier, archive: &FamilyArchive) -> RoundSession {
        let mut session = RoundSession::new(resolve(tier, variant), RoundOptions::default());
        session.start(archive, SEED).unwrap();
        session
    }

    fn correct_answer(session: &RoundSession) -> AnswerPayload {
        match session.current_item().unwrap() {
            RoundItem::Choice(item) => AnswerPayload::Choice(item.answer.clone()),
            RoundItem::Sequence(item) => {
                AnswerPayload::Sequence(item.canonical_order().into_iter().cloned().collect())
            }
            RoundItem::Pair(_) => unreachable!(),
        }
    }

    fn wrong_answer(session: &RoundSession) -> AnswerPayload {
        match session.current_item().unwrap() {
            RoundItem::Choice(item) => AnswerPayload::Choice(
                item.options
                    .iter()
                    .find(|option| **option != item.answer)
                    .unwrap()
                    .clone(),
            ),
            RoundItem::Sequence(item) => {
                let mut order: Vec<_> = item.canonical_order().into_iter().cloned().collect();
                order.reverse();
                AnswerPayload::Sequence(order)
            }
            RoundItem::Pair(_) => unreachable!(),
        }
    }

    fn ticks(session: &mut RoundSession, count: u32) -> RoundEvents {
        (0..count).flat_map(|_| session.tick()).collect()
    }

    fn completions(events: &[RoundEvent]) -> usize {
        events.iter().filter(|event| event.is_completed()).count()
    }

    /// Indices of the two cards of `pair` on the board.
    fn pair_cards(session: &RoundSession, pair: usize) -> (usize, usize) {
        let indices: Vec<_> = session
            .board()
            .unwrap()
            .cards()
            .iter()
            .enumerate()
            .filter(|(_, card)| card.card.pair == pair)
            .map(|(index, _)| index)
            .collect();
        (indices[0], indices[1])
    }

    mod lifecycle {
        use super::*;

        #[test]
        fn test_new_session_is_in_intro() {
            let session = RoundSession::new(
                resolve(Tier::Easy, GameVariant::Recognition),
                RoundOptions::default(),
            );
            assert!(session.phase().is_intro());
            assert!(session.current_item().is_none());
            assert_eq!(session.remaining_seconds(), 0);
        }

        #[test]
        fn test_start_enters_playing_with_full_clock() {
            let archive = family();
            let mut session = RoundSession::new(
                resolve(Tier::Hard, GameVariant::Recognition),
                RoundOptions::default(),
            );
            let events = session.start(&archive, SEED).unwrap();
            assert_eq!(
                events,
                [
                    RoundEvent::Started {
                        item_count: 10,
                        time_limit_secs: 10
                    },
                    RoundEvent::ItemPresented { index: 0 },
                ]
            );
            assert_eq!(session.phase(), &Phase::Playing(PlayStep::AwaitingAnswer));
            assert_eq!(session.remaining_seconds(), 10);
        }

        #[test]
        fn test_setup_error_keeps_intro() {
            let mut session = RoundSession::new(
                resolve(Tier::Medium, GameVariant::Matching),
                RoundOptions::default(),
            );
            let err = session.start(&FamilyArchive::default(), SEED).unwrap_err();
            assert!(matches!(err, SetupError::InsufficientItems { .. }));
            assert!(session.phase().is_intro());
            assert!(session.tick().is_empty());
            assert!(session.state().outcomes().is_empty());
        }

        #[test]
        fn test_cannot_start_twice() {
            let archive = family();
            let mut session = started(GameVariant::Recognition, Tier::Easy, &archive);
            assert_eq!(session.start(&archive, SEED), Err(SetupError::AlreadyStarted));
        }

        #[test]
        fn test_finished_round_ignores_input() {
            let archive = family();
            let mut session = started(GameVariant::Recognition, Tier::Easy, &archive);
            let mut events = vec![];
            while session.phase().is_playing() {
                let answer = correct_answer(&session);
                events.extend(session.submit_answer(answer));
            }
            assert_eq!(completions(&events), 1);
            let score = session.score();

            assert!(session.submit_answer(AnswerPayload::Choice("Rosa".to_owned())).is_empty());
            assert!(session.tick().is_empty());
            assert!(session.use_hint().is_empty());
            assert!(session.continue_story().is_empty());
            assert_eq!(session.score(), score);
            assert_eq!(session.state().outcomes().len(), session.state().items().len());
        }
    }

    mod recognition {
        use super::*;

        #[test]
        fn test_correct_answer_scores_with_time_bonus() {
            let archive = family();
            let mut session = started(GameVariant::Recognition, Tier::Medium, &archive);
            ticks(&mut session, 5);
            let answer = correct_answer(&session);
            let events = session.submit_answer(answer);

            // (10 + 10 / 2) * 3/2
            let RoundEvent::Answered(outcome) = &events[0] else {
                panic!("expected answer outcome, got {events:?}");
            };
            assert_eq!(outcome.verdict, Verdict::Correct);
            assert_eq!(outcome.time_remaining_at_answer, 10);
            assert_eq!(outcome.points, 22);
            assert_eq!(events[1], RoundEvent::ItemPresented { index: 1 });
            assert_eq!(session.remaining_seconds(), 15);
            assert_eq!(session.score(), 22);
        }

        #[test]
        fn test_wrong_answer_scores_nothing_and_breaks_streak() {
            let archive = family();
            let mut session = started(GameVariant::Recognition, Tier::Easy, &archive);
            let answer = correct_answer(&session);
            session.submit_answer(answer);
            assert_eq!(session.state().streak(), 1);
            let answer = wrong_answer(&session);
            let events = session.submit_answer(answer);
            assert!(matches!(
                &events[0],
                RoundEvent::Answered(ItemOutcome {
                    verdict: Verdict::Wrong,
                    points: 0,
                    ..
                })
            ));
            assert_eq!(session.state().streak(), 0);
            assert_eq!(session.state().best_streak(), 1);
        }

        #[test]
        fn test_hard_expiry_without_answer() {
            let archive = family();
            let mut session = started(GameVariant::Recognition, Tier::Hard, &archive);
            let events = ticks(&mut session, 10);

            assert_eq!(events.iter().filter(|event| event.is_tick()).count(), 10);
            assert_eq!(events.iter().filter(|event| event.is_expired()).count(), 1);
            let outcome = events
                .iter()
                .find_map(|event| match event {
                    RoundEvent::Answered(outcome) => Some(outcome),
                    _ => None,
                })
                .unwrap();
            assert_eq!(outcome.verdict, Verdict::TimedOut);
            assert_eq!(outcome.selected, None);
            assert_eq!(outcome.points, 0);
            assert_eq!(events.last(), Some(&RoundEvent::ItemPresented { index: 1 }));
            assert_eq!(session.state().current_index(), 1);
            assert_eq!(session.remaining_seconds(), 10);
        }

        #[test]
        fn test_unknown_option_is_malformed() {
            let archive = family();
            let mut session = started(GameVariant::Recognition, Tier::Easy, &archive);
            let events = session.submit_answer(AnswerPayload::Choice("Nobody".to_owned()));
            assert!(matches!(
                &events[0],
                RoundEvent::Answered(ItemOutcome {
                    verdict: Verdict::Malformed,
                    ..
                })
            ));
        }

        #[test]
        fn test_quit_mid_round_produces_no_result() {
            let archive = family();
            let mut session = started(GameVariant::Recognition, Tier::Easy, &archive);
            assert_eq!(session.state().items().len(), 5);
            for _ in 0..2 {
                let answer = correct_answer(&session);
                session.submit_answer(answer);
            }
            assert_eq!(session.state().outcomes().len(), 2);
            assert!(session.result().is_none());
            assert!(session.clock().is_running());
            session.quit();
        }

        #[test]
        fn test_invalid_profile_keeps_intro() {
            let archive = family();
            let mut profile = resolve(Tier::Easy, GameVariant::Sequencing);
            profile.item_size = 0;
            let mut session = RoundSession::new(profile, RoundOptions::default());
            let err = session.start(&archive, SEED).unwrap_err();
            assert!(matches!(
                err,
                SetupError::InvalidProfile {
                    variant: GameVariant::Sequencing,
                    ..
                }
            ));
            assert!(session.phase().is_intro());
            assert!(session.current_item().is_none());
            let events = session.submit_answer(AnswerPayload::Sequence(vec![]));
            assert!(events.is_empty());
        }
    }

    mod hints {
        use super::*;

        #[test]
        fn test_hint_costs_three_seconds() {
            let archive = family();
            let mut session = started(GameVariant::Recognition, Tier::Easy, &archive);
            assert_eq!(session.use_hint(), [RoundEvent::HintApplied { remaining: 17 }]);
            assert_eq!(session.state().hints_used(), 1);
            assert_eq!(ticks(&mut session, 1), [RoundEvent::Tick { remaining: 16 }]);
        }

        #[test]
        fn test_hint_never_empties_the_clock() {
            let archive = family();
            let mut session = started(GameVariant::Recognition, Tier::Hard, &archive);
            ticks(&mut session, 8);
            assert_eq!(session.use_hint(), [RoundEvent::HintApplied { remaining: 1 }]);
            assert_eq!(session.use_hint(), [RoundEvent::HintApplied { remaining: 1 }]);
            let events = session.tick();
            assert!(events.contains(&RoundEvent::Expired));
        }

        #[test]
        fn test_configured_penalty() {
            let archive = family();
            let mut session = RoundSession::new(
                resolve(Tier::Easy, GameVariant::Recognition),
                RoundOptions {
                    hint_penalty_secs: 5,
                },
            );
            session.start(&archive, SEED).unwrap();
            assert_eq!(session.use_hint(), [RoundEvent::HintApplied { remaining: 15 }]);
        }
    }

    mod sequencing {
        use super::*;

        #[test]
        fn test_easy_chronological_answer() {
            let archive = family();
            let mut session = started(GameVariant::Sequencing, Tier::Easy, &archive);
            ticks(&mut session, 7);
            let answer = correct_answer(&session);
            let events = session.submit_answer(answer);
            let RoundEvent::Answered(outcome) = &events[0] else {
                panic!("expected answer outcome, got {events:?}");
            };
            assert_eq!(outcome.verdict, Verdict::Correct);
            // floor((20 + floor(53 / 2)) * 1)
            assert_eq!(outcome.points, 46);
        }

        #[test]
        fn test_reversed_answer_is_wrong() {
            let archive = family();
            let mut session = started(GameVariant::Sequencing, Tier::Medium, &archive);
            let answer = wrong_answer(&session);
            let events = session.submit_answer(answer);
            assert!(matches!(
                &events[0],
                RoundEvent::Answered(ItemOutcome {
                    verdict: Verdict::Wrong,
                    points: 0,
                    ..
                })
            ));
        }
    }

    mod story {
        use super::*;

        #[test]
        fn test_review_between_stories() {
            let archive = family();
            let mut session = started(GameVariant::Story, Tier::Easy, &archive);
            assert_eq!(session.state().items().len(), 4);

            let answer = correct_answer(&session);
            session.submit_answer(answer);
            let answer = correct_answer(&session);
            let events = session.submit_answer(answer);
            let Some(RoundEvent::StoryReview { story_id }) = events.last() else {
                panic!("expected story review, got {events:?}");
            };
            assert!(matches!(
                session.phase(),
                Phase::Playing(PlayStep::StoryReview { story_id: id }) if id == story_id
            ));

            // The clock is stopped and answers are ignored while reviewing.
            assert!(session.tick().is_empty());
            assert!(session.submit_answer(AnswerPayload::Choice("porch".to_owned())).is_empty());
            assert!(session.use_hint().is_empty());

            let events = session.continue_story();
            assert_eq!(events, [RoundEvent::ItemPresented { index: 2 }]);
            assert_eq!(session.remaining_seconds(), 30);
            let Some(RoundItem::Choice(item)) = session.current_item() else {
                panic!("expected story blank");
            };
            assert!(matches!(
                item.prompt,
                ChoicePrompt::StoryBlank { blank_index: 0, .. }
            ));
        }

        #[test]
        fn test_elapsed_counts_ticks_in_play_only() {
            let archive = family();
            let mut session = started(GameVariant::Story, Tier::Easy, &archive);
            ticks(&mut session, 4);
            let answer = correct_answer(&session);
            session.submit_answer(answer);
            ticks(&mut session, 2);
            let answer = correct_answer(&session);
            session.submit_answer(answer);

            // Seconds spent reviewing a story are not part of the round.
            assert!(ticks(&mut session, 5).is_empty());
            session.continue_story();
            for _ in 0..2 {
                let answer = correct_answer(&session);
                session.submit_answer(answer);
            }
            let result = session.result().unwrap();
            assert_eq!(result.elapsed_seconds, 6);
            assert_eq!(result.time_budget_seconds, 4 * 30);
        }

        #[test]
        fn test_last_story_goes_straight_to_results() {
            let archive = family();
            let mut session = started(GameVariant::Story, Tier::Easy, &archive);
            let mut events = vec![];
            while session.phase().is_playing() {
                if session.current_item().is_some() && !session.continue_story().is_empty() {
                    continue;
                }
                let answer = correct_answer(&session);
                events.extend(session.submit_answer(answer));
            }
            assert_eq!(events.iter().filter(|event| event.is_story_review()).count(), 1);
            assert!(matches!(events.last(), Some(RoundEvent::Completed(_))));
            assert!(session.result().unwrap().is_perfect());
        }
    }

    mod matching {
        use super::*;

        #[test]
        fn test_medium_match_scores_time_bonus() {
            let archive = family();
            let mut session = started(GameVariant::Matching, Tier::Medium, &archive);
            assert_eq!(session.remaining_seconds(), 180);
            ticks(&mut session, 5);

            let (first, second) = pair_cards(&session, 0);
            assert_eq!(
                session.submit_answer(AnswerPayload::Flip(first)),
                [RoundEvent::CardRevealed { index: first }]
            );
            assert_eq!(
                session.submit_answer(AnswerPayload::Flip(second)),
                [RoundEvent::PairMatched {
                    first,
                    second,
                    points: 10 + 175 / 10
                }]
            );
            assert_eq!(session.score(), 27);
            assert_eq!(session.board().unwrap().moves(), 1);
        }

        #[test]
        fn test_medium_mismatch_hides_cards() {
            let archive = family();
            let mut session = started(GameVariant::Matching, Tier::Medium, &archive);
            let (first, _) = pair_cards(&session, 0);
            let (other, _) = pair_cards(&session, 1);

            session.submit_answer(AnswerPayload::Flip(first));
            assert_eq!(
                session.submit_answer(AnswerPayload::Flip(other)),
                [RoundEvent::PairMismatched {
                    first,
                    second: other
                }]
            );
            let board = session.board().unwrap();
            assert!(board.cards()[first].state.is_hidden());
            assert!(board.cards()[other].state.is_hidden());
            assert_eq!(board.moves(), 1);
            assert_eq!(session.score(), 0);
            assert!(session.state().outcomes().is_empty());
        }

        #[test]
        fn test_bad_flips_are_rejected() {
            let archive = family();
            let mut session = started(GameVariant::Matching, Tier::Easy, &archive);
            assert_eq!(
                session.submit_answer(AnswerPayload::Flip(99)),
                [RoundEvent::Rejected(AnswerPayload::Flip(99))]
            );
            let choice = AnswerPayload::Choice("Rosa".to_owned());
            assert_eq!(
                session.submit_answer(choice.clone()),
                [RoundEvent::Rejected(choice)]
            );
            assert_eq!(session.board().unwrap().moves(), 0);
        }

        #[test]
        fn test_all_pairs_complete_the_round() {
            let archive = family();
            let mut session = started(GameVariant::Matching, Tier::Easy, &archive);
            let mut events = vec![];
            for pair in 0..6 {
                let (first, second) = pair_cards(&session, pair);
                events.extend(session.submit_answer(AnswerPayload::Flip(first)));
                events.extend(session.submit_answer(AnswerPayload::Flip(second)));
            }
            assert_eq!(completions(&events), 1);
            let result = session.result().unwrap();
            assert_eq!((result.correct_count, result.total_count), (6, 6));
            assert_eq!(result.moves, 6);
            assert_eq!(result.score, 6 * (10 + 12));
            assert!(!session.clock().is_running());
        }

        #[test]
        fn test_expiry_ends_round_with_unmatched_pairs() {
            let archive = family();
            let mut session = started(GameVariant::Matching, Tier::Easy, &archive);
            let (first, second) = pair_cards(&session, 3);
            session.submit_answer(AnswerPayload::Flip(first));
            session.submit_answer(AnswerPayload::Flip(second));

            let events = ticks(&mut session, 200);
            assert_eq!(events.iter().filter(|event| event.is_tick()).count(), 120);
            assert_eq!(completions(&events), 1);
            let result = session.result().unwrap();
            assert_eq!((result.correct_count, result.total_count), (1, 6));
            assert_eq!(result.elapsed_seconds, 120);
            assert_eq!(session.state().outcomes().len(), 6);
            assert!(session.state().outcomes()[1..]
                .iter()
                .all(|outcome| outcome.verdict == Verdict::TimedOut));
        }
    }

    mod turns {
        use super::*;

        #[test]
        fn test_answer_beats_expiry_in_same_turn() {
            let archive = family();
            let mut session = started(GameVariant::Recognition, Tier::Hard, &archive);
            ticks(&mut session, 9);
            assert_eq!(session.remaining_seconds(), 1);

            let answer = correct_answer(&session);
            let events = session.process_turn([Command::Answer(answer)], true);
            let RoundEvent::Answered(outcome) = &events[0] else {
                panic!("expected answer outcome, got {events:?}");
            };
            assert_eq!(outcome.verdict, Verdict::Correct);
            assert_eq!(outcome.time_remaining_at_answer, 1);
            assert!(!events.contains(&RoundEvent::Expired));
            assert_eq!(events.last(), Some(&RoundEvent::ItemPresented { index: 1 }));
            assert!(!events.iter().any(RoundEvent::is_tick));
            assert_eq!(session.remaining_seconds(), 10);

            // Later ticks in a turn without a new item count as usual.
            let events = session.process_turn([Command::Hint], true);
            assert_eq!(
                events,
                [
                    RoundEvent::HintApplied { remaining: 7 },
                    RoundEvent::Tick { remaining: 6 },
                ]
            );
        }

        #[test]
        fn test_results_entered_once() {
            let archive = family();
            let mut session = started(GameVariant::Sequencing, Tier::Easy, &archive);
            let mut events = vec![];
            for _ in 0..500 {
                events.extend(session.process_turn([Command::Hint], true));
            }
            assert_eq!(completions(&events), 1);
            assert!(session.phase().is_results());
        }
    }
}
