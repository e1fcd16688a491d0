use chrono::{DateTime, Utc};

use crate::core::{DifficultyProfile, RoundItem};

use super::{matching::MatchingBoard, result::ItemOutcome};

/// Mutable data of one round, owned by its [`RoundSession`](super::RoundSession).
///
/// Readable from outside at any time; only the session mutates it.
#[derive(Debug, Clone)]
pub struct RoundState {
    profile: DifficultyProfile,
    items: Vec<RoundItem>,
    board: Option<MatchingBoard>,
    current_index: usize,
    cumulative_score: u32,
    outcomes: Vec<ItemOutcome>,
    streak: u32,
    best_streak: u32,
    hints_used: u32,
    elapsed_seconds: u32,
    started_at: Option<DateTime<Utc>>,
}

impl RoundState {
    pub(crate) const fn new(profile: DifficultyProfile) -> Self {
        Self {
            profile,
            items: vec![],
            board: None,
            current_index: 0,
            cumulative_score: 0,
            outcomes: vec![],
            streak: 0,
            best_streak: 0,
            hints_used: 0,
            elapsed_seconds: 0,
            started_at: None,
        }
    }

    #[must_use]
    pub const fn profile(&self) -> &DifficultyProfile {
        &self.profile
    }

    #[must_use]
    pub fn items(&self) -> &[RoundItem] {
        &self.items
    }

    /// Card layout; only present in matching rounds.
    #[must_use]
    pub const fn board(&self) -> Option<&MatchingBoard> {
        self.board.as_ref()
    }

    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub const fn cumulative_score(&self) -> u32 {
        self.cumulative_score
    }

    #[must_use]
    pub fn outcomes(&self) -> &[ItemOutcome] {
        &self.outcomes
    }

    /// Consecutive correct items up to now.
    #[must_use]
    pub const fn streak(&self) -> u32 {
        self.streak
    }

    #[must_use]
    pub const fn best_streak(&self) -> u32 {
        self.best_streak
    }

    #[must_use]
    pub const fn hints_used(&self) -> u32 {
        self.hints_used
    }

    /// Seconds the round clock has ticked while the round was in play.
    #[must_use]
    pub const fn elapsed_seconds(&self) -> u32 {
        self.elapsed_seconds
    }

    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn is_last_item(&self) -> bool {
        self.current_index + 1 >= self.items.len()
    }

    pub(crate) fn begin(
        &mut self,
        items: Vec<RoundItem>,
        board: Option<MatchingBoard>,
        now: DateTime<Utc>,
    ) {
        self.items = items;
        self.board = board;
        self.started_at = Some(now);
    }

    pub(crate) const fn board_mut(&mut self) -> Option<&mut MatchingBoard> {
        self.board.as_mut()
    }

    pub(crate) const fn advance(&mut self) {
        self.current_index += 1;
    }

    pub(crate) const fn count_second(&mut self) {
        self.elapsed_seconds = self.elapsed_seconds.saturating_add(1);
    }

    pub(crate) const fn count_hint(&mut self) {
        self.hints_used += 1;
    }

    pub(crate) const fn break_streak(&mut self) {
        self.streak = 0;
    }

    /// Appends a judged item. Never lets `outcomes` outgrow `items`.
    pub(crate) fn record(&mut self, outcome: ItemOutcome) {
        debug_assert!(self.outcomes.len() < self.items.len());
        self.cumulative_score = self.cumulative_score.saturating_add(outcome.points);
        if outcome.is_correct() {
            self.streak += 1;
            self.best_streak = self.best_streak.max(self.streak);
        } else {
            self.streak = 0;
        }
        self.outcomes.push(outcome);
    }

    #[must_use]
    pub fn is_fully_judged(&self) -> bool {
        !self.items.is_empty() && self.outcomes.len() == self.items.len()
    }
}
