use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{AnswerPayload, GameVariant, ItemId, Tier, Verdict};

use super::{matching::MatchingBoard, state::RoundState};

/// How a single item of the round was resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemOutcome {
    pub item_id: ItemId,
    pub verdict: Verdict,
    /// The submission, absent when the clock expired first.
    pub selected: Option<AnswerPayload>,
    pub time_remaining_at_answer: u32,
    pub points: u32,
}

impl ItemOutcome {
    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.verdict.is_correct()
    }
}

/// Final record of a finished round. Created once, never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResult {
    pub variant: GameVariant,
    pub tier: Tier,
    pub score: u32,
    pub correct_count: usize,
    pub total_count: usize,
    /// Round-clock seconds ticked while an answer was awaited.
    ///
    /// Counts the host's ticks, not wall time: story-review pauses and any
    /// time between ticks the host never delivered are excluded.
    pub elapsed_seconds: u32,
    /// Total seconds the round could have lasted.
    pub time_budget_seconds: u32,
    pub best_streak: u32,
    pub hints_used: u32,
    /// Matching moves; zero for other variants.
    pub moves: u32,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl RoundResult {
    #[must_use]
    pub const fn is_perfect(&self) -> bool {
        self.total_count > 0 && self.correct_count == self.total_count
    }
}

/// Aggregates a fully judged round into its result.
#[must_use]
pub fn finalize(state: &RoundState, completed_at: DateTime<Utc>) -> RoundResult {
    let profile = state.profile();
    let outcomes = state.outcomes();
    let limit = profile.per_item_time_limit_secs;
    let time_budget_seconds = if profile.variant.is_matching() {
        limit
    } else {
        limit.saturating_mul(u32::try_from(state.items().len()).unwrap_or(u32::MAX))
    };
    RoundResult {
        variant: profile.variant,
        tier: profile.tier,
        score: outcomes
            .iter()
            .map(|outcome| outcome.points)
            .fold(0, u32::saturating_add),
        correct_count: outcomes.iter().filter(|outcome| outcome.is_correct()).count(),
        total_count: state.items().len(),
        elapsed_seconds: state.elapsed_seconds(),
        time_budget_seconds,
        best_streak: state.best_streak(),
        hints_used: state.hints_used(),
        moves: state.board().map_or(0, MatchingBoard::moves),
        started_at: state.started_at().unwrap_or(completed_at),
        completed_at,
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, derive_more::Display,
)]
#[serde(transparent)]
pub struct AchievementId(&'static str);

impl AchievementId {
    #[must_use]
    pub const fn new(id: &'static str) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

/// A rule evaluated against a finished round.
#[derive(Debug, Clone, Copy)]
pub struct Achievement {
    pub id: AchievementId,
    pub title: &'static str,
    pub predicate: fn(&RoundResult) -> bool,
}

impl Achievement {
    #[must_use]
    pub fn is_earned(&self, result: &RoundResult) -> bool {
        (self.predicate)(result)
    }
}

/// Ids of every achievement whose predicate holds for `result`.
///
/// Predicates are independent of each other and of their order. Earlier
/// rounds are not consulted; deduplicating across rounds is the caller's job.
#[must_use]
pub fn evaluate(result: &RoundResult, achievements: &[Achievement]) -> BTreeSet<AchievementId> {
    achievements
        .iter()
        .filter(|achievement| achievement.is_earned(result))
        .map(|achievement| achievement.id)
        .collect()
}

const fn round_complete(_: &RoundResult) -> bool {
    true
}

const fn perfect_recall(result: &RoundResult) -> bool {
    result.is_perfect()
}

const fn quick_thinker(result: &RoundResult) -> bool {
    result.is_perfect() && result.elapsed_seconds.saturating_mul(2) <= result.time_budget_seconds
}

const fn on_a_roll(result: &RoundResult) -> bool {
    result.best_streak >= 5
}

const fn high_scorer(result: &RoundResult) -> bool {
    result.score >= 200
}

const fn unaided(result: &RoundResult) -> bool {
    result.is_perfect() && result.hints_used == 0
}

fn hard_won(result: &RoundResult) -> bool {
    result.is_perfect() && result.tier.is_hard()
}

fn matchmaker(result: &RoundResult) -> bool {
    result.is_perfect()
        && result.variant.is_matching()
        && u32::try_from(result.total_count).is_ok_and(|pairs| result.moves == pairs)
}

fn family_historian(result: &RoundResult) -> bool {
    result.is_perfect() && result.variant.is_sequencing()
}

/// Stock achievement rules.
pub const DEFAULT_ACHIEVEMENTS: [Achievement; 9] = [
    Achievement {
        id: AchievementId::new("round_complete"),
        title: "Finished a round",
        predicate: round_complete,
    },
    Achievement {
        id: AchievementId::new("perfect_recall"),
        title: "Every answer right",
        predicate: perfect_recall,
    },
    Achievement {
        id: AchievementId::new("quick_thinker"),
        title: "Perfect round in half the time",
        predicate: quick_thinker,
    },
    Achievement {
        id: AchievementId::new("on_a_roll"),
        title: "Five right in a row",
        predicate: on_a_roll,
    },
    Achievement {
        id: AchievementId::new("high_scorer"),
        title: "200 points in one round",
        predicate: high_scorer,
    },
    Achievement {
        id: AchievementId::new("unaided"),
        title: "Perfect round without hints",
        predicate: unaided,
    },
    Achievement {
        id: AchievementId::new("hard_won"),
        title: "Perfect round on hard",
        predicate: hard_won,
    },
    Achievement {
        id: AchievementId::new("matchmaker"),
        title: "Matched every pair without a miss",
        predicate: matchmaker,
    },
    Achievement {
        id: AchievementId::new("family_historian"),
        title: "Every timeline in order",
        predicate: family_historian,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    fn result() -> RoundResult {
        let at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        RoundResult {
            variant: GameVariant::Recognition,
            tier: Tier::Medium,
            score: 120,
            correct_count: 5,
            total_count: 8,
            elapsed_seconds: 70,
            time_budget_seconds: 120,
            best_streak: 3,
            hints_used: 1,
            moves: 0,
            started_at: at,
            completed_at: at,
        }
    }

    fn ids(result: &RoundResult) -> Vec<&'static str> {
        evaluate(result, &DEFAULT_ACHIEVEMENTS)
            .into_iter()
            .map(AchievementId::as_str)
            .collect()
    }

    #[test]
    fn test_ordinary_round_only_completes() {
        assert_eq!(ids(&result()), ["round_complete"]);
    }

    #[test]
    fn test_several_achievements_fire_together() {
        let result = RoundResult {
            correct_count: 8,
            best_streak: 8,
            hints_used: 0,
            score: 240,
            elapsed_seconds: 60,
            tier: Tier::Hard,
            ..result()
        };
        assert_eq!(
            ids(&result),
            [
                "hard_won",
                "high_scorer",
                "on_a_roll",
                "perfect_recall",
                "quick_thinker",
                "round_complete",
                "unaided",
            ]
        );
    }

    #[test]
    fn test_evaluation_ignores_rule_order() {
        let result = RoundResult {
            correct_count: 8,
            ..result()
        };
        let mut reversed = DEFAULT_ACHIEVEMENTS;
        reversed.reverse();
        assert_eq!(
            evaluate(&result, &reversed),
            evaluate(&result, &DEFAULT_ACHIEVEMENTS)
        );
    }

    #[test]
    fn test_matchmaker_needs_no_missed_moves() {
        let perfect = RoundResult {
            variant: GameVariant::Matching,
            correct_count: 6,
            total_count: 6,
            moves: 6,
            ..result()
        };
        assert!(ids(&perfect).contains(&"matchmaker"));
        let sloppy = RoundResult { moves: 9, ..perfect };
        assert!(!ids(&sloppy).contains(&"matchmaker"));
    }

    #[test]
    fn test_empty_round_is_never_perfect() {
        let empty = RoundResult {
            correct_count: 0,
            total_count: 0,
            ..result()
        };
        assert!(!empty.is_perfect());
    }
}
