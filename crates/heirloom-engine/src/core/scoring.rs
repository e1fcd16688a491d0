use super::{
    answer::Verdict,
    difficulty::{GameVariant, Multiplier},
};

/// Base points of a recognition question or story blank.
pub const CHOICE_BASE_POINTS: u32 = 10;
/// Base points of a fully ordered sequence.
pub const SEQUENCE_BASE_POINTS: u32 = 20;
/// Base points of a found matching pair.
pub const MATCH_BASE_POINTS: u32 = 10;

/// Time-bonus score: `floor((base + floor(time_remaining / 2)) * multiplier)`.
///
/// Pure; consults nothing but its inputs.
///
/// ```
/// use heirloom_engine::{Multiplier, score};
///
/// assert_eq!(score(10, 15, Multiplier::ONE_AND_A_HALF), 25);
/// assert_eq!(score(20, 0, Multiplier::ONE), 20);
/// ```
#[must_use]
pub fn score(base: u32, time_remaining: u32, multiplier: Multiplier) -> u32 {
    multiplier.apply(base.saturating_add(time_remaining / 2))
}

/// Points for a matching pair: `10 + floor(time_remaining / 10)`, no multiplier.
#[must_use]
pub const fn match_score(time_remaining: u32) -> u32 {
    MATCH_BASE_POINTS + time_remaining / 10
}

/// Per-variant point rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringRule {
    /// [`score`] with the given base.
    TimeBonus { base: u32 },
    /// [`match_score`].
    MatchBonus,
}

impl ScoringRule {
    #[must_use]
    pub const fn for_variant(variant: GameVariant) -> Self {
        match variant {
            GameVariant::Matching => Self::MatchBonus,
            GameVariant::Recognition | GameVariant::Story => Self::TimeBonus {
                base: CHOICE_BASE_POINTS,
            },
            GameVariant::Sequencing => Self::TimeBonus {
                base: SEQUENCE_BASE_POINTS,
            },
        }
    }

    /// Points awarded for a judged item; zero unless the verdict is correct.
    #[must_use]
    pub fn award(self, verdict: Verdict, time_remaining: u32, multiplier: Multiplier) -> u32 {
        if !verdict.is_correct() {
            return 0;
        }
        match self {
            Self::TimeBonus { base } => score(base, time_remaining, multiplier),
            Self::MatchBonus => match_score(time_remaining),
        }
    }
}
