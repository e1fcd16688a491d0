use std::{convert::Infallible, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{TableError, UnknownVariant};

/// The four memory games that share one round lifecycle.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::IsVariant,
)]
#[serde(rename_all = "snake_case")]
pub enum GameVariant {
    /// Flip cards two at a time and find the photo/name pairs.
    #[display("matching")]
    Matching,
    /// Name the family member in a photo.
    #[display("recognition")]
    Recognition,
    /// Fill the blanks of a family story.
    #[display("story")]
    Story,
    /// Put family events in chronological order.
    #[display("sequencing")]
    Sequencing,
}

impl GameVariant {
    pub const ALL: [Self; 4] = [
        Self::Matching,
        Self::Recognition,
        Self::Story,
        Self::Sequencing,
    ];
}

impl FromStr for GameVariant {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|variant| variant.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownVariant { name: s.to_owned() })
    }
}

/// Named difficulty level.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::IsVariant,
)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    #[display("easy")]
    Easy,
    #[default]
    #[display("medium")]
    Medium,
    #[display("hard")]
    Hard,
    /// Plays exactly like [`Tier::Medium`]; no performance-based adaptation exists.
    #[display("adaptive")]
    Adaptive,
}

impl Tier {
    pub const ALL: [Self; 4] = [Self::Easy, Self::Medium, Self::Hard, Self::Adaptive];

    /// Parses a tier name, falling back to [`Tier::Medium`] for anything unknown.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|tier| tier.to_string().eq_ignore_ascii_case(name.trim()))
            .unwrap_or_else(|| {
                tracing::warn!(name, "unknown difficulty tier, using medium");
                Self::Medium
            })
    }

    /// The tier whose settings this tier plays with.
    #[must_use]
    pub const fn settings_tier(self) -> Self {
        match self {
            Self::Adaptive => Self::Medium,
            tier => tier,
        }
    }
}

impl FromStr for Tier {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

/// Exact rational score multiplier.
///
/// Kept as a ratio so that `floor(points * multiplier)` never suffers from
/// floating point rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Multiplier {
    numerator: u32,
    denominator: u32,
}

impl Multiplier {
    pub const ONE: Self = Self::new(1, 1);
    pub const ONE_AND_A_HALF: Self = Self::new(3, 2);
    pub const TWO: Self = Self::new(2, 1);

    /// # Panics
    ///
    /// Panics if `denominator` is zero.
    #[must_use]
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        assert!(denominator != 0, "multiplier denominator must be non-zero");
        Self {
            numerator,
            denominator,
        }
    }

    #[must_use]
    pub const fn numerator(self) -> u32 {
        self.numerator
    }

    #[must_use]
    pub const fn denominator(self) -> u32 {
        self.denominator
    }

    /// Returns `floor(points * self)`, saturating at `u32::MAX`.
    #[must_use]
    pub fn apply(self, points: u32) -> u32 {
        let scaled =
            u64::from(points) * u64::from(self.numerator) / u64::from(self.denominator.max(1));
        u32::try_from(scaled).unwrap_or(u32::MAX)
    }
}

impl fmt::Display for Multiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denominator == 1 {
            write!(f, "x{}", self.numerator)
        } else {
            write!(f, "x{}/{}", self.numerator, self.denominator)
        }
    }
}

/// Configuration a round is played with, derived once when the round starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    pub tier: Tier,
    pub variant: GameVariant,
    /// Number of items in the round.
    ///
    /// For [`GameVariant::Story`] this counts stories; every blank of a chosen
    /// story becomes its own item.
    pub item_count: usize,
    /// Elements presented per item: answer options for recognition and story,
    /// events per sequence for sequencing, cards per pair for matching.
    pub item_size: usize,
    /// Seconds allowed per item, or for the whole round in matching.
    pub per_item_time_limit_secs: u32,
    pub score_multiplier: Multiplier,
}

impl DifficultyProfile {
    /// Checks that a round can be played with this profile: positive counts
    /// and time limit, two cards per matching pair, a usable multiplier.
    pub fn validate(&self) -> Result<(), TableError> {
        let Self {
            tier,
            variant,
            item_count,
            item_size,
            per_item_time_limit_secs,
            score_multiplier,
        } = *self;
        let non_positive = |field| TableError::NonPositive {
            variant,
            tier,
            field,
        };
        if item_count == 0 {
            return Err(non_positive("item_count"));
        }
        if item_size == 0 {
            return Err(non_positive("item_size"));
        }
        if per_item_time_limit_secs == 0 {
            return Err(non_positive("time_limit_secs"));
        }
        if variant.is_matching() && item_size != 2 {
            return Err(TableError::InvalidPairSize { tier, item_size });
        }
        if score_multiplier.denominator() == 0 {
            return Err(TableError::ZeroDenominator { tier });
        }
        Ok(())
    }
}

/// Numbers a single (variant, tier) plays with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierSettings {
    pub item_count: usize,
    pub item_size: usize,
    pub time_limit_secs: u32,
}

impl TierSettings {
    const fn new(item_count: usize, item_size: usize, time_limit_secs: u32) -> Self {
        Self {
            item_count,
            item_size,
            time_limit_secs,
        }
    }
}

/// Settings of one variant for each concrete tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSettings {
    pub easy: TierSettings,
    pub medium: TierSettings,
    pub hard: TierSettings,
}

impl VariantSettings {
    #[must_use]
    pub const fn get(&self, tier: Tier) -> &TierSettings {
        match tier.settings_tier() {
            Tier::Easy => &self.easy,
            Tier::Hard => &self.hard,
            Tier::Medium | Tier::Adaptive => &self.medium,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierMultipliers {
    pub easy: Multiplier,
    pub medium: Multiplier,
    pub hard: Multiplier,
}

impl TierMultipliers {
    #[must_use]
    pub const fn get(&self, tier: Tier) -> Multiplier {
        match tier.settings_tier() {
            Tier::Easy => self.easy,
            Tier::Hard => self.hard,
            Tier::Medium | Tier::Adaptive => self.medium,
        }
    }
}

/// Tunable numbers behind [`resolve`].
///
/// [`DifficultyTable::DEFAULT`] carries the stock configuration; hosts may
/// load their own (see [`DifficultyTable::validate`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyTable {
    pub matching: VariantSettings,
    pub recognition: VariantSettings,
    pub story: VariantSettings,
    pub sequencing: VariantSettings,
    pub multipliers: TierMultipliers,
}

impl Default for DifficultyTable {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl DifficultyTable {
    pub const DEFAULT: Self = Self {
        matching: VariantSettings {
            easy: TierSettings::new(6, 2, 120),
            medium: TierSettings::new(8, 2, 180),
            hard: TierSettings::new(10, 2, 240),
        },
        recognition: VariantSettings {
            easy: TierSettings::new(5, 3, 20),
            medium: TierSettings::new(8, 4, 15),
            hard: TierSettings::new(10, 4, 10),
        },
        story: VariantSettings {
            easy: TierSettings::new(2, 3, 30),
            medium: TierSettings::new(3, 4, 25),
            hard: TierSettings::new(4, 4, 20),
        },
        sequencing: VariantSettings {
            easy: TierSettings::new(3, 3, 60),
            medium: TierSettings::new(3, 4, 45),
            hard: TierSettings::new(3, 5, 30),
        },
        multipliers: TierMultipliers {
            easy: Multiplier::ONE,
            medium: Multiplier::ONE_AND_A_HALF,
            hard: Multiplier::TWO,
        },
    };

    #[must_use]
    pub const fn variant(&self, variant: GameVariant) -> &VariantSettings {
        match variant {
            GameVariant::Matching => &self.matching,
            GameVariant::Recognition => &self.recognition,
            GameVariant::Story => &self.story,
            GameVariant::Sequencing => &self.sequencing,
        }
    }

    /// Resolves the profile for a tier and variant. Total over both enums.
    #[must_use]
    pub fn resolve(&self, tier: Tier, variant: GameVariant) -> DifficultyProfile {
        let settings = self.variant(variant).get(tier);
        DifficultyProfile {
            tier,
            variant,
            item_count: settings.item_count,
            item_size: settings.item_size,
            per_item_time_limit_secs: settings.time_limit_secs,
            score_multiplier: self.multipliers.get(tier),
        }
    }

    /// Checks that every profile this table resolves is playable.
    pub fn validate(&self) -> Result<(), TableError> {
        for variant in GameVariant::ALL {
            for tier in [Tier::Easy, Tier::Medium, Tier::Hard] {
                self.resolve(tier, variant).validate()?;
            }
        }
        Ok(())
    }
}

/// Resolves a profile from [`DifficultyTable::DEFAULT`].
#[must_use]
pub fn resolve(tier: Tier, variant: GameVariant) -> DifficultyProfile {
    DifficultyTable::DEFAULT.resolve(tier, variant)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_defaults() {
        let cases = [
            (Tier::Easy, 6, 120),
            (Tier::Medium, 8, 180),
            (Tier::Hard, 10, 240),
            (Tier::Adaptive, 8, 180),
        ];
        for (tier, pairs, secs) in cases {
            let profile = resolve(tier, GameVariant::Matching);
            assert_eq!(profile.item_count, pairs, "{tier}");
            assert_eq!(profile.item_size, 2, "{tier}");
            assert_eq!(profile.per_item_time_limit_secs, secs, "{tier}");
        }
    }

    #[test]
    fn test_recognition_time_limits() {
        let limits: Vec<_> = [Tier::Easy, Tier::Medium, Tier::Hard]
            .into_iter()
            .map(|tier| resolve(tier, GameVariant::Recognition).per_item_time_limit_secs)
            .collect();
        assert_eq!(limits, [20, 15, 10]);
    }

    #[test]
    fn test_adaptive_aliases_medium() {
        for variant in GameVariant::ALL {
            let adaptive = resolve(Tier::Adaptive, variant);
            let medium = resolve(Tier::Medium, variant);
            assert_eq!(adaptive.tier, Tier::Adaptive);
            assert_eq!(
                DifficultyProfile {
                    tier: Tier::Medium,
                    ..adaptive
                },
                medium
            );
        }
    }

    #[test]
    fn test_multipliers_by_tier() {
        let profile = |tier| resolve(tier, GameVariant::Recognition).score_multiplier;
        assert_eq!(profile(Tier::Easy), Multiplier::ONE);
        assert_eq!(profile(Tier::Medium), Multiplier::ONE_AND_A_HALF);
        assert_eq!(profile(Tier::Hard), Multiplier::TWO);
        assert_eq!(profile(Tier::Adaptive), Multiplier::ONE_AND_A_HALF);
    }

    #[test]
    fn test_multiplier_apply_floors() {
        assert_eq!(Multiplier::ONE_AND_A_HALF.apply(15), 22);
        assert_eq!(Multiplier::ONE_AND_A_HALF.apply(16), 24);
        assert_eq!(Multiplier::TWO.apply(u32::MAX), u32::MAX);
    }

    #[test]
    fn test_unknown_tier_falls_back_to_medium() {
        assert_eq!(Tier::from_name("nightmare"), Tier::Medium);
        assert_eq!(Tier::from_name(""), Tier::Medium);
        assert_eq!(Tier::from_name("HARD"), Tier::Hard);
        assert_eq!("adaptive".parse::<Tier>(), Ok(Tier::Adaptive));
    }

    #[test]
    fn test_variant_parsing() {
        assert_eq!("Story".parse::<GameVariant>(), Ok(GameVariant::Story));
        let err = "trivia".parse::<GameVariant>().unwrap_err();
        assert_eq!(err.to_string(), "unknown game variant: trivia");
    }

    #[test]
    fn test_default_table_is_valid() {
        assert_eq!(DifficultyTable::DEFAULT.validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_zero_time_limit() {
        let mut table = DifficultyTable::DEFAULT;
        table.sequencing.hard.time_limit_secs = 0;
        assert_eq!(
            table.validate(),
            Err(TableError::NonPositive {
                variant: GameVariant::Sequencing,
                tier: Tier::Hard,
                field: "time_limit_secs",
            })
        );
    }

    #[test]
    fn test_validate_rejects_odd_pair_size() {
        let mut table = DifficultyTable::DEFAULT;
        table.matching.easy.item_size = 3;
        assert!(matches!(
            table.validate(),
            Err(TableError::InvalidPairSize { item_size: 3, .. })
        ));
    }

    #[test]
    fn test_profile_validate_reports_its_own_field() {
        let mut profile = resolve(Tier::Easy, GameVariant::Story);
        assert_eq!(profile.validate(), Ok(()));
        profile.item_count = 0;
        assert_eq!(
            profile.validate(),
            Err(TableError::NonPositive {
                variant: GameVariant::Story,
                tier: Tier::Easy,
                field: "item_count",
            })
        );
    }

    #[test]
    fn test_table_json_roundtrip_keeps_values() {
        let json = serde_json::to_string(&DifficultyTable::DEFAULT).unwrap();
        let table: DifficultyTable = serde_json::from_str(&json).unwrap();
        assert_eq!(table, DifficultyTable::DEFAULT);
    }
}
