//! Session engine for timed family memory games.
//!
//! The crate is split the same way a game is played:
//!
//! - [`core`] - Pure rules: difficulty profiles, round items, answer validation, scoring
//! - [`engine`] - Stateful pieces: the round clock, item deck, matching board,
//!   round session state machine, result derivation and the game host
//! - [`source`] - The item-source provider the host plugs family records into
//!
//! # Example
//!
//! ```
//! use heirloom_engine::{
//!     AnswerPayload, GameVariant, RoundEvent, RoundOptions, RoundSeed, RoundSession, Tier,
//!     resolve,
//!     source::{EventRecord, FamilyArchive},
//! };
//!
//! let archive = FamilyArchive {
//!     events: ["1950-06-01", "1962-09-14", "1978-03-30"]
//!         .into_iter()
//!         .enumerate()
//!         .map(|(i, date)| EventRecord {
//!             id: format!("event-{i}"),
//!             title: format!("Event {i}"),
//!             date: date.parse().unwrap(),
//!         })
//!         .collect(),
//!     ..FamilyArchive::default()
//! };
//!
//! let profile = resolve(Tier::Easy, GameVariant::Sequencing);
//! let mut session = RoundSession::new(profile, RoundOptions::default());
//! session.start(&archive, RoundSeed::from_bytes([7; 16])).unwrap();
//!
//! // Answer every sequence in chronological order.
//! while let Some(item) = session.current_item().and_then(|item| item.as_sequence()) {
//!     let answer = item.canonical_order().into_iter().cloned().collect();
//!     session.submit_answer(AnswerPayload::Sequence(answer));
//! }
//!
//! let result = session.result().unwrap();
//! assert_eq!(result.correct_count, result.total_count);
//! ```

pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;
pub mod source;

/// A round could not be assembled; it never entered play.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum SetupError {
    #[display("not enough {what} for a {variant} round: need {required}, found {available}")]
    InsufficientItems {
        variant: GameVariant,
        what: &'static str,
        required: usize,
        available: usize,
    },
    #[display("cannot play a {variant} round: {source}")]
    InvalidProfile {
        variant: GameVariant,
        source: TableError,
    },
    #[display("round has already been started")]
    AlreadyStarted,
}

/// A loaded difficulty table holds a value the resolver cannot use.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum TableError {
    #[display("{variant}/{tier}: {field} must be positive")]
    NonPositive {
        variant: GameVariant,
        tier: Tier,
        field: &'static str,
    },
    #[display("{tier}: matching pairs hold exactly 2 cards, got {item_size}")]
    InvalidPairSize { tier: Tier, item_size: usize },
    #[display("{tier}: score multiplier denominator must be non-zero")]
    ZeroDenominator { tier: Tier },
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("unknown game variant: {name}")]
pub struct UnknownVariant {
    pub name: String,
}
