use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{
    difficulty::GameVariant,
    item::{Card, ChoiceItem, ItemId, RoundItem, SequenceItem},
};

/// What a player submits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AnswerPayload {
    /// Chosen option of a recognition question or story blank.
    Choice(String),
    /// Event ids in the order the player put them.
    Sequence(Vec<ItemId>),
    /// Index of a matching card to turn over.
    Flip(usize),
}

/// How an item was judged.
///
/// Everything but [`Verdict::Correct`] scores zero; the other variants only
/// tell the host why.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::IsVariant,
)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    #[display("correct")]
    Correct,
    #[display("wrong")]
    Wrong,
    /// The clock ran out before anything was submitted.
    #[display("timed out")]
    TimedOut,
    /// The payload could not be judged against the item.
    #[display("malformed")]
    Malformed,
}

impl Verdict {
    const fn from_bool(correct: bool) -> Self {
        if correct { Self::Correct } else { Self::Wrong }
    }
}

/// Answer-validation rule of a game variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum Validator {
    /// Two revealed cards match iff their pair keys are equal.
    PairEquality,
    /// The chosen option must equal the designated answer byte for byte.
    ExactChoice,
    /// The submitted events must follow ascending time keys, position by position.
    OrderedSequence,
}

impl Validator {
    #[must_use]
    pub const fn for_variant(variant: GameVariant) -> Self {
        match variant {
            GameVariant::Matching => Self::PairEquality,
            GameVariant::Recognition | GameVariant::Story => Self::ExactChoice,
            GameVariant::Sequencing => Self::OrderedSequence,
        }
    }

    /// Judges a submission against an item.
    ///
    /// `None` means the clock expired first. Payloads of the wrong kind, or
    /// items this validator does not judge, yield [`Verdict::Malformed`].
    #[must_use]
    pub fn validate(self, item: &RoundItem, payload: Option<&AnswerPayload>) -> Verdict {
        let Some(payload) = payload else {
            return Verdict::TimedOut;
        };
        match (self, item, payload) {
            (Self::ExactChoice, RoundItem::Choice(item), AnswerPayload::Choice(choice)) => {
                validate_choice(item, choice)
            }
            (Self::OrderedSequence, RoundItem::Sequence(item), AnswerPayload::Sequence(ids)) => {
                validate_sequence(item, ids)
            }
            _ => Verdict::Malformed,
        }
    }

    /// Compares two revealed matching cards.
    #[must_use]
    pub fn cards_match(self, first: &Card, second: &Card) -> bool {
        self.is_pair_equality() && first.pair_key == second.pair_key
    }
}

fn validate_choice(item: &ChoiceItem, choice: &str) -> Verdict {
    if !item.options.iter().any(|option| option == choice) {
        return Verdict::Malformed;
    }
    Verdict::from_bool(choice == item.answer)
}

fn validate_sequence(item: &SequenceItem, ids: &[ItemId]) -> Verdict {
    let mut seen = BTreeSet::new();
    let mut keys = Vec::with_capacity(ids.len());
    for id in ids {
        let Some(event) = item.event(id) else {
            return Verdict::Malformed;
        };
        if !seen.insert(id) {
            return Verdict::Malformed;
        }
        keys.push(event.date);
    }
    Verdict::from_bool(keys_in_order(&keys, &item.expected_keys()))
}

/// Whether `submitted` reproduces `expected` exactly, position by position.
///
/// Any length mismatch fails; there is no partial credit.
#[must_use]
pub fn keys_in_order<K>(submitted: &[K], expected: &[K]) -> bool
where
    K: PartialEq,
{
    submitted.len() == expected.len() && submitted.iter().zip(expected).all(|(s, e)| s == e)
}
