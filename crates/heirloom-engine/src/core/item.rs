use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier of a round item, or of an event inside a sequence item.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// The atomic unit judged within a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_more::IsVariant)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoundItem {
    Pair(PairItem),
    Choice(ChoiceItem),
    Sequence(SequenceItem),
}

impl RoundItem {
    #[must_use]
    pub fn id(&self) -> &ItemId {
        match self {
            Self::Pair(item) => &item.id,
            Self::Choice(item) => &item.id,
            Self::Sequence(item) => &item.id,
        }
    }

    #[must_use]
    pub fn as_pair(&self) -> Option<&PairItem> {
        match self {
            Self::Pair(item) => Some(item),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_choice(&self) -> Option<&ChoiceItem> {
        match self {
            Self::Choice(item) => Some(item),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_sequence(&self) -> Option<&SequenceItem> {
        match self {
            Self::Sequence(item) => Some(item),
            _ => None,
        }
    }
}

/// One family member in the matching game, shown as a photo card and a name card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairItem {
    pub id: ItemId,
    /// Identity key both cards of the pair carry.
    pub pair_key: String,
    pub name: String,
    pub photo_id: String,
}

/// A question with one correct option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceItem {
    pub id: ItemId,
    pub prompt: ChoicePrompt,
    pub options: Vec<String>,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChoicePrompt {
    /// "Who is in this photo?"
    Photo {
        photo_id: String,
        caption: Option<String>,
    },
    /// A blank inside a story.
    StoryBlank {
        story_id: String,
        title: String,
        /// Story text between the previous blank (or the start) and this one.
        context: String,
        /// Zero-based position of this blank in its story.
        blank_index: usize,
        blank_count: usize,
    },
}

impl ChoicePrompt {
    /// Returns the story id when this blank is the last one of its story.
    #[must_use]
    pub fn completed_story(&self) -> Option<&str> {
        match self {
            Self::StoryBlank {
                story_id,
                blank_index,
                blank_count,
                ..
            } if blank_index + 1 == *blank_count => Some(story_id),
            _ => None,
        }
    }
}

/// A dated family event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub id: ItemId,
    pub title: String,
    pub date: NaiveDate,
}

/// Events presented out of order, to be put back in chronological order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceItem {
    pub id: ItemId,
    /// Events in presentation order.
    pub events: Vec<TimelineEvent>,
}

impl SequenceItem {
    /// Time keys in the order a correct answer lists them.
    #[must_use]
    pub fn expected_keys(&self) -> Vec<NaiveDate> {
        let mut keys: Vec<_> = self.events.iter().map(|event| event.date).collect();
        keys.sort_unstable();
        keys
    }

    /// Event ids sorted by date.
    #[must_use]
    pub fn canonical_order(&self) -> Vec<&ItemId> {
        let mut events: Vec<_> = self.events.iter().collect();
        events.sort_by_key(|event| event.date);
        events.into_iter().map(|event| &event.id).collect()
    }

    #[must_use]
    pub fn event(&self, id: &ItemId) -> Option<&TimelineEvent> {
        self.events.iter().find(|event| &event.id == id)
    }
}

/// What a matching card shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CardFace {
    Photo { photo_id: String },
    Name { name: String },
}

/// A pair-tagged matching card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Index of the [`PairItem`] this card belongs to.
    pub pair: usize,
    pub pair_key: String,
    pub face: CardFace,
}
