use std::{collections::BTreeSet, fmt, str::FromStr};

use rand::{
    Rng, SeedableRng as _,
    distr::{Distribution, StandardUniform},
    seq::SliceRandom as _,
};
use rand_pcg::Pcg32;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    SetupError,
    core::{
        Card, CardFace, ChoiceItem, ChoicePrompt, DifficultyProfile, GameVariant, ItemId,
        PairItem, RoundItem, SequenceItem, TimelineEvent,
    },
    source::{ItemSource, PhotoRecord, StoryRecord, StorySegment},
};

/// Seed for deterministic round generation.
///
/// 128 bits, serialized as a 32-character hex string. The same seed and the
/// same item source always deal the same round, which makes rounds
/// reproducible for records and tests.
///
/// ```
/// use heirloom_engine::RoundSeed;
/// use rand::Rng as _;
///
/// let seed: RoundSeed = rand::rng().random();
/// let parsed: RoundSeed = seed.to_string().parse().unwrap();
/// assert_eq!(seed, parsed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoundSeed([u8; 16]);

impl RoundSeed {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for RoundSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", u128::from_be_bytes(self.0))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("invalid seed {input:?}: {reason}")]
pub struct ParseSeedError {
    input: String,
    reason: String,
}

impl FromStr for RoundSeed {
    type Err = ParseSeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| ParseSeedError {
            input: s.to_owned(),
            reason,
        };
        if s.len() != 32 {
            return Err(invalid(format!(
                "expected 32 hex characters, got {}",
                s.len()
            )));
        }
        let num = u128::from_str_radix(s, 16).map_err(|e| invalid(e.to_string()))?;
        Ok(Self(num.to_be_bytes()))
    }
}

impl Serialize for RoundSeed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RoundSeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        hex_str.parse().map_err(serde::de::Error::custom)
    }
}

impl Distribution<RoundSeed> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> RoundSeed {
        let mut seed = [0; 16];
        rng.fill(&mut seed);
        RoundSeed(seed)
    }
}

/// Deals round items out of an [`ItemSource`].
///
/// All randomness of a round (which records are used, option order, card
/// layout) is drawn from one seeded generator.
#[derive(Debug, Clone)]
pub struct ItemDeck {
    rng: Pcg32,
}

impl ItemDeck {
    #[must_use]
    pub fn with_seed(seed: RoundSeed) -> Self {
        Self {
            rng: Pcg32::from_seed(seed.0),
        }
    }

    /// Builds the item set a profile asks for.
    ///
    /// Fails when the source does not hold enough suitable records.
    pub fn deal<S>(
        &mut self,
        profile: &DifficultyProfile,
        source: &S,
    ) -> Result<Vec<RoundItem>, SetupError>
    where
        S: ItemSource + ?Sized,
    {
        match profile.variant {
            GameVariant::Matching => self.deal_pairs(profile, source),
            GameVariant::Recognition => self.deal_photo_questions(profile, source),
            GameVariant::Story => self.deal_story_blanks(profile, source),
            GameVariant::Sequencing => self.deal_sequences(profile, source),
        }
    }

    /// Lays out two shuffled cards (photo and name) per pair item.
    pub fn lay_out_cards(&mut self, items: &[RoundItem]) -> Vec<Card> {
        let mut cards: Vec<_> = items
            .iter()
            .filter_map(RoundItem::as_pair)
            .enumerate()
            .flat_map(|(pair, item)| {
                let card = |face| Card {
                    pair,
                    pair_key: item.pair_key.clone(),
                    face,
                };
                [
                    card(CardFace::Photo {
                        photo_id: item.photo_id.clone(),
                    }),
                    card(CardFace::Name {
                        name: item.name.clone(),
                    }),
                ]
            })
            .collect();
        cards.shuffle(&mut self.rng);
        cards
    }

    fn draw<T>(&mut self, mut pool: Vec<T>, count: usize) -> Vec<T> {
        pool.shuffle(&mut self.rng);
        pool.truncate(count);
        pool
    }

    fn deal_pairs<S>(
        &mut self,
        profile: &DifficultyProfile,
        source: &S,
    ) -> Result<Vec<RoundItem>, SetupError>
    where
        S: ItemSource + ?Sized,
    {
        let mut candidates = vec![];
        for person in source.people() {
            let photos: Vec<&PhotoRecord> = source
                .photos()
                .iter()
                .filter(|photo| photo.people.contains(&person.id))
                .collect();
            if let Some(photo) = self.draw(photos, 1).pop() {
                candidates.push((person, photo));
            }
        }
        ensure(
            GameVariant::Matching,
            "people with a tagged photo",
            profile.item_count,
            candidates.len(),
        )?;

        let items = self
            .draw(candidates, profile.item_count)
            .into_iter()
            .map(|(person, photo)| {
                RoundItem::Pair(PairItem {
                    id: ItemId::new(&person.id),
                    pair_key: person.id.clone(),
                    name: person.name.clone(),
                    photo_id: photo.id.clone(),
                })
            })
            .collect();
        Ok(items)
    }

    fn deal_photo_questions<S>(
        &mut self,
        profile: &DifficultyProfile,
        source: &S,
    ) -> Result<Vec<RoundItem>, SetupError>
    where
        S: ItemSource + ?Sized,
    {
        let mut seen = BTreeSet::new();
        let names: Vec<&str> = source
            .people()
            .iter()
            .map(|person| person.name.as_str())
            .filter(|name| seen.insert(*name))
            .collect();
        ensure(
            GameVariant::Recognition,
            "distinct names",
            profile.item_size,
            names.len(),
        )?;

        let candidates: Vec<(&PhotoRecord, &str)> = source
            .photos()
            .iter()
            .filter_map(|photo| match photo.people.as_slice() {
                [person] => source
                    .person(person)
                    .map(|person| (photo, person.name.as_str())),
                _ => None,
            })
            .collect();
        ensure(
            GameVariant::Recognition,
            "photos of a single person",
            profile.item_count,
            candidates.len(),
        )?;

        let mut items = vec![];
        for (photo, name) in self.draw(candidates, profile.item_count) {
            let others = names.iter().copied().filter(|other| *other != name).collect();
            let mut options: Vec<String> = self
                .draw(others, profile.item_size.saturating_sub(1))
                .into_iter()
                .map(str::to_owned)
                .collect();
            options.push(name.to_owned());
            options.shuffle(&mut self.rng);
            items.push(RoundItem::Choice(ChoiceItem {
                id: ItemId::new(&photo.id),
                prompt: ChoicePrompt::Photo {
                    photo_id: photo.id.clone(),
                    caption: photo.caption.clone(),
                },
                options,
                answer: name.to_owned(),
            }));
        }
        Ok(items)
    }

    fn deal_story_blanks<S>(
        &mut self,
        profile: &DifficultyProfile,
        source: &S,
    ) -> Result<Vec<RoundItem>, SetupError>
    where
        S: ItemSource + ?Sized,
    {
        let candidates: Vec<&StoryRecord> = source
            .stories()
            .iter()
            .filter(|story| {
                let mut blanks = story.blanks().peekable();
                blanks.peek().is_some()
                    && blanks.all(|(answer, distractors)| {
                        !distinct_distractors(answer, distractors).is_empty()
                    })
            })
            .collect();
        ensure(
            GameVariant::Story,
            "stories with answerable blanks",
            profile.item_count,
            candidates.len(),
        )?;

        let mut items = vec![];
        for story in self.draw(candidates, profile.item_count) {
            let blank_count = story.blanks().count();
            let mut context = String::new();
            let mut blank_index = 0;
            for segment in &story.segments {
                match segment {
                    StorySegment::Text { text } => context.push_str(text),
                    StorySegment::Blank {
                        answer,
                        distractors,
                    } => {
                        let distractors = distinct_distractors(answer, distractors);
                        let mut options: Vec<String> = self
                            .draw(distractors, profile.item_size.saturating_sub(1))
                            .into_iter()
                            .map(str::to_owned)
                            .collect();
                        options.push(answer.clone());
                        options.shuffle(&mut self.rng);
                        items.push(RoundItem::Choice(ChoiceItem {
                            id: ItemId::new(format!("{}#{}", story.id, blank_index + 1)),
                            prompt: ChoicePrompt::StoryBlank {
                                story_id: story.id.clone(),
                                title: story.title.clone(),
                                context: std::mem::take(&mut context),
                                blank_index,
                                blank_count,
                            },
                            options,
                            answer: answer.clone(),
                        }));
                        blank_index += 1;
                    }
                }
            }
        }
        Ok(items)
    }

    fn deal_sequences<S>(
        &mut self,
        profile: &DifficultyProfile,
        source: &S,
    ) -> Result<Vec<RoundItem>, SetupError>
    where
        S: ItemSource + ?Sized,
    {
        let mut events: Vec<TimelineEvent> = source
            .events()
            .iter()
            .map(|event| TimelineEvent {
                id: ItemId::new(&event.id),
                title: event.title.clone(),
                date: event.date,
            })
            .collect();
        events.sort_by_key(|event| event.date);
        events.dedup_by_key(|event| event.date);
        ensure(
            GameVariant::Sequencing,
            "events with distinct dates",
            profile.item_size,
            events.len(),
        )?;

        let items = (0..profile.item_count)
            .map(|index| {
                let mut presented = self.draw(events.clone(), profile.item_size);
                if presented.len() > 1 && presented.is_sorted_by_key(|event| event.date) {
                    presented.rotate_left(1);
                }
                RoundItem::Sequence(SequenceItem {
                    id: ItemId::new(format!("sequence-{}", index + 1)),
                    events: presented,
                })
            })
            .collect();
        Ok(items)
    }
}

/// Distractors that differ from the answer, each kept once in source order.
fn distinct_distractors<'a>(answer: &str, distractors: &'a [String]) -> Vec<&'a str> {
    let mut seen = BTreeSet::new();
    distractors
        .iter()
        .map(String::as_str)
        .filter(|distractor| *distractor != answer && seen.insert(*distractor))
        .collect()
}

fn ensure(
    variant: GameVariant,
    what: &'static str,
    required: usize,
    available: usize,
) -> Result<(), SetupError> {
    if available < required {
        return Err(SetupError::InsufficientItems {
            variant,
            what,
            required,
            available,
        });
    }
    Ok(())
}
