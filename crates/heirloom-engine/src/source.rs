//! Item-source provider.
//!
//! Rounds are built from a family's records: people, tagged photos, stories
//! with blanks, and dated events. The engine only reads them through
//! [`ItemSource`]; where they live is up to the host. [`FamilyArchive`] is a
//! plain in-memory implementation that (de)serializes from JSON.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub trait ItemSource {
    fn people(&self) -> &[PersonRecord];
    fn photos(&self) -> &[PhotoRecord];
    fn stories(&self) -> &[StoryRecord];
    fn events(&self) -> &[EventRecord];

    fn person(&self, id: &str) -> Option<&PersonRecord> {
        self.people().iter().find(|person| person.id == id)
    }
}

impl<T> ItemSource for &T
where
    T: ItemSource + ?Sized,
{
    fn people(&self) -> &[PersonRecord] {
        (**self).people()
    }

    fn photos(&self) -> &[PhotoRecord] {
        (**self).photos()
    }

    fn stories(&self) -> &[StoryRecord] {
        (**self).stories()
    }

    fn events(&self) -> &[EventRecord] {
        (**self).events()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRecord {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRecord {
    pub id: String,
    #[serde(default)]
    pub caption: Option<String>,
    /// Ids of the people tagged in the photo.
    #[serde(default)]
    pub people: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryRecord {
    pub id: String,
    pub title: String,
    pub segments: Vec<StorySegment>,
}

impl StoryRecord {
    pub fn blanks(&self) -> impl Iterator<Item = (&str, &[String])> + '_ {
        self.segments.iter().filter_map(|segment| match segment {
            StorySegment::Blank {
                answer,
                distractors,
            } => Some((answer.as_str(), distractors.as_slice())),
            StorySegment::Text { .. } => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StorySegment {
    Text {
        text: String,
    },
    Blank {
        answer: String,
        #[serde(default)]
        distractors: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
}

/// In-memory family records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyArchive {
    #[serde(default)]
    pub people: Vec<PersonRecord>,
    #[serde(default)]
    pub photos: Vec<PhotoRecord>,
    #[serde(default)]
    pub stories: Vec<StoryRecord>,
    #[serde(default)]
    pub events: Vec<EventRecord>,
}

impl ItemSource for FamilyArchive {
    fn people(&self) -> &[PersonRecord] {
        &self.people
    }

    fn photos(&self) -> &[PhotoRecord] {
        &self.photos
    }

    fn stories(&self) -> &[StoryRecord] {
        &self.stories
    }

    fn events(&self) -> &[EventRecord] {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_from_json() {
        let json = r#"{
            "people": [{ "id": "p1", "name": "Rosa" }],
            "photos": [{ "id": "ph1", "people": ["p1"] }],
            "stories": [{
                "id": "s1",
                "title": "The Farm",
                "segments": [
                    { "kind": "text", "text": "Grandpa bought a " },
                    { "kind": "blank", "answer": "tractor", "distractors": ["horse", "boat"] }
                ]
            }],
            "events": [{ "id": "e1", "title": "Wedding", "date": "1971-05-02" }]
        }"#;
        let archive: FamilyArchive = serde_json::from_str(json).unwrap();

        assert_eq!(archive.person("p1").map(|p| p.name.as_str()), Some("Rosa"));
        assert_eq!(archive.photos[0].caption, None);
        let blanks: Vec<_> = archive.stories[0].blanks().collect();
        assert_eq!(blanks.len(), 1);
        assert_eq!(blanks[0].0, "tractor");
        assert_eq!(archive.events[0].date, "1971-05-02".parse().unwrap());
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let archive: FamilyArchive = serde_json::from_str("{}").unwrap();
        assert_eq!(archive, FamilyArchive::default());
    }
}
