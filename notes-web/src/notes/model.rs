use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

use crate::{errors::ValidationErrors, users::UserId};

pub type NoteId = Uuid;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub const TITLE_REQUIRED: &str = "Please Write a Title.";
pub const DESCRIPTION_REQUIRED: &str = "Please Write a Description";
pub const PUBLICATION_DATE_INVALID: &str = "Please Write a valid Publication Date";
pub const NOTE_NOT_FOUND: &str = "Note not found";

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub description: String,
    pub publication_date: NaiveDate,
    pub owner: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Row of the notes list; only what the list page shows.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct NoteListItem {
    pub id: NoteId,
    pub title: String,
    pub description: String,
    #[serde(serialize_with = "serialize_date")]
    pub created_at: DateTime<Utc>,
}

fn serialize_date<S: Serializer>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&date.format(DATE_FORMAT))
}

/// Body of the new note form. Ownership always comes from the session, never from here.
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct NewNote {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub publication_date: Option<String>,
}

impl NewNote {
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = required_fields(&self.title, &self.description);
        if self.parse_publication_date().is_err() {
            errors.add(PUBLICATION_DATE_INVALID);
        }
        errors
    }

    /// `None` for an absent or blank date.
    pub fn parse_publication_date(&self) -> Result<Option<NaiveDate>, chrono::ParseError> {
        match self.publication_date.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(date) => NaiveDate::parse_from_str(date, DATE_FORMAT).map(Some),
        }
    }
}

/// Body of the edit note form.
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct NoteChanges {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl NoteChanges {
    pub fn validate(&self) -> ValidationErrors {
        required_fields(&self.title, &self.description)
    }
}

fn required_fields(title: &str, description: &str) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    if title.trim().is_empty() {
        errors.add(TITLE_REQUIRED);
    }
    if description.trim().is_empty() {
        errors.add(DESCRIPTION_REQUIRED);
    }
    errors
}
