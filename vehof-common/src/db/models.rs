//! Database models
//!
//! `RawRecord` mirrors one row of the archive CSV. `Entity` is the
//! normalized, immutable catalog item stored in the `videos` table.
//! `Flag` is the per-entity user annotation stored in the `flags` table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One row of the archive CSV
///
/// Every column is optional at this layer; the loader rejects rows missing
/// `url` or `title` before normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub owner_url: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    /// `HH:MM:SS` or `MM:SS`
    #[serde(default)]
    pub duration: Option<String>,
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub view_count: Option<String>,
    #[serde(default)]
    pub subscription_count: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub gpt_tags: Option<String>,
    #[serde(default, rename = "Summary")]
    pub summary: Option<String>,
    #[serde(default, rename = "Format")]
    pub format: Option<String>,
    /// Comma-joined topic categories
    #[serde(default, rename = "Topic")]
    pub topic: Option<String>,
}

impl RawRecord {
    /// True when both `url` and `title` carry non-blank text
    pub fn is_importable(&self) -> bool {
        has_text(&self.url) && has_text(&self.title)
    }
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().map_or(false, |s| !s.trim().is_empty())
}

/// Normalized catalog item
///
/// Never mutated after creation. A changed source row produces a
/// replacement entity with the same `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Platform video id when one could be parsed, else the raw url
    pub id: String,
    /// Parsed platform video id; `None` when `id` fell back to the url
    pub media_id: Option<String>,
    pub url: String,
    pub title: String,
    pub owner: Option<String>,
    pub owner_url: Option<String>,
    /// Duration as it appeared in the source
    pub duration: Option<String>,
    /// `None` when `duration` was empty or unparseable (distinct from zero)
    pub duration_seconds: Option<i64>,
    pub published_date: Option<String>,
    /// Loose text; parsed at query time with `parse_number_loose`
    pub view_count: Option<String>,
    pub subscription_count: Option<String>,
    pub tags: Option<String>,
    pub gpt_tags: Option<String>,
    pub summary: Option<String>,
    pub format: Option<String>,
    /// Topic field as it appeared in the source
    pub topic: Option<String>,
    /// Split, trimmed topic categories in source order (duplicates kept)
    pub topics: Vec<String>,
}

/// Which of the three per-entity flags an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagKind {
    Watched,
    WatchLater,
    Favorite,
}

impl FlagKind {
    pub const ALL: [FlagKind; 3] = [FlagKind::Watched, FlagKind::WatchLater, FlagKind::Favorite];

    pub fn as_str(&self) -> &'static str {
        match self {
            FlagKind::Watched => "watched",
            FlagKind::WatchLater => "watch_later",
            FlagKind::Favorite => "favorite",
        }
    }
}

impl fmt::Display for FlagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlagKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "watched" => Ok(FlagKind::Watched),
            "watch_later" | "watchLater" | "watch-later" => Ok(FlagKind::WatchLater),
            "favorite" | "favorites" => Ok(FlagKind::Favorite),
            other => Err(crate::Error::InvalidInput(format!("Unknown flag: {}", other))),
        }
    }
}

/// Per-entity user annotation
///
/// One row per entity id; mutations overwrite the whole row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flag {
    /// Matches `Entity::id`
    pub id: String,
    #[serde(default)]
    pub watched: bool,
    #[serde(default)]
    pub watch_later: bool,
    #[serde(default)]
    pub favorite: bool,
    /// Milliseconds since the Unix epoch of the last mutation
    pub updated_at: i64,
}

impl Flag {
    /// All flags cleared
    pub fn empty(id: impl Into<String>, updated_at: i64) -> Self {
        Self {
            id: id.into(),
            watched: false,
            watch_later: false,
            favorite: false,
            updated_at,
        }
    }

    pub fn get(&self, kind: FlagKind) -> bool {
        match kind {
            FlagKind::Watched => self.watched,
            FlagKind::WatchLater => self.watch_later,
            FlagKind::Favorite => self.favorite,
        }
    }

    /// Copy of this row with one flag replaced and a new timestamp
    pub fn with(&self, kind: FlagKind, value: bool, updated_at: i64) -> Self {
        let mut next = self.clone();
        match kind {
            FlagKind::Watched => next.watched = value,
            FlagKind::WatchLater => next.watch_later = value,
            FlagKind::Favorite => next.favorite = value,
        }
        next.updated_at = updated_at;
        next
    }
}
