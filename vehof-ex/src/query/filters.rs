//! Structured filters: topics, duration buckets, owner

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use vehof_common::{Entity, Error};

const SHORT_LIMIT_SECS: i64 = 15 * 60;
const LONG_FROM_SECS: i64 = 45 * 60;

/// Selectable duration range
///
/// Entities without a parsed duration belong to no bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationBucket {
    /// Under 15 minutes
    Short,
    /// 15 to under 45 minutes
    Medium,
    /// 45 minutes or more
    Long,
}

impl DurationBucket {
    pub const ALL: [DurationBucket; 3] = [DurationBucket::Short, DurationBucket::Medium, DurationBucket::Long];

    /// Bucket for a duration; `None` is the unknown bucket
    pub fn of(duration_seconds: Option<i64>) -> Option<Self> {
        let seconds = duration_seconds?;
        Some(if seconds < SHORT_LIMIT_SECS {
            DurationBucket::Short
        } else if seconds < LONG_FROM_SECS {
            DurationBucket::Medium
        } else {
            DurationBucket::Long
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DurationBucket::Short => "short",
            DurationBucket::Medium => "medium",
            DurationBucket::Long => "long",
        }
    }
}

impl fmt::Display for DurationBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DurationBucket {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short" => Ok(DurationBucket::Short),
            "medium" => Ok(DurationBucket::Medium),
            "long" => Ok(DurationBucket::Long),
            other => Err(Error::InvalidInput(format!("Unknown duration bucket: {}", other))),
        }
    }
}

/// Active structured predicates; empty selections do not filter
#[derive(Debug, Clone, Copy)]
pub struct Filters<'s> {
    pub topics: &'s BTreeSet<String>,
    pub durations: &'s BTreeSet<DurationBucket>,
    pub owner: Option<&'s str>,
}

impl Filters<'_> {
    /// True when the entity satisfies every active predicate
    pub fn matches(&self, entity: &Entity) -> bool {
        self.matches_topics(entity) && self.matches_duration(entity) && self.matches_owner(entity)
    }

    // Any selected topic present
    fn matches_topics(&self, entity: &Entity) -> bool {
        self.topics.is_empty() || entity.topics.iter().any(|t| self.topics.contains(t))
    }

    fn matches_duration(&self, entity: &Entity) -> bool {
        if self.durations.is_empty() {
            return true;
        }
        DurationBucket::of(entity.duration_seconds).map_or(false, |b| self.durations.contains(&b))
    }

    fn matches_owner(&self, entity: &Entity) -> bool {
        match self.owner {
            Some(owner) => entity.owner.as_deref() == Some(owner),
            None => true,
        }
    }
}

/// Keep matching entities, order preserved
pub fn apply<'a>(items: Vec<&'a Entity>, filters: &Filters<'_>) -> Vec<&'a Entity> {
    items.into_iter().filter(|e| filters.matches(e)).collect()
}
