//! Query Engine
//!
//! Stateless pipeline over an entity snapshot and a flag map:
//! list-mode restriction, fuzzy search, structured filters, sort,
//! optional shuffle, then truncation to the visible window.

pub mod aggregate;
pub mod filters;
pub mod search;
pub mod sort;

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use vehof_common::{Entity, Error, Flag, FlagKind};

pub use aggregate::{topic_counts, TopicCount};
pub use filters::{DurationBucket, Filters};
pub use sort::SortKey;

/// Which personal list restricts the result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListMode {
    #[default]
    Discover,
    Favorites,
    WatchLater,
    Watched,
}

impl ListMode {
    /// Flag an entity needs to appear; `None` admits everything
    pub fn required_flag(&self) -> Option<FlagKind> {
        match self {
            ListMode::Discover => None,
            ListMode::Favorites => Some(FlagKind::Favorite),
            ListMode::WatchLater => Some(FlagKind::WatchLater),
            ListMode::Watched => Some(FlagKind::Watched),
        }
    }

    pub fn admits(&self, flag: Option<&Flag>) -> bool {
        match self.required_flag() {
            None => true,
            Some(kind) => flag.map_or(false, |f| f.get(kind)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ListMode::Discover => "discover",
            ListMode::Favorites => "favorites",
            ListMode::WatchLater => "watch_later",
            ListMode::Watched => "watched",
        }
    }
}

impl fmt::Display for ListMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "discover" | "all" => Ok(ListMode::Discover),
            "favorites" | "favorite" => Ok(ListMode::Favorites),
            "watch_later" | "watchLater" | "watch-later" => Ok(ListMode::WatchLater),
            "watched" => Ok(ListMode::Watched),
            other => Err(Error::InvalidInput(format!("Unknown list mode: {}", other))),
        }
    }
}

/// Everything that determines a result set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySpec {
    pub text: String,
    pub topics: BTreeSet<String>,
    pub durations: BTreeSet<DurationBucket>,
    pub owner: Option<String>,
    pub mode: ListMode,
    /// `None` keeps relevance (or original) order
    pub sort: Option<SortKey>,
    pub shuffle_seed: Option<u64>,
}

impl Default for QuerySpec {
    fn default() -> Self {
        Self {
            text: String::new(),
            topics: BTreeSet::new(),
            durations: BTreeSet::new(),
            owner: None,
            mode: ListMode::Discover,
            sort: Some(SortKey::Newest),
            shuffle_seed: None,
        }
    }
}

impl QuerySpec {
    pub fn filters(&self) -> Filters<'_> {
        Filters {
            topics: &self.topics,
            durations: &self.durations,
            owner: self.owner.as_deref(),
        }
    }
}

/// One page of a query
#[derive(Debug, Clone)]
pub struct QueryResult<'a> {
    pub items: Vec<&'a Entity>,
    /// Matches before pagination
    pub total: usize,
    /// Size of the list-mode base
    pub list_total: usize,
}

/// Run the full pipeline and keep the first `visible` items
pub fn run_query<'a>(
    entities: &'a [Entity],
    flags: &HashMap<String, Flag>,
    spec: &QuerySpec,
    visible: usize,
) -> QueryResult<'a> {
    let base: Vec<&Entity> = entities
        .iter()
        .filter(|e| spec.mode.admits(flags.get(&e.id)))
        .collect();
    let list_total = base.len();

    let searched = search::rank(base, &spec.text);
    let mut items = filters::apply(searched, &spec.filters());

    if let Some(key) = spec.sort {
        sort::sort_entities(&mut items, key);
    }
    if let Some(seed) = spec.shuffle_seed {
        sort::shuffle_entities(&mut items, seed);
    }

    let total = items.len();
    items.truncate(visible);

    QueryResult {
        items,
        total,
        list_total,
    }
}
