//! Sort keys and seeded shuffle

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use vehof_common::normalize::parse_number_loose;
use vehof_common::{Entity, Error};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Newest,
    Oldest,
    MostViews,
    FewestViews,
    Longest,
    Shortest,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Newest => "newest",
            SortKey::Oldest => "oldest",
            SortKey::MostViews => "most_views",
            SortKey::FewestViews => "fewest_views",
            SortKey::Longest => "longest",
            SortKey::Shortest => "shortest",
        }
    }

    fn compare(&self, a: &Entity, b: &Entity) -> Ordering {
        match self {
            SortKey::Newest => by_date(a, b, true),
            SortKey::Oldest => by_date(a, b, false),
            SortKey::MostViews => views(b).total_cmp(&views(a)),
            SortKey::FewestViews => views(a).total_cmp(&views(b)),
            SortKey::Longest => seconds(b).cmp(&seconds(a)),
            SortKey::Shortest => seconds(a).cmp(&seconds(b)),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "newest" | "new" => Ok(SortKey::Newest),
            "oldest" | "old" => Ok(SortKey::Oldest),
            "most_views" | "views" => Ok(SortKey::MostViews),
            "fewest_views" => Ok(SortKey::FewestViews),
            "longest" | "duration" => Ok(SortKey::Longest),
            "shortest" => Ok(SortKey::Shortest),
            other => Err(Error::InvalidInput(format!("Unknown sort key: {}", other))),
        }
    }
}

// ISO dates compare lexically; absent dates go last in both directions
fn by_date(a: &Entity, b: &Entity, descending: bool) -> Ordering {
    match (a.published_date.as_deref(), b.published_date.as_deref()) {
        (Some(x), Some(y)) if descending => y.cmp(x),
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn views(entity: &Entity) -> f64 {
    parse_number_loose(entity.view_count.as_deref()).unwrap_or(0.0)
}

fn seconds(entity: &Entity) -> i64 {
    entity.duration_seconds.unwrap_or(0)
}

/// Stable sort; ties keep their incoming order
pub fn sort_entities(items: &mut [&Entity], key: SortKey) {
    items.sort_by(|a, b| key.compare(a, b));
}

/// Uniform shuffle, reproducible for a fixed seed
pub fn shuffle_entities(items: &mut [&Entity], seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    items.shuffle(&mut rng);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: &str, date: Option<&str>, views: Option<&str>, secs: Option<i64>) -> Entity {
        Entity {
            id: id.to_string(),
            media_id: None,
            url: format!("https://example.test/{}", id),
            title: id.to_string(),
            owner: None,
            owner_url: None,
            duration: None,
            duration_seconds: secs,
            published_date: date.map(str::to_string),
            view_count: views.map(str::to_string),
            subscription_count: None,
            tags: None,
            gpt_tags: None,
            summary: None,
            format: None,
            topic: None,
            topics: Vec::new(),
        }
    }

    fn ids(items: &[&Entity]) -> Vec<String> {
        items.iter().map(|e| e.id.clone()).collect()
    }

    #[test]
    fn test_absent_dates_last_both_directions() {
        let a = entity("a", Some("2020-01-01"), None, None);
        let b = entity("b", None, None, None);
        let c = entity("c", Some("2022-05-05"), None, None);

        let mut items = vec![&a, &b, &c];
        sort_entities(&mut items, SortKey::Newest);
        assert_eq!(ids(&items), vec!["c", "a", "b"]);

        sort_entities(&mut items, SortKey::Oldest);
        assert_eq!(ids(&items), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_views_absent_counts_as_zero() {
        let a = entity("a", None, Some("1,000"), None);
        let b = entity("b", None, Some("n/a"), None);
        let c = entity("c", None, Some("20,000"), None);

        let mut items = vec![&a, &b, &c];
        sort_entities(&mut items, SortKey::MostViews);
        assert_eq!(ids(&items), vec!["c", "a", "b"]);

        sort_entities(&mut items, SortKey::FewestViews);
        assert_eq!(ids(&items), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_duration_sort_is_stable() {
        let a = entity("a", None, None, Some(60));
        let b = entity("b", None, None, None);
        let c = entity("c", None, None, Some(60));

        let mut items = vec![&a, &b, &c];
        sort_entities(&mut items, SortKey::Longest);
        assert_eq!(ids(&items), vec!["a", "c", "b"]);

        sort_entities(&mut items, SortKey::Shortest);
        assert_eq!(ids(&items), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_shuffle_reproducible_for_seed() {
        let all: Vec<Entity> = (0..20).map(|i| entity(&i.to_string(), None, None, None)).collect();

        let mut first: Vec<&Entity> = all.iter().collect();
        let mut second: Vec<&Entity> = all.iter().collect();
        shuffle_entities(&mut first, 42);
        shuffle_entities(&mut second, 42);

        assert_eq!(ids(&first), ids(&second));
        assert_eq!(first.len(), all.len());
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!("views".parse::<SortKey>().unwrap(), SortKey::MostViews);
        assert_eq!("most-views".parse::<SortKey>().unwrap(), SortKey::MostViews);
        assert_eq!("duration".parse::<SortKey>().unwrap(), SortKey::Longest);
        assert!("random".parse::<SortKey>().is_err());
    }
}
