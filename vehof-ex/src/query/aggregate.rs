//! Topic aggregation over the unfiltered catalog

use std::collections::HashMap;

use serde::Serialize;
use vehof_common::Entity;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicCount {
    pub topic: String,
    pub count: usize,
}

/// Occurrences of each topic, most frequent first, then by name
pub fn topic_counts(entities: &[Entity]) -> Vec<TopicCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for topic in entities.iter().flat_map(|e| e.topics.iter()) {
        *counts.entry(topic.as_str()).or_default() += 1;
    }

    let mut result: Vec<TopicCount> = counts
        .into_iter()
        .map(|(topic, count)| TopicCount {
            topic: topic.to_string(),
            count,
        })
        .collect();
    result.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.topic.cmp(&b.topic)));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use vehof_common::{normalize, RawRecord};

    fn entity(id: &str, topic: &str) -> Entity {
        normalize(RawRecord {
            url: Some(format!("https://youtu.be/{}", id)),
            title: Some(id.to_string()),
            topic: Some(topic.to_string()),
            ..Default::default()
        })
    }

    #[test]
    fn test_counts_sorted_by_count_then_name() {
        let entities = vec![
            entity("aaaaaa1", "Music, Film"),
            entity("bbbbbb2", "Film"),
            entity("cccccc3", "Art, Music"),
            entity("dddddd4", ""),
        ];

        let counts = topic_counts(&entities);
        let pairs: Vec<(&str, usize)> = counts.iter().map(|c| (c.topic.as_str(), c.count)).collect();

        assert_eq!(pairs, vec![("Film", 2), ("Music", 2), ("Art", 1)]);
    }

    #[test]
    fn test_empty_catalog() {
        assert!(topic_counts(&[]).is_empty());
    }
}
