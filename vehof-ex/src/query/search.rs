//! Weighted multi-field fuzzy search
//!
//! Each query token is scored against every searchable field: 0.0 for a
//! substring hit, otherwise the best normalized Levenshtein distance to a
//! word of the field (or to a same-length prefix of that word). A token
//! matches a field when its distance is within `THRESHOLD`. An entity
//! matches when every token matches at least one field, in any order.
//!
//! Field weights scale the per-token score so that a title hit outranks an
//! equally close summary hit. The entity score is the mean of its token
//! scores; lower is better.

use strsim::normalized_levenshtein;
use vehof_common::Entity;

/// Maximum token distance still counted as a match
pub const THRESHOLD: f64 = 0.35;

/// Tokens this short only match as substrings
const MIN_FUZZY_TOKEN_CHARS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Title,
    Owner,
    Topic,
    Tags,
    GptTags,
    Summary,
}

impl SearchField {
    pub const ALL: [SearchField; 6] = [
        SearchField::Title,
        SearchField::Owner,
        SearchField::Topic,
        SearchField::Tags,
        SearchField::GptTags,
        SearchField::Summary,
    ];

    pub fn weight(&self) -> f64 {
        match self {
            SearchField::Title => 0.45,
            SearchField::Owner => 0.18,
            SearchField::Topic => 0.20,
            SearchField::Tags => 0.08,
            SearchField::GptTags => 0.05,
            SearchField::Summary => 0.04,
        }
    }

    fn text<'e>(&self, entity: &'e Entity) -> Option<&'e str> {
        match self {
            SearchField::Title => Some(entity.title.as_str()),
            SearchField::Owner => entity.owner.as_deref(),
            SearchField::Topic => entity.topic.as_deref(),
            SearchField::Tags => entity.tags.as_deref(),
            SearchField::GptTags => entity.gpt_tags.as_deref(),
            SearchField::Summary => entity.summary.as_deref(),
        }
    }
}

/// Lowercased whitespace-separated query tokens
pub fn tokenize(query: &str) -> Vec<String> {
    query.split_whitespace().map(str::to_lowercase).collect()
}

/// Distance of one token to one field's lowercased text
///
/// `None` when the token does not match within `THRESHOLD`.
fn token_distance(token: &str, field: &str) -> Option<f64> {
    if field.contains(token) {
        return Some(0.0);
    }
    let token_len = token.chars().count();
    if token_len < MIN_FUZZY_TOKEN_CHARS {
        return None;
    }

    let best = field
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let whole = 1.0 - normalized_levenshtein(token, word);
            let prefix: String = word.chars().take(token_len).collect();
            let partial = 1.0 - normalized_levenshtein(token, &prefix);
            whole.min(partial)
        })
        .fold(f64::INFINITY, f64::min);

    (best <= THRESHOLD).then_some(best)
}

/// Score one entity; `None` when some token matches no field
pub fn score_entity(entity: &Entity, tokens: &[String]) -> Option<f64> {
    if tokens.is_empty() {
        return Some(0.0);
    }

    let max_weight = SearchField::ALL
        .iter()
        .map(SearchField::weight)
        .fold(0.0, f64::max);

    let fields: Vec<(f64, String)> = SearchField::ALL
        .iter()
        .filter_map(|field| {
            field
                .text(entity)
                .map(|text| (field.weight() / max_weight, text.to_lowercase()))
        })
        .collect();

    let mut total = 0.0;
    for token in tokens {
        let best = fields
            .iter()
            .filter_map(|(weight, text)| {
                token_distance(token, text).map(|d| 1.0 - (1.0 - d) * weight)
            })
            .fold(f64::INFINITY, f64::min);

        if !best.is_finite() {
            return None;
        }
        total += best;
    }

    Some(total / tokens.len() as f64)
}

/// Keep matching entities, best first; ties keep incoming order
///
/// A blank query passes everything through unchanged.
pub fn rank<'a>(items: Vec<&'a Entity>, query: &str) -> Vec<&'a Entity> {
    let tokens = tokenize(query);
    if tokens.is_empty() {
        return items;
    }

    let mut scored: Vec<(f64, &'a Entity)> = items
        .into_iter()
        .filter_map(|entity| score_entity(entity, &tokens).map(|score| (score, entity)))
        .collect();

    scored.sort_by(|a, b| a.0.total_cmp(&b.0));
    scored.into_iter().map(|(_, entity)| entity).collect()
}
