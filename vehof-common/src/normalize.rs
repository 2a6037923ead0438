//! Row normalization
//!
//! Turns one `RawRecord` into an `Entity`: derives the stable identity,
//! the parsed duration and the topic list. Every parser here degrades to
//! `None` (or the documented fallback) instead of failing, so a malformed
//! field never blocks ingestion of its row.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::db::models::{Entity, RawRecord};

/// Host of the platform's short-link service (`https://youtu.be/<id>`)
pub const SHORT_LINK_HOST: &str = "youtu.be";

static SHORTS_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/shorts/([A-Za-z0-9_-]{6,})").expect("static regex is valid")
});

/// Normalize one source row
///
/// Callers must drop rows where `RawRecord::is_importable` is false before
/// calling this; a missing url or title becomes an empty string here.
pub fn normalize(raw: RawRecord) -> Entity {
    let url = raw.url.as_deref().map(str::trim).unwrap_or_default().to_string();
    let title = raw.title.as_deref().map(str::trim).unwrap_or_default().to_string();

    let media_id = extract_media_id(&url);
    let id = media_id.clone().unwrap_or_else(|| url.clone());

    let duration_seconds = parse_duration_seconds(raw.duration.as_deref());
    let topics = parse_topics(raw.topic.as_deref());

    Entity {
        id,
        media_id,
        url,
        title,
        owner: non_blank(raw.owner),
        owner_url: non_blank(raw.owner_url),
        duration: non_blank(raw.duration),
        duration_seconds,
        published_date: non_blank(raw.published_date),
        view_count: non_blank(raw.view_count),
        subscription_count: non_blank(raw.subscription_count),
        tags: non_blank(raw.tags),
        gpt_tags: non_blank(raw.gpt_tags),
        summary: non_blank(raw.summary),
        format: non_blank(raw.format),
        topic: non_blank(raw.topic),
        topics,
    }
}

/// Extract the platform video id from a url
///
/// Checks, in order: a non-empty `v` query parameter, the first path
/// segment of a short-link url, and a `/shorts/<id>` path. Returns `None`
/// when the url does not parse or matches none of these.
pub fn extract_media_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;

    if let Some((_, v)) = parsed.query_pairs().find(|(key, _)| key == "v") {
        let v = v.trim();
        if !v.is_empty() {
            return Some(v.to_string());
        }
    }

    let is_short_link = parsed.host_str().map_or(false, |host| {
        host == SHORT_LINK_HOST || host.ends_with(&format!(".{}", SHORT_LINK_HOST))
    });
    if is_short_link {
        return parsed
            .path_segments()
            .and_then(|mut segments| segments.next())
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(str::to_string);
    }

    SHORTS_PATH
        .captures(parsed.path())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Parse `MM:SS` or `HH:MM:SS` into seconds
///
/// Returns `None` for empty input, any empty or non-numeric segment, a
/// segment count other than 2 or 3, or overflow.
pub fn parse_duration_seconds(input: Option<&str>) -> Option<i64> {
    let s = input?.trim();
    if s.is_empty() {
        return None;
    }

    let parts = s
        .split(':')
        .map(|part| part.trim().parse::<u32>().ok().map(i64::from))
        .collect::<Option<Vec<i64>>>()?;

    match parts.as_slice() {
        [mm, ss] => mm.checked_mul(60)?.checked_add(*ss),
        [hh, mm, ss] => hh
            .checked_mul(3600)?
            .checked_add(mm.checked_mul(60)?)?
            .checked_add(*ss),
        _ => None,
    }
}

/// Split a comma-joined topic field
///
/// Entries are trimmed and empties dropped; order and duplicates are kept.
pub fn parse_topics(topic: Option<&str>) -> Vec<String> {
    match topic {
        Some(s) => s
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    }
}

/// Tolerant number parser for view and subscription counts
///
/// Strips thousands separators and whitespace; `None` when nothing is left
/// or the result is not finite.
pub fn parse_number_loose(input: Option<&str>) -> Option<f64> {
    let cleaned: String = input?
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
