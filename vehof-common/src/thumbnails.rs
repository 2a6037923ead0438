//! Thumbnail addressing
//!
//! Deterministic image URLs for a platform video id. The explorer only
//! hands these to presentation; it never fetches them.

use serde::{Deserialize, Serialize};

/// Image host serving video thumbnails
pub const THUMBNAIL_HOST: &str = "https://i.ytimg.com/vi";

/// Thumbnail quality tier, lowest to highest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThumbnailTier {
    Default,
    Mq,
    Hq,
    Maxres,
}

impl ThumbnailTier {
    pub const ALL: [ThumbnailTier; 4] = [
        ThumbnailTier::Default,
        ThumbnailTier::Mq,
        ThumbnailTier::Hq,
        ThumbnailTier::Maxres,
    ];

    fn file_name(&self) -> &'static str {
        match self {
            ThumbnailTier::Default => "default.jpg",
            ThumbnailTier::Mq => "mqdefault.jpg",
            ThumbnailTier::Hq => "hqdefault.jpg",
            ThumbnailTier::Maxres => "maxresdefault.jpg",
        }
    }
}

/// URL of one thumbnail tier; `None` without a media id
pub fn thumbnail_url(media_id: Option<&str>, tier: ThumbnailTier) -> Option<String> {
    let id = media_id.filter(|id| !id.is_empty())?;
    Some(format!("{}/{}/{}", THUMBNAIL_HOST, id, tier.file_name()))
}

/// All tiers for one media id, keyed by tier
#[derive(Debug, Clone, Serialize)]
pub struct ThumbnailSet {
    pub default: String,
    pub mq: String,
    pub hq: String,
    pub maxres: String,
}

impl ThumbnailSet {
    pub fn for_media_id(media_id: Option<&str>) -> Option<Self> {
        Some(Self {
            default: thumbnail_url(media_id, ThumbnailTier::Default)?,
            mq: thumbnail_url(media_id, ThumbnailTier::Mq)?,
            hq: thumbnail_url(media_id, ThumbnailTier::Hq)?,
            maxres: thumbnail_url(media_id, ThumbnailTier::Maxres)?,
        })
    }
}
