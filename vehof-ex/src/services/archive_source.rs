//! Archive source fetching
//!
//! The archive table is read fresh on every call: HTTP sources send
//! `Cache-Control: no-store`, file sources are re-read from disk.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::header::{HeaderValue, CACHE_CONTROL};
use vehof_common::{Error, Result};

const USER_AGENT: &str = concat!("vehof-ex/", env!("CARGO_PKG_VERSION"));
const FETCH_TIMEOUT_SECS: u64 = 30;

/// Where the archive table comes from
#[derive(Debug, Clone)]
pub enum ArchiveSource {
    Http {
        url: String,
        client: reqwest::Client,
    },
    File(PathBuf),
}

impl ArchiveSource {
    /// Resolve a configured source string
    ///
    /// `http://` and `https://` strings become HTTP sources; anything else is
    /// a path, taken relative to `root_folder` unless absolute.
    pub fn resolve(source: &str, root_folder: &Path) -> Result<Self> {
        let source = source.trim();
        if source.starts_with("http://") || source.starts_with("https://") {
            return Self::http(source);
        }

        let path = PathBuf::from(source);
        if path.is_absolute() {
            Ok(Self::File(path))
        } else {
            Ok(Self::File(root_folder.join(path)))
        }
    }

    pub fn http(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Internal(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self::Http {
            url: url.into(),
            client,
        })
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// Fetch the full table as text, bypassing every cache
    ///
    /// Any I/O failure or non-success status is `Error::Fetch`.
    pub async fn fetch_text(&self) -> Result<String> {
        match self {
            ArchiveSource::Http { url, client } => {
                tracing::debug!(url = %url, "Fetching archive");

                let response = client
                    .get(url)
                    .header(CACHE_CONTROL, HeaderValue::from_static("no-store"))
                    .send()
                    .await
                    .map_err(|e| Error::Fetch(format!("{}: {}", url, e)))?;

                let status = response.status();
                if !status.is_success() {
                    return Err(Error::Fetch(format!("{} returned HTTP {}", url, status.as_u16())));
                }

                response
                    .text()
                    .await
                    .map_err(|e| Error::Fetch(format!("{}: {}", url, e)))
            }
            ArchiveSource::File(path) => {
                tracing::debug!(path = %path.display(), "Reading archive");

                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|e| Error::Fetch(format!("{}: {}", path.display(), e)))
            }
        }
    }
}

impl fmt::Display for ArchiveSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveSource::Http { url, .. } => f.write_str(url),
            ArchiveSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}
