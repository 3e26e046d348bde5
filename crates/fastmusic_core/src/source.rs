use std::fmt;
use std::sync::LazyLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use regex::Regex;
use thiserror::Error;

use crate::DownloadId;

const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";

static SUPPORTED_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(https?://)?(www\.)?(youtube\.com|youtu\.be)/.+")
        .expect("valid supported url regex")
});

/// True when `url` looks like a `youtube.com/...` or `youtu.be/...` link.
/// Scheme and `www.` are optional, matching is case-insensitive.
pub fn is_supported_url(url: &str) -> bool {
    SUPPORTED_URL.is_match(url)
}

/// Preview image for a search result.
pub fn thumbnail_url(video_id: &str) -> String {
    format!("https://img.youtube.com/vi/{video_id}/mqdefault.jpg")
}

/// Where a download comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    /// A row picked from the search results.
    Search { video_id: String },
    /// A link pasted by the user, already validated and trimmed.
    DirectUrl(String),
}

impl MediaSource {
    /// Validates a pasted link. Whitespace around it is ignored.
    pub fn direct(url: &str) -> Result<Self, SourceError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(SourceError::EmptyUrl);
        }
        if !is_supported_url(url) {
            return Err(SourceError::UnsupportedUrl(url.to_string()));
        }
        Ok(Self::DirectUrl(url.to_string()))
    }

    pub fn canonical_url(&self) -> String {
        match self {
            MediaSource::Search { video_id } => format!("{WATCH_URL_PREFIX}{video_id}"),
            MediaSource::DirectUrl(url) => url.clone(),
        }
    }

    /// Identity key for the pending set. Direct links get a synthetic
    /// `url:` key so they never collide with video ids.
    pub fn download_id(&self) -> DownloadId {
        match self {
            MediaSource::Search { video_id } => DownloadId::new(video_id.clone()),
            MediaSource::DirectUrl(url) => DownloadId::new(format!("url:{url}")),
        }
    }

    pub fn locator(&self) -> Locator {
        Locator::encode(&self.canonical_url())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("Please enter a YouTube URL")]
    EmptyUrl,
    #[error("Please enter a valid YouTube URL")]
    UnsupportedUrl(String),
}

/// Base64 of the canonical source URL, the form the backend expects.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator(String);

#[derive(Debug, Error)]
pub enum LocatorError {
    #[error("locator is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("locator does not decode to utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl Locator {
    pub fn encode(url: &str) -> Self {
        Self(STANDARD.encode(url.as_bytes()))
    }

    pub fn decode(&self) -> Result<String, LocatorError> {
        let bytes = STANDARD.decode(self.0.as_bytes())?;
        Ok(String::from_utf8(bytes)?)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_url_shapes() {
        assert!(is_supported_url("https://www.youtube.com/watch?v=abc"));
        assert!(is_supported_url("http://youtube.com/watch?v=abc&list=PL1"));
        assert!(is_supported_url("youtu.be/abc"));
        assert!(is_supported_url("HTTPS://WWW.YOUTUBE.COM/watch?v=abc"));
    }

    #[test]
    fn rejects_other_urls() {
        assert!(!is_supported_url("https://vimeo.com/123"));
        assert!(!is_supported_url("https://www.youtube.com/"));
        assert!(!is_supported_url("ftp://youtube.com/watch?v=abc"));
        assert!(!is_supported_url("notyoutube.com/watch"));
    }

    #[test]
    fn search_source_synthesizes_watch_url() {
        let source = MediaSource::Search {
            video_id: "dQw4w9WgXcQ".to_string(),
        };
        assert_eq!(
            source.canonical_url(),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
        assert_eq!(source.download_id().as_str(), "dQw4w9WgXcQ");
    }

    #[test]
    fn direct_source_is_trimmed_and_validated() {
        let source = MediaSource::direct("  https://youtu.be/abc  ").unwrap();
        assert_eq!(source.canonical_url(), "https://youtu.be/abc");
        assert_eq!(source.download_id().as_str(), "url:https://youtu.be/abc");

        assert_eq!(MediaSource::direct("   "), Err(SourceError::EmptyUrl));
        assert!(matches!(
            MediaSource::direct("https://example.com/x"),
            Err(SourceError::UnsupportedUrl(_))
        ));
    }

    #[test]
    fn locator_matches_standard_base64() {
        let locator = Locator::encode("https://www.youtube.com/watch?v=abc");
        assert_eq!(
            locator.as_str(),
            "aHR0cHM6Ly93d3cueW91dHViZS5jb20vd2F0Y2g/dj1hYmM="
        );
        assert_eq!(
            locator.decode().unwrap(),
            "https://www.youtube.com/watch?v=abc"
        );
    }

    #[test]
    fn thumbnail_uses_medium_quality_image() {
        assert_eq!(
            thumbnail_url("abc"),
            "https://img.youtube.com/vi/abc/mqdefault.jpg"
        );
    }
}
