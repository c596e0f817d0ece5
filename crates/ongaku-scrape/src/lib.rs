//! Page scraping: turn a captured browser page into a now-playing observation.
//!
//! The bridge hands us a [`PageSnapshot`] (URL, document title, serialized
//! DOM, and the playback state of the page's media elements). Each supported
//! site has its own extraction policy; anything else goes through the generic
//! metadata-tag scraper.

pub mod clean;
pub mod sites;

mod apple;
mod generic;
mod soundcloud;
mod youtube;

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

pub use sites::SiteMatcher;

/// Where an observation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Youtube,
    Soundcloud,
    AppleMusic,
    Generic,
}

impl Source {
    /// Wire name, matching the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Youtube => "youtube",
            Self::Soundcloud => "soundcloud",
            Self::AppleMusic => "apple_music",
            Self::Generic => "generic",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single now-playing observation. Produced fresh on every poll tick and
/// never persisted; two observations describe the same track when title,
/// artist, and source all agree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackObservation {
    pub title: String,
    pub artist: Option<String>,
    pub source: Source,
    pub playing: bool,
}

impl TrackObservation {
    /// Whether `other` describes the same track. `playing` is display state
    /// and does not participate in identity.
    pub fn same_track(&self, other: &TrackObservation) -> bool {
        self.title == other.title && self.artist == other.artist && self.source == other.source
    }

    /// Human-readable status line, e.g. `"Cold Little Heart – Michael Kiwanuka"`.
    pub fn status_line(&self) -> String {
        match &self.artist {
            Some(artist) => format!("{} – {}", self.title, artist),
            None => self.title.clone(),
        }
    }
}

/// Kind of media element found on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Audio,
    Video,
}

/// Playback state of one `<audio>`/`<video>` element at capture time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaElement {
    pub kind: MediaKind,
    pub paused: bool,
}

/// A captured page, as reported by the browser bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSnapshot {
    /// Page URL at capture time.
    pub url: String,
    /// Document title.
    pub title: String,
    /// Serialized DOM.
    pub html: String,
    /// Media elements present on the page.
    #[serde(default)]
    pub media: Vec<MediaElement>,
}

impl PageSnapshot {
    /// Whether any non-paused media element of the given kind exists.
    pub fn has_playing(&self, kind: MediaKind) -> bool {
        self.media.iter().any(|m| m.kind == kind && !m.paused)
    }

    /// Whether any non-paused media element exists at all.
    pub fn has_any_playing(&self) -> bool {
        self.media.iter().any(|m| !m.paused)
    }
}

/// Scrape a captured page into an observation.
///
/// Dispatches on the URL: pages on a known site get that site's policy,
/// everything else falls back to the generic metadata scraper. `None` means
/// nothing is playing or the required fields were unavailable, never an
/// error.
pub fn scrape(matcher: &SiteMatcher, page: &PageSnapshot) -> Option<TrackObservation> {
    match matcher.classify(&page.url) {
        Some(Source::Youtube) => youtube::scrape(page),
        Some(Source::Soundcloud) => soundcloud::scrape(page),
        Some(Source::AppleMusic) => apple::scrape(page),
        _ => generic::scrape(page),
    }
}

/// First non-empty text content matched by any of the selectors, in order.
pub(crate) fn first_text(doc: &Html, selectors: &[&str]) -> Option<String> {
    selectors.iter().find_map(|raw| {
        let sel = Selector::parse(raw).ok()?;
        doc.select(&sel).find_map(|el| {
            let text = el.text().collect::<String>().trim().to_string();
            if text.is_empty() {
                None
            } else {
                Some(text)
            }
        })
    })
}

/// First element matched by the selector.
pub(crate) fn select_first<'a>(doc: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
    let sel = Selector::parse(selector).ok()?;
    doc.select(&sel).next()
}

/// Non-empty `content` attribute of the first matching `<meta>` tag.
pub(crate) fn meta_content(doc: &Html, selector: &str) -> Option<String> {
    select_first(doc, selector)
        .and_then(|el| el.value().attr("content"))
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing_video() -> Vec<MediaElement> {
        vec![MediaElement {
            kind: MediaKind::Video,
            paused: false,
        }]
    }

    #[test]
    fn test_same_track_ignores_playing() {
        let a = TrackObservation {
            title: "Song".into(),
            artist: Some("Band".into()),
            source: Source::Youtube,
            playing: true,
        };
        let mut b = a.clone();
        b.playing = false;
        assert!(a.same_track(&b));

        b.artist = None;
        assert!(!a.same_track(&b));
    }

    #[test]
    fn test_status_line() {
        let obs = TrackObservation {
            title: "Song".into(),
            artist: Some("Band".into()),
            source: Source::Generic,
            playing: true,
        };
        assert_eq!(obs.status_line(), "Song – Band");

        let solo = TrackObservation {
            artist: None,
            ..obs
        };
        assert_eq!(solo.status_line(), "Song");
    }

    #[test]
    fn test_source_wire_names() {
        assert_eq!(Source::AppleMusic.as_str(), "apple_music");
        let json = serde_json::to_string(&Source::Soundcloud).unwrap();
        assert_eq!(json, "\"soundcloud\"");
    }

    #[test]
    fn test_scrape_dispatches_to_generic_for_unknown_site() {
        let matcher = SiteMatcher::new();
        let page = PageSnapshot {
            url: "https://radio.example.org/live".into(),
            title: "Some Artist - Some Song".into(),
            html: "<html><head></head><body></body></html>".into(),
            media: playing_video(),
        };
        let obs = scrape(&matcher, &page).unwrap();
        assert_eq!(obs.source, Source::Generic);
        assert_eq!(obs.title, "Some Song");
        assert_eq!(obs.artist.as_deref(), Some("Some Artist"));
    }

    #[test]
    fn test_snapshot_media_queries() {
        let page = PageSnapshot {
            url: String::new(),
            title: String::new(),
            html: String::new(),
            media: vec![
                MediaElement {
                    kind: MediaKind::Audio,
                    paused: true,
                },
                MediaElement {
                    kind: MediaKind::Video,
                    paused: false,
                },
            ],
        };
        assert!(page.has_playing(MediaKind::Video));
        assert!(!page.has_playing(MediaKind::Audio));
        assert!(page.has_any_playing());
    }
}
