//! YouTube watch-page scraping.

use tracing::debug;

use crate::clean;
use crate::{MediaKind, PageSnapshot, Source, TrackObservation};

/// Watch-page heading, newest layout first.
const TITLE_SELECTORS: &[&str] = &[
    "h1.ytd-watch-metadata yt-formatted-string",
    "h1.title.ytd-video-primary-info-renderer yt-formatted-string",
];

/// Channel-name link under the video.
const CHANNEL_SELECTORS: &[&str] = &[
    "ytd-channel-name #text a",
    "#owner #channel-name a",
];

pub(crate) fn scrape(page: &PageSnapshot) -> Option<TrackObservation> {
    if !page.has_playing(MediaKind::Video) {
        return None;
    }

    let doc = scraper::Html::parse_document(&page.html);

    let raw_title = match crate::first_text(&doc, TITLE_SELECTORS) {
        Some(t) => t,
        None => {
            debug!(url = %page.url, "no watch-page heading, falling back to document title");
            page.title.clone()
        }
    };
    let title =
        clean::strip_site_suffix(clean::strip_view_counter(&raw_title), " - YouTube").to_string();
    if title.is_empty() {
        return None;
    }

    let artist = crate::first_text(&doc, CHANNEL_SELECTORS);

    Some(TrackObservation {
        title,
        artist,
        source: Source::Youtube,
        playing: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MediaElement;

    fn page(html: &str, title: &str, paused: bool) -> PageSnapshot {
        PageSnapshot {
            url: "https://www.youtube.com/watch?v=abc123".into(),
            title: title.into(),
            html: html.into(),
            media: vec![MediaElement {
                kind: MediaKind::Video,
                paused,
            }],
        }
    }

    #[test]
    fn test_scrapes_heading_and_channel() {
        let html = r#"<html><body>
            <h1 class="ytd-watch-metadata"><yt-formatted-string>Cold Little Heart</yt-formatted-string></h1>
            <ytd-channel-name><div id="text"><a href="/@kiwanuka">Michael Kiwanuka</a></div></ytd-channel-name>
            </body></html>"#;
        let obs = scrape(&page(html, "irrelevant", false)).unwrap();
        assert_eq!(obs.title, "Cold Little Heart");
        assert_eq!(obs.artist.as_deref(), Some("Michael Kiwanuka"));
        assert_eq!(obs.source, Source::Youtube);
        assert!(obs.playing);
    }

    #[test]
    fn test_paused_video_yields_nothing() {
        let html = r#"<html><body>
            <h1 class="ytd-watch-metadata"><yt-formatted-string>Song</yt-formatted-string></h1>
            </body></html>"#;
        assert!(scrape(&page(html, "Song - YouTube", true)).is_none());
    }

    #[test]
    fn test_no_video_element_yields_nothing() {
        let mut p = page("<html></html>", "Song - YouTube", false);
        p.media.clear();
        assert!(scrape(&p).is_none());
    }

    #[test]
    fn test_document_title_fallback_is_cleaned() {
        let obs = scrape(&page(
            "<html><body></body></html>",
            "(3) Song Name - YouTube",
            false,
        ))
        .unwrap();
        assert_eq!(obs.title, "Song Name");
        assert_eq!(obs.artist, None);
    }
}
