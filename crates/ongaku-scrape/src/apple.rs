//! Apple Music web-player scraping.

use crate::{MediaKind, PageSnapshot, Source, TrackObservation};

/// Playback LCD in the web chrome.
const TITLE_SELECTORS: &[&str] = &[
    ".web-chrome-playback-lcd__song-name",
    ".web-chrome-playback-lcd__song-name-scroll-inner-text-wrapper",
];

const ARTIST_SELECTORS: &[&str] = &[
    ".web-chrome-playback-lcd__sub-copy a",
    ".web-chrome-playback-lcd__sub-copy",
];

pub(crate) fn scrape(page: &PageSnapshot) -> Option<TrackObservation> {
    if !page.has_playing(MediaKind::Audio) {
        return None;
    }

    let doc = scraper::Html::parse_document(&page.html);

    // Both fields are required; partial data is not reported.
    let title = crate::first_text(&doc, TITLE_SELECTORS)?;
    let artist = crate::first_text(&doc, ARTIST_SELECTORS)?;

    Some(TrackObservation {
        title,
        artist: Some(artist),
        source: Source::AppleMusic,
        playing: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MediaElement;

    fn page(html: &str, paused: bool) -> PageSnapshot {
        PageSnapshot {
            url: "https://music.apple.com/us/browse".into(),
            title: "Apple Music".into(),
            html: html.into(),
            media: vec![MediaElement {
                kind: MediaKind::Audio,
                paused,
            }],
        }
    }

    const LCD: &str = r##"<html><body>
        <div class="web-chrome-playback-lcd__song-name">Nightcall</div>
        <div class="web-chrome-playback-lcd__sub-copy"><a href="#">Kavinsky</a></div>
        </body></html>"##;

    #[test]
    fn test_scrapes_lcd() {
        let obs = scrape(&page(LCD, false)).unwrap();
        assert_eq!(obs.title, "Nightcall");
        assert_eq!(obs.artist.as_deref(), Some("Kavinsky"));
        assert_eq!(obs.source, Source::AppleMusic);
    }

    #[test]
    fn test_paused_audio_yields_nothing() {
        assert!(scrape(&page(LCD, true)).is_none());
    }

    #[test]
    fn test_missing_title_yields_nothing() {
        let html = r##"<html><body>
            <div class="web-chrome-playback-lcd__sub-copy"><a href="#">Kavinsky</a></div>
            </body></html>"##;
        assert!(scrape(&page(html, false)).is_none());
    }
}
