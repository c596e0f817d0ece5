//! SoundCloud scraping, keyed off the persistent playback bar.

use crate::clean;
use crate::{PageSnapshot, Source, TrackObservation};

/// Play control while audio is running. The `playing` class is only present
/// during playback, so its absence means paused or idle.
const PLAYING_CONTROL: &str = ".playControls__play.playing";

const TITLE_SELECTOR: &str = ".playbackSoundBadge__titleLink";
const ARTIST_SELECTOR: &str = ".playbackSoundBadge__lightLink";

pub(crate) fn scrape(page: &PageSnapshot) -> Option<TrackObservation> {
    let doc = scraper::Html::parse_document(&page.html);

    crate::select_first(&doc, PLAYING_CONTROL)?;

    // The badge's `title` attribute carries the untruncated text.
    let title_el = crate::select_first(&doc, TITLE_SELECTOR)?;
    let raw_title = title_el
        .value()
        .attr("title")
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .or_else(|| {
            let text = title_el.text().collect::<String>().trim().to_string();
            if text.is_empty() {
                None
            } else {
                Some(text)
            }
        })?;

    // Partial data is not reported for this source.
    let artist = crate::first_text(&doc, &[ARTIST_SELECTOR])?;

    let title = clean::collapse_doubled(&raw_title).to_string();

    Some(TrackObservation {
        title,
        artist: Some(artist),
        source: Source::Soundcloud,
        playing: true,
    })
}
