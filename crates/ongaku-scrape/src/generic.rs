//! Generic media-page scraping from document metadata.

use crate::clean;
use crate::{PageSnapshot, Source, TrackObservation};

pub(crate) fn scrape(page: &PageSnapshot) -> Option<TrackObservation> {
    if !page.has_any_playing() {
        return None;
    }

    let doc = scraper::Html::parse_document(&page.html);

    // Artist tags in priority order.
    let mut artist = crate::meta_content(&doc, r#"meta[property="og:music:artist"]"#)
        .or_else(|| crate::meta_content(&doc, r#"meta[name="twitter:creator"]"#))
        .or_else(|| crate::meta_content(&doc, r#"meta[name="artist"]"#))
        .or_else(|| crate::meta_content(&doc, r#"meta[name="byl"]"#));

    let title = match crate::meta_content(&doc, r#"meta[property="og:title"]"#) {
        Some(t) => t,
        None => {
            let (split_artist, track) = clean::split_document_title(&page.title);
            if let Some(a) = split_artist {
                artist = Some(a);
            }
            track
        }
    };
    if title.is_empty() {
        return None;
    }

    Some(TrackObservation {
        title,
        artist,
        source: Source::Generic,
        playing: true,
    })
}
