//! Title cleanup for scraping artifacts.

/// Strip a leading `"(N) "` unseen-count prefix, as YouTube prepends to the
/// document title when other tabs have notifications.
pub fn strip_view_counter(title: &str) -> &str {
    if let Some(rest) = title.strip_prefix('(') {
        if let Some(close) = rest.find(')') {
            let digits = &rest[..close];
            if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                return rest[close + 1..].trim_start();
            }
        }
    }
    title
}

/// Strip a trailing site suffix such as `" - YouTube"`.
pub fn strip_site_suffix<'a>(title: &'a str, suffix: &str) -> &'a str {
    title
        .strip_suffix(suffix)
        .map(str::trim_end)
        .unwrap_or(title)
}

/// Collapse a doubled title: some players render the same text twice
/// concatenated (`"FooFoo"`). When the first half, repeated, reconstructs
/// the whole string, keep only the first half.
pub fn collapse_doubled(s: &str) -> &str {
    let mid = s.len() / 2;
    if s.len() >= 2 && s.len() % 2 == 0 && s.is_char_boundary(mid) {
        let (head, tail) = s.split_at(mid);
        if head == tail {
            return head;
        }
    }
    s
}

/// Split a document title of the form `"Artist - Track"` (or
/// `"Artist • Track"`) into artist and track. Without a separator the whole
/// title is the track and no artist is derived.
pub fn split_document_title(title: &str) -> (Option<String>, String) {
    for sep in [" - ", " • "] {
        if let Some((artist, track)) = title.split_once(sep) {
            let artist = artist.trim();
            let track = track.trim();
            if !artist.is_empty() && !track.is_empty() {
                return (Some(artist.to_string()), track.to_string());
            }
        }
    }
    (None, title.trim().to_string())
}
