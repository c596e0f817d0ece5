//! Registry of sites with dedicated scraping policies.

use regex::Regex;

use crate::Source;

/// A known music site and the URL shapes it serves.
#[derive(Debug, Clone, Copy)]
pub struct SiteDef {
    pub source: Source,
    /// Regex patterns matched against the full tab URL.
    pub url_patterns: &'static [&'static str],
}

/// Sites with a dedicated scraper. First match wins, top to bottom.
pub const KNOWN_SITES: &[SiteDef] = &[
    SiteDef {
        source: Source::Youtube,
        url_patterns: &[r"^https?://(www\.|m\.|music\.)?youtube\.com/"],
    },
    SiteDef {
        source: Source::Soundcloud,
        url_patterns: &[r"^https?://(www\.|m\.)?soundcloud\.com/"],
    },
    SiteDef {
        source: Source::AppleMusic,
        url_patterns: &[r"^https?://music\.apple\.com/"],
    },
];

/// Compiled URL classifier over [`KNOWN_SITES`].
#[derive(Debug)]
pub struct SiteMatcher {
    compiled: Vec<(Source, Vec<Regex>)>,
}

impl SiteMatcher {
    pub fn new() -> Self {
        let compiled = KNOWN_SITES
            .iter()
            .map(|site| {
                let patterns = site
                    .url_patterns
                    .iter()
                    .filter_map(|p| Regex::new(p).ok())
                    .collect();
                (site.source, patterns)
            })
            .collect();
        Self { compiled }
    }

    /// The dedicated-scraper source for this URL, or `None` when only the
    /// generic policy applies.
    pub fn classify(&self, url: &str) -> Option<Source> {
        self.compiled
            .iter()
            .find(|(_, patterns)| patterns.iter().any(|re| re.is_match(url)))
            .map(|(source, _)| *source)
    }

    /// Whether the URL belongs to any site with a dedicated scraper.
    pub fn is_tracked(&self, url: &str) -> bool {
        self.classify(url).is_some()
    }
}

impl Default for SiteMatcher {
    fn default() -> Self {
        Self::new()
    }
}
