//! Report deduplication and the shared display state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ongaku_scrape::TrackObservation;

/// Gate in front of the status reporter: a report goes out if and only if
/// the observed track differs from the last reported one.
///
/// The cell is updated the moment a report is decided, regardless of how
/// the network call turns out: a transient failure must not cause repeated
/// duplicate sends for an unchanged track, at the cost of not retrying until
/// the track actually changes again. At-most-once per distinct value.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    last: Option<TrackObservation>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `obs` should be reported. When it should, it immediately
    /// becomes the last-reported track.
    pub fn check(&mut self, obs: &TrackObservation) -> bool {
        let changed = match &self.last {
            Some(last) => !last.same_track(obs),
            None => true,
        };
        if changed {
            self.last = Some(obs.clone());
        }
        changed
    }

    /// The most recently reported track, if any.
    pub fn last(&self) -> Option<&TrackObservation> {
        self.last.as_ref()
    }
}

/// What the UI sees when it asks for the current track: the latest poll
/// result and when it was observed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NowPlaying {
    pub track: Option<TrackObservation>,
    pub observed_at: Option<DateTime<Utc>>,
}

impl NowPlaying {
    pub fn observed(track: Option<TrackObservation>) -> Self {
        let observed_at = track.as_ref().map(|_| Utc::now());
        Self { track, observed_at }
    }
}
