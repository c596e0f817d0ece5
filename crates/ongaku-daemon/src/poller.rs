//! Tab polling and the two periodic loops.
//!
//! The report loop feeds the change detector and the status backend; the
//! display loop refreshes the state served to UI consumers. They tick
//! independently and share nothing but the daemon's state cells.

use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use ongaku_api::types::StatusUpdate;
use ongaku_core::NowPlaying;
use ongaku_scrape::{SiteMatcher, Source, TrackObservation};

use crate::bridge::TabProvider;
use crate::state::SharedDaemon;

/// Scan open tabs for a now-playing track.
///
/// Tabs are visited in the provider's enumeration order and only the first
/// tab of each candidate source is consulted; the first tab that scrapes to
/// an observation wins. Which source ends up first is whatever order the
/// browser returned; there is no source-priority policy here.
pub async fn poll_now_playing<P: TabProvider>(
    provider: &P,
    matcher: &SiteMatcher,
) -> Option<TrackObservation> {
    let tabs = match provider.list_tabs().await {
        Ok(tabs) => tabs,
        Err(e) => {
            debug!("tab enumeration failed: {e}");
            return None;
        }
    };

    let mut tried: Vec<Source> = Vec::new();
    for tab in &tabs {
        let Some(source) = matcher.classify(&tab.url) else {
            continue;
        };
        if tried.contains(&source) {
            continue;
        }
        tried.push(source);

        let page = match provider.capture_tab(tab.id).await {
            Ok(Some(page)) => page,
            Ok(None) => continue,
            Err(e) => {
                // One broken tab must not end the scan.
                debug!(url = %tab.url, "tab capture failed: {e}");
                continue;
            }
        };

        if let Some(obs) = ongaku_scrape::scrape(matcher, &page) {
            return Some(obs);
        }
    }

    None
}

pub fn spawn_report_loop(daemon: SharedDaemon) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(daemon.config.poll.report_interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            report_tick(&daemon).await;
        }
    })
}

pub fn spawn_display_loop(daemon: SharedDaemon) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(daemon.config.poll.display_interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let track = poll_now_playing(&daemon.bridge, &daemon.matcher).await;
            *daemon.now_playing.write().await = NowPlaying::observed(track);
        }
    })
}

async fn report_tick(daemon: &SharedDaemon) {
    let Some(obs) = poll_now_playing(&daemon.bridge, &daemon.matcher).await else {
        return;
    };

    // The detector is updated before the network call and never rolled
    // back: a failed report is not retried until the track changes.
    if !daemon.detector.lock().await.check(&obs) {
        debug!(title = %obs.title, "track unchanged, not reporting");
        return;
    }

    let Some(identity) = daemon.identity() else {
        debug!("no usable token, skipping status report");
        return;
    };
    let client = match daemon.authed_client() {
        Ok(client) => client,
        Err(e) => {
            debug!("skipping status report: {e}");
            return;
        }
    };

    match client
        .set_client_status(&identity.uid, &StatusUpdate::from(&obs))
        .await
    {
        Ok(_) => info!(title = %obs.title, source = %obs.source, "reported now playing"),
        Err(e) => warn!("status report failed: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    use ongaku_scrape::{MediaElement, MediaKind, PageSnapshot};

    use crate::bridge::{BridgeError, TabInfo};

    struct FakeTabs {
        tabs: Vec<TabInfo>,
        pages: HashMap<u64, PageSnapshot>,
        failing: HashSet<u64>,
    }

    impl FakeTabs {
        fn new(tabs: Vec<TabInfo>) -> Self {
            Self {
                tabs,
                pages: HashMap::new(),
                failing: HashSet::new(),
            }
        }
    }

    impl TabProvider for FakeTabs {
        async fn list_tabs(&self) -> Result<Vec<TabInfo>, BridgeError> {
            Ok(self.tabs.clone())
        }

        async fn capture_tab(&self, id: u64) -> Result<Option<PageSnapshot>, BridgeError> {
            if self.failing.contains(&id) {
                return Err(BridgeError::Closed);
            }
            Ok(self.pages.get(&id).cloned())
        }

        async fn capture_active(&self) -> Result<Option<PageSnapshot>, BridgeError> {
            Ok(None)
        }
    }

    fn tab(id: u64, url: &str) -> TabInfo {
        TabInfo {
            id,
            url: url.into(),
            title: String::new(),
        }
    }

    fn soundcloud_page(title: &str, artist: &str) -> PageSnapshot {
        PageSnapshot {
            url: "https://soundcloud.com/a/b".into(),
            title: "SoundCloud".into(),
            html: format!(
                r#"<html><body>
                <button class="playControls__play playing"></button>
                <a class="playbackSoundBadge__titleLink" title="{title}">{title}</a>
                <a class="playbackSoundBadge__lightLink">{artist}</a>
                </body></html>"#
            ),
            media: Vec::new(),
        }
    }

    fn idle_youtube_page() -> PageSnapshot {
        PageSnapshot {
            url: "https://www.youtube.com/watch?v=x".into(),
            title: "Some Video - YouTube".into(),
            html: "<html></html>".into(),
            media: vec![MediaElement {
                kind: MediaKind::Video,
                paused: true,
            }],
        }
    }

    #[tokio::test]
    async fn test_first_scrapable_tab_wins() {
        let mut fake = FakeTabs::new(vec![
            tab(1, "https://www.youtube.com/watch?v=x"),
            tab(2, "https://soundcloud.com/a/b"),
        ]);
        fake.pages.insert(1, idle_youtube_page());
        fake.pages.insert(2, soundcloud_page("Song", "Band"));

        let obs = poll_now_playing(&fake, &SiteMatcher::new()).await.unwrap();
        assert_eq!(obs.source, Source::Soundcloud);
        assert_eq!(obs.title, "Song");
    }

    #[tokio::test]
    async fn test_only_first_tab_per_source_is_consulted() {
        // The second YouTube tab would scrape fine, but only the first tab
        // of each source is evaluated.
        let mut fake = FakeTabs::new(vec![
            tab(1, "https://www.youtube.com/watch?v=idle"),
            tab(2, "https://www.youtube.com/watch?v=playing"),
        ]);
        fake.pages.insert(1, idle_youtube_page());
        let mut playing = idle_youtube_page();
        playing.media[0].paused = false;
        fake.pages.insert(2, playing);

        assert!(poll_now_playing(&fake, &SiteMatcher::new()).await.is_none());
    }

    #[tokio::test]
    async fn test_capture_failure_skips_to_next_source() {
        let mut fake = FakeTabs::new(vec![
            tab(1, "https://www.youtube.com/watch?v=x"),
            tab(2, "https://soundcloud.com/a/b"),
        ]);
        fake.failing.insert(1);
        fake.pages.insert(2, soundcloud_page("Song", "Band"));

        let obs = poll_now_playing(&fake, &SiteMatcher::new()).await.unwrap();
        assert_eq!(obs.source, Source::Soundcloud);
    }

    #[tokio::test]
    async fn test_untracked_tabs_are_ignored() {
        let fake = FakeTabs::new(vec![
            tab(1, "https://github.com/rust-lang/rust"),
            tab(2, "https://example.com/"),
        ]);
        assert!(poll_now_playing(&fake, &SiteMatcher::new()).await.is_none());
    }

    #[tokio::test]
    async fn test_closed_tab_between_list_and_capture() {
        // Tab listed but gone by capture time: scan continues.
        let mut fake = FakeTabs::new(vec![
            tab(1, "https://www.youtube.com/watch?v=x"),
            tab(2, "https://soundcloud.com/a/b"),
        ]);
        fake.pages.insert(2, soundcloud_page("Song", "Band"));

        let obs = poll_now_playing(&fake, &SiteMatcher::new()).await.unwrap();
        assert_eq!(obs.source, Source::Soundcloud);
    }
}
