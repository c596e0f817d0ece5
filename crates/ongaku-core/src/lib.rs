//! Core types and state for the ongaku daemon: configuration, the persisted
//! auth token, identity derivation, and report deduplication.

pub mod config;
pub mod error;
pub mod identity;
pub mod report;
pub mod token;

pub use config::AppConfig;
pub use error::CoreError;
pub use identity::{decode_identity, UserIdentity};
pub use report::{ChangeDetector, NowPlaying};
pub use token::TokenStore;

// Observation types come from the scrape crate; re-exported so consumers
// only need one import path.
pub use ongaku_scrape::{MediaElement, MediaKind, PageSnapshot, Source, TrackObservation};
