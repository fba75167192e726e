//! # backtrack
//!
//! A small host-environment adapter for applications that want looping
//! background audio plus a handful of platform conveniences.
//!
//! The core is [`BackgroundAudio`]: hand it encoded audio bytes and it decodes
//! them off-thread, then loops the result on the default output device. A new
//! `play` replaces the current sound instead of overlapping it, and a decode
//! that finishes after a newer `play` or `stop` is discarded.
//!
//! ## Quick Start
//!
//! ```no_run
//! use backtrack::*;
//!
//! let audio = BackgroundAudio::open_default(PlaybackDesc::default())?;
//!
//! let bytes = std::fs::read("menu_theme.ogg")?;
//! audio.play(bytes);
//!
//! for event in audio.poll_events() {
//!     if event.is_error() {
//!         eprintln!("background audio: {:?}", event);
//!     }
//! }
//!
//! audio.stop();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Key Components
//!
//! - **[`BackgroundAudio`]**: single-slot looping player driven by one worker thread
//! - **[`PlaybackDesc`]**: output, decoding and stale-completion settings
//! - **[`PlaybackEvent`]**: diagnostics for failures that happen after `play` returns
//! - **[`AudioDecoder`](audio_data::AudioDecoder)** / **[`AudioOutput`](output::AudioOutput)**:
//!   seams for the host decoder and output device (symphonia and cpal by default)
//! - **[`host`]**: color-scheme preference, navigation history, attribute storage, clock

pub mod audio_data;
pub mod config;
pub mod error;
pub mod events;
pub mod host;
pub mod manager;
pub mod output;
pub mod playback;

pub use config::{OutputInit, PlaybackDesc, StaleCompletionPolicy};
pub use error::BacktrackError;
pub use events::PlaybackEvent;
pub use manager::{BackgroundAudio, PlaybackState};
pub use output::{AudioOutput, CpalOutput, CpalSource, SourceHandle};
pub use playback::{LoopingVoice, PlayState};
