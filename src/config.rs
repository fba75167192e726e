//! Configuration for the background audio manager

use crate::audio_data::DecodeOptions;
use crate::error::{BacktrackError, Result};
use std::time::Duration;

/// What to do with a decode that finishes after a newer `play` or `stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StaleCompletionPolicy {
    /// Drop completions whose generation is no longer the latest.
    #[default]
    Discard,
    /// Let any successful completion become the current source. The previous
    /// source is still stopped first, so only one source is ever audible.
    LastDecodeWins,
}

/// When the output context is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputInit {
    /// Open while spawning the manager and fail the constructor on error.
    #[default]
    Eager,
    /// Open on the first non-empty `play`; retried on later plays if it fails.
    Lazy,
}

#[derive(Debug, Clone)]
pub struct PlaybackDesc {
    /// Output sample rate (None = device default)
    pub sample_rate: Option<u32>,
    /// Fixed device buffer size in frames (None = device default)
    pub block_size: Option<u32>,
    /// Number of decode worker threads
    pub decode_workers: usize,
    /// Maximum duration to decode from a single `play` (None = whole stream)
    pub max_decode_duration: Option<Duration>,
    pub stale_completions: StaleCompletionPolicy,
    pub output_init: OutputInit,
    /// Events kept for `poll_events`; newer events are dropped once full
    pub event_capacity: usize,
}

impl Default for PlaybackDesc {
    fn default() -> Self {
        Self {
            sample_rate: None,
            block_size: None,
            decode_workers: 1,
            max_decode_duration: None,
            stale_completions: StaleCompletionPolicy::Discard,
            output_init: OutputInit::Eager,
            event_capacity: 256,
        }
    }
}

impl PlaybackDesc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample_rate(mut self, rate: u32) -> Self {
        self.sample_rate = Some(rate);
        self
    }

    pub fn block_size(mut self, size: u32) -> Self {
        self.block_size = Some(size);
        self
    }

    pub fn decode_workers(mut self, workers: usize) -> Self {
        self.decode_workers = workers;
        self
    }

    pub fn max_decode_duration(mut self, duration: Duration) -> Self {
        self.max_decode_duration = Some(duration);
        self
    }

    pub fn stale_completions(mut self, policy: StaleCompletionPolicy) -> Self {
        self.stale_completions = policy;
        self
    }

    pub fn output_init(mut self, init: OutputInit) -> Self {
        self.output_init = init;
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == Some(0) {
            return Err(BacktrackError::Configuration(
                "Sample rate must be greater than 0".to_string(),
            ));
        }
        if self.block_size == Some(0) {
            return Err(BacktrackError::Configuration(
                "Block size must be greater than 0".to_string(),
            ));
        }
        if self.decode_workers == 0 {
            return Err(BacktrackError::Configuration(
                "At least one decode worker is required".to_string(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(BacktrackError::Configuration(
                "Event capacity must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Decode options for the symphonia decoder built by `open_default`.
    pub fn decode_options(&self) -> DecodeOptions {
        let mut options = DecodeOptions::new();
        if let Some(duration) = self.max_decode_duration {
            options = options.max_duration(duration);
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_desc_is_valid() {
        let desc = PlaybackDesc::default();
        assert!(desc.validate().is_ok());
        assert_eq!(desc.stale_completions, StaleCompletionPolicy::Discard);
        assert_eq!(desc.output_init, OutputInit::Eager);
    }

    #[test]
    fn test_builder_sets_fields() {
        let desc = PlaybackDesc::new()
            .sample_rate(44100)
            .block_size(256)
            .decode_workers(3)
            .max_decode_duration(Duration::from_secs(30))
            .stale_completions(StaleCompletionPolicy::LastDecodeWins)
            .output_init(OutputInit::Lazy)
            .event_capacity(8);

        assert_eq!(desc.sample_rate, Some(44100));
        assert_eq!(desc.block_size, Some(256));
        assert_eq!(desc.decode_workers, 3);
        assert_eq!(
            desc.decode_options().max_duration,
            Some(Duration::from_secs(30))
        );
        assert_eq!(desc.stale_completions, StaleCompletionPolicy::LastDecodeWins);
        assert_eq!(desc.output_init, OutputInit::Lazy);
        assert_eq!(desc.event_capacity, 8);
    }

    #[test]
    fn test_invalid_desc() {
        assert!(PlaybackDesc::new().sample_rate(0).validate().is_err());
        assert!(PlaybackDesc::new().block_size(0).validate().is_err());
        assert!(PlaybackDesc::new().decode_workers(0).validate().is_err());
        assert!(PlaybackDesc::new().event_capacity(0).validate().is_err());
    }
}
