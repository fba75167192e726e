//! Event types for backtrack
//!
//! Every failure the manager hits after `play` has returned is reported here,
//! since the caller has no result to inspect.

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    DecodeSubmitted {
        generation: u64,
        bytes: usize,
    },
    DecodeFailed {
        generation: u64,
        error: String,
    },
    StaleDecodeDiscarded {
        generation: u64,
        latest: u64,
    },
    SourceStarted {
        generation: u64,
    },
    SourceStopped {
        generation: u64,
    },
    OutputOpened {
        sample_rate: u32,
        channels: u16,
    },
    OutputError {
        error: String,
    },
}

impl PlaybackEvent {
    pub fn generation(&self) -> Option<u64> {
        match self {
            Self::DecodeSubmitted { generation, .. }
            | Self::DecodeFailed { generation, .. }
            | Self::StaleDecodeDiscarded { generation, .. }
            | Self::SourceStarted { generation }
            | Self::SourceStopped { generation } => Some(*generation),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::DecodeFailed { .. } | Self::OutputError { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_classification() {
        let failed = PlaybackEvent::DecodeFailed {
            generation: 3,
            error: "bad header".to_string(),
        };
        assert!(failed.is_error());
        assert_eq!(failed.generation(), Some(3));

        let opened = PlaybackEvent::OutputOpened {
            sample_rate: 48000,
            channels: 2,
        };
        assert!(!opened.is_error());
        assert_eq!(opened.generation(), None);
    }
}
