mod decode_options;
mod decoder;
mod resampler;
mod symphonia_decoder;

use crate::error::{BacktrackError, Result};
pub use decode_options::DecodeOptions;
pub use decoder::{AudioDecoder, DecodeCallback, DecodeRequest};
pub use resampler::AudioResampler;
use std::sync::Arc;
use std::time::Duration;

pub use symphonia_decoder::{SymphoniaDecoder, decode_bytes};

/// Decoded, interleaved f32 audio ready for playback.
///
/// Cloning is cheap; the sample storage is shared.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    inner: Arc<AudioDataInner>,
}

#[derive(Debug)]
pub(crate) struct AudioDataInner {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
    pub duration: Duration,
    pub total_frames: usize,
}

impl DecodedAudio {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Result<Self> {
        if sample_rate == 0 {
            return Err(BacktrackError::AudioFormat(
                "Sample rate must be greater than 0".to_string(),
            ));
        }
        if channels == 0 {
            return Err(BacktrackError::AudioFormat(
                "Channel count must be greater than 0".to_string(),
            ));
        }
        if samples.len() % channels as usize != 0 {
            return Err(BacktrackError::AudioFormat(format!(
                "{} samples do not divide into {} channels",
                samples.len(),
                channels
            )));
        }

        let total_frames = samples.len() / channels as usize;
        let duration = Duration::from_secs_f64(total_frames as f64 / sample_rate as f64);
        Ok(Self {
            inner: Arc::new(AudioDataInner {
                samples,
                sample_rate,
                channels,
                duration,
                total_frames,
            }),
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.inner.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.inner.channels
    }

    pub fn duration(&self) -> Duration {
        self.inner.duration
    }

    pub fn samples(&self) -> &[f32] {
        &self.inner.samples
    }

    pub fn total_frames(&self) -> usize {
        self.inner.total_frames
    }

    pub fn is_empty(&self) -> bool {
        self.inner.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.samples.len()
    }

    /// Get samples for a specific channel (0-indexed)
    pub fn channel_samples(&self, channel: usize) -> Result<Vec<f32>> {
        if channel >= self.inner.channels as usize {
            return Err(BacktrackError::AudioFormat(format!(
                "Channel {} out of range (max: {})",
                channel,
                self.inner.channels - 1
            )));
        }

        let channel_samples: Vec<f32> = self
            .inner
            .samples
            .chunks(self.inner.channels as usize)
            .map(|frame| frame[channel])
            .collect();

        Ok(channel_samples)
    }

    /// Resample to a different sample rate using rubato
    pub fn resample(&self, target_sample_rate: u32) -> Result<Self> {
        if target_sample_rate == self.inner.sample_rate {
            return Ok(self.clone());
        }

        let resampler = AudioResampler::new(
            self.inner.sample_rate,
            target_sample_rate,
            self.inner.channels,
            Some(1024), // chunk_size
        )?;

        let resampled_samples = resampler.resample_interleaved(&self.inner.samples)?;

        Self::new(resampled_samples, target_sample_rate, self.inner.channels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_and_duration() {
        let audio = DecodedAudio::new(vec![0.0; 8000 * 2], 8000, 2).unwrap();
        assert_eq!(audio.total_frames(), 8000);
        assert_eq!(audio.duration(), Duration::from_secs(1));
        assert_eq!(audio.len(), 16000);
        assert!(!audio.is_empty());
    }

    #[test]
    fn test_rejects_ragged_samples() {
        assert!(DecodedAudio::new(vec![0.0; 3], 8000, 2).is_err());
        assert!(DecodedAudio::new(vec![0.0; 4], 0, 2).is_err());
        assert!(DecodedAudio::new(vec![0.0; 4], 8000, 0).is_err());
    }

    #[test]
    fn test_channel_samples() {
        let audio = DecodedAudio::new(vec![0.1, 0.2, 0.3, 0.4], 8000, 2).unwrap();
        assert_eq!(audio.channel_samples(0).unwrap(), vec![0.1, 0.3]);
        assert_eq!(audio.channel_samples(1).unwrap(), vec![0.2, 0.4]);
        assert!(audio.channel_samples(2).is_err());
    }

    #[test]
    fn test_resample_same_rate_shares_storage() {
        let audio = DecodedAudio::new(vec![0.5; 64], 48000, 1).unwrap();
        let same = audio.resample(48000).unwrap();
        assert!(std::ptr::eq(audio.samples(), same.samples()));
    }
}
