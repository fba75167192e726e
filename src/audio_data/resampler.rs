use crate::error::{BacktrackError, Result};
use rubato::{FftFixedIn, Resampler};

pub struct AudioResampler {
    source_sample_rate: u32,
    target_sample_rate: u32,
    channels: u16,
    chunk_size: usize,
}

impl AudioResampler {
    pub fn new(
        source_sample_rate: u32,
        target_sample_rate: u32,
        channels: u16,
        chunk_size: Option<usize>,
    ) -> Result<Self> {
        if source_sample_rate == 0 || target_sample_rate == 0 {
            return Err(BacktrackError::AudioFormat(
                "Sample rates must be greater than 0".to_string(),
            ));
        }

        if channels == 0 {
            return Err(BacktrackError::AudioFormat(
                "Channel count must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            source_sample_rate,
            target_sample_rate,
            channels,
            chunk_size: chunk_size.unwrap_or(1024),
        })
    }

    /// Number of output frames produced for `input_frames` source frames.
    pub fn output_frames(&self, input_frames: usize) -> usize {
        let scaled = input_frames as u64 * self.target_sample_rate as u64;
        scaled.div_ceil(self.source_sample_rate as u64) as usize
    }

    /// Resample interleaved samples, processing all channels in one pass.
    ///
    /// The resampler's output delay is skipped at the start and the tail is
    /// flushed with silence, so the result lines up with the input and holds
    /// exactly `output_frames` frames. Looped buffers depend on this.
    pub fn resample_interleaved(&self, interleaved_samples: &[f32]) -> Result<Vec<f32>> {
        if self.source_sample_rate == self.target_sample_rate {
            return Ok(interleaved_samples.to_vec());
        }

        let channels = self.channels as usize;
        let input_frames = interleaved_samples.len() / channels;
        if input_frames == 0 {
            return Ok(Vec::new());
        }
        let expected_frames = self.output_frames(input_frames);

        let mut resampler = FftFixedIn::<f32>::new(
            self.source_sample_rate as usize,
            self.target_sample_rate as usize,
            self.chunk_size,
            2, // sub_chunks
            channels,
        )
        .map_err(|e| BacktrackError::AudioFormat(format!("Failed to create resampler: {}", e)))?;

        let delay = resampler.output_delay();
        let needed_frames = delay + expected_frames;

        let mut resampled_channels: Vec<Vec<f32>> =
            vec![Vec::with_capacity(needed_frames); channels];
        let mut frame_index = 0;

        // Past the end of the input the chunks are pure silence, which
        // pushes the delayed tail out of the filter.
        while resampled_channels[0].len() < needed_frames {
            let chunk_frames = resampler.input_frames_next();
            let frames_to_process = (input_frames - frame_index).min(chunk_frames);

            let mut waves_in = vec![vec![0.0f32; chunk_frames]; channels];
            for offset in 0..frames_to_process {
                let frame_start = (frame_index + offset) * channels;
                for (ch, wave) in waves_in.iter_mut().enumerate() {
                    wave[offset] = interleaved_samples[frame_start + ch];
                }
            }

            let waves_out = resampler
                .process(&waves_in, None)
                .map_err(|e| BacktrackError::AudioFormat(format!("Resampling error: {}", e)))?;

            if waves_out.first().is_none_or(|wave| wave.is_empty()) {
                return Err(BacktrackError::AudioFormat(
                    "Resampler produced no output".to_string(),
                ));
            }

            for (resampled, wave) in resampled_channels.iter_mut().zip(waves_out.iter()) {
                resampled.extend_from_slice(wave);
            }

            frame_index += frames_to_process;
        }

        let mut interleaved = Vec::with_capacity(expected_frames * channels);
        for frame in delay..needed_frames {
            for channel in &resampled_channels {
                interleaved.push(channel[frame]);
            }
        }

        Ok(interleaved)
    }

    pub fn target_sample_rate(&self) -> u32 {
        self.target_sample_rate
    }

    pub fn source_sample_rate(&self) -> u32 {
        self.source_sample_rate
    }

    pub fn resample_ratio(&self) -> f64 {
        self.target_sample_rate as f64 / self.source_sample_rate as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resampler_creation() {
        let resampler = AudioResampler::new(44100, 48000, 2, None);
        assert!(resampler.is_ok());

        let resampler = resampler.unwrap();
        assert_eq!(resampler.source_sample_rate(), 44100);
        assert_eq!(resampler.target_sample_rate(), 48000);
    }

    #[test]
    fn test_resampler_no_resampling_needed() {
        let resampler = AudioResampler::new(44100, 44100, 1, None).unwrap();
        let samples = vec![0.1, 0.2, 0.3, 0.4];
        let result = resampler.resample_interleaved(&samples).unwrap();
        assert_eq!(result, samples);
    }

    #[test]
    fn test_invalid_sample_rates() {
        assert!(AudioResampler::new(0, 48000, 2, None).is_err());
        assert!(AudioResampler::new(44100, 0, 2, None).is_err());
        assert!(AudioResampler::new(44100, 48000, 0, None).is_err());
    }

    #[test]
    fn test_upsample_output_length() {
        let resampler = AudioResampler::new(8000, 16000, 2, None).unwrap();
        let frames = 1000;
        let samples: Vec<f32> = (0..frames).flat_map(|_| [0.25f32, -0.25f32]).collect();

        let result = resampler.resample_interleaved(&samples).unwrap();

        assert_eq!(resampler.output_frames(frames), 2000);
        assert_eq!(result.len(), 2000 * 2);
    }

    #[test]
    fn test_resampled_constant_has_no_leading_silence() {
        let resampler = AudioResampler::new(44100, 48000, 1, None).unwrap();
        let samples = vec![1.0f32; 44100];

        let result = resampler.resample_interleaved(&samples).unwrap();

        assert_eq!(result.len(), 48000);
        assert!(result[0] > 0.25, "first frame is {}", result[0]);
        // Away from the edges the filter has settled on the input level.
        for (index, sample) in result[1000..47000].iter().enumerate() {
            assert!(
                (sample - 1.0).abs() < 0.05,
                "frame {} is {}",
                index + 1000,
                sample
            );
        }
    }

    #[test]
    fn test_resampled_tail_is_not_truncated() {
        let resampler = AudioResampler::new(44100, 48000, 1, None).unwrap();
        let mut samples = vec![0.0f32; 4410];
        for sample in &mut samples[3969..] {
            *sample = 1.0;
        }

        let result = resampler.resample_interleaved(&samples).unwrap();

        assert_eq!(result.len(), 4800);
        assert!(result[100].abs() < 0.05, "frame 100 is {}", result[100]);
        assert!(result[4790] > 0.75, "frame 4790 is {}", result[4790]);
    }
}
