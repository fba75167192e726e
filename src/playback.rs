//! Playback cursor over a single decoded buffer.
//!
//! A [`LoopingVoice`] is what the output device actually renders: it owns a
//! [`DecodedAudio`], a frame cursor and the loop flag. With looping enabled the
//! cursor wraps to frame 0 at the end of the buffer and playback continues
//! until the voice is stopped or replaced.

use crate::audio_data::DecodedAudio;

/// Represents the current playback state of a voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Playing,
    /// Reached the end of a non-looping buffer
    Finished,
}

#[derive(Debug)]
pub struct LoopingVoice {
    audio: DecodedAudio,
    looping: bool,
    current_frame: usize,
    loop_count: u32,
    play_state: PlayState,
}

impl LoopingVoice {
    pub fn new(audio: DecodedAudio, looping: bool) -> Self {
        let play_state = if audio.total_frames() == 0 {
            PlayState::Finished
        } else {
            PlayState::Playing
        };

        Self {
            audio,
            looping,
            current_frame: 0,
            loop_count: 0,
            play_state,
        }
    }

    pub fn audio(&self) -> &DecodedAudio {
        &self.audio
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    /// Number of times the cursor wrapped back to the start.
    pub fn loop_count(&self) -> u32 {
        self.loop_count
    }

    pub fn play_state(&self) -> PlayState {
        self.play_state
    }

    pub fn is_finished(&self) -> bool {
        self.play_state == PlayState::Finished
    }

    /// Mix this voice into `buffer` (interleaved, `channels` wide).
    /// Returns the number of frames actually filled.
    ///
    /// Source channels are mapped onto output channels: mono is duplicated,
    /// a mono output averages all source channels, otherwise output channel
    /// `c` reads source channel `c % source_channels`.
    pub fn fill_buffer(&mut self, buffer: &mut [f32], channels: u16) -> usize {
        if self.play_state != PlayState::Playing || channels == 0 {
            return 0;
        }

        let out_channels = channels as usize;
        let src_channels = self.audio.channels() as usize;
        let total_frames = self.audio.total_frames();
        let samples = self.audio.samples();
        let mut frames_filled = 0;

        for out_frame in buffer.chunks_exact_mut(out_channels) {
            if self.current_frame >= total_frames {
                if self.looping {
                    self.current_frame = 0;
                    self.loop_count += 1;
                } else {
                    self.play_state = PlayState::Finished;
                    break;
                }
            }

            let src_start = self.current_frame * src_channels;
            let src_frame = &samples[src_start..src_start + src_channels];

            if out_channels == 1 && src_channels > 1 {
                let sum: f32 = src_frame.iter().sum();
                out_frame[0] += sum / src_channels as f32;
            } else {
                for (channel, sample) in out_frame.iter_mut().enumerate() {
                    *sample += src_frame[channel % src_channels];
                }
            }

            self.current_frame += 1;
            frames_filled += 1;
        }

        if !self.looping && self.current_frame >= total_frames {
            self.play_state = PlayState::Finished;
        }

        frames_filled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(frames: usize, channels: u16) -> DecodedAudio {
        let samples = (0..frames)
            .flat_map(|frame| (0..channels).map(move |ch| frame as f32 + ch as f32 * 0.5))
            .collect();
        DecodedAudio::new(samples, 8000, channels).unwrap()
    }

    #[test]
    fn test_looping_voice_plays_past_buffer_end() {
        let mut voice = LoopingVoice::new(ramp(4, 1), true);
        let mut buffer = vec![0.0f32; 10];

        let filled = voice.fill_buffer(&mut buffer, 1);

        assert_eq!(filled, 10);
        assert_eq!(
            buffer,
            vec![0.0, 1.0, 2.0, 3.0, 0.0, 1.0, 2.0, 3.0, 0.0, 1.0]
        );
        assert_eq!(voice.loop_count(), 2);
        assert_eq!(voice.play_state(), PlayState::Playing);
    }

    #[test]
    fn test_non_looping_voice_finishes() {
        let mut voice = LoopingVoice::new(ramp(3, 1), false);
        let mut buffer = vec![0.0f32; 8];

        let filled = voice.fill_buffer(&mut buffer, 1);

        assert_eq!(filled, 3);
        assert!(voice.is_finished());
        assert_eq!(voice.fill_buffer(&mut buffer, 1), 0);
    }

    #[test]
    fn test_mono_source_duplicated_to_stereo() {
        let mut voice = LoopingVoice::new(ramp(2, 1), true);
        let mut buffer = vec![0.0f32; 4];

        voice.fill_buffer(&mut buffer, 2);

        assert_eq!(buffer, vec![0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_stereo_source_downmixed_to_mono() {
        let mut voice = LoopingVoice::new(ramp(2, 2), true);
        let mut buffer = vec![0.0f32; 2];

        voice.fill_buffer(&mut buffer, 1);

        assert_eq!(buffer, vec![0.25, 1.25]);
    }

    #[test]
    fn test_empty_audio_never_plays() {
        let audio = DecodedAudio::new(Vec::new(), 8000, 1).unwrap();
        let mut voice = LoopingVoice::new(audio, true);
        let mut buffer = vec![0.0f32; 16];

        assert_eq!(voice.fill_buffer(&mut buffer, 1), 0);
        assert!(voice.is_finished());
    }
}
