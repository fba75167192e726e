//! Host audio output device.
//!
//! [`AudioOutput`] is the output context the manager opens once and keeps for
//! its whole life; [`SourceHandle`] is one startable/stoppable playback of a
//! decoded buffer. [`CpalOutput`] implements both on top of the default cpal
//! device: the stream runs continuously and renders whichever voice currently
//! occupies its single slot, or silence.

use crate::audio_data::DecodedAudio;
use crate::config::PlaybackDesc;
use crate::error::{BacktrackError, Result};
use crate::playback::LoopingVoice;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

/// A startable/stoppable playback instance bound to one decoded buffer.
pub trait SourceHandle {
    /// Begin audible output immediately.
    fn start(&mut self) -> Result<()>;

    /// Halt output immediately. Calling it again is a no-op.
    fn stop(&mut self);

    /// True between a successful `start` and the first `stop`.
    fn is_active(&self) -> bool;
}

/// The output side of the host audio pipeline.
pub trait AudioOutput {
    type Source: SourceHandle;

    fn sample_rate(&self) -> u32;

    fn channels(&self) -> u16;

    fn create_source(&self, audio: DecodedAudio, looping: bool) -> Result<Self::Source>;
}

struct ActiveVoice {
    id: Uuid,
    voice: LoopingVoice,
}

type VoiceSlot = Arc<Mutex<Option<ActiveVoice>>>;

/// Output context backed by the default cpal device.
pub struct CpalOutput {
    _stream: cpal::Stream,
    voice_slot: VoiceSlot,
    frames_rendered: Arc<AtomicUsize>,
    sample_rate: u32,
    channels: u16,
}

impl CpalOutput {
    /// Open the default output device and start its stream.
    pub fn open(desc: &PlaybackDesc) -> Result<Self> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or_else(|| {
            BacktrackError::AudioDevice("No default output device available".into())
        })?;

        let default_config = device.default_output_config().map_err(|e| {
            BacktrackError::AudioDevice(format!("Failed to get default config: {}", e))
        })?;

        let mut config = default_config.config();
        if let Some(rate) = desc.sample_rate {
            config.sample_rate = cpal::SampleRate(rate);
        }
        if let Some(block_size) = desc.block_size {
            config.buffer_size = cpal::BufferSize::Fixed(block_size);
        }

        log::info!(
            "Opening output device {} ({}ch, {}Hz, {:?})",
            device.name().unwrap_or_else(|_| "Unknown Device".to_string()),
            config.channels,
            config.sample_rate.0,
            default_config.sample_format()
        );

        let voice_slot: VoiceSlot = Arc::new(Mutex::new(None));
        let frames_rendered = Arc::new(AtomicUsize::new(0));

        let stream = match default_config.sample_format() {
            cpal::SampleFormat::F32 => {
                create_stream::<f32>(&device, &config, voice_slot.clone(), frames_rendered.clone())?
            }
            cpal::SampleFormat::I16 => {
                create_stream::<i16>(&device, &config, voice_slot.clone(), frames_rendered.clone())?
            }
            cpal::SampleFormat::U16 => {
                create_stream::<u16>(&device, &config, voice_slot.clone(), frames_rendered.clone())?
            }
            other => {
                return Err(BacktrackError::AudioFormat(format!(
                    "Unsupported sample format: {:?}",
                    other
                )));
            }
        };

        stream.play().map_err(|e| {
            BacktrackError::AudioDevice(format!("Failed to start stream: {}", e))
        })?;

        Ok(Self {
            _stream: stream,
            voice_slot,
            frames_rendered,
            sample_rate: config.sample_rate.0,
            channels: config.channels,
        })
    }

    /// Frames of non-silent output rendered since the stream opened.
    pub fn frames_rendered(&self) -> usize {
        self.frames_rendered.load(Ordering::Relaxed)
    }
}

impl AudioOutput for CpalOutput {
    type Source = CpalSource;

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn create_source(&self, audio: DecodedAudio, looping: bool) -> Result<CpalSource> {
        let audio = if audio.sample_rate() != self.sample_rate {
            log::warn!(
                "Decoded audio at {}Hz does not match output {}Hz, resampling",
                audio.sample_rate(),
                self.sample_rate
            );
            audio.resample(self.sample_rate)?
        } else {
            audio
        };

        Ok(CpalSource {
            id: Uuid::new_v4(),
            pending: Some(LoopingVoice::new(audio, looping)),
            voice_slot: self.voice_slot.clone(),
            active: false,
        })
    }
}

/// Source handle for [`CpalOutput`].
///
/// Starting a source installs its voice in the output's slot; stopping it
/// removes the voice only if the slot still holds this source.
pub struct CpalSource {
    id: Uuid,
    pending: Option<LoopingVoice>,
    voice_slot: VoiceSlot,
    active: bool,
}

impl SourceHandle for CpalSource {
    fn start(&mut self) -> Result<()> {
        let voice = self.pending.take().ok_or_else(|| {
            BacktrackError::Engine(format!("Source {} was already started or stopped", self.id))
        })?;

        let previous = self.voice_slot.lock().replace(ActiveVoice { id: self.id, voice });
        if let Some(previous) = previous {
            log::warn!("Source {} replaced still-active source {}", self.id, previous.id);
        }

        self.active = true;
        log::debug!("Source {} started", self.id);
        Ok(())
    }

    fn stop(&mut self) {
        self.pending = None;
        if !self.active {
            return;
        }
        self.active = false;

        let mut slot = self.voice_slot.lock();
        if slot.as_ref().is_some_and(|active| active.id == self.id) {
            *slot = None;
        }
        log::debug!("Source {} stopped", self.id);
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

impl Drop for CpalSource {
    fn drop(&mut self) {
        self.stop();
    }
}

fn create_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    voice_slot: VoiceSlot,
    frames_rendered: Arc<AtomicUsize>,
) -> Result<cpal::Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels;
    let mut scratch: Vec<f32> = Vec::new();

    let stream = device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                if scratch.len() < data.len() {
                    scratch.resize(data.len(), 0.0);
                }
                let mix = &mut scratch[..data.len()];
                mix.fill(0.0);

                // Never block the audio thread; a contended slot renders one block of silence.
                if let Some(mut slot) = voice_slot.try_lock() {
                    if let Some(active) = slot.as_mut() {
                        let frames = active.voice.fill_buffer(mix, channels);
                        frames_rendered.fetch_add(frames, Ordering::Relaxed);
                    }
                }

                for (out, sample) in data.iter_mut().zip(mix.iter()) {
                    *out = T::from_sample(*sample);
                }
            },
            move |err| {
                log::error!("Audio stream error: {}", err);
            },
            None,
        )
        .map_err(|e| BacktrackError::AudioDevice(format!("Failed to build stream: {}", e)))?;

    Ok(stream)
}
