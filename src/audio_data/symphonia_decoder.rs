use crate::{
    audio_data::{AudioDecoder, DecodeCallback, DecodeOptions, DecodeRequest, DecodedAudio},
    error::{BacktrackError, Result},
};
use crossbeam_channel::Sender;
use std::io::Cursor;
use std::sync::Arc;
use std::thread;
use symphonia::{
    core::{
        audio::SampleBuffer, codecs::DecoderOptions, errors::Error, formats::FormatOptions,
        io::MediaSourceStream, meta::MetadataOptions, probe::Hint,
    },
    default::{get_codecs, get_probe},
};

/// Decode an in-memory encoded buffer into interleaved f32 samples.
pub fn decode_bytes(bytes: Arc<[u8]>, options: &DecodeOptions) -> Result<DecodedAudio> {
    if bytes.is_empty() {
        return Err(BacktrackError::Decode("Empty input buffer".to_string()));
    }

    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = options.extension_hint.as_deref() {
        hint.with_extension(ext);
    }

    let probed = get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| BacktrackError::Decode(format!("Failed to probe audio format: {:?}", e)))?;

    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| BacktrackError::Decode("No default audio track found".to_string()))?;
    let track_id = track.id;

    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| BacktrackError::Decode("Sample rate not found".to_string()))?;

    // Some codecs only report the channel layout once the first packet is decoded.
    let mut channels = track
        .codec_params
        .channels
        .map(|channels| channels.count() as u16);

    let mut decoder = get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| BacktrackError::Decode(format!("Failed to create decoder: {:?}", e)))?;

    let max_frames = options
        .max_duration
        .map(|d| (d.as_secs_f64() * sample_rate as f64) as usize)
        .unwrap_or(usize::MAX);

    let mut samples: Vec<f32> = Vec::new();
    let mut frames_decoded = 0;

    while frames_decoded < max_frames {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(Error::IoError(_)) => break, // end-of-stream
            Err(Error::ResetRequired) => break,
            Err(e) => {
                return Err(BacktrackError::Decode(format!(
                    "Error reading packet: {:?}",
                    e
                )));
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(Error::IoError(_)) => break,
            Err(Error::DecodeError(e)) => {
                log::warn!("Skipping corrupt packet: {}", e);
                continue;
            }
            Err(e) => {
                return Err(BacktrackError::Decode(format!(
                    "Error decoding packet: {:?}",
                    e
                )));
            }
        };

        let spec = *decoded.spec();
        let packet_channels = *channels.get_or_insert(spec.channels.count() as u16);
        if packet_channels == 0 {
            return Err(BacktrackError::Decode("Stream has no channels".to_string()));
        }

        let mut tmp = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        tmp.copy_interleaved_ref(decoded);
        samples.extend_from_slice(tmp.samples());

        frames_decoded = samples.len() / packet_channels as usize;
    }

    let channels =
        channels.ok_or_else(|| BacktrackError::Decode("Channel count not found".to_string()))?;

    if frames_decoded > max_frames {
        samples.truncate(max_frames * channels as usize);
    }

    if samples.is_empty() {
        return Err(BacktrackError::Decode(
            "Stream contained no audio frames".to_string(),
        ));
    }

    let mut audio_data = DecodedAudio::new(samples, sample_rate, channels)?;

    if let Some(target_rate) = options.target_sample_rate {
        if target_rate != sample_rate {
            log::debug!("Resampling decoded audio {}Hz -> {}Hz", sample_rate, target_rate);
            audio_data = audio_data.resample(target_rate)?;
        }
    }

    Ok(audio_data)
}

struct DecodeJob {
    request: DecodeRequest,
    on_done: DecodeCallback,
}

/// Symphonia-backed [`AudioDecoder`] running on a small pool of worker threads.
///
/// Workers exit once the decoder is dropped and the job queue drains.
pub struct SymphoniaDecoder {
    job_sender: Sender<DecodeJob>,
}

impl SymphoniaDecoder {
    pub fn new(options: DecodeOptions, workers: usize) -> Result<Self> {
        let (job_sender, job_receiver) = crossbeam_channel::unbounded::<DecodeJob>();

        for index in 0..workers.max(1) {
            let job_receiver = job_receiver.clone();
            let options = options.clone();
            thread::Builder::new()
                .name(format!("backtrack-decode-{}", index))
                .spawn(move || {
                    for job in job_receiver.iter() {
                        let mut job_options = options.clone();
                        if let Some(rate) = job.request.target_sample_rate {
                            job_options.target_sample_rate = Some(rate);
                        }
                        let result = decode_bytes(job.request.bytes, &job_options);
                        (job.on_done)(result);
                    }
                    log::debug!("Decode worker {} exiting", index);
                })
                .map_err(|e| {
                    BacktrackError::Engine(format!("Failed to spawn decode worker: {}", e))
                })?;
        }

        Ok(Self { job_sender })
    }
}

impl AudioDecoder for SymphoniaDecoder {
    fn submit(&self, request: DecodeRequest, on_done: DecodeCallback) {
        if let Err(err) = self.job_sender.send(DecodeJob { request, on_done }) {
            let job = err.into_inner();
            (job.on_done)(Err(BacktrackError::Engine(
                "Decode workers have shut down".to_string(),
            )));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn wav_bytes(sample_rate: u32, channels: u16, frames: usize) -> Arc<[u8]> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for frame in 0..frames {
                for _ in 0..channels {
                    writer.write_sample(((frame % 64) as i16 - 32) * 512).unwrap();
                }
            }
            writer.finalize().unwrap();
        }
        Arc::from(cursor.into_inner())
    }

    #[test]
    fn test_decode_wav_bytes() {
        let _ = env_logger::builder().is_test(true).try_init();

        let audio = decode_bytes(wav_bytes(8000, 2, 1000), &DecodeOptions::default()).unwrap();

        assert_eq!(audio.sample_rate(), 8000);
        assert_eq!(audio.channels(), 2);
        assert_eq!(audio.total_frames(), 1000);
    }

    #[test]
    fn test_decode_respects_max_duration() {
        let options = DecodeOptions::new().max_duration(Duration::from_millis(100));

        let audio = decode_bytes(wav_bytes(8000, 1, 4000), &options).unwrap();

        assert_eq!(audio.total_frames(), 800);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let garbage: Arc<[u8]> = Arc::from(vec![0x13u8; 256]);
        assert!(matches!(
            decode_bytes(garbage, &DecodeOptions::default()),
            Err(BacktrackError::Decode(_))
        ));
    }

    #[test]
    fn test_decode_rejects_empty_buffer() {
        let empty: Arc<[u8]> = Arc::from(Vec::new());
        assert!(decode_bytes(empty, &DecodeOptions::default()).is_err());
    }

    #[test]
    fn test_decoder_pool_invokes_callback_once() -> anyhow::Result<()> {
        let decoder = SymphoniaDecoder::new(DecodeOptions::default(), 2)?;
        let (tx, rx) = crossbeam_channel::unbounded();

        let ok_tx = tx.clone();
        decoder.submit(
            DecodeRequest {
                bytes: wav_bytes(8000, 1, 500),
                target_sample_rate: None,
            },
            Box::new(move |result| {
                let _ = ok_tx.send(result.map(|audio| audio.total_frames()).ok());
            }),
        );
        decoder.submit(
            DecodeRequest {
                bytes: Arc::from(vec![1u8, 2, 3, 4]),
                target_sample_rate: None,
            },
            Box::new(move |result| {
                let _ = tx.send(result.map(|audio| audio.total_frames()).ok());
            }),
        );

        let mut results = vec![
            rx.recv_timeout(Duration::from_secs(5))?,
            rx.recv_timeout(Duration::from_secs(5))?,
        ];
        results.sort();
        assert_eq!(results, vec![None, Some(500)]);
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
        Ok(())
    }
}
