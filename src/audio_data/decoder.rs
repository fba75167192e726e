use crate::audio_data::DecodedAudio;
use crate::error::Result;
use std::sync::Arc;

/// Completion callback for a submitted decode.
pub type DecodeCallback = Box<dyn FnOnce(Result<DecodedAudio>) + Send + 'static>;

/// A request to decode one encoded buffer.
#[derive(Debug, Clone)]
pub struct DecodeRequest {
    /// Encoded audio in any container/codec the decoder understands
    pub bytes: Arc<[u8]>,
    /// Sample rate the decoded audio should be delivered at (None = native)
    pub target_sample_rate: Option<u32>,
}

/// Asynchronous audio decoder.
///
/// The background audio manager never decodes on its own thread; it hands
/// the encoded bytes to an `AudioDecoder` and continues. Implementations may
/// decode on any thread but must invoke `on_done` exactly once per request.
///
/// # Example
///
/// ```ignore
/// use backtrack::audio_data::{AudioDecoder, DecodeCallback, DecodeRequest, decode_bytes, DecodeOptions};
///
/// struct InlineDecoder;
///
/// impl AudioDecoder for InlineDecoder {
///     fn submit(&self, request: DecodeRequest, on_done: DecodeCallback) {
///         on_done(decode_bytes(request.bytes, &DecodeOptions::default()));
///     }
/// }
/// ```
pub trait AudioDecoder: Send {
    fn submit(&self, request: DecodeRequest, on_done: DecodeCallback);
}
