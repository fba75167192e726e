use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    /// Target sample rate for resampling (None = keep original)
    pub target_sample_rate: Option<u32>,
    /// Maximum duration to decode (None = decode the entire stream)
    pub max_duration: Option<Duration>,
    /// Container extension hint for the format probe, e.g. "ogg"
    pub extension_hint: Option<String>,
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target_sample_rate(mut self, rate: u32) -> Self {
        self.target_sample_rate = Some(rate);
        self
    }

    pub fn max_duration(mut self, duration: Duration) -> Self {
        self.max_duration = Some(duration);
        self
    }

    pub fn extension_hint(mut self, extension: impl Into<String>) -> Self {
        self.extension_hint = Some(extension.into());
        self
    }
}
