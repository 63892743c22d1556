/// A value stored in a format descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatValue {
    Int(i32),
    Str(String),
}

impl From<i32> for FormatValue {
    fn from(value: i32) -> Self {
        FormatValue::Int(value)
    }
}

impl From<&str> for FormatValue {
    fn from(value: &str) -> Self {
        FormatValue::Str(value.to_string())
    }
}

impl From<String> for FormatValue {
    fn from(value: String) -> Self {
        FormatValue::Str(value)
    }
}

/// Everything a session is configured with. Immutable once the session starts.
///
/// ```rust
/// use mediacodec::SessionConfig;
///
/// let config = SessionConfig::new("OMX.qcom.video.decoder.avc", "video/avc", 1920, 1080)
///     .with_rotation(90)
///     .with_i32("max-input-size", 1 << 20);
/// assert!(!config.encoder);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Codec component name, e.g. `OMX.google.h264.decoder`.
    pub codec_name: String,
    /// Mime type of the elementary stream, e.g. `video/avc`.
    pub mime: String,
    pub width: i32,
    pub height: i32,
    /// Rotation in degrees, stored as `rotation-degrees`.
    pub rotation: i32,
    /// Configure for encoding instead of decoding.
    pub encoder: bool,
    /// Extra format entries applied after the standard keys.
    pub extra: Vec<(String, FormatValue)>,
}

impl SessionConfig {
    pub fn new(
        codec_name: impl Into<String>,
        mime: impl Into<String>,
        width: i32,
        height: i32,
    ) -> Self {
        Self {
            codec_name: codec_name.into(),
            mime: mime.into(),
            width,
            height,
            rotation: 0,
            encoder: false,
            extra: Vec::new(),
        }
    }

    pub fn with_rotation(mut self, degrees: i32) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn encoder(mut self, encoder: bool) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_i32(mut self, key: impl Into<String>, value: i32) -> Self {
        self.extra.push((key.into(), FormatValue::Int(value)));
        self
    }

    pub fn with_string(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((key.into(), FormatValue::Str(value.into())));
        self
    }
}
