//! Format descriptors: the key/value bag a session is configured with, and the
//! output geometry a codec reports when its output format changes.

use std::ffi::{CStr, CString};

use crate::api::CodecApi;
use crate::config::{FormatValue, SessionConfig};
use crate::error::StartError;

/// Well-known `AMediaFormat` keys.
pub mod keys {
    use std::ffi::CStr;

    pub const MIME: &CStr = c"mime";
    pub const WIDTH: &CStr = c"width";
    pub const HEIGHT: &CStr = c"height";
    pub const ROTATION: &CStr = c"rotation-degrees";
    pub const ENCODER: &CStr = c"encoder";
    pub const STRIDE: &CStr = c"stride";
    pub const SLICE_HEIGHT: &CStr = c"slice-height";
    pub const COLOR_FORMAT: &CStr = c"color-format";
    pub const CROP_LEFT: &CStr = c"crop-left";
    pub const CROP_TOP: &CStr = c"crop-top";
    pub const CROP_RIGHT: &CStr = c"crop-right";
    pub const CROP_BOTTOM: &CStr = c"crop-bottom";
}

#[derive(Debug)]
enum NativeValue {
    Int(i32),
    Str(CString),
}

/// A session's format entries, converted to C strings before any native call
/// is made so that a bad string cannot fail a half-built session.
#[derive(Debug)]
pub(crate) struct FormatEntries {
    entries: Vec<(CString, NativeValue)>,
}

impl FormatEntries {
    pub(crate) fn from_config(config: &SessionConfig) -> Result<Self, StartError> {
        let mime = CString::new(config.mime.as_str())
            .map_err(|_| StartError::InvalidArgument("mime type"))?;

        let mut entries = vec![
            (keys::MIME.to_owned(), NativeValue::Str(mime)),
            (keys::WIDTH.to_owned(), NativeValue::Int(config.width)),
            (keys::HEIGHT.to_owned(), NativeValue::Int(config.height)),
            (keys::ROTATION.to_owned(), NativeValue::Int(config.rotation)),
            (
                keys::ENCODER.to_owned(),
                NativeValue::Int(i32::from(config.encoder)),
            ),
        ];

        for (key, value) in &config.extra {
            let key = CString::new(key.as_str())
                .map_err(|_| StartError::InvalidArgument("format key"))?;
            let value = match value {
                FormatValue::Int(v) => NativeValue::Int(*v),
                FormatValue::Str(s) => NativeValue::Str(
                    CString::new(s.as_str())
                        .map_err(|_| StartError::InvalidArgument("format value"))?,
                ),
            };
            entries.push((key, value));
        }

        Ok(Self { entries })
    }

    pub(crate) fn apply<A: CodecApi>(&self, api: &A, format: &A::Format) {
        for (key, value) in &self.entries {
            match value {
                NativeValue::Int(v) => api.format_set_i32(format, key, *v),
                NativeValue::Str(s) => api.format_set_string(format, key, s),
            }
        }
    }
}

/// Output geometry and pixel layout reported on a format change.
///
/// Fields the codec does not report are 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct OutputFormat {
    pub width: i32,
    pub height: i32,
    pub stride: i32,
    pub slice_height: i32,
    /// Codec-specific `color-format` value (an OMX color format on most devices).
    pub pixel_format: i32,
    pub crop_left: i32,
    pub crop_top: i32,
    /// Inclusive.
    pub crop_right: i32,
    /// Inclusive.
    pub crop_bottom: i32,
}

impl OutputFormat {
    pub fn read<A: CodecApi>(api: &A, format: &A::Format) -> Self {
        let get = |key: &CStr| api.format_get_i32(format, key).unwrap_or(0);
        Self {
            width: get(keys::WIDTH),
            height: get(keys::HEIGHT),
            stride: get(keys::STRIDE),
            slice_height: get(keys::SLICE_HEIGHT),
            pixel_format: get(keys::COLOR_FORMAT),
            crop_left: get(keys::CROP_LEFT),
            crop_top: get(keys::CROP_TOP),
            crop_right: get(keys::CROP_RIGHT),
            crop_bottom: get(keys::CROP_BOTTOM),
        }
    }

    /// Whether the codec reported a crop rectangle; all four keys read as 0 otherwise.
    pub fn has_crop(&self) -> bool {
        self.crop_left != 0 || self.crop_top != 0 || self.crop_right != 0 || self.crop_bottom != 0
    }

    /// Visible width, from the inclusive crop rectangle when one is reported.
    pub fn visible_width(&self) -> i32 {
        if self.has_crop() && self.crop_right >= self.crop_left {
            self.crop_right - self.crop_left + 1
        } else {
            self.width
        }
    }

    /// Visible height, from the inclusive crop rectangle when one is reported.
    pub fn visible_height(&self) -> i32 {
        if self.has_crop() && self.crop_bottom >= self.crop_top {
            self.crop_bottom - self.crop_top + 1
        } else {
            self.height
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeCodec, FakeValue};

    #[test]
    fn entries_carry_standard_keys_then_extras() -> Result<(), StartError> {
        let fake = FakeCodec::default();
        let config = SessionConfig::new("c2.fake.avc.decoder", "video/avc", 1280, 720)
            .with_rotation(180)
            .with_i32("max-input-size", 65536)
            .with_string("language", "und");

        let format = fake.new_format().unwrap();
        FormatEntries::from_config(&config)?.apply(&fake, &format);

        let values = fake.format_values(&format);
        assert_eq!(values["mime"], FakeValue::Str("video/avc".into()));
        assert_eq!(values["width"], FakeValue::Int(1280));
        assert_eq!(values["height"], FakeValue::Int(720));
        assert_eq!(values["rotation-degrees"], FakeValue::Int(180));
        assert_eq!(values["encoder"], FakeValue::Int(0));
        assert_eq!(values["max-input-size"], FakeValue::Int(65536));
        assert_eq!(values["language"], FakeValue::Str("und".into()));
        fake.delete_format(format);
        Ok(())
    }

    #[test]
    fn interior_nul_is_rejected() {
        let config = SessionConfig::new("c2.fake", "video/\0avc", 16, 16);
        assert!(matches!(
            FormatEntries::from_config(&config),
            Err(StartError::InvalidArgument("mime type"))
        ));

        let config = SessionConfig::new("c2.fake", "video/avc", 16, 16).with_i32("bad\0key", 1);
        assert!(matches!(
            FormatEntries::from_config(&config),
            Err(StartError::InvalidArgument("format key"))
        ));
    }

    #[test]
    fn missing_output_fields_read_as_zero() {
        let fake = FakeCodec::default();
        let format = fake.new_format().unwrap();
        fake.format_set_i32(&format, keys::WIDTH, 1920);
        fake.format_set_i32(&format, keys::HEIGHT, 1088);
        fake.format_set_i32(&format, keys::CROP_RIGHT, 1919);
        fake.format_set_i32(&format, keys::CROP_BOTTOM, 1079);

        let output = OutputFormat::read(&fake, &format);
        assert_eq!(output.width, 1920);
        assert_eq!(output.stride, 0);
        assert_eq!(output.slice_height, 0);
        assert_eq!(output.pixel_format, 0);
        assert_eq!(output.crop_left, 0);
        assert_eq!(output.visible_width(), 1920);
        assert_eq!(output.visible_height(), 1080);
        fake.delete_format(format);
    }

    #[test]
    fn crop_rectangle_is_inclusive() {
        let single_column = OutputFormat {
            width: 1920,
            height: 1080,
            crop_left: 5,
            crop_right: 5,
            crop_top: 0,
            crop_bottom: 1079,
            ..OutputFormat::default()
        };
        assert_eq!(single_column.visible_width(), 1);
        assert_eq!(single_column.visible_height(), 1080);

        let uncropped = OutputFormat {
            width: 640,
            height: 480,
            ..OutputFormat::default()
        };
        assert!(!uncropped.has_crop());
        assert_eq!(uncropped.visible_width(), 640);
        assert_eq!(uncropped.visible_height(), 480);
    }
}
