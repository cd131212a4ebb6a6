//! The tag layer of the format.
//!
//! A tag is a `(code, length, body)` record. Readers only need a tag's length to skip it, so an
//! older reader can walk a newer file and ignore every tag it does not know.
//!
//! # Header Layout
//! `[ u16: code << 6 | short_length ] [ u32: length (only when short_length == 63) ]`
//!
//! Codes are 10-bit. Bodies shorter than 63 bytes are described by the 2-byte form.

pub(crate) mod attributes;
pub(crate) mod composition;
pub(crate) mod effect;
pub(crate) mod file;
pub(crate) mod image;
pub(crate) mod layer;
pub(crate) mod mask;

use crate::error::CodecError;
use crate::graph::{Color, Point, TimeRange};
use crate::io::{DecodeStream, EncodeStream};

const LONG_LENGTH_MARKER: u16 = 63;
const SHORT_LENGTH_MASK: u16 = 0b11_1111;
const CODE_SHIFT: u16 = 6;

macro_rules! tag_codes {
    ($($name:ident = $value:expr),* $(,)?) => {
        /// Every tag code this crate knows about.
        ///
        /// New codes are only ever appended; a code's meaning never changes.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u16)]
        pub enum TagCode {
            $(
                #[allow(missing_docs)]
                $name = $value,
            )*
        }

        impl TagCode {
            /// Maps a raw code to a known tag, if any.
            pub fn from_u16(code: u16) -> Option<Self> {
                match code {
                    $($value => Some(Self::$name),)*
                    _ => None,
                }
            }

            /// The name used in diagnostics.
            pub fn name(&self) -> &'static str {
                match self {
                    $(Self::$name => stringify!($name),)*
                }
            }
        }
    };
}

tag_codes! {
    End = 0,
    FontTables = 1,
    VectorCompositionBlock = 2,
    CompositionAttributes = 3,
    ImageTables = 4,
    LayerBlock = 5,
    LayerAttributes = 6,
    SolidColor = 7,
    TextSource = 8,
    TextMoreOption = 10,
    ImageReference = 11,
    CompositionReference = 12,
    Transform2D = 13,
    MaskBlock = 14,
    ShapeGroup = 15,
    Rectangle = 16,
    Ellipse = 17,
    PolyStar = 18,
    ShapePath = 19,
    Fill = 20,
    Stroke = 21,
    GradientFill = 22,
    GradientStroke = 23,
    MergePaths = 24,
    TrimPaths = 25,
    Repeater = 26,
    RoundCorners = 27,
    Performance = 28,
    DropShadowStyle = 29,
    CachePolicy = 30,
    FileAttributes = 31,
    TimeStretchMode = 32,
    Mp4Header = 33,
    BitmapCompositionBlock = 45,
    BitmapSequence = 46,
    ImageBytes = 47,
    ImageBytesV2 = 48,
    ImageBytesV3 = 49,
    VideoCompositionBlock = 50,
    VideoSequence = 51,
    LayerAttributesV2 = 52,
    MarkerList = 53,
    ImageFillRule = 54,
    AudioBytes = 55,
    MotionTileEffect = 56,
    LevelsIndividualEffect = 57,
    CornerPinEffect = 58,
    BulgeEffect = 59,
    FastBlurEffect = 60,
    GlowEffect = 61,
    LayerAttributesV3 = 62,
    LayerAttributesExtra = 63,
    TextSourceV2 = 64,
    DropShadowStyleV2 = 65,
    DisplacementMapEffect = 66,
    ImageFillRuleV2 = 67,
    TextSourceV3 = 68,
    TextPathOption = 69,
    TextAnimator = 70,
    TextRangeSelector = 71,
    TextAnimatorPropertiesTrackingType = 72,
    TextAnimatorPropertiesTrackingAmount = 73,
    TextAnimatorPropertiesFillColor = 74,
    TextAnimatorPropertiesStrokeColor = 75,
    TextAnimatorPropertiesPosition = 76,
    TextAnimatorPropertiesScale = 77,
    TextAnimatorPropertiesRotation = 78,
    TextAnimatorPropertiesOpacity = 79,
    TextWigglySelector = 80,
    RadialBlurEffect = 81,
    MosaicEffect = 82,
    EditableIndices = 83,
    ImageScaleModes = 84,
}

/// The highest tag code this crate understands.
pub const MAX_SUPPORTED_TAG_LEVEL: u16 = TagCode::ImageScaleModes as u16;

/// The largest code representable in a tag header.
pub const MAX_TAG_CODE: u16 = u16::MAX >> CODE_SHIFT;

/// The `(code, length)` pair preceding every tag body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagHeader {
    /// Raw tag code. May be unknown to this reader.
    pub code: u16,
    /// Length of the body in bytes.
    pub length: u32,
}

impl TagHeader {
    /// The known tag for this header, if any.
    pub fn tag(&self) -> Option<TagCode> {
        TagCode::from_u16(self.code)
    }

    /// Returns true for the sequence terminator.
    pub fn is_end(&self) -> bool {
        self.code == TagCode::End as u16
    }
}

/// Reads a tag header without consuming the body.
///
/// Also raises the context's tag-level watermark to the code read.
pub fn read_tag_header(stream: &mut DecodeStream<'_>) -> TagHeader {
    let code_and_length = stream.read_u16();
    let code = code_and_length >> CODE_SHIFT;
    let mut length = u32::from(code_and_length & SHORT_LENGTH_MASK);
    if length == u32::from(LONG_LENGTH_MARKER) {
        length = stream.read_u32();
    }
    if !stream.context().has_failed() {
        stream.context().raise_tag_level(code);
    }
    TagHeader { code, length }
}

/// Walks a tag sequence until its `End` tag, handing each body to `dispatch`.
///
/// `dispatch` receives a sub-stream covering exactly the body. It may consume all, part, or
/// none of it: the walk always resumes after the body. Codes unknown to [`TagCode`] are
/// dispatched too, for the dispatcher to ignore. The walk stops as soon as the shared context
/// fails.
pub fn read_tags<'a, F>(stream: &mut DecodeStream<'a>, mut dispatch: F)
where
    F: FnMut(TagHeader, &mut DecodeStream<'a>),
{
    let mut header = read_tag_header(stream);
    while !stream.context().has_failed() && !header.is_end() {
        let mut body = stream.read_bytes(header.length as usize);
        if stream.context().has_failed() {
            return;
        }
        if header.tag().is_none() {
            log::trace!("unknown tag code {} ({} bytes)", header.code, header.length);
        }
        dispatch(header, &mut body);
        if stream.context().has_failed() {
            return;
        }
        header = read_tag_header(stream);
    }
}

/// Writes a tag header for a body of `length` bytes.
pub fn write_tag_header(stream: &mut EncodeStream<'_>, code: TagCode, length: u32) {
    let code = (code as u16) << CODE_SHIFT;
    if length < u32::from(LONG_LENGTH_MARKER) {
        stream.write_u16(code | length as u16);
    } else {
        stream.write_u16(code | LONG_LENGTH_MARKER);
        stream.write_u32(length);
    }
}

/// Writes a complete tag: the body is produced by `body_writer`, then framed with its length.
pub fn write_tag<'a, F>(stream: &mut EncodeStream<'a>, code: TagCode, body_writer: F)
where
    F: FnOnce(&mut EncodeStream<'a>),
{
    let mut body = EncodeStream::new(stream.context());
    body_writer(&mut body);
    match u32::try_from(body.len()) {
        Ok(length) => {
            write_tag_header(stream, code, length);
            stream.write_bytes(body.as_bytes());
        }
        Err(_) => stream
            .context()
            .signal_error(CodecError::Format(format!(
                "Tag {} body of {} bytes exceeds the format limit",
                code.name(),
                body.len()
            ))),
    }
}

/// Terminates a tag sequence.
pub fn write_end_tag(stream: &mut EncodeStream<'_>) {
    write_tag_header(stream, TagCode::End, 0);
}

/// Reads an ID where 0 means "no reference".
pub(crate) fn read_reference_id(stream: &mut DecodeStream<'_>) -> Option<u32> {
    match stream.read_encoded_u32() {
        0 => None,
        id => Some(id),
    }
}

/// Writes an ID where `None` becomes 0.
pub(crate) fn write_reference_id(stream: &mut EncodeStream<'_>, id: Option<u32>) {
    stream.write_encoded_u32(id.unwrap_or(0));
}

/// Reads an element count, failing the stream if `count * min_item_size` bytes cannot follow.
pub(crate) fn read_count(stream: &mut DecodeStream<'_>, min_item_size: usize) -> usize {
    let count = stream.read_encoded_u32() as usize;
    if count.saturating_mul(min_item_size) > stream.bytes_available() {
        stream.context().signal_error(CodecError::Truncation(format!(
            "List of {count} elements exceeds the {} bytes left",
            stream.bytes_available()
        )));
        return 0;
    }
    count
}

pub(crate) fn write_count(stream: &mut EncodeStream<'_>, count: usize) {
    match u32::try_from(count) {
        Ok(count) => stream.write_encoded_u32(count),
        Err(_) => stream.context().signal_error(CodecError::Format(format!(
            "List of {count} elements exceeds the format limit"
        ))),
    }
}

pub(crate) fn read_point(stream: &mut DecodeStream<'_>) -> Point {
    let x = stream.read_f32();
    let y = stream.read_f32();
    Point::new(x, y)
}

pub(crate) fn write_point(stream: &mut EncodeStream<'_>, point: Point) {
    stream.write_f32(point.x);
    stream.write_f32(point.y);
}

pub(crate) fn read_color(stream: &mut DecodeStream<'_>) -> Color {
    let red = stream.read_u8();
    let green = stream.read_u8();
    let blue = stream.read_u8();
    Color::new(red, green, blue)
}

pub(crate) fn write_color(stream: &mut EncodeStream<'_>, color: Color) {
    stream.write_u8(color.red);
    stream.write_u8(color.green);
    stream.write_u8(color.blue);
}

pub(crate) fn read_time_range(stream: &mut DecodeStream<'_>) -> TimeRange {
    let start = stream.read_encoded_i64();
    let end = stream.read_encoded_i64();
    TimeRange::new(start, end)
}

pub(crate) fn write_time_range(stream: &mut EncodeStream<'_>, range: TimeRange) {
    stream.write_encoded_i64(range.start);
    stream.write_encoded_i64(range.end);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::StreamContext;

    #[test]
    fn short_and_long_headers() {
        let context = StreamContext::new();
        let mut out = EncodeStream::new(&context);
        write_tag(&mut out, TagCode::Performance, |s| s.write_bytes(&[7; 10]));
        write_tag(&mut out, TagCode::ImageBytes, |s| s.write_bytes(&[9; 200]));
        write_end_tag(&mut out);
        let bytes = out.into_bytes();
        assert_eq!(bytes.len(), 2 + 10 + 6 + 200 + 2);

        let mut seen = Vec::new();
        let mut input = DecodeStream::new(&context, &bytes);
        read_tags(&mut input, |header, body| {
            seen.push((header.tag(), body.len()));
        });
        assert!(input.check().is_ok());
        assert_eq!(
            seen,
            vec![
                (Some(TagCode::Performance), 10),
                (Some(TagCode::ImageBytes), 200)
            ]
        );
        assert_eq!(context.tag_level(), TagCode::ImageBytes as u16);
    }

    #[test]
    fn unknown_codes_are_skipped_by_length() {
        let context = StreamContext::new();
        let mut out = EncodeStream::new(&context);
        // Code 40 sits in the reserved range.
        out.write_u16((40 << 6) | 3);
        out.write_bytes(&[1, 2, 3]);
        write_tag(&mut out, TagCode::TimeStretchMode, |s| s.write_u8(2));
        write_end_tag(&mut out);
        let bytes = out.into_bytes();

        let mut seen = Vec::new();
        let mut input = DecodeStream::new(&context, &bytes);
        read_tags(&mut input, |header, body| {
            if header.tag().is_some() {
                seen.push((header.code, body.read_u8()));
            }
        });
        assert!(input.check().is_ok());
        assert_eq!(seen, vec![(TagCode::TimeStretchMode as u16, 2)]);
        assert_eq!(context.tag_level(), 40);
    }

    #[test]
    fn missing_end_tag_fails() {
        let context = StreamContext::new();
        let mut out = EncodeStream::new(&context);
        write_tag(&mut out, TagCode::Performance, |s| s.write_u8(1));
        let bytes = out.into_bytes();

        let mut input = DecodeStream::new(&context, &bytes);
        read_tags(&mut input, |_, _| {});
        assert!(input.check().is_err());
    }
}
