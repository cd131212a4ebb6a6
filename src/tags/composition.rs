//! Composition block bodies.
//!
//! All three blocks share one shape: `[id: enc u32] [nested tags...] [End]`. The nested
//! `CompositionAttributes` tag is common; the repeated content tag depends on the block:
//! `LayerBlock` for vector, `BitmapSequence` for bitmap, `VideoSequence` for video.

use super::layer::{read_layer_block, write_layer_block};
use super::{
    TagCode, read_color, read_count, read_tags, read_time_range, write_color, write_count, write_end_tag,
    write_tag, write_time_range,
};
use crate::graph::{
    BitmapFrame, BitmapRect, BitmapSequence, Color, Composition, CompositionContent, VideoFrame,
    VideoSequence,
};
use crate::io::{DecodeStream, EncodeStream};
use crate::resolver::PendingComposition;

/// Decodes a composition block of kind `code`.
///
/// Returns `None` if `code` is not a composition block.
pub(crate) fn read_composition_block(
    code: TagCode,
    stream: &mut DecodeStream<'_>,
) -> Option<(Composition, PendingComposition)> {
    let content = match code {
        TagCode::VectorCompositionBlock => CompositionContent::Vector { layers: Vec::new() },
        TagCode::BitmapCompositionBlock => CompositionContent::Bitmap { sequences: Vec::new() },
        TagCode::VideoCompositionBlock => CompositionContent::Video { sequences: Vec::new() },
        _ => return None,
    };
    let id = stream.read_encoded_u32();
    let mut composition = Composition::new(id, 0, 0, 0, 0.0, content);
    let mut pending = PendingComposition::default();
    read_tags(stream, |header, body| {
        let Some(code) = header.tag() else {
            return;
        };
        match (code, &mut composition.content) {
            (TagCode::CompositionAttributes, _) => {
                composition.width = body.read_encoded_i32();
                composition.height = body.read_encoded_i32();
                composition.duration = body.read_encoded_i64();
                composition.frame_rate = body.read_f32();
                composition.background_color = read_color(body);
            }
            (TagCode::LayerBlock, CompositionContent::Vector { layers }) => {
                let (layer, pending_layer) = read_layer_block(body);
                layers.push(layer);
                pending.layers.push(pending_layer);
            }
            (TagCode::BitmapSequence, CompositionContent::Bitmap { sequences }) => {
                sequences.push(read_bitmap_sequence(body));
            }
            (TagCode::VideoSequence, CompositionContent::Video { sequences }) => {
                sequences.push(read_video_sequence(body));
            }
            _ => log::trace!("composition {id} ignores tag {}", code.name()),
        }
    });
    Some((composition, pending))
}

/// The tag code a composition is written under.
pub(crate) fn composition_code(composition: &Composition) -> TagCode {
    match composition.content {
        CompositionContent::Vector { .. } => TagCode::VectorCompositionBlock,
        CompositionContent::Bitmap { .. } => TagCode::BitmapCompositionBlock,
        CompositionContent::Video { .. } => TagCode::VideoCompositionBlock,
    }
}

/// Encodes a composition block. `compositions` resolves pre-compose handles.
pub(crate) fn write_composition_block(
    stream: &mut EncodeStream<'_>,
    composition: &Composition,
    compositions: &[Composition],
) {
    stream.write_encoded_u32(composition.id);
    write_tag(stream, TagCode::CompositionAttributes, |s| {
        s.write_encoded_i32(composition.width);
        s.write_encoded_i32(composition.height);
        s.write_encoded_i64(composition.duration);
        s.write_f32(composition.frame_rate);
        write_color(s, composition.background_color);
    });
    match &composition.content {
        CompositionContent::Vector { layers } => {
            for layer in layers {
                write_tag(stream, TagCode::LayerBlock, |s| {
                    write_layer_block(s, layer, layers, compositions);
                });
            }
        }
        CompositionContent::Bitmap { sequences } => {
            for sequence in sequences {
                write_tag(stream, TagCode::BitmapSequence, |s| write_bitmap_sequence(s, sequence));
            }
        }
        CompositionContent::Video { sequences } => {
            for sequence in sequences {
                write_tag(stream, TagCode::VideoSequence, |s| write_video_sequence(s, sequence));
            }
        }
    }
    write_end_tag(stream);
}

// [width: enc i32] [height: enc i32] [frame rate: f32] [frame count: enc u32]
// per frame: [key: bool] [bitmap count: enc u32] per bitmap: [x: enc i32] [y: enc i32] [bytes]
fn read_bitmap_sequence(stream: &mut DecodeStream<'_>) -> BitmapSequence {
    let width = stream.read_encoded_i32();
    let height = stream.read_encoded_i32();
    let frame_rate = stream.read_f32();
    let frame_count = read_count(stream, 2);
    let mut frames = Vec::with_capacity(frame_count);
    for _ in 0..frame_count {
        let is_key_frame = stream.read_bool();
        let bitmap_count = read_count(stream, 3);
        let bitmaps = (0..bitmap_count)
            .map(|_| BitmapRect {
                x: stream.read_encoded_i32(),
                y: stream.read_encoded_i32(),
                file_bytes: stream.read_byte_data(),
            })
            .collect();
        frames.push(BitmapFrame {
            is_key_frame,
            bitmaps,
        });
    }
    BitmapSequence {
        width,
        height,
        frame_rate,
        frames,
    }
}

fn write_bitmap_sequence(stream: &mut EncodeStream<'_>, sequence: &BitmapSequence) {
    stream.write_encoded_i32(sequence.width);
    stream.write_encoded_i32(sequence.height);
    stream.write_f32(sequence.frame_rate);
    write_count(stream, sequence.frames.len());
    for frame in &sequence.frames {
        stream.write_bool(frame.is_key_frame);
        write_count(stream, frame.bitmaps.len());
        for bitmap in &frame.bitmaps {
            stream.write_encoded_i32(bitmap.x);
            stream.write_encoded_i32(bitmap.y);
            stream.write_byte_data(&bitmap.file_bytes);
        }
    }
}

// [width] [height] [frame rate: f32] [alpha x] [alpha y] [frame count]
// per frame: [frame: enc i64] [key: bool] [bytes]
// [range count] per range: [start: enc i64] [end: enc i64]
fn read_video_sequence(stream: &mut DecodeStream<'_>) -> VideoSequence {
    let width = stream.read_encoded_i32();
    let height = stream.read_encoded_i32();
    let frame_rate = stream.read_f32();
    let alpha_start_x = stream.read_encoded_i32();
    let alpha_start_y = stream.read_encoded_i32();
    let frame_count = read_count(stream, 3);
    let frames = (0..frame_count)
        .map(|_| VideoFrame {
            frame: stream.read_encoded_i64(),
            is_key_frame: stream.read_bool(),
            file_bytes: stream.read_byte_data(),
        })
        .collect();
    let range_count = read_count(stream, 2);
    let static_time_ranges = (0..range_count).map(|_| read_time_range(stream)).collect();
    VideoSequence {
        width,
        height,
        frame_rate,
        alpha_start_x,
        alpha_start_y,
        frames,
        static_time_ranges,
    }
}

fn write_video_sequence(stream: &mut EncodeStream<'_>, sequence: &VideoSequence) {
    stream.write_encoded_i32(sequence.width);
    stream.write_encoded_i32(sequence.height);
    stream.write_f32(sequence.frame_rate);
    stream.write_encoded_i32(sequence.alpha_start_x);
    stream.write_encoded_i32(sequence.alpha_start_y);
    write_count(stream, sequence.frames.len());
    for frame in &sequence.frames {
        stream.write_encoded_i64(frame.frame);
        stream.write_bool(frame.is_key_frame);
        stream.write_byte_data(&frame.file_bytes);
    }
    write_count(stream, sequence.static_time_ranges.len());
    for range in &sequence.static_time_ranges {
        write_time_range(stream, *range);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::StreamContext;

    #[test]
    fn video_block_keeps_sequences_and_ranges() {
        let sequence = VideoSequence {
            width: 320,
            height: 240,
            frame_rate: 24.0,
            alpha_start_x: 320,
            alpha_start_y: 0,
            frames: vec![VideoFrame {
                frame: 0,
                is_key_frame: true,
                file_bytes: vec![0, 0, 0, 1, 0x67],
            }],
            static_time_ranges: vec![crate::graph::TimeRange::new(3, 9)],
        };
        let mut composition = Composition::new(
            7,
            320,
            240,
            48,
            24.0,
            CompositionContent::Video {
                sequences: vec![sequence],
            },
        );
        composition.background_color = Color::new(0, 0, 0);

        let context = StreamContext::new();
        let mut out = EncodeStream::new(&context);
        write_composition_block(&mut out, &composition, &[]);
        let bytes = out.into_bytes();

        let mut input = DecodeStream::new(&context, &bytes);
        let (decoded, pending) =
            read_composition_block(TagCode::VideoCompositionBlock, &mut input).unwrap();
        assert!(input.check().is_ok());
        assert_eq!(decoded, composition);
        assert!(pending.layers.is_empty());
    }

    #[test]
    fn non_composition_codes_are_refused() {
        let context = StreamContext::new();
        let mut input = DecodeStream::new(&context, &[]);
        assert!(read_composition_block(TagCode::LayerBlock, &mut input).is_none());
    }
}
