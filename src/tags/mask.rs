//! `MaskBlock` body.
//!
//! `[id: enc u32] [inverted: bool] [mode: u8] [opacity: u8] [expansion: f32]
//!  [vertex count: enc u32] [vertices: (f32, f32)...]`

use super::{read_count, read_point, write_count, write_point};
use crate::graph::{Mask, MaskMode};
use crate::io::{DecodeStream, EncodeStream};

const POINT_SIZE: usize = 8;

pub(crate) fn read_mask(stream: &mut DecodeStream<'_>) -> Mask {
    let id = stream.read_encoded_u32();
    let inverted = stream.read_bool();
    let mode = MaskMode::from_u8(stream.read_u8());
    let opacity = stream.read_u8();
    let expansion = stream.read_f32();
    let count = read_count(stream, POINT_SIZE);
    let vertices = (0..count).map(|_| read_point(stream)).collect();
    Mask {
        id,
        inverted,
        mode,
        opacity,
        expansion,
        vertices,
    }
}

pub(crate) fn write_mask(stream: &mut EncodeStream<'_>, mask: &Mask) {
    stream.write_encoded_u32(mask.id);
    stream.write_bool(mask.inverted);
    stream.write_u8(mask.mode as u8);
    stream.write_u8(mask.opacity);
    stream.write_f32(mask.expansion);
    write_count(stream, mask.vertices.len());
    for vertex in &mask.vertices {
        write_point(stream, *vertex);
    }
}
