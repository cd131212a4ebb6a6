//! `ImageBytes` bodies.
//!
//! Each version appends to the previous one:
//! - `ImageBytes`: `[id: enc u32] [bytes]`
//! - `ImageBytesV2`: `+ [scale factor: f32]`
//! - `ImageBytesV3`: `+ [width] [height] [anchor x] [anchor y]`, all `enc i32`

use super::TagCode;
use crate::graph::ImageAsset;
use crate::io::{DecodeStream, EncodeStream};

/// Decodes any version of the image tag. Returns `None` for other codes.
pub(crate) fn read_image(code: TagCode, stream: &mut DecodeStream<'_>) -> Option<ImageAsset> {
    let version = match code {
        TagCode::ImageBytes => 1,
        TagCode::ImageBytesV2 => 2,
        TagCode::ImageBytesV3 => 3,
        _ => return None,
    };
    let id = stream.read_encoded_u32();
    let mut image = ImageAsset::new(id, stream.read_byte_data());
    if version >= 2 {
        image.scale_factor = stream.read_f32();
    }
    if version >= 3 {
        image.width = stream.read_encoded_i32();
        image.height = stream.read_encoded_i32();
        image.anchor_x = stream.read_encoded_i32();
        image.anchor_y = stream.read_encoded_i32();
    }
    Some(image)
}

/// The lowest tag version able to carry every field of `image`.
pub(crate) fn image_code(image: &ImageAsset) -> TagCode {
    if image.has_bounds() {
        TagCode::ImageBytesV3
    } else if image.scale_factor != 1.0 {
        TagCode::ImageBytesV2
    } else {
        TagCode::ImageBytes
    }
}

/// Encodes `image` in the layout of `code`.
pub(crate) fn write_image(stream: &mut EncodeStream<'_>, code: TagCode, image: &ImageAsset) {
    stream.write_encoded_u32(image.id);
    stream.write_byte_data(&image.file_bytes);
    if matches!(code, TagCode::ImageBytesV2 | TagCode::ImageBytesV3) {
        stream.write_f32(image.scale_factor);
    }
    if code == TagCode::ImageBytesV3 {
        stream.write_encoded_i32(image.width);
        stream.write_encoded_i32(image.height);
        stream.write_encoded_i32(image.anchor_x);
        stream.write_encoded_i32(image.anchor_y);
    }
}
