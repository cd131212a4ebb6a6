//! The Read-Side Engine.
//!
//! Validates the envelope, decodes the body into flat collections, links them, and hands the
//! result to the verifier. Also provides the partial decode that extracts only the
//! `Performance` tag.

use crate::error::Result;
use crate::format::read_body;
use crate::graph::{File, PerformanceData, verify_and_make};
use crate::io::{DecodeStream, StreamContext};
use crate::resolver::resolve;
use crate::tags::attributes::read_performance;
use crate::tags::file::FileDecoder;
use crate::tags::{TagCode, read_tag_header, read_tags};

/// Decodes a complete file.
///
/// `path` is stored on the result for diagnostics only.
pub fn decode(bytes: &[u8], path: &str) -> Result<File> {
    log::debug!("decoding {} bytes from {path:?}", bytes.len());
    let result = decode_file(bytes, path);
    match &result {
        Ok(file) => log::debug!(
            "decoded {} compositions, {} images, tag level {}",
            file.compositions().len(),
            file.images().len(),
            file.tag_level()
        ),
        Err(err) => log::warn!("failed to decode {path:?}: {err}"),
    }
    result
}

fn decode_file(bytes: &[u8], path: &str) -> Result<File> {
    let context = StreamContext::new();
    let mut stream = DecodeStream::new(&context, bytes);
    let mut body = read_body(&mut stream)?;

    let mut decoder = FileDecoder::default();
    read_tags(&mut body, |header, tag_body| decoder.read_tag(header, tag_body));
    context.check()?;

    let FileDecoder {
        mut compositions,
        pending,
        images,
        time_stretch_mode,
        scaled_time_range,
        file_attributes,
        editable_indices,
        image_scale_modes,
    } = decoder;
    resolve(&mut compositions, pending);

    let mut file = verify_and_make(compositions, images)?
        .with_tag_level(context.tag_level())
        .with_time_stretch_mode(time_stretch_mode)
        .with_scaled_time_range(scaled_time_range)
        .with_file_attributes(file_attributes)
        .with_image_scale_modes(image_scale_modes)
        .with_path(path);
    if let Some(indices) = editable_indices {
        file = file
            .with_editable_images(indices.images)
            .with_editable_texts(indices.texts);
    }
    file.update_static_time_ranges();
    Ok(file)
}

/// Extracts the `Performance` tag without decoding anything else.
///
/// Walks the top-level tags, skipping every body by its length, and returns as soon as the
/// `Performance` tag is found. Returns `Ok(None)` if the body ends without one.
pub fn read_performance_data(bytes: &[u8]) -> Result<Option<PerformanceData>> {
    let context = StreamContext::new();
    let mut stream = DecodeStream::new(&context, bytes);
    let mut body = read_body(&mut stream)?;

    loop {
        let header = read_tag_header(&mut body);
        context.check()?;
        if header.is_end() {
            return Ok(None);
        }
        let mut tag_body = body.read_bytes(header.length as usize);
        context.check()?;
        if header.tag() == Some(TagCode::Performance) {
            let data = read_performance(&mut tag_body);
            context.check()?;
            return Ok(Some(data));
        }
    }
}
