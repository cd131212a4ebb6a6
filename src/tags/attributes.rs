//! File-level metadata tag bodies.

use super::{read_count, read_time_range, write_count, write_time_range};
use crate::graph::{FileAttributes, PerformanceData, ScaleMode, TimeRange, TimeStretchMode};
use crate::io::{DecodeStream, EncodeStream};

// [timestamp: enc i64] [plugin] [ae] [system] [author] [scene] [warning count] [warnings...]
pub(crate) fn read_file_attributes(stream: &mut DecodeStream<'_>) -> FileAttributes {
    let mut attributes = FileAttributes {
        timestamp: stream.read_encoded_i64(),
        plugin_version: stream.read_string(),
        ae_version: stream.read_string(),
        system_version: stream.read_string(),
        author: stream.read_string(),
        scene: stream.read_string(),
        warnings: Vec::new(),
    };
    let count = read_count(stream, 1);
    attributes.warnings = (0..count).map(|_| stream.read_string()).collect();
    attributes
}

pub(crate) fn write_file_attributes(stream: &mut EncodeStream<'_>, attributes: &FileAttributes) {
    stream.write_encoded_i64(attributes.timestamp);
    stream.write_string(&attributes.plugin_version);
    stream.write_string(&attributes.ae_version);
    stream.write_string(&attributes.system_version);
    stream.write_string(&attributes.author);
    stream.write_string(&attributes.scene);
    write_count(stream, attributes.warnings.len());
    for warning in &attributes.warnings {
        stream.write_string(warning);
    }
}

// [mode: u8] [has range: bool] [start: enc i64] [end: enc i64]
pub(crate) fn read_time_stretch_mode(stream: &mut DecodeStream<'_>) -> (TimeStretchMode, Option<TimeRange>) {
    let mode = TimeStretchMode::from_u8(stream.read_u8());
    let range = stream.read_bool().then(|| read_time_range(stream));
    (mode, range)
}

pub(crate) fn write_time_stretch_mode(
    stream: &mut EncodeStream<'_>,
    mode: TimeStretchMode,
    range: Option<TimeRange>,
) {
    stream.write_u8(mode as u8);
    stream.write_bool(range.is_some());
    if let Some(range) = range {
        write_time_range(stream, range);
    }
}

/// Editable image and text indices.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct EditableIndices {
    pub(crate) images: Vec<u32>,
    pub(crate) texts: Vec<u32>,
}

// [image count] [images: enc u32...] [text count] [texts: enc u32...]
pub(crate) fn read_editable_indices(stream: &mut DecodeStream<'_>) -> EditableIndices {
    let count = read_count(stream, 1);
    let images = (0..count).map(|_| stream.read_encoded_u32()).collect();
    let count = read_count(stream, 1);
    let texts = (0..count).map(|_| stream.read_encoded_u32()).collect();
    EditableIndices { images, texts }
}

pub(crate) fn write_editable_indices(stream: &mut EncodeStream<'_>, images: &[u32], texts: &[u32]) {
    for list in [images, texts] {
        write_count(stream, list.len());
        for index in list {
            stream.write_encoded_u32(*index);
        }
    }
}

// [count] [modes: u8...]
pub(crate) fn read_image_scale_modes(stream: &mut DecodeStream<'_>) -> Vec<ScaleMode> {
    let count = read_count(stream, 1);
    (0..count).map(|_| ScaleMode::from_u8(stream.read_u8())).collect()
}

pub(crate) fn write_image_scale_modes(stream: &mut EncodeStream<'_>, modes: &[ScaleMode]) {
    write_count(stream, modes.len());
    for mode in modes {
        stream.write_u8(*mode as u8);
    }
}

// [rendering] [image decoding] [presenting] [graphics memory], all enc i64
pub(crate) fn read_performance(stream: &mut DecodeStream<'_>) -> PerformanceData {
    PerformanceData {
        rendering_time: stream.read_encoded_i64(),
        image_decoding_time: stream.read_encoded_i64(),
        presenting_time: stream.read_encoded_i64(),
        graphics_memory: stream.read_encoded_i64(),
    }
}

pub(crate) fn write_performance(stream: &mut EncodeStream<'_>, data: &PerformanceData) {
    stream.write_encoded_i64(data.rendering_time);
    stream.write_encoded_i64(data.image_decoding_time);
    stream.write_encoded_i64(data.presenting_time);
    stream.write_encoded_i64(data.graphics_memory);
}
