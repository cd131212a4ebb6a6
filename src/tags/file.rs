//! The top-level tag sequence of a file body.

use super::attributes::{
    EditableIndices, read_editable_indices, read_file_attributes, read_image_scale_modes, read_time_stretch_mode,
    write_editable_indices, write_file_attributes, write_image_scale_modes, write_performance,
    write_time_stretch_mode,
};
use super::composition::{composition_code, read_composition_block, write_composition_block};
use super::image::{image_code, read_image, write_image};
use super::{TagCode, TagHeader, write_end_tag, write_tag};
use crate::graph::{
    Composition, File, FileAttributes, ImageAsset, PerformanceData, ScaleMode, TimeRange, TimeStretchMode,
};
use crate::io::{DecodeStream, EncodeStream};
use crate::resolver::PendingComposition;

/// Everything collected from a file body before references are resolved.
#[derive(Debug, Default)]
pub(crate) struct FileDecoder {
    pub(crate) compositions: Vec<Composition>,
    pub(crate) pending: Vec<PendingComposition>,
    pub(crate) images: Vec<ImageAsset>,
    pub(crate) time_stretch_mode: TimeStretchMode,
    pub(crate) scaled_time_range: Option<TimeRange>,
    pub(crate) file_attributes: FileAttributes,
    pub(crate) editable_indices: Option<EditableIndices>,
    pub(crate) image_scale_modes: Vec<ScaleMode>,
}

impl FileDecoder {
    /// Dispatches one top-level tag.
    pub(crate) fn read_tag(&mut self, header: TagHeader, stream: &mut DecodeStream<'_>) {
        let Some(code) = header.tag() else {
            return;
        };
        match code {
            TagCode::FileAttributes => self.file_attributes = read_file_attributes(stream),
            TagCode::TimeStretchMode => {
                let (mode, range) = read_time_stretch_mode(stream);
                self.time_stretch_mode = mode;
                self.scaled_time_range = range;
            }
            TagCode::ImageBytes | TagCode::ImageBytesV2 | TagCode::ImageBytesV3 => {
                self.images.extend(read_image(code, stream));
            }
            TagCode::VectorCompositionBlock
            | TagCode::BitmapCompositionBlock
            | TagCode::VideoCompositionBlock => {
                if let Some((composition, pending)) = read_composition_block(code, stream) {
                    self.compositions.push(composition);
                    self.pending.push(pending);
                }
            }
            TagCode::EditableIndices => self.editable_indices = Some(read_editable_indices(stream)),
            TagCode::ImageScaleModes => self.image_scale_modes = read_image_scale_modes(stream),
            _ => log::trace!("file body ignores tag {}", code.name()),
        }
    }
}

/// Writes every tag of `file`, then the optional `Performance` tag, then `End`.
pub(crate) fn write_file_tags(
    stream: &mut EncodeStream<'_>,
    file: &File,
    performance: Option<&PerformanceData>,
) {
    if !file.file_attributes().is_empty() {
        write_tag(stream, TagCode::FileAttributes, |s| {
            write_file_attributes(s, file.file_attributes());
        });
    }
    if file.time_stretch_mode() != TimeStretchMode::default() || file.scaled_time_range().is_some() {
        write_tag(stream, TagCode::TimeStretchMode, |s| {
            write_time_stretch_mode(s, file.time_stretch_mode(), file.scaled_time_range());
        });
    }
    for image in file.images() {
        let code = image_code(image);
        write_tag(stream, code, |s| write_image(s, code, image));
    }
    let compositions = file.compositions();
    for composition in compositions {
        write_tag(stream, composition_code(composition), |s| {
            write_composition_block(s, composition, compositions);
        });
    }
    if !file.has_default_editable_indices() {
        write_tag(stream, TagCode::EditableIndices, |s| {
            write_editable_indices(s, file.editable_images(), file.editable_texts());
        });
    }
    if !file.image_scale_modes().is_empty() {
        write_tag(stream, TagCode::ImageScaleModes, |s| {
            write_image_scale_modes(s, file.image_scale_modes());
        });
    }
    if let Some(data) = performance {
        write_tag(stream, TagCode::Performance, |s| write_performance(s, data));
    }
    write_end_tag(stream);
}
