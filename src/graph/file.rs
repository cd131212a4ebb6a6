//! The decoded file and its assembly.

use serde::Serialize;

use super::composition::{Composition, TimeRange};
use super::id::CompositionRef;
use super::image::ImageAsset;
use super::layer::{Layer, LayerContent, LayerType, ScaleMode};
use super::verify::Verify;
use crate::error::{CodecError, Result};

/// How playback fills a duration different from the file's own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[repr(u8)]
pub enum TimeStretchMode {
    /// Stop at the last frame.
    None = 0,
    /// Stretch the scaled time range to fit.
    Scale = 1,
    /// Loop from the start.
    #[default]
    Repeat = 2,
    /// Loop, playing every other pass backwards.
    RepeatInverted = 3,
}

impl TimeStretchMode {
    /// Maps a wire byte to a mode. Unrecognized bytes become `Repeat`.
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::None,
            1 => Self::Scale,
            3 => Self::RepeatInverted,
            _ => Self::Repeat,
        }
    }
}

/// Exporter metadata. Never interpreted by the codec.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FileAttributes {
    /// Export time, milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub plugin_version: String,
    pub ae_version: String,
    pub system_version: String,
    pub author: String,
    pub scene: String,
    pub warnings: Vec<String>,
}

impl FileAttributes {
    /// Returns true if no attribute is set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Rendering cost measured by the exporter, stored in a trailing tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct PerformanceData {
    /// Microseconds.
    pub rendering_time: i64,
    /// Microseconds.
    pub image_decoding_time: i64,
    /// Microseconds.
    pub presenting_time: i64,
    /// Bytes.
    pub graphics_memory: i64,
}

/// A fully decoded, verified animation file.
///
/// A `File` only exists if it holds at least one composition and every composition and image
/// passed verification. The last composition is the main one. Fields are read through
/// accessors; the `with_*` methods consume the file and return an updated one.
#[derive(Debug, Clone, PartialEq)]
pub struct File {
    compositions: Vec<Composition>,
    images: Vec<ImageAsset>,
    tag_level: u16,
    time_stretch_mode: TimeStretchMode,
    scaled_time_range: Option<TimeRange>,
    file_attributes: FileAttributes,
    path: String,
    editable_images: Vec<u32>,
    editable_texts: Vec<u32>,
    image_scale_modes: Vec<ScaleMode>,
}

/// Verifies every composition and image, then moves them into a new [`File`].
///
/// Fails if `compositions` is empty or any element fails [`Verify`]. Both vectors are consumed
/// either way. The file's editable lists start as the identity lists over its text and image
/// layers.
pub fn verify_and_make(compositions: Vec<Composition>, images: Vec<ImageAsset>) -> Result<File> {
    if compositions.is_empty() {
        return Err(CodecError::Verification("File has no composition".into()));
    }
    if let Some(composition) = compositions.iter().find(|c| !c.verify()) {
        return Err(CodecError::Verification(format!(
            "Composition {} failed verification",
            composition.id
        )));
    }
    if let Some(image) = images.iter().find(|i| !i.verify()) {
        return Err(CodecError::Verification(format!(
            "Image {} failed verification",
            image.id
        )));
    }
    let mut file = File {
        compositions,
        images,
        tag_level: 1,
        time_stretch_mode: TimeStretchMode::default(),
        scaled_time_range: None,
        file_attributes: FileAttributes::default(),
        path: String::new(),
        editable_images: Vec::new(),
        editable_texts: Vec::new(),
        image_scale_modes: Vec::new(),
    };
    file.editable_images = identity_indices(file.num_images());
    file.editable_texts = identity_indices(file.num_texts());
    Ok(file)
}

fn identity_indices(count: usize) -> Vec<u32> {
    (0..count).filter_map(|i| u32::try_from(i).ok()).collect()
}

impl File {
    /// All compositions, nested ones first.
    pub fn compositions(&self) -> &[Composition] {
        &self.compositions
    }

    /// All image assets.
    pub fn images(&self) -> &[ImageAsset] {
        &self.images
    }

    /// The root composition: the last one in the file.
    pub fn main_composition(&self) -> &Composition {
        // Non-empty by construction.
        &self.compositions[self.compositions.len() - 1]
    }

    /// Looks up a composition by handle.
    pub fn composition(&self, handle: CompositionRef) -> Option<&Composition> {
        self.compositions.get(handle.index())
    }

    /// Length of the main composition, in frames.
    pub fn duration(&self) -> i64 {
        self.main_composition().duration
    }

    /// Frame rate of the main composition.
    pub fn frame_rate(&self) -> f32 {
        self.main_composition().frame_rate
    }

    /// Width of the main composition.
    pub fn width(&self) -> i32 {
        self.main_composition().width
    }

    /// Height of the main composition.
    pub fn height(&self) -> i32 {
        self.main_composition().height
    }

    /// The highest tag code seen while decoding. At least 1.
    pub fn tag_level(&self) -> u16 {
        self.tag_level
    }

    #[allow(missing_docs)]
    pub fn time_stretch_mode(&self) -> TimeStretchMode {
        self.time_stretch_mode
    }

    /// The part of the timeline stretched by [`TimeStretchMode::Scale`], within `[0, duration]`.
    pub fn scaled_time_range(&self) -> Option<TimeRange> {
        self.scaled_time_range
    }

    #[allow(missing_docs)]
    pub fn file_attributes(&self) -> &FileAttributes {
        &self.file_attributes
    }

    /// The path given at decode time, for diagnostics only.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Indices of the images a host may replace, into the image layers' distinct image IDs.
    pub fn editable_images(&self) -> &[u32] {
        &self.editable_images
    }

    /// Indices of the text layers a host may edit, in traversal order.
    pub fn editable_texts(&self) -> &[u32] {
        &self.editable_texts
    }

    /// Per editable image scale-mode overrides.
    pub fn image_scale_modes(&self) -> &[ScaleMode] {
        &self.image_scale_modes
    }

    /// Number of text layers reachable from the main composition.
    pub fn num_texts(&self) -> usize {
        self.reachable_layers()
            .iter()
            .filter(|layer| layer.layer_type() == LayerType::Text)
            .count()
    }

    /// Number of distinct images used by reachable image layers.
    pub fn num_images(&self) -> usize {
        let mut ids: Vec<u32> = self
            .reachable_layers()
            .iter()
            .filter_map(|layer| match layer.content {
                LayerContent::Image { image_id, .. } => Some(image_id),
                _ => None,
            })
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }

    /// Number of video compositions reachable from the main composition.
    pub fn num_videos(&self) -> usize {
        self.reachable_compositions()
            .iter()
            .filter(|index| self.compositions[**index].is_video())
            .count()
    }

    /// Number of layers reachable from the main composition.
    pub fn num_layers(&self) -> usize {
        self.reachable_layers().len()
    }

    /// Compositions reachable from the main one through pre-compose layers, each listed once.
    fn reachable_compositions(&self) -> Vec<usize> {
        let mut visited = vec![false; self.compositions.len()];
        let mut order = Vec::new();
        let mut stack = vec![self.compositions.len() - 1];
        while let Some(index) = stack.pop() {
            if visited[index] {
                continue;
            }
            visited[index] = true;
            order.push(index);
            for layer in self.compositions[index].layers().iter().rev() {
                if let Some(nested) = layer.composition()
                    && nested.index() < self.compositions.len()
                {
                    stack.push(nested.index());
                }
            }
        }
        order
    }

    fn reachable_layers(&self) -> Vec<&Layer> {
        self.reachable_compositions()
            .into_iter()
            .flat_map(|index| self.compositions[index].layers())
            .collect()
    }

    /// Replaces the time-stretch mode.
    pub fn with_time_stretch_mode(mut self, mode: TimeStretchMode) -> Self {
        self.time_stretch_mode = mode;
        self
    }

    /// Replaces the scaled time range, clamped to `[0, duration]`.
    pub fn with_scaled_time_range(mut self, range: Option<TimeRange>) -> Self {
        let duration = self.duration().max(0);
        self.scaled_time_range = range.map(|range| {
            TimeRange::new(range.start.clamp(0, duration), range.end.clamp(0, duration))
        });
        self
    }

    /// Replaces the exporter metadata.
    pub fn with_file_attributes(mut self, attributes: FileAttributes) -> Self {
        self.file_attributes = attributes;
        self
    }

    /// Replaces the editable image indices.
    pub fn with_editable_images(mut self, indices: Vec<u32>) -> Self {
        self.editable_images = indices;
        self
    }

    /// Replaces the editable text indices.
    pub fn with_editable_texts(mut self, indices: Vec<u32>) -> Self {
        self.editable_texts = indices;
        self
    }

    /// Replaces the per-image scale modes.
    pub fn with_image_scale_modes(mut self, modes: Vec<ScaleMode>) -> Self {
        self.image_scale_modes = modes;
        self
    }

    pub(crate) fn with_tag_level(mut self, tag_level: u16) -> Self {
        self.tag_level = tag_level.max(1);
        self
    }

    pub(crate) fn with_path(mut self, path: &str) -> Self {
        self.path = path.to_string();
        self
    }

    pub(crate) fn has_default_editable_indices(&self) -> bool {
        self.editable_images == identity_indices(self.num_images())
            && self.editable_texts == identity_indices(self.num_texts())
    }

    pub(crate) fn update_static_time_ranges(&mut self) {
        super::composition::update_static_time_ranges(&mut self.compositions);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::layer::TextDocument;

    fn linked(mut layers: Vec<Layer>) -> Vec<Layer> {
        for layer in &mut layers {
            layer.containing_composition = Some(CompositionRef::new(0));
        }
        layers
    }

    #[test]
    fn empty_composition_list_is_rejected() {
        let images = vec![ImageAsset::new(1, vec![0x89, b'P', b'N', b'G'])];
        let err = verify_and_make(Vec::new(), images).unwrap_err();
        assert!(matches!(err, CodecError::Verification(_)));
    }

    #[test]
    fn one_bad_image_rejects_the_file() {
        let compositions = vec![Composition::vector(1, 10, 10, 10, 30.0, Vec::new())];
        let images = vec![ImageAsset::new(1, vec![1]), ImageAsset::new(2, Vec::new())];
        assert!(verify_and_make(compositions, images).is_err());
    }

    #[test]
    fn unlinked_layer_fails_verification() {
        let layer = Layer::new(1, LayerContent::Null);
        let compositions = vec![Composition::vector(1, 10, 10, 10, 30.0, vec![layer])];
        assert!(verify_and_make(compositions, Vec::new()).is_err());
    }

    #[test]
    fn editable_lists_default_to_identity() {
        let text = |id| {
            Layer::new(
                id,
                LayerContent::Text {
                    document: Some(TextDocument::new("hi")),
                    path_option: None,
                },
            )
        };
        let image = |id, image_id| {
            Layer::new(
                id,
                LayerContent::Image {
                    image_id,
                    scale_mode: None,
                },
            )
        };
        let layers = linked(vec![text(1), text(2), image(3, 7), image(4, 7), image(5, 8)]);
        let compositions = vec![Composition::vector(1, 10, 10, 10, 30.0, layers)];
        let file = verify_and_make(compositions, Vec::new()).unwrap();

        assert_eq!(file.num_texts(), 2);
        assert_eq!(file.num_images(), 2);
        assert_eq!(file.editable_texts(), &[0, 1]);
        assert_eq!(file.editable_images(), &[0, 1]);
        assert!(file.has_default_editable_indices());
    }

    #[test]
    fn scaled_time_range_is_clamped() {
        let compositions = vec![Composition::vector(1, 10, 10, 50, 30.0, Vec::new())];
        let file = verify_and_make(compositions, Vec::new())
            .unwrap()
            .with_scaled_time_range(Some(TimeRange::new(-5, 80)));
        assert_eq!(file.scaled_time_range(), Some(TimeRange::new(0, 50)));
    }
}
