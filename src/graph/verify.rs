//! Self-verification of decoded objects.
//!
//! Verification runs after references are resolved and before a [`File`](super::File) is
//! built. A single failing object rejects the whole file.

use super::composition::{BitmapSequence, Composition, CompositionContent, VideoSequence};
use super::image::ImageAsset;
use super::layer::{Effect, EffectKind, Layer, LayerContent, Mask};

/// A structural self-check.
pub trait Verify {
    /// Returns true if the object is usable by a renderer.
    fn verify(&self) -> bool;
}

impl Verify for Composition {
    fn verify(&self) -> bool {
        if self.width <= 0 || self.height <= 0 || self.duration <= 0 || self.frame_rate <= 0.0 {
            return false;
        }
        match &self.content {
            CompositionContent::Vector { layers } => layers.iter().all(Verify::verify),
            CompositionContent::Bitmap { sequences } => sequences.iter().all(Verify::verify),
            CompositionContent::Video { sequences } => sequences.iter().all(Verify::verify),
        }
    }
}

impl Verify for Layer {
    fn verify(&self) -> bool {
        if self.duration <= 0 || self.containing_composition.is_none() {
            return false;
        }
        if !self.masks.iter().all(Verify::verify) || !self.effects.iter().all(Verify::verify) {
            return false;
        }
        match &self.content {
            LayerContent::Solid { width, height, .. } => *width > 0 && *height > 0,
            LayerContent::Text { document, .. } => document.is_some(),
            LayerContent::Image { image_id, .. } => *image_id != 0,
            LayerContent::PreCompose { composition, .. } => composition.is_some(),
            LayerContent::Unknown
            | LayerContent::Null
            | LayerContent::Shape { .. }
            | LayerContent::Camera => true,
        }
    }
}

impl Verify for Mask {
    fn verify(&self) -> bool {
        !self.vertices.is_empty()
    }
}

impl Verify for Effect {
    fn verify(&self) -> bool {
        match &self.kind {
            EffectKind::FastBlur { blurriness, .. } => *blurriness >= 0.0,
            EffectKind::Glow { radius, .. } => *radius >= 0.0,
            EffectKind::Mosaic {
                horizontal_blocks,
                vertical_blocks,
                ..
            } => *horizontal_blocks > 0 && *vertical_blocks > 0,
            EffectKind::DisplacementMap { .. } => true,
        }
    }
}

impl Verify for ImageAsset {
    fn verify(&self) -> bool {
        !self.file_bytes.is_empty() && self.scale_factor > 0.0
    }
}

impl Verify for BitmapSequence {
    fn verify(&self) -> bool {
        self.width > 0 && self.height > 0 && self.frame_rate > 0.0
    }
}

impl Verify for VideoSequence {
    fn verify(&self) -> bool {
        self.width > 0 && self.height > 0 && self.frame_rate > 0.0
    }
}
