//! The in-memory scene graph produced by decoding.
//!
//! Ownership is strictly hierarchical: a [`File`] owns compositions and images, a vector
//! composition owns its layers, a layer owns its masks and effects. Every other link is an
//! index handle ([`LayerRef`], [`MaskRef`], [`CompositionRef`]) into one of those containers.

/// Compositions, sequences, and static time ranges.
pub mod composition;
/// The `File` root object and its assembly.
pub mod file;
/// Index handles.
pub mod id;
/// Image assets.
pub mod image;
/// Layers, masks, and effects.
pub mod layer;
/// The `Verify` trait.
pub mod verify;

pub use composition::{
    BitmapFrame, BitmapRect, BitmapSequence, Composition, CompositionContent, TimeRange,
    VideoFrame, VideoSequence, update_static_time_ranges,
};
pub use file::{File, FileAttributes, PerformanceData, TimeStretchMode, verify_and_make};
pub use id::{CompositionRef, LayerRef, MaskRef};
pub use image::ImageAsset;
pub use layer::{
    Color, Effect, EffectKind, Layer, LayerContent, LayerType, Mask, MaskMode, Point, ScaleMode,
    ShapeElement, TextDocument, TextPathOption, TrackMatteType, Transform2D,
};
pub use verify::Verify;
