//! Layers and everything a layer owns: masks, effects, and variant content.

use super::id::{CompositionRef, LayerRef, MaskRef};

/// An 8-bit RGB color.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    /// Creates a color from its channels.
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

/// A 2D point or size.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    /// Creates a point.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// The wire discriminant of a layer variant.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LayerType {
    Unknown = 0,
    Null = 1,
    Solid = 2,
    Text = 3,
    Shape = 4,
    Image = 5,
    PreCompose = 6,
    Camera = 7,
}

impl LayerType {
    /// Maps a wire byte to a layer type. Unrecognized bytes become `Unknown`.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Null,
            2 => Self::Solid,
            3 => Self::Text,
            4 => Self::Shape,
            5 => Self::Image,
            6 => Self::PreCompose,
            7 => Self::Camera,
            _ => Self::Unknown,
        }
    }
}

/// How a layer uses the layer above it as a matte.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum TrackMatteType {
    /// No matte.
    #[default]
    None = 0,
    Alpha = 1,
    AlphaInverted = 2,
    Luma = 3,
    LumaInverted = 4,
}

impl TrackMatteType {
    /// Maps a wire byte to a matte type. Unrecognized bytes become `None`.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Alpha,
            2 => Self::AlphaInverted,
            3 => Self::Luma,
            4 => Self::LumaInverted,
            _ => Self::None,
        }
    }

    /// Returns true for every variant that takes the preceding layer as a matte.
    pub fn is_matte(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// How a mask combines with the masks before it.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum MaskMode {
    None = 0,
    #[default]
    Add = 1,
    Subtract = 2,
    Intersect = 3,
    Difference = 4,
}

impl MaskMode {
    /// Maps a wire byte to a mask mode. Unrecognized bytes become `Add`.
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::None,
            2 => Self::Subtract,
            3 => Self::Intersect,
            4 => Self::Difference,
            _ => Self::Add,
        }
    }
}

/// Static 2D transform of a layer.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub struct Transform2D {
    pub anchor_point: Point,
    pub position: Point,
    pub scale: Point,
    /// Degrees, clockwise.
    pub rotation: f32,
    pub opacity: u8,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self {
            anchor_point: Point::default(),
            position: Point::default(),
            scale: Point::new(1.0, 1.0),
            rotation: 0.0,
            opacity: 255,
        }
    }
}

/// A path-based clipping region owned by one layer.
///
/// Mask IDs are layer-local: two layers may both own a mask with ID 1.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    pub id: u32,
    pub inverted: bool,
    pub mode: MaskMode,
    pub opacity: u8,
    pub expansion: f32,
    /// Closed polygon approximating the mask path.
    pub vertices: Vec<Point>,
}

impl Mask {
    /// Creates an additive, fully opaque mask.
    pub fn new(id: u32, vertices: Vec<Point>) -> Self {
        Self {
            id,
            inverted: false,
            mode: MaskMode::Add,
            opacity: 255,
            expansion: 0.0,
            vertices,
        }
    }
}

/// An effect applied to a layer, optionally restricted to some of its masks.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub struct Effect {
    /// Masks of the owning layer this effect is limited to.
    pub mask_references: Vec<MaskRef>,
    pub kind: EffectKind,
}

impl Effect {
    /// Creates an effect that applies to the whole layer.
    pub fn new(kind: EffectKind) -> Self {
        Self {
            mask_references: Vec::new(),
            kind,
        }
    }
}

/// The supported effect variants.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub enum EffectKind {
    FastBlur {
        blurriness: f32,
        /// 0 = both, 1 = horizontal, 2 = vertical.
        dimension: u8,
        repeat_edge_pixels: bool,
    },
    Glow {
        threshold: f32,
        radius: f32,
        intensity: f32,
    },
    Mosaic {
        horizontal_blocks: u32,
        vertical_blocks: u32,
        sharp_colors: bool,
    },
    /// Offsets pixels by the channels of another layer in the same composition.
    DisplacementMap {
        /// The layer used as the displacement source.
        layer: Option<LayerRef>,
        use_for_horizontal: u8,
        max_horizontal: f32,
        use_for_vertical: u8,
        max_vertical: f32,
        wrap_pixels: bool,
    },
}

/// Static text content of a text layer.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub struct TextDocument {
    pub text: String,
    pub font_family: String,
    pub font_style: String,
    pub font_size: f32,
    pub fill_color: Color,
    /// 0 = left, 1 = center, 2 = right.
    pub justification: u8,
}

impl TextDocument {
    /// Creates a document with default font settings.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font_family: String::new(),
            font_style: String::new(),
            font_size: 24.0,
            fill_color: Color::default(),
            justification: 0,
        }
    }
}

/// Lays text out along one of the layer's masks.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextPathOption {
    /// The mask whose path the text follows.
    pub path: Option<MaskRef>,
    pub reversed_path: bool,
    pub perpendicular_to_path: bool,
    pub force_alignment: bool,
    pub first_margin: f32,
    pub last_margin: f32,
}

/// A primitive of a shape layer.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeElement {
    Rectangle {
        position: Point,
        size: Point,
        roundness: f32,
    },
    Ellipse { position: Point, size: Point },
    Fill { color: Color, opacity: u8 },
}

/// How an image is fitted into its layer bounds.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum ScaleMode {
    None = 0,
    Stretch = 1,
    #[default]
    LetterBox = 2,
    Zoom = 3,
}

impl ScaleMode {
    /// Maps a wire byte to a scale mode. Unrecognized bytes become `LetterBox`.
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::None,
            1 => Self::Stretch,
            3 => Self::Zoom,
            _ => Self::LetterBox,
        }
    }
}

/// Variant payload of a layer.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub enum LayerContent {
    /// A layer type this reader does not know. Decoded for its shared attributes only.
    Unknown,
    Null,
    Solid { color: Color, width: i32, height: i32 },
    Text {
        document: Option<TextDocument>,
        path_option: Option<TextPathOption>,
    },
    Shape { elements: Vec<ShapeElement> },
    Image {
        image_id: u32,
        scale_mode: Option<ScaleMode>,
    },
    /// Embeds another composition of the same file.
    PreCompose {
        composition: Option<CompositionRef>,
        /// Offset of the nested composition's frame 0 within this layer.
        composition_start_time: i64,
    },
    Camera,
}

impl LayerContent {
    /// Returns an empty payload for `layer_type`.
    pub fn empty(layer_type: LayerType) -> Self {
        match layer_type {
            LayerType::Unknown => Self::Unknown,
            LayerType::Null => Self::Null,
            LayerType::Solid => Self::Solid {
                color: Color::default(),
                width: 0,
                height: 0,
            },
            LayerType::Text => Self::Text {
                document: None,
                path_option: None,
            },
            LayerType::Shape => Self::Shape {
                elements: Vec::new(),
            },
            LayerType::Image => Self::Image {
                image_id: 0,
                scale_mode: None,
            },
            LayerType::PreCompose => Self::PreCompose {
                composition: None,
                composition_start_time: 0,
            },
            LayerType::Camera => Self::Camera,
        }
    }

    /// The wire discriminant of this payload.
    pub fn layer_type(&self) -> LayerType {
        match self {
            Self::Unknown => LayerType::Unknown,
            Self::Null => LayerType::Null,
            Self::Solid { .. } => LayerType::Solid,
            Self::Text { .. } => LayerType::Text,
            Self::Shape { .. } => LayerType::Shape,
            Self::Image { .. } => LayerType::Image,
            Self::PreCompose { .. } => LayerType::PreCompose,
            Self::Camera => LayerType::Camera,
        }
    }
}

/// One visual element of a vector composition.
///
/// Every cross reference is an index handle into a container the layer does not own:
/// `parent`, `track_matte_layer`, and displacement-map layers index the sibling layer list,
/// mask references index this layer's own `masks`, and `containing_composition` indexes the
/// file's composition list.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    /// Unique among the layers of one composition.
    pub id: u32,
    pub name: String,
    /// The layer whose transform this layer inherits.
    pub parent: Option<LayerRef>,
    /// The vector composition this layer belongs to. Set during decode.
    pub containing_composition: Option<CompositionRef>,
    /// First frame, in composition time.
    pub start_time: i64,
    /// Length in frames. Always positive after decode.
    pub duration: i64,
    pub is_active: bool,
    pub auto_orientation: bool,
    pub motion_blur: bool,
    pub blend_mode: u8,
    pub track_matte_type: TrackMatteType,
    /// Always the immediately preceding layer when set.
    pub track_matte_layer: Option<LayerRef>,
    pub transform: Option<Transform2D>,
    pub masks: Vec<Mask>,
    pub effects: Vec<Effect>,
    pub content: LayerContent,
}

impl Layer {
    /// Creates an active, one-frame layer with no references.
    pub fn new(id: u32, content: LayerContent) -> Self {
        Self {
            id,
            name: String::new(),
            parent: None,
            containing_composition: None,
            start_time: 0,
            duration: 1,
            is_active: true,
            auto_orientation: false,
            motion_blur: false,
            blend_mode: 0,
            track_matte_type: TrackMatteType::None,
            track_matte_layer: None,
            transform: None,
            masks: Vec::new(),
            effects: Vec::new(),
            content,
        }
    }

    /// The wire discriminant of this layer's variant.
    pub fn layer_type(&self) -> LayerType {
        self.content.layer_type()
    }

    /// The nested composition of a pre-compose layer.
    pub fn composition(&self) -> Option<CompositionRef> {
        match self.content {
            LayerContent::PreCompose { composition, .. } => composition,
            _ => None,
        }
    }
}
