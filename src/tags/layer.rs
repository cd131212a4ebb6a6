//! `LayerBlock` body and the tags nested in it.
//!
//! `[layer type: u8] [id: enc u32] [nested tags...] [End]`
//!
//! Nested tags that do not apply to the layer's variant are skipped.

use super::effect::{effect_code, read_effect, write_effect};
use super::mask::{read_mask, write_mask};
use super::{
    TagCode, TagHeader, read_color, read_point, read_reference_id, read_tags, write_color, write_end_tag,
    write_point, write_reference_id, write_tag,
};
use crate::graph::{
    Composition, Layer, LayerContent, LayerType, ScaleMode, ShapeElement, TextDocument, TextPathOption,
    TrackMatteType, Transform2D,
};
use crate::io::{DecodeStream, EncodeStream};
use crate::resolver::PendingLayer;

/// Accumulates one layer and its raw references while its nested tags are read.
struct LayerDecoder {
    layer: Layer,
    pending: PendingLayer,
}

impl LayerDecoder {
    fn read_tag(&mut self, header: TagHeader, stream: &mut DecodeStream<'_>) {
        let Some(code) = header.tag() else {
            return;
        };
        match code {
            TagCode::LayerAttributes | TagCode::LayerAttributesV2 => {
                self.pending.parent = read_layer_attributes(stream, &mut self.layer);
                if code == TagCode::LayerAttributesV2 {
                    self.layer.name = stream.read_string();
                }
            }
            TagCode::Transform2D => self.layer.transform = Some(read_transform(stream)),
            TagCode::MaskBlock => self.layer.masks.push(read_mask(stream)),
            TagCode::FastBlurEffect
            | TagCode::GlowEffect
            | TagCode::MosaicEffect
            | TagCode::DisplacementMapEffect => {
                if let Some((effect, pending)) = read_effect(code, stream) {
                    self.layer.effects.push(effect);
                    self.pending.effects.push(pending);
                }
            }
            _ => self.read_content_tag(code, stream),
        }
    }

    fn read_content_tag(&mut self, code: TagCode, stream: &mut DecodeStream<'_>) {
        match (&mut self.layer.content, code) {
            (LayerContent::Solid { color, width, height }, TagCode::SolidColor) => {
                *color = read_color(stream);
                *width = stream.read_encoded_i32();
                *height = stream.read_encoded_i32();
            }
            (LayerContent::Text { document, .. }, TagCode::TextSource) => {
                *document = Some(read_text_document(stream));
            }
            (LayerContent::Text { path_option, .. }, TagCode::TextPathOption) => {
                let (option, mask) = read_text_path_option(stream);
                *path_option = Some(option);
                self.pending.text_path_mask = mask;
            }
            (
                LayerContent::PreCompose {
                    composition_start_time,
                    ..
                },
                TagCode::CompositionReference,
            ) => {
                self.pending.composition = read_reference_id(stream);
                *composition_start_time = stream.read_encoded_i64();
            }
            (LayerContent::Image { image_id, .. }, TagCode::ImageReference) => {
                *image_id = stream.read_encoded_u32();
            }
            (LayerContent::Image { scale_mode, .. }, TagCode::ImageFillRule) => {
                *scale_mode = Some(ScaleMode::from_u8(stream.read_u8()));
            }
            (LayerContent::Shape { elements }, TagCode::Rectangle) => {
                elements.push(ShapeElement::Rectangle {
                    position: read_point(stream),
                    size: read_point(stream),
                    roundness: stream.read_f32(),
                });
            }
            (LayerContent::Shape { elements }, TagCode::Ellipse) => {
                elements.push(ShapeElement::Ellipse {
                    position: read_point(stream),
                    size: read_point(stream),
                });
            }
            (LayerContent::Shape { elements }, TagCode::Fill) => {
                elements.push(ShapeElement::Fill {
                    color: read_color(stream),
                    opacity: stream.read_u8(),
                });
            }
            _ => log::trace!("layer {} ignores tag {}", self.layer.id, code.name()),
        }
    }
}

/// Decodes a layer block, returning the layer and its unresolved references.
pub(crate) fn read_layer_block(stream: &mut DecodeStream<'_>) -> (Layer, PendingLayer) {
    let layer_type = LayerType::from_u8(stream.read_u8());
    let id = stream.read_encoded_u32();
    let mut decoder = LayerDecoder {
        layer: Layer::new(id, LayerContent::empty(layer_type)),
        pending: PendingLayer::default(),
    };
    read_tags(stream, |header, body| decoder.read_tag(header, body));
    let LayerDecoder { mut layer, pending } = decoder;
    if layer.duration <= 0 {
        layer.duration = 1;
    }
    (layer, pending)
}

/// Reads the shared attributes into `layer` and returns the raw parent ID.
fn read_layer_attributes(stream: &mut DecodeStream<'_>, layer: &mut Layer) -> Option<u32> {
    layer.is_active = stream.read_bool();
    layer.auto_orientation = stream.read_bool();
    layer.motion_blur = stream.read_bool();
    let parent = read_reference_id(stream);
    layer.start_time = stream.read_encoded_i64();
    layer.duration = stream.read_encoded_i64();
    layer.blend_mode = stream.read_u8();
    layer.track_matte_type = TrackMatteType::from_u8(stream.read_u8());
    parent
}

/// Writes the `LayerAttributes` body with an explicit parent ID.
pub(crate) fn write_layer_attributes(stream: &mut EncodeStream<'_>, layer: &Layer, parent_id: Option<u32>) {
    stream.write_bool(layer.is_active);
    stream.write_bool(layer.auto_orientation);
    stream.write_bool(layer.motion_blur);
    write_reference_id(stream, parent_id);
    stream.write_encoded_i64(layer.start_time);
    stream.write_encoded_i64(layer.duration);
    stream.write_u8(layer.blend_mode);
    stream.write_u8(layer.track_matte_type as u8);
}

fn read_transform(stream: &mut DecodeStream<'_>) -> Transform2D {
    Transform2D {
        anchor_point: read_point(stream),
        position: read_point(stream),
        scale: read_point(stream),
        rotation: stream.read_f32(),
        opacity: stream.read_u8(),
    }
}

fn write_transform(stream: &mut EncodeStream<'_>, transform: &Transform2D) {
    write_point(stream, transform.anchor_point);
    write_point(stream, transform.position);
    write_point(stream, transform.scale);
    stream.write_f32(transform.rotation);
    stream.write_u8(transform.opacity);
}

fn read_text_document(stream: &mut DecodeStream<'_>) -> TextDocument {
    TextDocument {
        text: stream.read_string(),
        font_family: stream.read_string(),
        font_style: stream.read_string(),
        font_size: stream.read_f32(),
        fill_color: read_color(stream),
        justification: stream.read_u8(),
    }
}

fn write_text_document(stream: &mut EncodeStream<'_>, document: &TextDocument) {
    stream.write_string(&document.text);
    stream.write_string(&document.font_family);
    stream.write_string(&document.font_style);
    stream.write_f32(document.font_size);
    write_color(stream, document.fill_color);
    stream.write_u8(document.justification);
}

fn read_text_path_option(stream: &mut DecodeStream<'_>) -> (TextPathOption, Option<u32>) {
    let mask = read_reference_id(stream);
    let option = TextPathOption {
        path: None,
        reversed_path: stream.read_bool(),
        perpendicular_to_path: stream.read_bool(),
        force_alignment: stream.read_bool(),
        first_margin: stream.read_f32(),
        last_margin: stream.read_f32(),
    };
    (option, mask)
}

/// Encodes `layer`, one of `layers`, inside a composition of `compositions`.
pub(crate) fn write_layer_block(
    stream: &mut EncodeStream<'_>,
    layer: &Layer,
    layers: &[Layer],
    compositions: &[Composition],
) {
    stream.write_u8(layer.layer_type() as u8);
    stream.write_encoded_u32(layer.id);

    let parent_id = layer.parent.and_then(|p| layers.get(p.index())).map(|p| p.id);
    let attributes_code = if layer.name.is_empty() {
        TagCode::LayerAttributes
    } else {
        TagCode::LayerAttributesV2
    };
    write_tag(stream, attributes_code, |s| {
        write_layer_attributes(s, layer, parent_id);
        if attributes_code == TagCode::LayerAttributesV2 {
            s.write_string(&layer.name);
        }
    });
    if let Some(transform) = &layer.transform {
        write_tag(stream, TagCode::Transform2D, |s| write_transform(s, transform));
    }
    for mask in &layer.masks {
        write_tag(stream, TagCode::MaskBlock, |s| write_mask(s, mask));
    }
    write_content_tags(stream, layer, compositions);
    for effect in &layer.effects {
        write_tag(stream, effect_code(effect), |s| write_effect(s, effect, layer, layers));
    }
    write_end_tag(stream);
}

fn write_content_tags(stream: &mut EncodeStream<'_>, layer: &Layer, compositions: &[Composition]) {
    match &layer.content {
        LayerContent::Solid { color, width, height } => {
            write_tag(stream, TagCode::SolidColor, |s| {
                write_color(s, *color);
                s.write_encoded_i32(*width);
                s.write_encoded_i32(*height);
            });
        }
        LayerContent::Text {
            document,
            path_option,
        } => {
            if let Some(document) = document {
                write_tag(stream, TagCode::TextSource, |s| write_text_document(s, document));
            }
            if let Some(option) = path_option {
                let mask_id = option.path.and_then(|m| layer.masks.get(m.index())).map(|m| m.id);
                write_tag(stream, TagCode::TextPathOption, |s| {
                    write_reference_id(s, mask_id);
                    s.write_bool(option.reversed_path);
                    s.write_bool(option.perpendicular_to_path);
                    s.write_bool(option.force_alignment);
                    s.write_f32(option.first_margin);
                    s.write_f32(option.last_margin);
                });
            }
        }
        LayerContent::Shape { elements } => {
            for element in elements {
                write_shape_element(stream, element);
            }
        }
        LayerContent::Image {
            image_id,
            scale_mode,
        } => {
            write_tag(stream, TagCode::ImageReference, |s| s.write_encoded_u32(*image_id));
            if let Some(mode) = scale_mode {
                write_tag(stream, TagCode::ImageFillRule, |s| s.write_u8(*mode as u8));
            }
        }
        LayerContent::PreCompose {
            composition,
            composition_start_time,
        } => {
            let composition_id = composition.and_then(|c| compositions.get(c.index())).map(|c| c.id);
            write_tag(stream, TagCode::CompositionReference, |s| {
                write_reference_id(s, composition_id);
                s.write_encoded_i64(*composition_start_time);
            });
        }
        LayerContent::Unknown | LayerContent::Null | LayerContent::Camera => {}
    }
}

fn write_shape_element(stream: &mut EncodeStream<'_>, element: &ShapeElement) {
    match element {
        ShapeElement::Rectangle {
            position,
            size,
            roundness,
        } => write_tag(stream, TagCode::Rectangle, |s| {
            write_point(s, *position);
            write_point(s, *size);
            s.write_f32(*roundness);
        }),
        ShapeElement::Ellipse { position, size } => write_tag(stream, TagCode::Ellipse, |s| {
            write_point(s, *position);
            write_point(s, *size);
        }),
        ShapeElement::Fill { color, opacity } => write_tag(stream, TagCode::Fill, |s| {
            write_color(s, *color);
            s.write_u8(*opacity);
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Effect, EffectKind, LayerRef, Mask, MaskRef, Point};
    use crate::io::StreamContext;
    use crate::tags::{read_count, write_count};

    fn write_layer_list(stream: &mut EncodeStream<'_>, layers: &[Layer]) {
        write_count(stream, layers.len());
        for layer in layers {
            write_layer_block(stream, layer, layers, &[]);
        }
    }

    fn read_layer_list(stream: &mut DecodeStream<'_>) -> Vec<(Layer, PendingLayer)> {
        let count = read_count(stream, 1);
        (0..count).map(|_| read_layer_block(stream)).collect()
    }

    #[test]
    fn layer_block_keeps_raw_references() {
        let mut layers = vec![
            Layer::new(4, LayerContent::Null),
            Layer::new(
                9,
                LayerContent::Text {
                    document: Some(TextDocument::new("title")),
                    path_option: Some(TextPathOption {
                        path: Some(MaskRef::new(0)),
                        ..Default::default()
                    }),
                },
            ),
        ];
        let text = &mut layers[1];
        text.name = "Title".into();
        text.parent = Some(LayerRef::new(0));
        text.track_matte_type = TrackMatteType::Luma;
        text.masks = vec![Mask::new(3, vec![Point::new(1.0, 2.0)])];
        let mut blur = Effect::new(EffectKind::FastBlur {
            blurriness: 2.5,
            dimension: 1,
            repeat_edge_pixels: true,
        });
        blur.mask_references = vec![MaskRef::new(0)];
        text.effects = vec![blur];

        let context = StreamContext::new();
        let mut out = EncodeStream::new(&context);
        write_layer_list(&mut out, &layers);
        let bytes = out.into_bytes();

        let mut input = DecodeStream::new(&context, &bytes);
        let decoded = read_layer_list(&mut input);
        assert!(input.check().is_ok());
        assert_eq!(decoded.len(), 2);

        let (layer, pending) = &decoded[1];
        assert_eq!(layer.name, "Title");
        assert_eq!(layer.track_matte_type, TrackMatteType::Luma);
        assert_eq!(layer.parent, None);
        assert_eq!(pending.parent, Some(4));
        assert_eq!(pending.text_path_mask, Some(3));
        assert_eq!(pending.effects[0].masks, vec![3]);
        assert_eq!(layer.effects[0].mask_references, Vec::new());
        assert_eq!(layer.masks[0].vertices, vec![Point::new(1.0, 2.0)]);
    }

    #[test]
    fn non_positive_duration_is_repaired() {
        let mut layer = Layer::new(1, LayerContent::Null);
        layer.duration = -3;

        let context = StreamContext::new();
        let mut out = EncodeStream::new(&context);
        write_layer_block(&mut out, &layer, std::slice::from_ref(&layer), &[]);
        let bytes = out.into_bytes();

        let mut input = DecodeStream::new(&context, &bytes);
        let (decoded, _) = read_layer_block(&mut input);
        assert_eq!(decoded.duration, 1);
    }

    #[test]
    fn tags_of_other_variants_are_ignored() {
        let context = StreamContext::new();
        let mut out = EncodeStream::new(&context);
        out.write_u8(LayerType::Null as u8);
        out.write_encoded_u32(1);
        write_tag(&mut out, TagCode::SolidColor, |s| {
            write_color(s, crate::graph::Color::new(1, 2, 3));
            s.write_encoded_i32(10);
            s.write_encoded_i32(10);
        });
        // A code this reader has never heard of.
        out.write_u16((900 << 6) | 2);
        out.write_bytes(&[0xFF, 0xFF]);
        write_end_tag(&mut out);
        let bytes = out.into_bytes();

        let mut input = DecodeStream::new(&context, &bytes);
        let (layer, _) = read_layer_block(&mut input);
        assert!(input.check().is_ok());
        assert_eq!(layer.content, LayerContent::Null);
        assert_eq!(context.tag_level(), 900);
    }
}
