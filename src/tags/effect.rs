//! Effect tag bodies.
//!
//! Every effect body opens with the masks it is restricted to:
//! `[mask count: enc u32] [mask ids: enc u32...]`, followed by the variant's own fields.

use super::{TagCode, read_count, read_reference_id, write_count, write_reference_id};
use crate::graph::{Effect, EffectKind, Layer};
use crate::io::{DecodeStream, EncodeStream};
use crate::resolver::PendingEffect;

/// Decodes an effect body, or returns `None` if `code` is not an effect.
pub(crate) fn read_effect(code: TagCode, stream: &mut DecodeStream<'_>) -> Option<(Effect, PendingEffect)> {
    let count = read_count(stream, 1);
    let masks: Vec<u32> = (0..count).map(|_| stream.read_encoded_u32()).collect();
    let mut displacement_layer = None;
    let kind = match code {
        TagCode::FastBlurEffect => EffectKind::FastBlur {
            blurriness: stream.read_f32(),
            dimension: stream.read_u8(),
            repeat_edge_pixels: stream.read_bool(),
        },
        TagCode::GlowEffect => EffectKind::Glow {
            threshold: stream.read_f32(),
            radius: stream.read_f32(),
            intensity: stream.read_f32(),
        },
        TagCode::MosaicEffect => EffectKind::Mosaic {
            horizontal_blocks: stream.read_encoded_u32(),
            vertical_blocks: stream.read_encoded_u32(),
            sharp_colors: stream.read_bool(),
        },
        TagCode::DisplacementMapEffect => {
            displacement_layer = read_reference_id(stream);
            EffectKind::DisplacementMap {
                layer: None,
                use_for_horizontal: stream.read_u8(),
                max_horizontal: stream.read_f32(),
                use_for_vertical: stream.read_u8(),
                max_vertical: stream.read_f32(),
                wrap_pixels: stream.read_bool(),
            }
        }
        _ => return None,
    };
    let pending = PendingEffect {
        masks,
        displacement_layer,
    };
    Some((Effect::new(kind), pending))
}

/// The tag code an effect is written under.
pub(crate) fn effect_code(effect: &Effect) -> TagCode {
    match effect.kind {
        EffectKind::FastBlur { .. } => TagCode::FastBlurEffect,
        EffectKind::Glow { .. } => TagCode::GlowEffect,
        EffectKind::Mosaic { .. } => TagCode::MosaicEffect,
        EffectKind::DisplacementMap { .. } => TagCode::DisplacementMapEffect,
    }
}

/// Encodes an effect of `owner`, whose siblings are `layers`.
///
/// Handles pointing outside their container are written as "no reference".
pub(crate) fn write_effect(stream: &mut EncodeStream<'_>, effect: &Effect, owner: &Layer, layers: &[Layer]) {
    let mask_ids: Vec<u32> = effect
        .mask_references
        .iter()
        .filter_map(|mask| owner.masks.get(mask.index()).map(|m| m.id))
        .collect();
    write_count(stream, mask_ids.len());
    for id in mask_ids {
        stream.write_encoded_u32(id);
    }
    match &effect.kind {
        EffectKind::FastBlur {
            blurriness,
            dimension,
            repeat_edge_pixels,
        } => {
            stream.write_f32(*blurriness);
            stream.write_u8(*dimension);
            stream.write_bool(*repeat_edge_pixels);
        }
        EffectKind::Glow {
            threshold,
            radius,
            intensity,
        } => {
            stream.write_f32(*threshold);
            stream.write_f32(*radius);
            stream.write_f32(*intensity);
        }
        EffectKind::Mosaic {
            horizontal_blocks,
            vertical_blocks,
            sharp_colors,
        } => {
            stream.write_encoded_u32(*horizontal_blocks);
            stream.write_encoded_u32(*vertical_blocks);
            stream.write_bool(*sharp_colors);
        }
        EffectKind::DisplacementMap {
            layer,
            use_for_horizontal,
            max_horizontal,
            use_for_vertical,
            max_vertical,
            wrap_pixels,
        } => {
            let layer_id = layer.and_then(|l| layers.get(l.index())).map(|l| l.id);
            write_reference_id(stream, layer_id);
            stream.write_u8(*use_for_horizontal);
            stream.write_f32(*max_horizontal);
            stream.write_u8(*use_for_vertical);
            stream.write_f32(*max_vertical);
            stream.write_bool(*wrap_pixels);
        }
    }
}
