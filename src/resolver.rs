//! Turns the raw IDs read from the wire into index handles.
//!
//! Tag bodies are decoded before the objects they reference exist, so the layer and
//! composition codecs leave every reference-bearing field empty and record the raw ID in a
//! side table ([`PendingComposition`]) instead. Once the whole body is decoded, [`resolve`]
//! consumes that table. A reference whose ID matches nothing is cleared, never reported.

use std::collections::HashMap;

use crate::graph::{Composition, CompositionRef, EffectKind, Layer, LayerContent, LayerRef, MaskRef};

/// Raw references of one composition, parallel to its layer list.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PendingComposition {
    /// One entry per layer, same order. Empty for bitmap and video compositions.
    pub layers: Vec<PendingLayer>,
}

/// Raw references of one layer.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PendingLayer {
    /// ID of the parent layer.
    pub parent: Option<u32>,
    /// One entry per effect, same order.
    pub effects: Vec<PendingEffect>,
    /// ID of the mask a text path follows.
    pub text_path_mask: Option<u32>,
    /// ID of the nested composition of a pre-compose layer.
    pub composition: Option<u32>,
}

/// Raw references of one effect.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PendingEffect {
    /// IDs of masks of the owning layer.
    pub masks: Vec<u32>,
    /// ID of the displacement source layer.
    pub displacement_layer: Option<u32>,
}

/// Resolves every pending reference of `compositions`.
///
/// `pending` is parallel to `compositions`. Duplicate IDs resolve to the last object carrying
/// them. Every composition's layers end up pointing at it through `containing_composition`.
pub fn resolve(compositions: &mut [Composition], pending: Vec<PendingComposition>) {
    for (composition, pending) in compositions.iter_mut().zip(&pending) {
        if let Some(layers) = composition.layers_mut() {
            resolve_layers(layers, &pending.layers);
        }
    }

    let composition_map = index_map(compositions.iter().map(|c| c.id));
    for (composition, pending) in compositions.iter_mut().zip(&pending) {
        let Some(layers) = composition.layers_mut() else {
            continue;
        };
        for (layer, pending) in layers.iter_mut().zip(&pending.layers) {
            if let LayerContent::PreCompose { composition, .. } = &mut layer.content {
                *composition = lookup(&composition_map, pending.composition).map(CompositionRef::new);
            }
        }
    }
    link_layers(compositions);
}

/// Points every layer's `containing_composition` at the composition owning it.
pub fn link_layers(compositions: &mut [Composition]) {
    for (index, composition) in compositions.iter_mut().enumerate() {
        for layer in composition.layers_mut().into_iter().flatten() {
            layer.containing_composition = Some(CompositionRef::new(index));
        }
    }
}

/// Resolves the references between the layers of one composition.
fn resolve_layers(layers: &mut [Layer], pending: &[PendingLayer]) {
    let layer_map = index_map(layers.iter().map(|layer| layer.id));

    for (layer, pending) in layers.iter_mut().zip(pending) {
        let mask_map = index_map(layer.masks.iter().map(|mask| mask.id));

        for (effect, pending) in layer.effects.iter_mut().zip(&pending.effects) {
            effect.mask_references = pending
                .masks
                .iter()
                .filter_map(|id| mask_map.get(id).copied().map(MaskRef::new))
                .collect();
            if let EffectKind::DisplacementMap { layer, .. } = &mut effect.kind {
                *layer = lookup(&layer_map, pending.displacement_layer).map(LayerRef::new);
            }
        }

        if let LayerContent::Text {
            path_option: Some(path_option),
            ..
        } = &mut layer.content
        {
            path_option.path = lookup(&mask_map, pending.text_path_mask).map(MaskRef::new);
        }

        layer.parent = lookup(&layer_map, pending.parent).map(LayerRef::new);
    }

    for (index, layer) in layers.iter_mut().enumerate() {
        layer.track_matte_layer = match index {
            0 => None,
            _ if layer.track_matte_type.is_matte() => Some(LayerRef::new(index - 1)),
            _ => None,
        };
    }
}

/// Maps each ID to the index of the last item carrying it.
fn index_map(ids: impl Iterator<Item = u32>) -> HashMap<u32, usize> {
    ids.enumerate().map(|(index, id)| (id, index)).collect()
}

fn lookup(map: &HashMap<u32, usize>, id: Option<u32>) -> Option<usize> {
    id.and_then(|id| map.get(&id).copied())
}
