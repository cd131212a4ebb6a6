//! Compositions and the static time range precomputation.
//!
//! A static time range is an inclusive run of frames over which a composition renders the same
//! image. Ranges shorter than two frames carry no information and are never stored.

use serde::Serialize;

use super::id::CompositionRef;
use super::layer::{Color, Layer, LayerContent};

/// An inclusive range of frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TimeRange {
    #[allow(missing_docs)]
    pub start: i64,
    #[allow(missing_docs)]
    pub end: i64,
}

impl TimeRange {
    /// Creates a range covering `start..=end`.
    pub const fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// True if the range covers more than one frame.
    pub fn is_span(&self) -> bool {
        self.end > self.start
    }
}

/// One encoded image placed at an offset within a bitmap frame.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub struct BitmapRect {
    pub x: i32,
    pub y: i32,
    pub file_bytes: Vec<u8>,
}

/// One frame of a bitmap sequence. An empty `bitmaps` list repeats the previous frame.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BitmapFrame {
    pub is_key_frame: bool,
    pub bitmaps: Vec<BitmapRect>,
}

/// Pre-rendered frames of a bitmap composition at one resolution.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub struct BitmapSequence {
    pub width: i32,
    pub height: i32,
    pub frame_rate: f32,
    pub frames: Vec<BitmapFrame>,
}

/// One encoded sample of a video sequence.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    pub frame: i64,
    pub is_key_frame: bool,
    pub file_bytes: Vec<u8>,
}

/// Pre-rendered frames of a video composition at one resolution.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub struct VideoSequence {
    pub width: i32,
    pub height: i32,
    pub frame_rate: f32,
    /// Offset of the alpha plane in the packed frame, 0 when the video is opaque.
    pub alpha_start_x: i32,
    pub alpha_start_y: i32,
    pub frames: Vec<VideoFrame>,
    /// Ranges the exporter found static, in sequence frames.
    pub static_time_ranges: Vec<TimeRange>,
}

/// Variant payload of a composition.
#[derive(Debug, Clone, PartialEq)]
pub enum CompositionContent {
    /// Layers rendered at runtime.
    Vector {
        #[allow(missing_docs)]
        layers: Vec<Layer>,
    },
    /// Pre-rendered bitmap frames.
    Bitmap {
        #[allow(missing_docs)]
        sequences: Vec<BitmapSequence>,
    },
    /// Pre-rendered video frames.
    Video {
        #[allow(missing_docs)]
        sequences: Vec<VideoSequence>,
    },
}

/// A reusable animated scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    /// Unique among the compositions of one file.
    pub id: u32,
    #[allow(missing_docs)]
    pub width: i32,
    #[allow(missing_docs)]
    pub height: i32,
    /// Length in frames.
    pub duration: i64,
    #[allow(missing_docs)]
    pub frame_rate: f32,
    #[allow(missing_docs)]
    pub background_color: Color,
    #[allow(missing_docs)]
    pub content: CompositionContent,
    static_time_ranges: Vec<TimeRange>,
    static_time_range_updated: bool,
}

impl Composition {
    /// Creates a composition with a white background.
    pub fn new(
        id: u32,
        width: i32,
        height: i32,
        duration: i64,
        frame_rate: f32,
        content: CompositionContent,
    ) -> Self {
        Self {
            id,
            width,
            height,
            duration,
            frame_rate,
            background_color: Color::new(255, 255, 255),
            content,
            static_time_ranges: Vec::new(),
            static_time_range_updated: false,
        }
    }

    /// Creates a vector composition owning `layers`.
    pub fn vector(
        id: u32,
        width: i32,
        height: i32,
        duration: i64,
        frame_rate: f32,
        layers: Vec<Layer>,
    ) -> Self {
        Self::new(id, width, height, duration, frame_rate, CompositionContent::Vector { layers })
    }

    /// The layers of a vector composition; empty for the other variants.
    pub fn layers(&self) -> &[Layer] {
        match &self.content {
            CompositionContent::Vector { layers } => layers,
            _ => &[],
        }
    }

    pub(crate) fn layers_mut(&mut self) -> Option<&mut Vec<Layer>> {
        match &mut self.content {
            CompositionContent::Vector { layers } => Some(layers),
            _ => None,
        }
    }

    /// Returns true for the `Video` variant.
    pub fn is_video(&self) -> bool {
        matches!(self.content, CompositionContent::Video { .. })
    }

    /// Frames over which this composition renders the same image.
    ///
    /// Empty until [`update_static_time_ranges`] has run, which decoding always does.
    pub fn static_time_ranges(&self) -> &[TimeRange] {
        &self.static_time_ranges
    }

    /// Whether the static time ranges have been computed.
    pub fn static_time_range_updated(&self) -> bool {
        self.static_time_range_updated
    }

    /// Returns true if every frame renders the same image.
    pub fn has_static_content(&self) -> bool {
        self.duration <= 1
            || matches!(self.static_time_ranges.as_slice(),
                [range] if range.start == 0 && range.end == self.duration - 1)
    }
}

/// Computes the static time ranges of every composition in `compositions`.
///
/// Each composition is computed at most once: a composition whose ranges are already computed
/// is left untouched, so calling this again is a no-op. Nested compositions are computed before
/// the compositions embedding them. A pre-compose cycle is cut where it closes: the nested
/// composition still being computed contributes no static frames.
pub fn update_static_time_ranges(compositions: &mut [Composition]) {
    let mut visiting = vec![false; compositions.len()];
    let mut stack = Vec::new();
    for root in 0..compositions.len() {
        stack.push((root, false));
        // Post-order: a composition is computed once every nested one it reaches is done.
        while let Some((index, children_done)) = stack.pop() {
            if children_done {
                let ranges = compute_ranges(compositions, index);
                let composition = &mut compositions[index];
                composition.static_time_ranges = ranges;
                composition.static_time_range_updated = true;
                visiting[index] = false;
                continue;
            }
            if compositions[index].static_time_range_updated || visiting[index] {
                continue;
            }
            visiting[index] = true;
            stack.push((index, true));
            for child in nested_compositions(&compositions[index]).into_iter().rev() {
                if child.index() < compositions.len() {
                    stack.push((child.index(), false));
                }
            }
        }
    }
}

fn nested_compositions(composition: &Composition) -> Vec<CompositionRef> {
    composition.layers().iter().filter_map(Layer::composition).collect()
}

fn compute_ranges(compositions: &[Composition], index: usize) -> Vec<TimeRange> {
    let composition = &compositions[index];
    if composition.duration <= 1 {
        return Vec::new();
    }
    match &composition.content {
        CompositionContent::Vector { layers } => vector_ranges(compositions, composition.duration, layers),
        CompositionContent::Bitmap { sequences } => match sequences.first() {
            Some(sequence) => bitmap_ranges(sequence),
            None => vec![TimeRange::new(0, composition.duration - 1)],
        },
        CompositionContent::Video { sequences } => sequences
            .first()
            .map(|sequence| sequence.static_time_ranges.clone())
            .unwrap_or_default(),
    }
}

fn vector_ranges(compositions: &[Composition], duration: i64, layers: &[Layer]) -> Vec<TimeRange> {
    let mut ranges = vec![TimeRange::new(0, duration - 1)];
    let mut split_points = Vec::with_capacity(layers.len() * 2);
    for layer in layers {
        let layer_end = layer.start_time.saturating_add(layer.duration);
        split_points.push(layer.start_time);
        split_points.push(layer_end);

        if let LayerContent::PreCompose {
            composition: Some(nested),
            composition_start_time,
        } = &layer.content
            && let Some(nested) = compositions.get(nested.index())
            && !nested.has_static_content()
            && layer_end > layer.start_time
        {
            let window = TimeRange::new(layer.start_time, layer_end - 1);
            let offset = layer.start_time.saturating_add(*composition_start_time);
            let allowed: Vec<TimeRange> = nested
                .static_time_ranges
                .iter()
                .map(|range| {
                    TimeRange::new(
                        range.start.saturating_add(offset).max(window.start),
                        range.end.saturating_add(offset).min(window.end),
                    )
                })
                .filter(TimeRange::is_span)
                .collect();
            restrict(&mut ranges, window, &allowed);
        }
    }
    split_points.sort_unstable();
    split_points.dedup();
    split_all(&ranges, &split_points)
}

fn bitmap_ranges(sequence: &BitmapSequence) -> Vec<TimeRange> {
    let mut ranges = Vec::new();
    let mut current = TimeRange::new(-1, -1);
    for (index, frame) in (0_i64..).zip(&sequence.frames) {
        if frame.bitmaps.is_empty() {
            current.end = index;
        } else {
            if current.is_span() {
                ranges.push(current);
            }
            current = TimeRange::new(index, index);
        }
    }
    if current.is_span() {
        ranges.push(current);
    }
    ranges
}

/// Intersects two sorted lists of disjoint ranges.
fn intersect(ranges: &[TimeRange], others: &[TimeRange]) -> Vec<TimeRange> {
    let mut result = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < ranges.len() && j < others.len() {
        let (range, other) = (ranges[i], others[j]);
        let overlap = TimeRange::new(range.start.max(other.start), range.end.min(other.end));
        if overlap.is_span() {
            result.push(overlap);
        }
        if range.end < other.end {
            i += 1;
        } else {
            j += 1;
        }
    }
    result
}

/// Keeps only the frames of `window` covered by `allowed`. Frames outside `window` are untouched.
fn restrict(ranges: &mut Vec<TimeRange>, window: TimeRange, allowed: &[TimeRange]) {
    let first = ranges.partition_point(|range| range.end < window.start);
    let last = ranges.partition_point(|range| range.start <= window.end);
    if first >= last {
        return;
    }
    let head = ranges[first];
    let tail = ranges[last - 1];
    let inside: Vec<TimeRange> = ranges[first..last]
        .iter()
        .map(|range| TimeRange::new(range.start.max(window.start), range.end.min(window.end)))
        .collect();

    let mut replacement = Vec::new();
    if head.start < window.start {
        replacement.push(TimeRange::new(head.start, window.start - 1));
    }
    replacement.extend(intersect(&inside, allowed));
    if tail.end > window.end {
        replacement.push(TimeRange::new(window.end + 1, tail.end));
    }
    replacement.retain(TimeRange::is_span);

    let mut rebuilt = Vec::with_capacity(ranges.len() + replacement.len());
    rebuilt.extend_from_slice(&ranges[..first]);
    rebuilt.extend(replacement);
    rebuilt.extend_from_slice(&ranges[last..]);
    *ranges = rebuilt;
}

/// Cuts sorted, disjoint `ranges` at every frame in sorted `points`, so that `point - 1` and
/// `point` never share a range.
fn split_all(ranges: &[TimeRange], points: &[i64]) -> Vec<TimeRange> {
    let mut result = Vec::with_capacity(ranges.len() + points.len());
    let mut next = 0;
    for range in ranges {
        while next < points.len() && points[next] <= range.start {
            next += 1;
        }
        let mut start = range.start;
        while next < points.len() && points[next] <= range.end {
            result.push(TimeRange::new(start, points[next] - 1));
            start = points[next];
            next += 1;
        }
        result.push(TimeRange::new(start, range.end));
    }
    result.retain(TimeRange::is_span);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::layer::LayerType;

    fn layer(id: u32, start_time: i64, duration: i64) -> Layer {
        let mut layer = Layer::new(id, LayerContent::empty(LayerType::Null));
        layer.start_time = start_time;
        layer.duration = duration;
        layer
    }

    #[test]
    fn layer_boundaries_split_the_static_range() {
        let mut compositions = vec![Composition::vector(1, 100, 100, 30, 30.0, vec![layer(1, 10, 10)])];
        update_static_time_ranges(&mut compositions);
        assert_eq!(
            compositions[0].static_time_ranges(),
            &[TimeRange::new(0, 9), TimeRange::new(10, 19), TimeRange::new(20, 29)]
        );
    }

    #[test]
    fn second_update_is_a_no_op() {
        let mut compositions = vec![Composition::vector(1, 100, 100, 30, 30.0, vec![layer(1, 5, 10)])];
        update_static_time_ranges(&mut compositions);
        let first = compositions[0].static_time_ranges().to_vec();
        assert!(compositions[0].static_time_range_updated());

        compositions[0].duration = 300;
        update_static_time_ranges(&mut compositions);
        assert_eq!(compositions[0].static_time_ranges(), first.as_slice());
    }

    #[test]
    fn nested_ranges_are_shifted_into_the_parent() {
        let child = Composition::vector(1, 10, 10, 20, 30.0, vec![layer(1, 0, 10)]);
        let mut pre_compose = Layer::new(
            2,
            LayerContent::PreCompose {
                composition: Some(CompositionRef::new(0)),
                composition_start_time: 0,
            },
        );
        pre_compose.start_time = 5;
        pre_compose.duration = 20;
        let parent = Composition::vector(2, 10, 10, 40, 30.0, vec![pre_compose]);
        let mut compositions = vec![child, parent];
        update_static_time_ranges(&mut compositions);

        assert_eq!(
            compositions[0].static_time_ranges(),
            &[TimeRange::new(0, 9), TimeRange::new(10, 19)]
        );
        assert_eq!(
            compositions[1].static_time_ranges(),
            &[
                TimeRange::new(0, 4),
                TimeRange::new(5, 14),
                TimeRange::new(15, 24),
                TimeRange::new(25, 39)
            ]
        );
    }

    #[test]
    fn pre_compose_cycles_terminate() {
        let mut a = Layer::new(
            1,
            LayerContent::PreCompose {
                composition: Some(CompositionRef::new(1)),
                composition_start_time: 0,
            },
        );
        a.duration = 10;
        let mut b = a.clone();
        b.content = LayerContent::PreCompose {
            composition: Some(CompositionRef::new(0)),
            composition_start_time: 0,
        };
        let mut compositions = vec![
            Composition::vector(1, 10, 10, 10, 30.0, vec![a]),
            Composition::vector(2, 10, 10, 10, 30.0, vec![b]),
        ];
        update_static_time_ranges(&mut compositions);
        assert!(compositions.iter().all(Composition::static_time_range_updated));
    }

    #[test]
    fn back_to_back_layers_each_get_a_range() {
        let layers: Vec<Layer> = (0..40_000).map(|i| layer(i as u32 + 1, i * 2, 2)).collect();
        let mut compositions = vec![Composition::vector(1, 10, 10, 80_000, 30.0, layers)];
        update_static_time_ranges(&mut compositions);

        let ranges = compositions[0].static_time_ranges();
        assert_eq!(ranges.len(), 40_000);
        assert_eq!(ranges[0], TimeRange::new(0, 1));
        assert_eq!(ranges[39_999], TimeRange::new(79_998, 79_999));
    }

    #[test]
    fn deep_pre_compose_chains_are_computed_without_recursion() {
        let depth = 50_000;
        let mut compositions = vec![Composition::vector(1, 10, 10, 20, 30.0, vec![layer(1, 0, 10)])];
        for i in 1..depth {
            let mut pre_compose = Layer::new(
                1,
                LayerContent::PreCompose {
                    composition: Some(CompositionRef::new(i - 1)),
                    composition_start_time: 0,
                },
            );
            pre_compose.duration = 20;
            compositions.push(Composition::vector(i as u32 + 1, 10, 10, 20, 30.0, vec![pre_compose]));
        }
        // Start from the outermost composition so the walk has to descend the whole chain.
        compositions.reverse();
        for composition in &mut compositions {
            for layer in composition.layers_mut().into_iter().flatten() {
                if let LayerContent::PreCompose {
                    composition: Some(nested),
                    ..
                } = &mut layer.content
                {
                    *nested = CompositionRef::new(depth - 1 - nested.index());
                }
            }
        }
        update_static_time_ranges(&mut compositions);

        assert!(compositions.iter().all(Composition::static_time_range_updated));
        assert_eq!(
            compositions[0].static_time_ranges(),
            &[TimeRange::new(0, 9), TimeRange::new(10, 19)]
        );
    }

    #[test]
    fn restricted_windows_keep_the_outside_untouched() {
        let mut ranges = vec![TimeRange::new(0, 9), TimeRange::new(12, 40)];
        restrict(&mut ranges, TimeRange::new(5, 20), &[TimeRange::new(14, 18)]);
        assert_eq!(
            ranges,
            vec![TimeRange::new(0, 4), TimeRange::new(14, 18), TimeRange::new(21, 40)]
        );
    }

    #[test]
    fn bitmap_runs_of_empty_frames_are_static() {
        let keyed = BitmapFrame {
            is_key_frame: true,
            bitmaps: vec![BitmapRect {
                x: 0,
                y: 0,
                file_bytes: vec![1],
            }],
        };
        let frames = vec![
            keyed.clone(),
            BitmapFrame::default(),
            BitmapFrame::default(),
            keyed.clone(),
            keyed,
        ];
        let sequence = BitmapSequence {
            width: 10,
            height: 10,
            frame_rate: 30.0,
            frames,
        };
        assert_eq!(bitmap_ranges(&sequence), vec![TimeRange::new(0, 2)]);
    }
}
