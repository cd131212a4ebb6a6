#![allow(missing_docs)]

use pagcodec::graph::{Composition, Layer, LayerContent, LayerType};
use pagcodec::{Codec, CodecError, Inspector, PerformanceData};

fn sample() -> pagcodec::Result<Vec<u8>> {
    let mut layer = Layer::new(4, LayerContent::empty(LayerType::Null));
    layer.duration = 10;
    let file = Codec::make_file(
        vec![Composition::vector(2, 32, 32, 10, 10.0, vec![layer])],
        Vec::new(),
    )?;
    Codec::encode_with_performance(&file, &PerformanceData::default())
}

#[test]
fn report_describes_envelope_and_tree() -> pagcodec::Result<()> {
    let bytes = sample()?;
    let report = Inspector::inspect_bytes(&bytes)?;

    assert_eq!(report.file_size, bytes.len() as u64);
    assert_eq!(report.version, 1);
    assert_eq!(report.body_length as usize, bytes.len() - 9);
    assert_eq!(report.compression, "None");

    let names: Vec<&str> = report.tags.iter().map(|tag| tag.name.as_str()).collect();
    assert_eq!(names, vec!["VectorCompositionBlock", "Performance"]);

    let composition = &report.tags[0];
    assert!(
        composition
            .children
            .iter()
            .any(|tag| tag.name == "CompositionAttributes")
    );
    let layer = composition
        .children
        .iter()
        .find(|tag| tag.name == "LayerBlock")
        .ok_or_else(|| CodecError::Format("missing layer block".into()))?;
    assert!(layer.children.iter().any(|tag| tag.name == "LayerAttributes"));
    Ok(())
}

#[test]
fn report_serializes_to_json() -> pagcodec::Result<()> {
    let report = Inspector::inspect_bytes(&sample()?)?;
    let json = serde_json::to_value(&report).map_err(|err| CodecError::Format(err.to_string()))?;

    assert_eq!(json["version"], 1);
    assert_eq!(json["compression"], "None");
    assert_eq!(json["tags"][1]["name"], "Performance");
    assert_eq!(json["tags"][1]["length"], 4);
    Ok(())
}

#[test]
fn report_renders_as_a_tree() -> pagcodec::Result<()> {
    let text = Inspector::inspect_bytes(&sample()?)?.to_string();

    assert!(text.starts_with("=== PAG INSPECTOR REPORT ==="));
    assert!(text.contains("├── [VectorCompositionBlock]"));
    assert!(text.contains("└── [Performance] Code: 28 | Size: 4b"));
    assert!(text.contains("│   "));
    Ok(())
}

#[test]
fn unknown_codes_are_named_by_number() -> pagcodec::Result<()> {
    let mut bytes = sample()?;
    // Re-tag the Performance record with a code from a newer format revision.
    let performance_header = (28u16 << 6) | 4;
    let position = bytes
        .windows(2)
        .rposition(|pair| pair == performance_header.to_le_bytes())
        .ok_or_else(|| CodecError::Format("missing performance tag".into()))?;
    bytes[position..position + 2].copy_from_slice(&((700u16 << 6) | 4).to_le_bytes());

    let report = Inspector::inspect_bytes(&bytes)?;

    assert_eq!(report.tags[1].name, "Unknown(700)");
    assert_eq!(report.tag_level, 700);
    Ok(())
}

#[test]
#[cfg(not(target_arch = "wasm32"))]
fn inspect_reads_from_disk() -> pagcodec::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("sample.pag");
    std::fs::write(&path, sample()?)?;

    let report = Inspector::inspect(&path)?;
    assert_eq!(report.tags.len(), 2);
    Ok(())
}

#[test]
fn broken_input_is_reported() {
    assert!(Inspector::inspect_bytes(b"PAG").is_err());
}
