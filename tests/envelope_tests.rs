#![allow(missing_docs)]

use pagcodec::graph::{Color, Composition, Layer, LayerContent};
use pagcodec::{Codec, CodecError};

fn encoded() -> pagcodec::Result<Vec<u8>> {
    let mut layer = Layer::new(
        1,
        LayerContent::Solid {
            color: Color::new(0, 128, 255),
            width: 16,
            height: 16,
        },
    );
    layer.duration = 12;
    let composition = Composition::vector(1, 16, 16, 12, 12.0, vec![layer]);
    Codec::encode(&Codec::make_file(vec![composition], Vec::new())?)
}

fn set_body_length(bytes: &mut [u8], length: u32) {
    bytes[4..8].copy_from_slice(&length.to_le_bytes());
}

/// Inserts a top-level tag just before the closing `End` tag of the body.
fn insert_tag(bytes: &[u8], code: u16, body: &[u8]) -> Vec<u8> {
    assert!(body.len() < 63);
    let header = (code << 6) | body.len() as u16;
    let split = bytes.len() - 2;
    let mut out = bytes[..split].to_vec();
    out.extend_from_slice(&header.to_le_bytes());
    out.extend_from_slice(body);
    out.extend_from_slice(&bytes[split..]);
    let body_length = (out.len() - 9) as u32;
    set_body_length(&mut out, body_length);
    out
}

fn is_format_error<T>(result: pagcodec::Result<T>) -> bool {
    matches!(result, Err(CodecError::Format(_)))
}

// --- ENVELOPE ---

#[test]
fn envelope_layout_is_little_endian() -> pagcodec::Result<()> {
    let bytes = encoded()?;
    assert_eq!(&bytes[..3], b"PAG");
    assert_eq!(bytes[3], 1);
    assert_eq!(u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize, bytes.len() - 9);
    assert_eq!(bytes[8], 0);
    assert_eq!(&bytes[bytes.len() - 2..], &[0, 0]);
    Ok(())
}

#[test]
fn short_input_is_rejected() {
    assert!(is_format_error(Codec::decode(b"", "")));
    assert!(is_format_error(Codec::decode(b"PAG\x01\x00\x00\x00\x00\x00\x00", "")));
}

#[test]
fn bad_magic_is_rejected() -> pagcodec::Result<()> {
    let mut bytes = encoded()?;
    bytes[0] = b'X';
    assert!(is_format_error(Codec::decode(&bytes, "")));
    Ok(())
}

#[test]
fn encrypted_and_future_versions_are_rejected() -> pagcodec::Result<()> {
    for version in [3, 4, 200] {
        let mut bytes = encoded()?;
        bytes[3] = version;
        assert!(is_format_error(Codec::decode(&bytes, "")), "version {version}");
    }
    Ok(())
}

#[test]
fn version_two_is_accepted() -> pagcodec::Result<()> {
    let mut bytes = encoded()?;
    bytes[3] = 2;
    assert_eq!(Codec::decode(&bytes, "")?.compositions().len(), 1);
    Ok(())
}

#[test]
fn compressed_bodies_are_rejected() -> pagcodec::Result<()> {
    for compression in [1, 9] {
        let mut bytes = encoded()?;
        bytes[8] = compression;
        assert!(is_format_error(Codec::decode(&bytes, "")));
        assert!(is_format_error(Codec::read_performance_data(&bytes)));
    }
    Ok(())
}

#[test]
fn over_declared_body_length_is_clamped() -> pagcodec::Result<()> {
    let mut bytes = encoded()?;
    set_body_length(&mut bytes, u32::MAX);
    assert_eq!(Codec::decode(&bytes, "")?.compositions().len(), 1);
    Ok(())
}

// --- CORRUPTION ---

#[test]
fn every_truncation_fails_cleanly() -> pagcodec::Result<()> {
    let bytes = encoded()?;
    for end in 0..bytes.len() {
        let mut prefix = bytes[..end].to_vec();
        if prefix.len() >= 9 {
            let body_length = (prefix.len() - 9) as u32;
            set_body_length(&mut prefix, body_length);
        }
        assert!(Codec::decode(&prefix, "").is_err(), "prefix of {end} bytes decoded");
    }
    Ok(())
}

#[test]
fn flipped_bytes_never_panic() -> pagcodec::Result<()> {
    let bytes = encoded()?;
    for index in 9..bytes.len() {
        for value in [0x00, 0x3f, 0x80, 0xff] {
            let mut corrupted = bytes.clone();
            corrupted[index] = value;
            // Either outcome is fine, as long as it is an outcome.
            let _ = Codec::decode(&corrupted, "");
        }
    }
    Ok(())
}

// --- FORWARD COMPATIBILITY ---

#[test]
fn unknown_tags_are_skipped() -> pagcodec::Result<()> {
    let bytes = insert_tag(&encoded()?, 900, &[1, 2, 3, 4, 5]);
    let file = Codec::decode(&bytes, "")?;

    assert_eq!(file.compositions().len(), 1);
    assert_eq!(file.tag_level(), 900);
    assert!(file.tag_level() > Codec::max_supported_tag_level());
    Ok(())
}

#[test]
fn performance_scan_skips_unknown_tags() -> pagcodec::Result<()> {
    let bytes = insert_tag(&encoded()?, 901, &[0xff; 12]);
    assert_eq!(Codec::read_performance_data(&bytes)?, None);
    Ok(())
}
