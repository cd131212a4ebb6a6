//! Defines the fixed envelope wrapping every PAG file.
//!
//! # Layout
//! File: `[Envelope] [Body]`
//!
//! ## Envelope Anatomy
//! `[ 'P' 'A' 'G' ] [ Version: u8 ] [ Body Length: u32 LE ] [ Compression: u8 ]`
//!
//! The body is a sequence of tag records terminated by the `End` tag (see [`crate::tags`]).

use crate::compression::CompressionAlgorithm;
use crate::error::{CodecError, Result};
use crate::io::{DecodeStream, EncodeStream};

/// Magic bytes identifying the file format: "PAG".
pub const MAGIC_BYTES: [u8; 3] = *b"PAG";

/// The fixed size of the envelope.
/// Magic(3) + Version(1) + BodyLength(4) + Compression(1) = 9
pub const ENVELOPE_SIZE: usize = 9;

/// Envelope plus the 2-byte `End` tag header of an empty body.
/// Files shorter than this are rejected before any field is read.
pub const MIN_FILE_SIZE: usize = ENVELOPE_SIZE + 2;

/// The version written by the encoder.
pub const VERSION: u8 = 1;

/// The newest version this reader understands.
pub const MAX_KNOWN_VERSION: u8 = 2;

/// Reserved version marking an encrypted file. Always rejected.
pub const ENCRYPTED_VERSION: u8 = 3;

/// The fixed header preceding the tag body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope {
    /// Format version of the body.
    pub version: u8,
    /// Declared length of the body in bytes.
    pub body_length: u32,
    /// Compression applied to the body.
    pub compression: CompressionAlgorithm,
}

impl Envelope {
    /// Creates the envelope the encoder writes for a body of `body_length` bytes.
    pub fn new(body_length: u32) -> Self {
        Self {
            version: VERSION,
            body_length,
            compression: CompressionAlgorithm::Uncompressed,
        }
    }

    /// Serializes the envelope.
    pub fn write(&self, stream: &mut EncodeStream<'_>) {
        stream.write_bytes(&MAGIC_BYTES);
        stream.write_u8(self.version);
        stream.write_u32(self.body_length);
        stream.write_u8(self.compression.id());
    }

    /// Reads and validates the envelope.
    ///
    /// The compression byte is checked here so callers never see a body they cannot parse.
    pub fn read(stream: &mut DecodeStream<'_>) -> Result<Self> {
        if stream.len() < MIN_FILE_SIZE {
            return Err(CodecError::Format("Length of PAG file is too short".into()));
        }
        let mut magic = [0u8; 3];
        for byte in &mut magic {
            *byte = stream.read_u8();
        }
        if magic != MAGIC_BYTES {
            return Err(CodecError::Format("Invalid PAG file header".into()));
        }
        let version = stream.read_u8();
        if version == ENCRYPTED_VERSION {
            return Err(CodecError::Format("Encrypted PAG files are not supported".into()));
        }
        if version > MAX_KNOWN_VERSION {
            return Err(CodecError::Format(format!(
                "Unsupported version: {version}"
            )));
        }
        let body_length = stream.read_u32();
        let compression = CompressionAlgorithm::from_id(stream.read_u8());
        compression.ensure_decodable()?;
        stream.check()?;
        Ok(Self {
            version,
            body_length,
            compression,
        })
    }
}

/// Validates the envelope and returns the body as a sub-stream.
///
/// The declared body length is clamped to the bytes actually remaining, so a header that
/// over-declares never causes a read past the physical buffer.
pub fn read_body<'a>(stream: &mut DecodeStream<'a>) -> Result<DecodeStream<'a>> {
    let envelope = Envelope::read(stream)?;
    let available = u32::try_from(stream.bytes_available()).unwrap_or(u32::MAX);
    let body_length = envelope.body_length.min(available);
    let body = stream.read_bytes(body_length as usize);
    stream.check()?;
    Ok(body)
}
