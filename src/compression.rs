//! Compression declared by the envelope.
//!
//! The envelope carries a single byte naming the algorithm applied to the body. This crate
//! only reads and writes uncompressed bodies: any other declared algorithm is recognized so it
//! can be reported precisely, then rejected.

use crate::error::{CodecError, Result};

/// The algorithm named by the envelope's compression byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionAlgorithm {
    /// ID 0. The body is stored as-is.
    Uncompressed,
    /// ID 1. Declared by the format, not implemented here.
    Lz4,
    /// Any other ID.
    Unknown(u8),
}

impl CompressionAlgorithm {
    /// Maps a wire byte to an algorithm.
    pub fn from_id(id: u8) -> Self {
        match id {
            0 => Self::Uncompressed,
            1 => Self::Lz4,
            other => Self::Unknown(other),
        }
    }

    /// Returns the wire byte for this algorithm.
    pub fn id(&self) -> u8 {
        match self {
            Self::Uncompressed => 0,
            Self::Lz4 => 1,
            Self::Unknown(id) => *id,
        }
    }

    /// Returns a short display name, as shown by the inspector.
    pub fn name(&self) -> String {
        match self {
            Self::Uncompressed => "None".to_string(),
            Self::Lz4 => "LZ4".to_string(),
            Self::Unknown(id) => format!("Unknown({id})"),
        }
    }

    /// Fails unless the body can be parsed without a decompression step.
    pub fn ensure_decodable(&self) -> Result<()> {
        match self {
            Self::Uncompressed => Ok(()),
            other => Err(CodecError::Format(format!(
                "Unsupported compression algorithm: {}",
                other.name()
            ))),
        }
    }
}
