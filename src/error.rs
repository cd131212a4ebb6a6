//! Centralized error handling for the codec.
//!
//! Every failure inside the decoder is recorded once on the shared stream context and surfaces
//! at the public entry points as a single [`CodecError`]. Nothing panics and nothing is
//! partially returned: a failed decode drops every object it allocated.
//!
//! ## Error Categories
//!
//! - **Format Errors** ([`CodecError::Format`]): bad magic, unsupported or encrypted version,
//!   compressed body, truncated envelope, lengths that do not fit the wire format.
//! - **Truncation Errors** ([`CodecError::Truncation`]): a read ran past the end of the
//!   available bytes somewhere inside the body.
//! - **Verification Errors** ([`CodecError::Verification`]): a fully linked composition or
//!   image asset failed its self-check, or the file has no composition at all.
//! - **I/O Errors** ([`CodecError::Io`]): reading a file from disk failed.
//!
//! Unresolved references are not an error category: they are cleared to `None`
//! by the resolver.
//!
//! ## Usage
//!
//! ```rust
//! use pagcodec::{Codec, CodecError};
//!
//! match Codec::decode(b"not a pag file", "") {
//!     Ok(file) => println!("{} compositions", file.compositions().len()),
//!     Err(CodecError::Format(msg)) => eprintln!("rejected: {msg}"),
//!     Err(e) => eprintln!("other error: {e}"),
//! }
//! ```

use std::fmt;
use std::io;
use std::sync::Arc;

/// A specialized `Result` type for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;

/// The master error enum covering all failure domains of the codec.
///
/// This type is `Clone` so the first failure can be captured on the stream context and handed
/// out again at the public boundary. I/O errors are wrapped in `Arc` to keep cloning cheap.
#[derive(Debug, Clone)]
pub enum CodecError {
    /// The envelope or a tag header does not conform to the format.
    ///
    /// ## Common Causes
    ///
    /// - Wrong magic bytes (not "PAG")
    /// - Reserved "encrypted" version or a version newer than this reader knows
    /// - A compression byte other than "uncompressed"
    /// - A buffer shorter than the fixed envelope
    Format(String),

    /// A declared length exceeded the bytes actually available.
    ///
    /// Raised by the byte cursor the first time a read runs past the end of its range. All
    /// later reads sharing the same context become no-ops.
    Truncation(String),

    /// A decoded object graph failed self-verification.
    Verification(String),

    /// Low-level I/O failure while loading a file from disk.
    Io(Arc<io::Error>),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Format(s) => write!(f, "Format Error: {s}"),
            Self::Truncation(s) => write!(f, "Truncation Error: {s}"),
            Self::Verification(s) => write!(f, "Verification Error: {s}"),
            Self::Io(e) => write!(f, "I/O Error: {e}"),
        }
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for CodecError {
    fn from(err: io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}
