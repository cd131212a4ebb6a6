//! The Write-Side Engine.
//!
//! Encodes the body into a scratch buffer first so the envelope can declare its exact length.

use crate::error::{CodecError, Result};
use crate::format::{ENVELOPE_SIZE, Envelope};
use crate::graph::{File, PerformanceData};
use crate::io::{EncodeStream, StreamContext};
use crate::tags::file::write_file_tags;

/// Encodes `file`, optionally appending a `Performance` tag.
pub fn encode(file: &File, performance: Option<&PerformanceData>) -> Result<Vec<u8>> {
    let context = StreamContext::new();
    let mut body = EncodeStream::new(&context);
    write_file_tags(&mut body, file, performance);
    context.check()?;

    let body_length = u32::try_from(body.len()).map_err(|_| {
        CodecError::Format(format!("Body of {} bytes exceeds the format limit", body.len()))
    })?;
    let mut out = EncodeStream::new(&context);
    Envelope::new(body_length).write(&mut out);
    out.write_bytes(body.as_bytes());
    log::debug!(
        "encoded {} compositions into {} bytes",
        file.compositions().len(),
        ENVELOPE_SIZE + body.len()
    );
    Ok(out.into_bytes())
}
