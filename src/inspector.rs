//! Tools for inspecting the physical tag structure of a file.
//! Useful for debugging exporters and forward-compatibility issues.

use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::format::{Envelope, read_body};
use crate::io::{DecodeStream, StreamContext};
use crate::tags::{TagCode, TagHeader, read_tags};

/// A structural report of a file.
#[derive(Debug, Serialize)]
pub struct DebugReport {
    /// Total size of the input.
    pub file_size: u64,
    /// Format version from the envelope.
    pub version: u8,
    /// Body length declared by the envelope, before clamping.
    pub body_length: u32,
    /// Compression algorithm named by the envelope.
    pub compression: String,
    /// Highest tag code found.
    pub tag_level: u16,
    /// The top-level tags, in file order.
    pub tags: Vec<TagInfo>,
}

/// One tag in the tree.
#[derive(Debug, Serialize)]
pub struct TagInfo {
    /// Raw tag code.
    pub code: u16,
    /// Tag name, or `Unknown(code)`.
    pub name: String,
    /// Body length in bytes.
    pub length: u32,
    /// Tags nested in composition and layer blocks.
    pub children: Vec<TagInfo>,
}

/// The file inspector.
#[derive(Debug)]
pub struct Inspector;

impl Inspector {
    /// Reads the file at `path` and returns its structural report.
    pub fn inspect<P: AsRef<Path>>(path: P) -> Result<DebugReport> {
        let bytes = std::fs::read(path)?;
        Self::inspect_bytes(&bytes)
    }

    /// Analyzes an encoded file without building its scene graph.
    pub fn inspect_bytes(bytes: &[u8]) -> Result<DebugReport> {
        let context = StreamContext::new();
        let envelope = Envelope::read(&mut DecodeStream::new(&context, bytes))?;
        let mut body = read_body(&mut DecodeStream::new(&context, bytes))?;
        let tags = Self::inspect_sequence(&mut body);
        context.check()?;

        Ok(DebugReport {
            file_size: bytes.len() as u64,
            version: envelope.version,
            body_length: envelope.body_length,
            compression: envelope.compression.name(),
            tag_level: context.tag_level(),
            tags,
        })
    }

    fn inspect_sequence(stream: &mut DecodeStream<'_>) -> Vec<TagInfo> {
        let mut tags = Vec::new();
        read_tags(stream, |header, body| tags.push(Self::inspect_tag(header, body)));
        tags
    }

    fn inspect_tag(header: TagHeader, body: &mut DecodeStream<'_>) -> TagInfo {
        let children = match header.tag() {
            Some(
                TagCode::VectorCompositionBlock
                | TagCode::BitmapCompositionBlock
                | TagCode::VideoCompositionBlock,
            ) => {
                body.read_encoded_u32();
                Self::inspect_sequence(body)
            }
            Some(TagCode::LayerBlock) => {
                body.read_u8();
                body.read_encoded_u32();
                Self::inspect_sequence(body)
            }
            _ => Vec::new(),
        };
        TagInfo {
            code: header.code,
            name: header
                .tag()
                .map(|tag| tag.name().to_string())
                .unwrap_or_else(|| format!("Unknown({})", header.code)),
            length: header.length,
            children,
        }
    }
}

impl fmt::Display for DebugReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== PAG INSPECTOR REPORT ===")?;
        writeln!(f, "File Size:      {}", self.file_size)?;
        writeln!(f, "Version:        {}", self.version)?;
        writeln!(f, "Body Length:    {}", self.body_length)?;
        writeln!(f, "Compression:    {}", self.compression)?;
        writeln!(f, "Tag Level:      {}", self.tag_level)?;
        writeln!(f, "\n[TAG LAYOUT]")?;
        for (i, tag) in self.tags.iter().enumerate() {
            tag.fmt_recursive(f, "", i == self.tags.len() - 1)?;
        }
        Ok(())
    }
}

impl TagInfo {
    fn fmt_recursive(&self, f: &mut fmt::Formatter<'_>, prefix: &str, is_last: bool) -> fmt::Result {
        let connector = if is_last { "└── " } else { "├── " };
        let child_prefix = if is_last { "    " } else { "│   " };
        writeln!(
            f,
            "{}{}[{}] Code: {} | Size: {}b",
            prefix, connector, self.name, self.code, self.length
        )?;
        for (i, child) in self.children.iter().enumerate() {
            let is_last_child = i == self.children.len() - 1;
            child.fmt_recursive(f, &format!("{prefix}{child_prefix}"), is_last_child)?;
        }
        Ok(())
    }
}
