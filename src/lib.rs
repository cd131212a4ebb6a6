//! # pagcodec
//!
//! A binary codec for PAG, a versioned, tag-based animation file format. It decodes a byte
//! stream into an in-memory scene graph and encodes that graph back to bytes.
//!
//! ## Overview
//!
//! A PAG file is a short fixed envelope followed by a sequence of tags. Every tag is a
//! `(code, length, body)` record, so a reader can skip any tag it does not understand by its
//! length alone. This is how the format stays forward compatible: new exporters add new tag
//! codes, and old readers walk straight past them.
//!
//! ### Key Features
//!
//! *   **Self-Describing Wire Format:** A closed set of tag codes ([`tags::TagCode`]), each
//!     versioned by appending new codes rather than changing old ones.
//! *   **ID-Based Graph Reconstruction:** Layers reference parents, masks, matte layers, and
//!     nested compositions by integer ID on the wire. Decoding links them into index handles.
//! *   **Corruption Safety:** A read past the end of any range fails the whole decode. Nothing
//!     panics and no partially built file is ever returned.
//! *   **Partial Decode:** [`Codec::read_performance_data`] extracts one trailing tag without
//!     decoding anything else.
//!
//! ## Architecture
//!
//! ### File Format
//!
//! ```text
//! [ 'P' 'A' 'G' ] [ version: u8 ] [ body length: u32 LE ] [ compression: u8 ] [ body ]
//! ```
//!
//! The body is a tag sequence ending with the `End` tag. Composition and layer blocks contain
//! nested tag sequences of their own, each also ending with `End`.
//!
//! ### Decode Pipeline
//!
//! 1. [`format`] validates the envelope and clamps the body to the bytes actually present.
//! 2. [`tags`] walks the body, decoding compositions, layers, and images into flat lists.
//!    References are recorded as raw IDs in a side table.
//! 3. [`resolver`] turns the raw IDs into handles. An ID matching nothing becomes `None`.
//! 4. [`graph::verify_and_make`] verifies every composition and image, then builds the
//!    immutable [`File`].
//!
//! All reads share one [`io::StreamContext`]: the first failure is recorded there, and every
//! later read becomes a no-op. Errors surface once, at the public entry points.
//!
//! ### Graph Model
//!
//! The [`File`] owns compositions and images; compositions own layers; layers own masks and
//! effects. Every other link ([`graph::LayerRef`], [`graph::MaskRef`],
//! [`graph::CompositionRef`]) is an index into one of those containers, so the graph has no
//! ownership cycles.
//!
//! ## Usage Patterns
//!
//! ```rust
//! use pagcodec::graph::{Composition, Layer, LayerContent, Color};
//! use pagcodec::Codec;
//!
//! let red = Color::new(255, 0, 0);
//! let mut solid = Layer::new(1, LayerContent::Solid { color: red, width: 64, height: 64 });
//! solid.duration = 30;
//! let composition = Composition::vector(1, 64, 64, 30, 30.0, vec![solid]);
//!
//! let bytes = Codec::encode(&Codec::make_file(vec![composition], Vec::new())?)?;
//! let file = Codec::decode(&bytes, "red.pag")?;
//! assert_eq!(file.main_composition().layers().len(), 1);
//! # Ok::<(), pagcodec::CodecError>(())
//! ```
//!
//! ### Safety and Error Handling
//!
//! * **Encapsulated Unsafe:** the only `unsafe` block memory-maps a file in [`Codec::load`].
//! * **No Panics:** No `unwrap()` or `panic!()` calls in the library (enforced by clippy lints).
//! * **Comprehensive Errors:** All failures correspond to a [`CodecError`].

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]

// --- PUBLIC API MODULES ---
pub mod api;
pub mod compression;
pub mod error;
pub mod format;
pub mod graph;
pub mod inspector;
pub mod reader;
pub mod tags;
pub mod writer;

// --- INTERNAL IMPLEMENTATION MODULES (Hidden from Docs) ---
#[doc(hidden)]
pub mod io;
#[doc(hidden)]
pub mod resolver;

// --- RE-EXPORTS ---

pub use api::{Codec, CodecBuilder};
pub use error::{CodecError, Result};
pub use graph::{File, PerformanceData};
pub use inspector::{DebugReport, Inspector};
