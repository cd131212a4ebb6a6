use std::fs;
use std::path::Path;

use memmap2::Mmap;

use crate::error::Result;
use crate::graph::{Composition, File, ImageAsset, PerformanceData, verify_and_make};
use crate::resolver::link_layers;
use crate::tags::MAX_SUPPORTED_TAG_LEVEL;
use crate::{reader, writer};

/// The main entry point for decoding and encoding files.
#[derive(Debug)]
pub struct Codec;

impl Codec {
    /// Decodes a complete file from memory.
    ///
    /// # Arguments
    /// * `bytes`: The whole file, envelope included.
    /// * `path`: Where the bytes came from. Stored on the [`File`] for diagnostics only.
    pub fn decode(bytes: &[u8], path: &str) -> Result<File> {
        reader::decode(bytes, path)
    }

    /// Memory-maps the file at `path` and decodes it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<File> {
        let path = path.as_ref();
        let file = fs::File::open(path)?;

        // Safety: the map is only read while this call runs. A concurrent writer truncating
        // the file is outside the contract of this function.
        #[allow(unsafe_code)]
        let mmap = unsafe { Mmap::map(&file)? };

        reader::decode(&mmap, &path.to_string_lossy())
    }

    /// Encodes `file` with no `Performance` tag.
    pub fn encode(file: &File) -> Result<Vec<u8>> {
        writer::encode(file, None)
    }

    /// Encodes `file` and appends `performance` as a trailing tag.
    pub fn encode_with_performance(file: &File, performance: &PerformanceData) -> Result<Vec<u8>> {
        writer::encode(file, Some(performance))
    }

    /// Reads only the `Performance` tag of an encoded file.
    pub fn read_performance_data(bytes: &[u8]) -> Result<Option<PerformanceData>> {
        reader::read_performance_data(bytes)
    }

    /// Builds a [`File`] from compositions and images, verifying each one.
    ///
    /// Every layer's `containing_composition` is set to the composition it sits in. The last
    /// composition becomes the main one.
    pub fn make_file(mut compositions: Vec<Composition>, images: Vec<ImageAsset>) -> Result<File> {
        link_layers(&mut compositions);
        verify_and_make(compositions, images)
    }

    /// The highest tag code this version of the codec understands.
    ///
    /// A decoded file whose [`File::tag_level`] exceeds this was written by a newer encoder
    /// and may carry data this reader skipped.
    pub fn max_supported_tag_level() -> u16 {
        MAX_SUPPORTED_TAG_LEVEL
    }

    /// Starts a configurable decode or encode.
    pub fn builder() -> CodecBuilder {
        CodecBuilder::default()
    }
}

/// Options for a single decode or encode call.
///
/// ```rust
/// use pagcodec::{Codec, PerformanceData};
///
/// let bytes = Codec::builder()
///     .performance(PerformanceData { rendering_time: 1200, ..Default::default() })
///     .encode(&some_file()?)?;
/// let file = Codec::builder().path("memory://demo").decode(&bytes)?;
/// assert_eq!(file.path(), "memory://demo");
/// # fn some_file() -> pagcodec::Result<pagcodec::File> {
/// #     use pagcodec::graph::Composition;
/// #     Codec::make_file(vec![Composition::vector(1, 8, 8, 1, 24.0, Vec::new())], Vec::new())
/// # }
/// # Ok::<(), pagcodec::CodecError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct CodecBuilder {
    path: String,
    performance: Option<PerformanceData>,
}

impl CodecBuilder {
    /// Sets the diagnostic path recorded on decoded files.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Sets the performance data appended by [`encode`](Self::encode).
    pub fn performance(mut self, performance: PerformanceData) -> Self {
        self.performance = Some(performance);
        self
    }

    /// Decodes `bytes` with the configured path.
    pub fn decode(&self, bytes: &[u8]) -> Result<File> {
        reader::decode(bytes, &self.path)
    }

    /// Encodes `file` with the configured performance data.
    pub fn encode(&self, file: &File) -> Result<Vec<u8>> {
        writer::encode(file, self.performance.as_ref())
    }
}
