/// An encoded image referenced by image layers.
///
/// `width`, `height`, and the anchor describe the image before its transparent border was
/// stripped by the exporter. They are zero when the file does not record them.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAsset {
    /// Unique among the images of one file. Image layers reference this.
    pub id: u32,
    /// Encoded image (PNG, JPEG, WebP...). Never decoded by this crate.
    pub file_bytes: Vec<u8>,
    /// Ratio between the stored and the displayed resolution.
    pub scale_factor: f32,
    #[allow(missing_docs)]
    pub width: i32,
    #[allow(missing_docs)]
    pub height: i32,
    #[allow(missing_docs)]
    pub anchor_x: i32,
    #[allow(missing_docs)]
    pub anchor_y: i32,
}

impl ImageAsset {
    /// Creates an image at its native scale.
    pub fn new(id: u32, file_bytes: Vec<u8>) -> Self {
        Self {
            id,
            file_bytes,
            scale_factor: 1.0,
            width: 0,
            height: 0,
            anchor_x: 0,
            anchor_y: 0,
        }
    }

    pub(crate) fn has_bounds(&self) -> bool {
        self.width != 0 || self.height != 0 || self.anchor_x != 0 || self.anchor_y != 0
    }
}
