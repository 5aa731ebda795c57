//! PDF rasterization boundary and the pipeline that turns pages into device bitmaps.

use std::path::Path;

pub(crate) mod convert;
#[cfg(feature = "mupdf")]
pub mod mupdf;
pub(crate) mod pipeline;

/// Byte order of the four channels in a [`PixelBuffer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelOrder {
    /// `r, g, b, a`.
    Rgba,
    /// `b, g, r, a`.
    Bgra,
}

/// Straight-alpha pixels returned by a rasterizer, 4 bytes per pixel, tightly packed rows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Channel order of `data`.
    pub order: ChannelOrder,
    /// Pixel bytes, `width * height * 4` long.
    pub data: Vec<u8>,
}

impl PixelBuffer {
    /// Byte length implied by the dimensions.
    pub fn expected_len(&self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4)
    }
}

/// Requested output resolution for one page.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolutionSpec {
    /// PDF points to pixels.
    pub scale: f64,
    /// Largest acceptable width or height in pixels.
    pub max_dim: u32,
}

impl ResolutionSpec {
    /// Pixel size of a `width_pt x height_pt` page at this scale (at least 1x1).
    pub fn pixel_size(&self, width_pt: f64, height_pt: f64) -> (u32, u32) {
        let w = (width_pt * self.scale).ceil().max(1.0);
        let h = (height_pt * self.scale).ceil().max(1.0);
        (w.min(f64::from(u32::MAX)) as u32, h.min(f64::from(u32::MAX)) as u32)
    }
}

/// Rasterization failures. These never escape the pipeline; they become an empty layer.
#[derive(thiserror::Error, Debug)]
pub enum RasterError {
    /// The document could not be opened or parsed.
    #[error("failed to open document: {0}")]
    Open(String),
    /// The requested 1-based page does not exist.
    #[error("page {page} out of range (document has {count} pages)")]
    PageOutOfRange {
        /// Requested page.
        page: u32,
        /// Pages in the document.
        count: u32,
    },
    /// The rasterizer failed while rendering.
    #[error("failed to render page: {0}")]
    Render(String),
    /// The rasterizer returned no pixels.
    #[error("rasterizer returned an empty pixel buffer")]
    EmptyPixels,
    /// Returned pixels do not match their declared size or exceed the size limit.
    #[error("invalid pixel buffer: {0}")]
    InvalidBuffer(String),
}

/// Opens PDF documents. Implementations must be usable from worker threads.
pub trait PdfRasterizer: Send + Sync {
    /// Open the document at `path`.
    ///
    /// The returned handle is dropped at the end of the rasterization call that opened it.
    fn open(&self, path: &Path) -> Result<Box<dyn PdfDocument>, RasterError>;
}

/// An open PDF document.
pub trait PdfDocument {
    /// Number of pages.
    fn page_count(&self) -> u32;

    /// Render the 1-based `page` at `spec`.
    fn render_page(&self, page: u32, spec: ResolutionSpec) -> Result<PixelBuffer, RasterError>;
}

pub use convert::PremulImage;
pub use pipeline::{RasterOutcome, rasterize_page, upload_page};
