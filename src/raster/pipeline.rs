use std::path::Path;

use crate::backend::GraphicsBackend;
use crate::foundation::error::PdfShapeResult;
use crate::raster::{PdfRasterizer, PixelBuffer, PremulImage, RasterError, ResolutionSpec};
use crate::resources::{ResourceKind, Tracked};

/// Result of one rasterization attempt.
#[derive(Debug)]
pub enum RasterOutcome {
    /// Page pixels, validated against the requested limits.
    Content(PixelBuffer),
    /// Nothing to draw. The reason has already been logged.
    NoContent(RasterError),
}

impl RasterOutcome {
    pub fn is_content(&self) -> bool {
        matches!(self, Self::Content(_))
    }
}

/// Open `path`, render the 1-based `page` at `spec` and validate the pixels.
///
/// Never fails: every rasterizer error is logged and turned into [`RasterOutcome::NoContent`].
/// The document handle is dropped before this returns.
pub fn rasterize_page(
    rasterizer: &dyn PdfRasterizer,
    path: &Path,
    page: u32,
    spec: ResolutionSpec,
) -> RasterOutcome {
    match try_rasterize(rasterizer, path, page, spec) {
        Ok(buffer) => {
            tracing::debug!(
                path = %path.display(),
                page,
                width = buffer.width,
                height = buffer.height,
                "rasterized pdf page"
            );
            RasterOutcome::Content(buffer)
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), page, error = %err, "pdf rasterization failed");
            RasterOutcome::NoContent(err)
        }
    }
}

fn try_rasterize(
    rasterizer: &dyn PdfRasterizer,
    path: &Path,
    page: u32,
    spec: ResolutionSpec,
) -> Result<PixelBuffer, RasterError> {
    let doc = rasterizer.open(path)?;
    let count = doc.page_count();
    if page == 0 || page > count {
        return Err(RasterError::PageOutOfRange { page, count });
    }
    let buffer = doc.render_page(page, spec)?;
    drop(doc);

    if buffer.width == 0 || buffer.height == 0 || buffer.data.is_empty() {
        return Err(RasterError::EmptyPixels);
    }
    if buffer.data.len() != buffer.expected_len() {
        return Err(RasterError::InvalidBuffer(format!(
            "{}x{} needs {} bytes, got {}",
            buffer.width,
            buffer.height,
            buffer.expected_len(),
            buffer.data.len()
        )));
    }
    if buffer.width > spec.max_dim || buffer.height > spec.max_dim {
        return Err(RasterError::InvalidBuffer(format!(
            "{}x{} exceeds {}px limit",
            buffer.width, buffer.height, spec.max_dim
        )));
    }
    Ok(buffer)
}

/// Convert rasterizer pixels to premultiplied RGBA and upload them as a device bitmap.
///
/// The conversion buffer is tracked as an intermediate and released before returning, on success
/// and on failure alike.
pub fn upload_page<B: GraphicsBackend>(
    backend: &mut B,
    buffer: PixelBuffer,
) -> PdfShapeResult<Tracked<B::Bitmap>> {
    let tracker = backend.tracker().clone();
    let converted = tracker.track(
        ResourceKind::Intermediate,
        PremulImage::from_straight(buffer),
    );
    let bitmap = backend.create_bitmap(&converted)?;
    drop(converted);
    Ok(tracker.track(ResourceKind::Bitmap, bitmap))
}

#[cfg(test)]
#[path = "../../tests/unit/raster/pipeline.rs"]
mod tests;
