//! MuPDF-backed rasterizer (feature `mupdf`).

use std::path::Path;

use mupdf::{Colorspace, Document, Matrix};

use crate::raster::{
    ChannelOrder, PdfDocument, PdfRasterizer, PixelBuffer, RasterError, ResolutionSpec,
};

/// Opens documents with MuPDF. Stateless; each `open` gets its own context-bound document.
#[derive(Clone, Copy, Debug, Default)]
pub struct MupdfRasterizer;

struct MupdfDocument {
    doc: Document,
    pages: u32,
}

impl PdfRasterizer for MupdfRasterizer {
    fn open(&self, path: &Path) -> Result<Box<dyn PdfDocument>, RasterError> {
        let doc = Document::open(path.to_string_lossy().as_ref())
            .map_err(|e| RasterError::Open(e.to_string()))?;
        let count = doc
            .page_count()
            .map_err(|e| RasterError::Open(e.to_string()))?;
        Ok(Box::new(MupdfDocument {
            doc,
            pages: u32::try_from(count).unwrap_or(0),
        }))
    }
}

impl PdfDocument for MupdfDocument {
    fn page_count(&self) -> u32 {
        self.pages
    }

    fn render_page(&self, page: u32, spec: ResolutionSpec) -> Result<PixelBuffer, RasterError> {
        let index = i32::try_from(page.saturating_sub(1))
            .map_err(|_| RasterError::PageOutOfRange {
                page,
                count: self.pages,
            })?;
        let page = self
            .doc
            .load_page(index)
            .map_err(|e| RasterError::Render(e.to_string()))?;

        let bounds = page
            .bounds()
            .map_err(|e| RasterError::Render(e.to_string()))?;
        let (w, h) = spec.pixel_size(
            f64::from(bounds.x1 - bounds.x0),
            f64::from(bounds.y1 - bounds.y0),
        );
        if w > spec.max_dim || h > spec.max_dim {
            return Err(RasterError::InvalidBuffer(format!(
                "{w}x{h} exceeds {}px limit",
                spec.max_dim
            )));
        }

        let scale = spec.scale as f32;
        let pixmap = page
            .to_pixmap(
                &Matrix::new_scale(scale, scale),
                &Colorspace::device_rgb(),
                false,
                false,
            )
            .map_err(|e| RasterError::Render(e.to_string()))?;

        let width = pixmap.width();
        let height = pixmap.height();
        let n = pixmap.n() as usize;
        let samples = pixmap.samples();
        if width == 0 || height == 0 || n < 3 || samples.is_empty() {
            return Err(RasterError::EmptyPixels);
        }
        let row_len = width as usize * n;
        let stride = samples.len() / height as usize;
        if stride < row_len {
            return Err(RasterError::InvalidBuffer(format!(
                "{} sample bytes for {width}x{height}x{n}",
                samples.len()
            )));
        }

        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for row in samples.chunks(stride).take(height as usize) {
            for px in row[..row_len].chunks_exact(n) {
                let a = if n >= 4 { px[3] } else { 255 };
                data.extend_from_slice(&[px[0], px[1], px[2], a]);
            }
        }

        Ok(PixelBuffer {
            width,
            height,
            order: ChannelOrder::Rgba,
            data,
        })
    }
}
