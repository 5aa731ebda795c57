//! Parameter sampling: turns animated layer parameters into one concrete render request.

use crate::animation::anim::Curve;
use crate::foundation::core::{Affine, TimelinePos};
use crate::params::{PdfShapeParams, RenderMode, ZoomSource};

/// Zoom factor bounds (the zoom slider spans 0-800 %; the floor keeps transforms invertible).
pub const ZOOM_RANGE: (f64, f64) = (0.01, 8.0);
/// Bounds of the combined `zoom * vector_size` raster scale in vector mode.
pub const VECTOR_SCALE_RANGE: (f64, f64) = (0.1, 10.0);
/// DPI bounds in raster mode.
pub const DPI_RANGE: (f64, f64) = (72.0, 9600.0);
/// PDF user-space units per inch.
pub const POINTS_PER_INCH: f64 = 72.0;

/// Concrete parameters for one frame, produced by [`sample_request`].
#[derive(Clone, Debug, PartialEq)]
pub struct RenderRequest {
    /// PDF path as configured.
    pub file_path: String,
    /// 1-based page number.
    pub page: u32,
    /// Rasterization policy.
    pub mode: RenderMode,
    /// Zoom factor (1.0 = 100 %).
    pub zoom: f64,
    /// Vector-size percentage (vector mode) or DPI (raster mode).
    pub mode_param: f64,
}

impl RenderRequest {
    /// Re-apply every clamp the sampler applies. Idempotent.
    ///
    /// Requests built by hand go through this before fingerprinting, so a pathological value can
    /// never reach the rasterizer.
    pub fn normalized(mut self) -> Self {
        self.zoom = clamp_finite(self.zoom, ZOOM_RANGE, 1.0);
        self.mode_param = match self.mode {
            RenderMode::Vector => clamp_finite(self.mode_param, (0.0, f64::MAX), 100.0),
            RenderMode::Raster => clamp_finite(self.mode_param.trunc(), DPI_RANGE, 144.0),
        };
        self
    }

    /// Scale from PDF points to bitmap pixels.
    pub fn raster_scale(&self) -> f64 {
        match self.mode {
            RenderMode::Vector => clamp_finite(
                self.zoom * self.mode_param / 100.0,
                VECTOR_SCALE_RANGE,
                1.0,
            ),
            RenderMode::Raster => {
                clamp_finite(self.mode_param.trunc(), DPI_RANGE, 144.0) / POINTS_PER_INCH
            }
        }
    }

    /// Transform applied on top of the centered bitmap.
    ///
    /// Vector mode bakes zoom into the pixels, raster mode scales the bitmap.
    pub fn display_transform(&self) -> Affine {
        if self.mode.zoom_is_baked() {
            Affine::IDENTITY
        } else {
            Affine::scale(self.zoom)
        }
    }
}

fn clamp_finite(v: f64, (lo, hi): (f64, f64), fallback: f64) -> f64 {
    if v.is_finite() { v.clamp(lo, hi) } else { fallback }
}

/// Sample every animated parameter at `pos`.
///
/// Page numbers below 1 clamp to 1; zoom, vector-size scale and DPI clamp to their ranges.
pub fn sample_request(params: &PdfShapeParams, pos: TimelinePos) -> RenderRequest {
    let page = params.page.value_at(pos).trunc().clamp(1.0, f64::from(u32::MAX)) as u32;
    let zoom = params.zoom().value_at(pos) / 100.0;
    let mode_param = match params.mode {
        RenderMode::Vector => params.vector_size.value_at(pos),
        RenderMode::Raster => params.raster_dpi.value_at(pos),
    };

    RenderRequest {
        file_path: params.file_path.clone(),
        page,
        mode: params.mode,
        zoom,
        mode_param,
    }
    .normalized()
}

#[cfg(test)]
#[path = "../tests/unit/sample.rs"]
mod tests;
