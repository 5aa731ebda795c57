use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::animation::anim::Anim;
use crate::foundation::error::{PdfShapeError, PdfShapeResult};

/// How page pixels relate to the on-screen zoom.
///
/// - `Raster`: the page is rasterized at a fixed DPI and zoom is applied as an affine transform,
///   so zoom animation never re-rasterizes.
/// - `Vector`: the page is rasterized at `zoom * vector_size`, so it stays crisp at every zoom
///   level; any zoom change re-rasterizes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Resolution follows zoom and vector size.
    Vector,
    /// Resolution follows DPI; zoom is transform-only.
    #[default]
    Raster,
}

impl RenderMode {
    /// Whether a zoom change alone must re-rasterize the page in this mode.
    pub fn zoom_is_baked(self) -> bool {
        matches!(self, Self::Vector)
    }
}

/// Access to the zoom curve every shape layer carries.
pub trait ZoomSource {
    /// Zoom curve in percent.
    fn zoom(&self) -> &Anim;
}

/// Parameters shared by all shape layers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShapeBaseParams {
    /// Zoom in percent (100 = natural size).
    #[serde(default = "default_percent")]
    pub zoom: Anim,
}

impl Default for ShapeBaseParams {
    fn default() -> Self {
        Self {
            zoom: default_percent(),
        }
    }
}

impl ZoomSource for ShapeBaseParams {
    fn zoom(&self) -> &Anim {
        &self.zoom
    }
}

/// Parameters of one PDF page layer, as stored in the project.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PdfShapeParams {
    /// Shared shape parameters.
    #[serde(flatten)]
    pub base: ShapeBaseParams,
    /// Path of the PDF document. Empty means "no document".
    #[serde(default)]
    pub file_path: String,
    /// 1-based page number curve.
    #[serde(default = "default_page")]
    pub page: Anim,
    /// Rasterization policy.
    #[serde(default)]
    pub mode: RenderMode,
    /// Raster size in percent of the page's natural size (vector mode).
    #[serde(default = "default_percent")]
    pub vector_size: Anim,
    /// Rasterization DPI (raster mode).
    #[serde(default = "default_dpi")]
    pub raster_dpi: Anim,
}

fn default_percent() -> Anim {
    Anim::constant(100.0)
}

fn default_page() -> Anim {
    Anim::constant(1.0)
}

fn default_dpi() -> Anim {
    Anim::constant(144.0)
}

impl Default for PdfShapeParams {
    fn default() -> Self {
        Self {
            base: ShapeBaseParams::default(),
            file_path: String::new(),
            page: default_page(),
            mode: RenderMode::default(),
            vector_size: default_percent(),
            raster_dpi: default_dpi(),
        }
    }
}

impl ZoomSource for PdfShapeParams {
    fn zoom(&self) -> &Anim {
        self.base.zoom()
    }
}

impl PdfShapeParams {
    /// Parameters for `file_path` with every curve at its default.
    pub fn for_file(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            ..Self::default()
        }
    }

    /// Parse and validate layer parameters from JSON.
    pub fn from_json_str(s: &str) -> PdfShapeResult<Self> {
        let params: Self =
            serde_json::from_str(s).map_err(|e| PdfShapeError::serde(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    /// Read layer parameters from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> PdfShapeResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            PdfShapeError::validation(format!("failed to read '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&text)
    }

    /// Serialize to pretty JSON.
    pub fn to_json_string(&self) -> PdfShapeResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| PdfShapeError::serde(e.to_string()))
    }

    /// Validate every curve.
    pub fn validate(&self) -> PdfShapeResult<()> {
        let curves = [
            ("zoom", self.zoom()),
            ("page", &self.page),
            ("vector_size", &self.vector_size),
            ("raster_dpi", &self.raster_dpi),
        ];
        for (name, curve) in curves {
            curve
                .validate()
                .map_err(|e| PdfShapeError::validation(format!("{name}: {e}")))?;
        }
        Ok(())
    }
}

/// Engine-level options that are not part of the stored project.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PdfShapeOpts {
    /// Largest accepted rasterized page dimension in pixels.
    pub max_raster_dim: u32,
}

impl Default for PdfShapeOpts {
    fn default() -> Self {
        Self {
            max_raster_dim: 16_384,
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/params.rs"]
mod tests;
