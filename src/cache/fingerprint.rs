use std::path::Path;
use std::time::SystemTime;

use crate::params::RenderMode;
use crate::sample::RenderRequest;

const CASE_INSENSITIVE_FS: bool = cfg!(any(windows, target_os = "macos"));

/// File path compared the way the host filesystem compares names.
///
/// Windows folds `\` to `/` and case; macOS folds case; other hosts compare bytes exactly.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PathKey(String);

impl PathKey {
    /// Build the comparison key for `path`.
    pub fn new(path: &str) -> Self {
        let s = if cfg!(windows) {
            path.replace('\\', "/")
        } else {
            path.to_owned()
        };
        if CASE_INSENSITIVE_FS {
            Self(s.to_lowercase())
        } else {
            Self(s)
        }
    }

    /// The folded key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Size and modification time of the document on disk.
///
/// A new stamp means the file was rewritten and cached pixels may be stale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FileStamp {
    /// File length in bytes.
    pub len: u64,
    /// Last modification time, when the platform reports one.
    pub modified: Option<SystemTime>,
}

impl FileStamp {
    /// Stat `path`. Directories and missing files yield `None`.
    pub fn of(path: &Path) -> Option<Self> {
        let meta = std::fs::metadata(path).ok()?;
        if !meta.is_file() {
            return None;
        }
        Some(Self {
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

/// Why a request cannot produce content before any rasterization is attempted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputIssue {
    /// The file path is empty.
    NoFile,
    /// The path does not name an existing regular file.
    FileMissing,
    /// The page number is below 1.
    InvalidPage,
}

/// Check the file and page of `request`, returning the file's stamp when usable.
pub fn validate_input(request: &RenderRequest) -> Result<FileStamp, InputIssue> {
    if request.file_path.is_empty() {
        return Err(InputIssue::NoFile);
    }
    if request.page < 1 {
        return Err(InputIssue::InvalidPage);
    }
    FileStamp::of(Path::new(&request.file_path)).ok_or(InputIssue::FileMissing)
}

/// Comparable snapshot of everything that decides what the layer shows.
///
/// Floats are compared by bit pattern after the sampler's clamping, which gives a total
/// equality.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RenderFingerprint {
    path: PathKey,
    stamp: FileStamp,
    page: u32,
    mode: RenderMode,
    raster_scale_bits: u64,
    zoom_bits: u64,
}

impl RenderFingerprint {
    /// Fingerprint a normalized request whose file has `stamp`.
    pub fn new(request: &RenderRequest, stamp: FileStamp) -> Self {
        Self {
            path: PathKey::new(&request.file_path),
            stamp,
            page: request.page,
            mode: request.mode,
            raster_scale_bits: request.raster_scale().to_bits(),
            zoom_bits: request.zoom.to_bits(),
        }
    }

    /// Page this fingerprint renders.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Rasterization scale (points to pixels).
    pub fn raster_scale(&self) -> f64 {
        f64::from_bits(self.raster_scale_bits)
    }

    /// Fields baked into the rasterized pixels.
    fn same_pixels(&self, other: &Self) -> bool {
        self.path == other.path
            && self.stamp == other.stamp
            && self.page == other.page
            && self.mode == other.mode
            && self.raster_scale_bits == other.raster_scale_bits
    }
}

/// Work one update call must do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateKind {
    /// Nothing changed; reuse the artifact as-is.
    NoOp,
    /// Pixels are still valid; only the transform changes.
    TransformOnly,
    /// Pixels are stale or missing; rasterize again.
    FullRender,
}

/// Classify `next` against the fingerprint of the artifact currently shown.
///
/// Zoom is part of the raster scale in vector mode, so a zoom change there is a full render;
/// in raster mode it only moves the transform.
pub fn classify(prev: Option<&RenderFingerprint>, next: &RenderFingerprint) -> UpdateKind {
    let Some(prev) = prev else {
        return UpdateKind::FullRender;
    };
    if !prev.same_pixels(next) {
        return UpdateKind::FullRender;
    }
    if prev.zoom_bits != next.zoom_bits {
        return UpdateKind::TransformOnly;
    }
    UpdateKind::NoOp
}

#[cfg(test)]
#[path = "../../tests/unit/cache/fingerprint.rs"]
mod tests;
