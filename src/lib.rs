//! pdfshape renders one page of a PDF document as an animated layer on a timeline.
//!
//! Rasterizing a page is the most expensive thing a frame can ask for, so the layer keeps a
//! retained artifact (a page bitmap plus a command sequence that draws it centered) and only
//! re-rasterizes when something baked into the pixels changes:
//!
//! - Sample the layer's [`PdfShapeParams`] at a [`TimelinePos`] into a [`RenderRequest`]
//! - Fingerprint the request and classify it as no-op, transform-only, or full render
//! - Drive everything through [`PdfShapeSource::update`] and draw [`PdfShapeSource::output`]
//!
//! Rasterizers plug in through [`PdfRasterizer`] (MuPDF behind the `mupdf` feature) and graphics
//! devices through [`GraphicsBackend`] ([`CpuBackend`] is built in). Every device resource is
//! owned by a [`Tracked`] handle and released exactly once.
#![forbid(unsafe_code)]

pub mod animation;
pub mod artifact;
pub mod backend;
pub mod cache;
mod foundation;
pub mod params;
pub mod raster;
pub mod resources;
pub mod sample;
pub mod source;
pub mod thumbnail;

pub use crate::foundation::core::{
    Affine, Canvas, Fps, FrameIndex, Rgba8Premul, TimelinePos, Vec2,
};
pub use crate::foundation::error::{PdfShapeError, PdfShapeResult};

pub use crate::animation::anim::{
    Anim, Curve, Expr, InterpMode, Keyframe, Keyframes, LoopMode, SampleCtx,
};
pub use crate::animation::ease::Ease;
pub use crate::animation::proc::ProcScalar;
pub use crate::artifact::{CachedArtifact, build_artifact, empty_artifact};
pub use crate::backend::cpu::{
    CpuBackend, CpuBackendOpts, CpuBitmap, CpuCommand, CpuCommandList, CpuRecorder, center_on,
    render_artifact_to_frame,
};
pub use crate::backend::{BitmapLike, CommandRecorder, FrameRGBA, GraphicsBackend};
pub use crate::cache::fingerprint::{
    FileStamp, InputIssue, PathKey, RenderFingerprint, UpdateKind, classify, validate_input,
};
pub use crate::params::{PdfShapeOpts, PdfShapeParams, RenderMode, ShapeBaseParams, ZoomSource};
#[cfg(feature = "mupdf")]
pub use crate::raster::mupdf::MupdfRasterizer;
pub use crate::raster::{
    ChannelOrder, PdfDocument, PdfRasterizer, PixelBuffer, PremulImage, RasterError,
    RasterOutcome, ResolutionSpec, rasterize_page, upload_page,
};
pub use crate::resources::{ResourceKind, ResourceStats, ResourceTracker, Tracked};
pub use crate::sample::{RenderRequest, sample_request};
pub use crate::source::{EmptyReason, PdfShapeSource, SourceState, SourceStats, UpdateOutcome};
pub use crate::thumbnail::{
    PdfFileEntry, Thumbnail, ThumbnailLoader, ThumbnailTicket, list_sibling_pdfs,
};
