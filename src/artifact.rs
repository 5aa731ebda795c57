//! Retained drawable artifacts handed to the compositor.

use std::fmt;

use crate::backend::{BitmapLike, CommandRecorder, GraphicsBackend};
use crate::foundation::core::{Affine, Vec2};
use crate::foundation::error::PdfShapeResult;
use crate::resources::{ResourceKind, Tracked};

/// The last drawable unit produced for a layer.
///
/// The command sequence draws the bitmap centered on the origin; `transform` places it. A
/// transform-only update replaces the transform and keeps the bitmap and commands.
pub struct CachedArtifact<B: GraphicsBackend> {
    bitmap: Option<Tracked<B::Bitmap>>,
    commands: Tracked<B::CommandList>,
    transform: Affine,
    generation: u64,
}

impl<B: GraphicsBackend> CachedArtifact<B> {
    /// `true` when the artifact draws nothing.
    pub fn is_empty(&self) -> bool {
        self.bitmap.is_none()
    }

    /// Page bitmap, if any.
    pub fn bitmap(&self) -> Option<&B::Bitmap> {
        self.bitmap.as_deref()
    }

    /// Bitmap size in pixels, if any.
    pub fn bitmap_size(&self) -> Option<(u32, u32)> {
        self.bitmap().map(BitmapLike::size)
    }

    /// Closed command sequence to replay each frame.
    pub fn commands(&self) -> &B::CommandList {
        &self.commands
    }

    /// Transform applied on top of the centered commands.
    pub fn transform(&self) -> Affine {
        self.transform
    }

    /// Identifies the command sequence; changes whenever the commands are rebuilt.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn set_transform(&mut self, transform: Affine) {
        self.transform = transform;
    }
}

impl<B: GraphicsBackend> fmt::Debug for CachedArtifact<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedArtifact")
            .field("generation", &self.generation)
            .field("bitmap_size", &self.bitmap_size())
            .field("transform", &self.transform)
            .finish()
    }
}

/// Record the command sequence for `bitmap` and wrap everything into an artifact.
///
/// The sequence clears to transparent and, with a bitmap, draws it offset by half its size so its
/// center sits on the origin. Only backend allocation can fail.
pub fn build_artifact<B: GraphicsBackend>(
    backend: &mut B,
    bitmap: Option<Tracked<B::Bitmap>>,
    transform: Affine,
    generation: u64,
) -> PdfShapeResult<CachedArtifact<B>> {
    let mut rec = backend.begin_commands()?;
    rec.clear_transparent();
    if let Some(bmp) = bitmap.as_deref() {
        let (w, h) = bmp.size();
        rec.draw_bitmap(bmp, Vec2::new(-f64::from(w) / 2.0, -f64::from(h) / 2.0));
    }
    let commands = backend
        .tracker()
        .track(ResourceKind::CommandList, rec.close());

    Ok(CachedArtifact {
        bitmap,
        commands,
        transform,
        generation,
    })
}

/// The deterministic artifact shown when there is nothing to draw.
pub fn empty_artifact<B: GraphicsBackend>(
    backend: &mut B,
    generation: u64,
) -> PdfShapeResult<CachedArtifact<B>> {
    build_artifact(backend, None, Affine::IDENTITY, generation)
}
