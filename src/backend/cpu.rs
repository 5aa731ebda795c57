use std::sync::Arc;

use crate::artifact::CachedArtifact;
use crate::backend::{BitmapLike, CommandRecorder, FrameRGBA, GraphicsBackend};
use crate::foundation::core::{Affine, Canvas, Vec2};
use crate::foundation::error::{PdfShapeError, PdfShapeResult};
use crate::raster::PremulImage;
use crate::resources::{ResourceKind, ResourceTracker, Tracked};

/// Limits enforced by [`CpuBackend`] when allocating bitmaps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CpuBackendOpts {
    /// Largest bitmap width or height in pixels. Capped at `u16::MAX` by the pixmap format.
    pub max_bitmap_dim: u32,
    /// Refuse new bitmaps while this many are alive. `None` means unbounded.
    pub max_live_bitmaps: Option<u64>,
}

impl Default for CpuBackendOpts {
    fn default() -> Self {
        Self {
            max_bitmap_dim: 16_384,
            max_live_bitmaps: None,
        }
    }
}

#[derive(Debug)]
struct ImagingFactory {
    opts: CpuBackendOpts,
}

/// Software backend built on `vello_cpu` pixmaps.
#[derive(Debug)]
pub struct CpuBackend {
    tracker: ResourceTracker,
    factory: Tracked<ImagingFactory>,
}

impl CpuBackend {
    /// Backend with its own fresh tracker.
    pub fn new(opts: CpuBackendOpts) -> Self {
        Self::with_tracker(ResourceTracker::new(), opts)
    }

    /// Backend reporting into an existing tracker.
    pub fn with_tracker(tracker: ResourceTracker, opts: CpuBackendOpts) -> Self {
        let factory = tracker.track(ResourceKind::Factory, ImagingFactory { opts });
        Self { tracker, factory }
    }

    pub fn opts(&self) -> CpuBackendOpts {
        self.factory.opts
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new(CpuBackendOpts::default())
    }
}

/// A page bitmap held as a shared `vello_cpu` image paint.
#[derive(Clone, Debug)]
pub struct CpuBitmap {
    image: vello_cpu::Image,
    pixmap: Arc<vello_cpu::Pixmap>,
    width: u32,
    height: u32,
}

impl CpuBitmap {
    /// Premultiplied RGBA8 bytes of the bitmap.
    pub fn rgba8_premul(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }
}

impl BitmapLike for CpuBitmap {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// One recorded drawing command.
#[derive(Clone, Debug)]
pub enum CpuCommand {
    /// Clear the target to transparent.
    Clear,
    /// Draw a bitmap with its top-left corner at `offset`.
    DrawBitmap {
        /// Bitmap to draw.
        bitmap: CpuBitmap,
        /// Top-left corner in artifact space.
        offset: Vec2,
    },
}

/// Closed command sequence. Cloning shares the commands.
#[derive(Clone, Debug)]
pub struct CpuCommandList {
    commands: Arc<[CpuCommand]>,
}

impl CpuCommandList {
    pub fn commands(&self) -> &[CpuCommand] {
        &self.commands
    }
}

/// Recorder for [`CpuCommandList`].
#[derive(Debug, Default)]
pub struct CpuRecorder {
    commands: Vec<CpuCommand>,
}

impl CommandRecorder for CpuRecorder {
    type Bitmap = CpuBitmap;
    type CommandList = CpuCommandList;

    fn clear_transparent(&mut self) {
        self.commands.push(CpuCommand::Clear);
    }

    fn draw_bitmap(&mut self, bitmap: &CpuBitmap, offset: Vec2) {
        self.commands.push(CpuCommand::DrawBitmap {
            bitmap: bitmap.clone(),
            offset,
        });
    }

    fn close(self) -> CpuCommandList {
        CpuCommandList {
            commands: self.commands.into(),
        }
    }
}

impl GraphicsBackend for CpuBackend {
    type Bitmap = CpuBitmap;
    type CommandList = CpuCommandList;
    type Recorder = CpuRecorder;

    fn tracker(&self) -> &ResourceTracker {
        &self.tracker
    }

    fn create_bitmap(&mut self, image: &PremulImage) -> PdfShapeResult<CpuBitmap> {
        let opts = self.opts();
        if let Some(max_live) = opts.max_live_bitmaps {
            let live = self.tracker.stats().live(ResourceKind::Bitmap);
            if live >= max_live {
                return Err(PdfShapeError::resource_exhausted(format!(
                    "bitmap budget exhausted ({live} live, limit {max_live})"
                )));
            }
        }
        let max_dim = opts.max_bitmap_dim.min(u32::from(u16::MAX));
        if image.width == 0 || image.height == 0 {
            return Err(PdfShapeError::validation("bitmap dimensions must be non-zero"));
        }
        if image.width > max_dim || image.height > max_dim {
            return Err(PdfShapeError::resource_exhausted(format!(
                "bitmap {}x{} exceeds {max_dim}px limit",
                image.width, image.height
            )));
        }

        let pixmap = Arc::new(premul_bytes_to_pixmap(
            &image.rgba8_premul,
            image.width,
            image.height,
        )?);
        Ok(CpuBitmap {
            image: vello_cpu::Image {
                image: vello_cpu::ImageSource::Pixmap(Arc::clone(&pixmap)),
                sampler: vello_cpu::peniko::ImageSampler::default(),
            },
            pixmap,
            width: image.width,
            height: image.height,
        })
    }

    fn begin_commands(&mut self) -> PdfShapeResult<CpuRecorder> {
        Ok(CpuRecorder::default())
    }
}

/// Placement that puts the artifact origin at the canvas center.
pub fn center_on(canvas: Canvas) -> Affine {
    Affine::translate(Vec2::new(
        f64::from(canvas.width) / 2.0,
        f64::from(canvas.height) / 2.0,
    ))
}

/// Replay an artifact's commands into a fresh transparent frame.
///
/// Bitmaps are drawn with `placement * artifact.transform() * translate(offset)`.
pub fn render_artifact_to_frame(
    artifact: &CachedArtifact<CpuBackend>,
    canvas: Canvas,
    placement: Affine,
) -> PdfShapeResult<FrameRGBA> {
    let w: u16 = canvas
        .width
        .try_into()
        .map_err(|_| PdfShapeError::validation("canvas width exceeds u16"))?;
    let h: u16 = canvas
        .height
        .try_into()
        .map_err(|_| PdfShapeError::validation("canvas height exceeds u16"))?;
    if w == 0 || h == 0 {
        return Err(PdfShapeError::validation("canvas dimensions must be non-zero"));
    }

    let mut pixmap = vello_cpu::Pixmap::new(w, h);
    let mut ctx = vello_cpu::RenderContext::new(w, h);
    let base = placement * artifact.transform();

    for cmd in artifact.commands().commands() {
        match cmd {
            CpuCommand::Clear => ctx.reset(),
            CpuCommand::DrawBitmap { bitmap, offset } => {
                ctx.set_transform(affine_to_cpu(base * Affine::translate(*offset)));
                ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
                ctx.set_paint(bitmap.image.clone());
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                    0.0,
                    0.0,
                    f64::from(bitmap.width),
                    f64::from(bitmap.height),
                ));
            }
        }
    }
    ctx.flush();
    ctx.render_to_pixmap(&mut pixmap);

    Ok(FrameRGBA {
        width: canvas.width,
        height: canvas.height,
        data: pixmap.data_as_u8_slice().to_vec(),
    })
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> PdfShapeResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| PdfShapeError::resource_exhausted("bitmap width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| PdfShapeError::resource_exhausted("bitmap height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(PdfShapeError::validation("bitmap byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/backend/cpu.rs"]
mod tests;
