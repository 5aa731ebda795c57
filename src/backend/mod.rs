//! Imaging/graphics backend boundary.
//!
//! The cache never touches pixels after rasterization: it hands premultiplied images to a
//! [`GraphicsBackend`] and records draw commands through a [`CommandRecorder`]. All calls happen on
//! the thread that owns the backend.

use crate::foundation::core::Vec2;
use crate::foundation::error::PdfShapeResult;
use crate::raster::PremulImage;
use crate::resources::ResourceTracker;

pub mod cpu;

/// A device bitmap with known pixel size.
pub trait BitmapLike {
    /// `(width, height)` in pixels.
    fn size(&self) -> (u32, u32);
}

/// Builder for one retained command sequence.
pub trait CommandRecorder {
    /// Bitmap type this recorder can draw.
    type Bitmap;
    /// Closed, replayable command sequence.
    type CommandList;

    /// Clear the target to transparent.
    fn clear_transparent(&mut self);

    /// Draw `bitmap` with its top-left corner at `offset`.
    fn draw_bitmap(&mut self, bitmap: &Self::Bitmap, offset: Vec2);

    /// Finish recording. The result is immutable.
    fn close(self) -> Self::CommandList;
}

/// Device-side resource factory.
///
/// Implementations report allocation refusals as
/// [`PdfShapeError::ResourceExhausted`](crate::PdfShapeError::ResourceExhausted).
pub trait GraphicsBackend {
    /// Device bitmap.
    type Bitmap: BitmapLike;
    /// Closed command sequence.
    type CommandList;
    /// Recorder producing [`Self::CommandList`].
    type Recorder: CommandRecorder<Bitmap = Self::Bitmap, CommandList = Self::CommandList>;

    /// Counters for every resource created through this backend.
    fn tracker(&self) -> &ResourceTracker;

    /// Upload premultiplied pixels into a device bitmap.
    fn create_bitmap(&mut self, image: &PremulImage) -> PdfShapeResult<Self::Bitmap>;

    /// Start recording a command sequence.
    fn begin_commands(&mut self) -> PdfShapeResult<Self::Recorder>;
}

/// A composited frame as premultiplied RGBA8 pixels.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major, premultiplied.
    pub data: Vec<u8>,
}

impl FrameRGBA {
    /// Premultiplied RGBA at `(x, y)`, if inside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Convert to straight alpha for image encoders.
    pub fn into_straight_rgba(mut self) -> Vec<u8> {
        for px in self.data.chunks_exact_mut(4) {
            let a = u16::from(px[3]);
            if a == 0 || a == 255 {
                continue;
            }
            for c in &mut px[..3] {
                *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
            }
        }
        self.data
    }
}
