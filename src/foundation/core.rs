use crate::foundation::error::{PdfShapeError, PdfShapeResult};

pub use kurbo::{Affine, Vec2};

/// Frame index relative to the start of the timeline item.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Timeline frame rate as the exact ratio `num / den` (e.g. `30000 / 1001`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    pub num: u32,
    pub den: u32,
}

impl Fps {
    /// Both parts must be non-zero.
    pub fn new(num: u32, den: u32) -> PdfShapeResult<Self> {
        if num == 0 || den == 0 {
            return Err(PdfShapeError::validation(format!(
                "frame rate {num}/{den} must have non-zero parts"
            )));
        }
        Ok(Self { num, den })
    }

    /// Frames per second as a float.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Timeline seconds covered by `frames` frames.
    pub fn frames_to_secs(self, frames: u64) -> f64 {
        frames as f64 * f64::from(self.den) / f64::from(self.num)
    }
}

/// Timing supplied by the host compositor for one update call.
///
/// `frame` is the position inside the timeline item, `duration` the item's length in frames.
/// Sampling the same position always yields the same parameter values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimelinePos {
    /// Item-local frame position.
    pub frame: FrameIndex,
    /// Item duration in frames.
    pub duration: u64,
    /// Timeline frame rate.
    pub fps: Fps,
}

impl TimelinePos {
    /// Build a timeline position.
    pub fn new(frame: u64, duration: u64, fps: Fps) -> Self {
        Self {
            frame: FrameIndex(frame),
            duration,
            fps,
        }
    }

    /// Sampling frame for curves: clamped to `[0, duration - 1]`.
    ///
    /// Zero-length items sample frame 0.
    pub fn sample_frame(self) -> FrameIndex {
        if self.duration == 0 {
            return FrameIndex(0);
        }
        FrameIndex(self.frame.0.min(self.duration - 1))
    }

    /// Item progress in `[0, 1]`.
    pub fn progress(self) -> f64 {
        if self.duration <= 1 {
            return 0.0;
        }
        (self.sample_frame().0 as f64 / (self.duration - 1) as f64).clamp(0.0, 1.0)
    }
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// One premultiplied RGBA8 pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rgba8Premul(pub [u8; 4]);

impl Rgba8Premul {
    /// Premultiply a straight-alpha pixel, rounding to nearest. Zero alpha yields transparent
    /// black.
    pub fn from_straight(px: [u8; 4]) -> Self {
        let a = u16::from(px[3]);
        let mul = |c: u8| ((u16::from(c) * a + 127) / 255) as u8;
        Self([mul(px[0]), mul(px[1]), mul(px[2]), px[3]])
    }

    pub fn to_array(self) -> [u8; 4] {
        self.0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
