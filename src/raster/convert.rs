use crate::foundation::core::Rgba8Premul;
use crate::raster::{ChannelOrder, PixelBuffer};

/// Premultiplied RGBA8 page pixels, ready for bitmap upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PremulImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major premultiplied RGBA8 bytes.
    pub rgba8_premul: Vec<u8>,
}

impl PremulImage {
    /// Convert a rasterizer buffer in place: reorder channels to RGBA, then premultiply.
    pub fn from_straight(buffer: PixelBuffer) -> Self {
        let PixelBuffer {
            width,
            height,
            order,
            mut data,
        } = buffer;
        if order == ChannelOrder::Bgra {
            for px in data.chunks_exact_mut(4) {
                px.swap(0, 2);
            }
        }
        premultiply_rgba8_in_place(&mut data);
        Self {
            width,
            height,
            rgba8_premul: data,
        }
    }
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        if px[3] == 255 {
            continue;
        }
        let premul = Rgba8Premul::from_straight([px[0], px[1], px[2], px[3]]);
        px.copy_from_slice(&premul.to_array());
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/convert.rs"]
mod tests;
