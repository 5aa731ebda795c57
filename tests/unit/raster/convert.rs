use super::*;

#[test]
fn rgba_is_premultiplied() {
    let img = PremulImage::from_straight(PixelBuffer {
        width: 2,
        height: 1,
        order: ChannelOrder::Rgba,
        data: vec![100, 50, 200, 128, 7, 8, 9, 0],
    });
    assert_eq!(
        img.rgba8_premul,
        vec![
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128,
            0,
            0,
            0,
            0,
        ]
    );
}

#[test]
fn bgra_is_reordered_before_premultiplying() {
    let img = PremulImage::from_straight(PixelBuffer {
        width: 1,
        height: 1,
        order: ChannelOrder::Bgra,
        data: vec![10, 20, 30, 255],
    });
    assert_eq!(img.rgba8_premul, vec![30, 20, 10, 255]);
    assert_eq!((img.width, img.height), (1, 1));
}
