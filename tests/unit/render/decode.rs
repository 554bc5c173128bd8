use std::io::Cursor;

use super::*;

fn encode(img: RgbaImage, format: image::ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), format)
        .unwrap();
    buf
}

#[test]
fn decode_png_premultiplies() {
    let img = RgbaImage::from_raw(1, 1, vec![100, 50, 200, 128]).unwrap();
    let layer = decode_layer(&encode(img, image::ImageFormat::Png)).unwrap();
    assert_eq!(layer.dimensions(), (1, 1));
    assert_eq!(layer.premul_rgba8(), &[50, 25, 100, 128]);
}

#[test]
fn decode_gif_is_supported() {
    let img = RgbaImage::from_pixel(3, 2, image::Rgba([0, 255, 0, 255]));
    let layer = decode_layer(&encode(img, image::ImageFormat::Gif)).unwrap();
    assert_eq!(layer.dimensions(), (3, 2));
    assert_eq!(layer.premul_rgba8()[3], 255);
}

#[test]
fn garbage_is_a_resource_error() {
    let err = decode_layer(b"not an image").unwrap_err();
    assert_eq!(err.kind(), crate::foundation::error::ErrorKind::Resource);
}

#[test]
fn resize_hits_target_and_keeps_solid_color() {
    let layer = LayerImage::from_straight(RgbaImage::from_pixel(4, 4, image::Rgba([10, 20, 30, 255])));
    let big = layer.resized(16, 8);
    assert_eq!(big.dimensions(), (16, 8));
    assert!(big.premul_rgba8().chunks_exact(4).all(|p| p == [10, 20, 30, 255]));
    assert_eq!(layer.resized(4, 4), layer);
}
