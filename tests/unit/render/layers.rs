use super::*;
use crate::{
    render::decode::decode_layer,
    test_support::{rect_png, solid_png},
};

const BLUE: [u8; 4] = [0, 0, 255, 255];
const RED: [u8; 4] = [255, 0, 0, 255];
const GREEN: [u8; 4] = [0, 255, 0, 255];

fn pixel(png: &[u8], x: u32, y: u32) -> [u8; 4] {
    image::load_from_memory(png)
        .unwrap()
        .to_rgba8()
        .get_pixel(x, y)
        .0
}

#[test]
fn later_layers_occlude_earlier_ones() {
    let mut r = LayerRenderer::new(16, 16, false).unwrap();
    r.add_layer(&decode_layer(&solid_png(16, 16, BLUE)).unwrap(), "0")
        .unwrap();
    r.add_layer(&decode_layer(&rect_png(16, 16, (0, 0, 8, 8), RED)).unwrap(), "1")
        .unwrap();
    r.add_layer(&decode_layer(&rect_png(16, 16, (4, 4, 12, 12), GREEN)).unwrap(), "2")
        .unwrap();
    assert_eq!(r.layer_count(), 3);

    let png = r.encode(PngCompression::Default).unwrap();
    assert_eq!(pixel(&png, 5, 5), GREEN);
    assert_eq!(pixel(&png, 1, 1), RED);
    assert_eq!(pixel(&png, 14, 14), BLUE);
}

#[test]
fn order_of_calls_decides_the_winner() {
    let red = decode_layer(&rect_png(8, 8, (0, 0, 8, 8), RED)).unwrap();
    let green = decode_layer(&rect_png(8, 8, (0, 0, 8, 8), GREEN)).unwrap();

    let mut a = LayerRenderer::new(8, 8, false).unwrap();
    a.add_layer(&red, "red").unwrap();
    a.add_layer(&green, "green").unwrap();
    let mut b = LayerRenderer::new(8, 8, false).unwrap();
    b.add_layer(&green, "green").unwrap();
    b.add_layer(&red, "red").unwrap();

    assert_eq!(pixel(&a.encode(PngCompression::Fast).unwrap(), 3, 3), GREEN);
    assert_eq!(pixel(&b.encode(PngCompression::Fast).unwrap(), 3, 3), RED);
}

#[test]
fn mismatched_layers_are_scaled_to_the_canvas() {
    let mut r = LayerRenderer::new(32, 24, false).unwrap();
    r.add_layer(&decode_layer(&solid_png(4, 4, GREEN)).unwrap(), "small")
        .unwrap();
    let png = r.encode(PngCompression::Best).unwrap();
    let img = image::load_from_memory(&png).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (32, 24));
    assert!(img.pixels().all(|p| p.0 == GREEN));
}

#[test]
fn untouched_canvas_is_transparent() {
    let png = LayerRenderer::new(4, 4, false)
        .unwrap()
        .encode(PngCompression::Default)
        .unwrap();
    assert_eq!(pixel(&png, 2, 2), [0, 0, 0, 0]);
}

#[test]
fn compression_levels_encode_the_same_pixels() {
    let layer = decode_layer(&rect_png(16, 16, (2, 2, 9, 9), RED)).unwrap();
    let mut decoded = Vec::new();
    for c in [PngCompression::Default, PngCompression::Fast, PngCompression::Best] {
        let mut r = LayerRenderer::new(16, 16, false).unwrap();
        r.add_layer(&layer, "rect").unwrap();
        decoded.push(
            image::load_from_memory(&r.encode(c).unwrap())
                .unwrap()
                .to_rgba8()
                .into_raw(),
        );
    }
    assert_eq!(decoded[0], decoded[1]);
    assert_eq!(decoded[1], decoded[2]);
}

#[test]
fn labels_render_without_disturbing_the_far_corner() {
    let mut r = LayerRenderer::new(128, 128, true).unwrap();
    r.add_layer(&decode_layer(&solid_png(128, 128, BLUE)).unwrap(), "Background: Sky")
        .unwrap();
    r.add_layer(&decode_layer(&rect_png(128, 128, (0, 0, 1, 1), RED)).unwrap(), "Cockpit: Bubble")
        .unwrap();
    let png = r.encode(PngCompression::Default).unwrap();
    assert_eq!(pixel(&png, 127, 127), BLUE);
}

#[test]
fn empty_or_oversized_canvas_is_rejected() {
    assert!(LayerRenderer::new(0, 10, false).is_err());
    assert!(LayerRenderer::new(10, 0, false).is_err());
    assert!(LayerRenderer::new(MAX_CANVAS_DIM + 1, 10, false).is_err());
}

#[test]
fn compression_parses_lowercase() {
    let c: PngCompression = serde_json::from_str("\"best\"").unwrap();
    assert_eq!(c, PngCompression::Best);
}
