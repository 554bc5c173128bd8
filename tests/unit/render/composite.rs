use super::*;

#[test]
fn transparent_source_is_noop() {
    let dst = [10, 20, 30, 40];
    assert_eq!(over(dst, [255, 255, 255, 0]), dst);
}

#[test]
fn opaque_source_replaces_destination() {
    let src = [255, 0, 0, 255];
    assert_eq!(over([0, 0, 255, 255], src), src);
}

#[test]
fn translucent_source_blends() {
    // 50% red over opaque blue.
    let out = over([0, 0, 255, 255], [128, 0, 0, 128]);
    assert_eq!(out, [128, 0, 127, 255]);
}

#[test]
fn over_in_place_rejects_mismatched_buffers() {
    let mut dst = vec![0u8; 8];
    assert!(over_in_place(&mut dst, &[0u8; 4]).is_err());
    assert!(over_in_place(&mut dst[..6], &[0u8; 6]).is_err());
}

#[test]
fn premultiply_then_unpremultiply_is_close() {
    let mut px = vec![100u8, 50, 200, 128, 9, 9, 9, 0, 1, 2, 3, 255];
    premultiply_in_place(&mut px);
    assert_eq!(&px[..4], &[50, 25, 100, 128]);
    assert_eq!(&px[4..8], &[0, 0, 0, 0]);
    unpremultiply_in_place(&mut px);
    for (got, want) in px[..3].iter().zip([100u8, 50, 200]) {
        assert!(got.abs_diff(want) <= 1, "{got} vs {want}");
    }
    assert_eq!(&px[8..], &[1, 2, 3, 255]);
}
