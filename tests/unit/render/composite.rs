use super::*;

#[test]
fn opaque_source_replaces_destination() {
    assert_eq!(blend_over([10, 20, 30, 255], [200, 0, 0, 255]), [200, 0, 0, 255]);
}

#[test]
fn transparent_source_keeps_destination() {
    let dst = [10, 20, 30, 255];
    assert_eq!(blend_over(dst, [0, 0, 0, 0]), dst);
}

#[test]
fn half_alpha_source_blends() {
    assert_eq!(blend_over([0, 0, 0, 255], [128, 0, 0, 128]), [128, 0, 0, 255]);
    assert_eq!(blend_over([0, 0, 200, 200], [64, 0, 0, 64]), [64, 0, 150, 214]);
}

#[test]
fn blending_onto_transparent_yields_source() {
    let src = [40, 30, 20, 90];
    assert_eq!(blend_over([0, 0, 0, 0], src), src);
}

#[test]
fn premultiply_scales_color_by_alpha() {
    assert_eq!(premultiply([255, 128, 0, 128]), [128, 64, 0, 128]);
    assert_eq!(premultiply([9, 8, 7, 255]), [9, 8, 7, 255]);
    assert_eq!(premultiply([9, 8, 7, 0]), [0, 0, 0, 0]);
}
