use super::*;

#[test]
fn image_id_zero_is_unbound() {
    assert!(ImageId::UNBOUND.is_unbound());
    assert!(ImageId::default().is_unbound());
    assert!(!ImageId(7).is_unbound());
}

#[test]
fn premultiply_rounds_to_nearest() {
    let c = Rgba8Premul::from_straight_rgba(255, 128, 0, 128);
    assert_eq!(c.to_array(), [128, 64, 0, 128]);
    assert_eq!(Rgba8Premul::transparent().to_array(), [0, 0, 0, 0]);
    assert_eq!(Rgba8Premul::opaque(1, 2, 3).a, 255);
}
