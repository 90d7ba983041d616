use super::*;

#[test]
fn mul_div255_rounds_to_nearest_for_every_pair() {
    for x in 0..=255_u8 {
        for y in 0..=255_u8 {
            let expected = (f64::from(x) * f64::from(y) / 255.0).round() as u8;
            assert_eq!(mul_div255(x, y), expected, "{x} * {y}");
        }
    }
}

#[test]
fn mul_div255_keeps_identity_and_zero() {
    assert_eq!(mul_div255(200, 255), 200);
    assert_eq!(mul_div255(200, 0), 0);
}
