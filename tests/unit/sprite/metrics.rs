use image::Rgba;

use super::*;

const GREEN: [u8; 4] = [0, 177, 64, 255];

fn sprite(w: u32, h: u32, rect: (u32, u32, u32, u32)) -> RgbaImage {
    let mut img = RgbaImage::from_pixel(w, h, Rgba(GREEN));
    for y in rect.1..rect.3 {
        for x in rect.0..rect.2 {
            img.put_pixel(x, y, Rgba([40, 40, 40, 255]));
        }
    }
    img
}

#[test]
fn measure_reports_visible_height_and_baseline_pad() {
    let img = sprite(64, 100, (10, 20, 40, 90));
    let m = ReferenceMetrics::measure(&img, &KeyColor::default(), "match sprite").unwrap();
    assert_eq!(
        m.canvas,
        Canvas {
            width: 64,
            height: 100
        }
    );
    assert_eq!(m.visible_height, 70);
    assert_eq!(m.baseline_pad, 10);
}

#[test]
fn content_touching_the_bottom_has_zero_pad() {
    let img = sprite(8, 8, (0, 4, 8, 8));
    let m = ReferenceMetrics::measure(&img, &KeyColor::default(), "match sprite").unwrap();
    assert_eq!(m.baseline_pad, 0);
}

#[test]
fn measure_fails_on_empty_reference() {
    let img = RgbaImage::from_pixel(8, 8, Rgba(GREEN));
    let err = ReferenceMetrics::measure(&img, &KeyColor::default(), "scale reference")
        .unwrap_err()
        .to_string();
    assert!(err.contains("no visible pixels found in scale reference"));
}

#[test]
fn scale_factor_is_ratio_times_multiplier() {
    let f = scale_factor(120, 80, 1.25).unwrap();
    assert!((f - 1.875).abs() < 1e-12);
}

#[test]
fn scale_factor_is_invariant_under_uniform_reference_rescale() {
    let key = KeyColor::default();
    let a = visible_height(&sprite(50, 100, (5, 10, 45, 70)), &key, "match").unwrap();
    let b = visible_height(&sprite(50, 100, (5, 30, 45, 70)), &key, "ref").unwrap();
    let a2 = visible_height(&sprite(150, 300, (15, 30, 135, 210)), &key, "match").unwrap();
    let b2 = visible_height(&sprite(150, 300, (15, 90, 135, 210)), &key, "ref").unwrap();

    let f1 = scale_factor(a, b, 1.1).unwrap();
    let f2 = scale_factor(a2, b2, 1.1).unwrap();
    assert!((f1 - f2).abs() < 1e-12);
}

#[test]
fn scale_factor_rejects_zero_heights_and_bad_multipliers() {
    assert!(scale_factor(0, 10, 1.0).is_err());
    assert!(scale_factor(10, 0, 1.0).is_err());
    assert!(scale_factor(10, 10, 0.0).is_err());
    assert!(scale_factor(10, 10, f64::NAN).is_err());
}

#[test]
fn scaled_size_rounds_and_clamps_to_one() {
    assert_eq!(scaled_size(10, 20, 1.25), (13, 25));
    assert_eq!(scaled_size(1, 1, 0.01), (1, 1));
}
