use image::Rgba;

use super::*;

const WHITE: Rgba<u8> = Rgba([250, 250, 250, 255]);
const INK: Rgba<u8> = Rgba([20, 20, 20, 255]);

#[test]
fn corner_background_takes_per_channel_median() {
    let mut img = RgbaImage::from_pixel(30, 30, WHITE);
    img.put_pixel(0, 0, INK);
    assert_eq!(corner_background(&img), Some(Rgb::new(250, 250, 250)));
}

#[test]
fn flood_fill_clears_connected_background_only() {
    // White frame, ink ring, white hole inside the ring.
    let mut img = RgbaImage::from_fn(12, 12, |x, y| {
        let ring = (3..9).contains(&x) && (3..9).contains(&y);
        let hole = (5..7).contains(&x) && (5..7).contains(&y);
        if ring && !hole { INK } else { WHITE }
    });

    let cleared = clear_corner_background(&mut img, 12);
    assert_eq!(cleared, 144 - 36);
    assert_eq!(img.get_pixel(0, 0).0[3], 0);
    assert_eq!(img.get_pixel(11, 11).0[3], 0);
    assert_eq!(img.get_pixel(4, 4).0[3], 255);
    // The enclosed hole is not reachable from the corners.
    assert_eq!(img.get_pixel(5, 5).0[3], 255);
}

#[test]
fn flood_fill_respects_tolerance() {
    let mut img = RgbaImage::from_pixel(4, 1, WHITE);
    img.put_pixel(1, 0, Rgba([236, 250, 250, 255]));
    img.put_pixel(2, 0, Rgba([236, 250, 250, 255]));
    img.put_pixel(3, 0, Rgba([236, 250, 250, 255]));
    clear_corner_background(&mut img, 12);
    assert_eq!(img.get_pixel(0, 0).0[3], 0);
    assert_eq!(img.get_pixel(1, 0).0[3], 255);
}
