use image::RgbaImage;

use crate::{foundation::core::Rgb, sprite::bounds::KeyColor};

/// Median color of the four corner squares (side `max(1, min(w, h) / 30)`).
pub fn corner_background(img: &RgbaImage) -> Option<Rgb> {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return None;
    }
    let band = (w.min(h) / 30).max(1);
    let corners = [
        (0, 0),
        (w - band, 0),
        (0, h - band),
        (w - band, h - band),
    ];

    let mut rs = Vec::new();
    let mut gs = Vec::new();
    let mut bs = Vec::new();
    for (x0, y0) in corners {
        for y in y0..y0 + band {
            for x in x0..x0 + band {
                let [r, g, b, _] = img.get_pixel(x, y).0;
                rs.push(r);
                gs.push(g);
                bs.push(b);
            }
        }
    }
    rs.sort_unstable();
    gs.sort_unstable();
    bs.sort_unstable();
    let mid = rs.len() / 2;
    Some(Rgb::new(rs[mid], gs[mid], bs[mid]))
}

/// Make the solid background connected to the image corners transparent.
///
/// The background color is sampled from the corners; a 4-connected flood fill from each
/// corner clears the alpha of every reachable pixel within `tolerance` of it. Interior
/// regions of the same color that do not touch the corners are kept.
pub fn clear_corner_background(img: &mut RgbaImage, tolerance: u8) -> usize {
    let Some(bg) = corner_background(img) else {
        return 0;
    };
    let key = KeyColor::new(bg, tolerance);
    let (w, h) = img.dimensions();

    let mut visited = vec![false; w as usize * h as usize];
    let mut stack = vec![(0, 0), (w - 1, 0), (0, h - 1), (w - 1, h - 1)];
    let mut cleared = 0usize;

    while let Some((x, y)) = stack.pop() {
        let idx = y as usize * w as usize + x as usize;
        if visited[idx] {
            continue;
        }
        visited[idx] = true;

        let px = img.get_pixel_mut(x, y);
        let [r, g, b, _] = px.0;
        if !key.matches(r, g, b) {
            continue;
        }
        px.0[3] = 0;
        cleared += 1;

        if x + 1 < w {
            stack.push((x + 1, y));
        }
        if x > 0 {
            stack.push((x - 1, y));
        }
        if y + 1 < h {
            stack.push((x, y + 1));
        }
        if y > 0 {
            stack.push((x, y - 1));
        }
    }

    cleared
}

#[cfg(test)]
#[path = "../../tests/unit/sprite/keying.rs"]
mod tests;
