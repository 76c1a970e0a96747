// Display filters and ROI augmentations.
// All functions are pure: they read a Frame and return a new one with the
// same dimensions. Filters that produce intensity (grayscale, edge) return a
// Gray frame whose pixels are already re-expanded for display.

use std::fmt;

use crate::types::{luma, rgb, unpack, Channels, Frame};

/// Closed set of live filters selectable in the camera overlay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FilterSelection {
    #[default]
    None,
    Grayscale,
    Blur,
    Edge,
    Sharpen,
}

impl fmt::Display for FilterSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FilterSelection::None => "none",
            FilterSelection::Grayscale => "grayscale",
            FilterSelection::Blur => "blur",
            FilterSelection::Edge => "edge",
            FilterSelection::Sharpen => "sharpen",
        };
        f.write_str(name)
    }
}

pub fn apply_filter(frame: &Frame, selection: FilterSelection) -> Frame {
    match selection {
        FilterSelection::None => frame.clone(),
        FilterSelection::Grayscale => grayscale(frame),
        FilterSelection::Blur => gaussian_blur_5x5(frame),
        FilterSelection::Edge => canny(frame, 100, 200),
        FilterSelection::Sharpen => sharpen(frame),
    }
}

/// One-shot transforms offered on a selected region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Augmentation {
    Rotate45,
    Grayscale,
    /// Signed offset added to every channel, -100..=100.
    Brightness(i16),
}

pub fn augment(frame: &Frame, aug: Augmentation) -> Frame {
    match aug {
        Augmentation::Rotate45 => rotate(frame, 45.0),
        Augmentation::Grayscale => grayscale(frame),
        Augmentation::Brightness(beta) => brightness(frame, beta),
    }
}

/// Mirror an out-of-range index back inside 0..n without repeating the edge
/// sample (reflect-101: -1 -> 1, n -> n-2).
#[inline]
fn reflect101(i: i32, n: usize) -> usize {
    let n = n as i32;
    if n == 1 {
        return 0;
    }
    let mut i = i;
    while i < 0 || i >= n {
        i = if i < 0 { -i } else { 2 * (n - 1) - i };
    }
    i as usize
}

pub fn grayscale(frame: &Frame) -> Frame {
    let pixels = frame
        .pixels
        .iter()
        .map(|&px| match frame.channels {
            Channels::Gray => px,
            Channels::Color => {
                let v = luma(px);
                rgb(v, v, v)
            }
        })
        .collect();
    Frame {
        width: frame.width,
        height: frame.height,
        channels: Channels::Gray,
        pixels,
    }
}

/// 5x5 Gaussian as two separable 1-4-6-4-1 passes.
pub fn gaussian_blur_5x5(src: &Frame) -> Frame {
    const K: [u32; 5] = [1, 4, 6, 4, 1];
    let (w, h) = (src.width, src.height);
    if w == 0 || h == 0 {
        return src.clone();
    }

    /* ---- Pass 1: Horizontal (unnormalized sums, up to 255 * 16 per channel) ---- */
    let mut tmp = vec![[0u32; 3]; w * h];
    for y in 0..h {
        let row = y * w;
        for x in 0..w {
            let mut acc = [0u32; 3];
            for (k, weight) in K.iter().enumerate() {
                let sx = reflect101(x as i32 + k as i32 - 2, w);
                let (r, g, b) = unpack(src.pixels[row + sx]);
                acc[0] += weight * r as u32;
                acc[1] += weight * g as u32;
                acc[2] += weight * b as u32;
            }
            tmp[row + x] = acc;
        }
    }

    /* ---- Pass 2: Vertical (read tmp, write dst, divide by 16 * 16) ---- */
    let mut dst = Frame {
        width: w,
        height: h,
        channels: src.channels,
        pixels: vec![0; w * h],
    };
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u32; 3];
            for (k, weight) in K.iter().enumerate() {
                let sy = reflect101(y as i32 + k as i32 - 2, h);
                let t = tmp[sy * w + x];
                for c in 0..3 {
                    acc[c] += weight * t[c];
                }
            }
            let q = |v: u32| ((v + 128) >> 8) as u8;
            dst.pixels[y * w + x] = rgb(q(acc[0]), q(acc[1]), q(acc[2]));
        }
    }
    dst
}

/// 3x3 sharpen: 9 at the center, -1 around it.
pub fn sharpen(src: &Frame) -> Frame {
    let (w, h) = (src.width, src.height);
    let mut dst = src.clone();
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0i32; 3];
            for ky in -1..=1 {
                for kx in -1..=1 {
                    let sx = reflect101(x as i32 + kx, w);
                    let sy = reflect101(y as i32 + ky, h);
                    let (r, g, b) = unpack(src.pixels[sy * w + sx]);
                    let weight = if kx == 0 && ky == 0 { 9 } else { -1 };
                    acc[0] += weight * r as i32;
                    acc[1] += weight * g as i32;
                    acc[2] += weight * b as i32;
                }
            }
            let c = |v: i32| v.clamp(0, 255) as u8;
            dst.pixels[y * w + x] = rgb(c(acc[0]), c(acc[1]), c(acc[2]));
        }
    }
    dst
}

/// Canny edge detector on the luma image: 3x3 Sobel, L1 magnitude,
/// non-maximum suppression, then hysteresis between `low` and `high`.
pub fn canny(src: &Frame, low: i32, high: i32) -> Frame {
    let (w, h) = (src.width, src.height);
    let gray: Vec<i32> = src.pixels.iter().map(|&px| luma(px) as i32).collect();
    let at = |x: i32, y: i32| gray[reflect101(y, h) * w + reflect101(x, w)];

    let mut mag = vec![0i32; w * h];
    let mut gx = vec![0i32; w * h];
    let mut gy = vec![0i32; w * h];
    for y in 0..h as i32 {
        for x in 0..w as i32 {
            let dx = (at(x + 1, y - 1) + 2 * at(x + 1, y) + at(x + 1, y + 1))
                - (at(x - 1, y - 1) + 2 * at(x - 1, y) + at(x - 1, y + 1));
            let dy = (at(x - 1, y + 1) + 2 * at(x, y + 1) + at(x + 1, y + 1))
                - (at(x - 1, y - 1) + 2 * at(x, y - 1) + at(x + 1, y - 1));
            let i = y as usize * w + x as usize;
            gx[i] = dx;
            gy[i] = dy;
            mag[i] = dx.abs() + dy.abs();
        }
    }

    let m = |x: i32, y: i32| -> i32 {
        if x < 0 || y < 0 || x >= w as i32 || y >= h as i32 {
            0
        } else {
            mag[y as usize * w + x as usize]
        }
    };

    // 0 = suppressed, 1 = weak, 2 = strong
    let mut class = vec![0u8; w * h];
    let mut stack = Vec::new();
    for y in 0..h as i32 {
        for x in 0..w as i32 {
            let i = y as usize * w + x as usize;
            let v = mag[i];
            if v <= low {
                continue;
            }
            let (ax, ay) = (gx[i].abs() as f32, gy[i].abs() as f32);
            // tan(22.5) and tan(67.5)
            let (n1, n2) = if ay < ax * 0.414_213_56 {
                (m(x - 1, y), m(x + 1, y))
            } else if ay > ax * 2.414_213_6 {
                (m(x, y - 1), m(x, y + 1))
            } else if (gx[i] < 0) != (gy[i] < 0) {
                (m(x - 1, y + 1), m(x + 1, y - 1))
            } else {
                (m(x - 1, y - 1), m(x + 1, y + 1))
            };
            if v > n1 && v >= n2 {
                if v > high {
                    class[i] = 2;
                    stack.push((x, y));
                } else {
                    class[i] = 1;
                }
            }
        }
    }

    // Grow strong edges through connected weak ones.
    while let Some((x, y)) = stack.pop() {
        for ny in (y - 1)..=(y + 1) {
            for nx in (x - 1)..=(x + 1) {
                if nx < 0 || ny < 0 || nx >= w as i32 || ny >= h as i32 {
                    continue;
                }
                let j = ny as usize * w + nx as usize;
                if class[j] == 1 {
                    class[j] = 2;
                    stack.push((nx, ny));
                }
            }
        }
    }

    let pixels = class
        .iter()
        .map(|&c| if c == 2 { rgb(255, 255, 255) } else { 0 })
        .collect();
    Frame {
        width: w,
        height: h,
        channels: Channels::Gray,
        pixels,
    }
}

/// Rotate counter-clockwise by `degrees` about the integer center, keeping
/// the frame size. Bilinear sampling, black where the source runs out.
pub fn rotate(src: &Frame, degrees: f32) -> Frame {
    let (w, h) = (src.width, src.height);
    let (sin, cos) = degrees.to_radians().sin_cos();
    let cx = (w / 2) as f32;
    let cy = (h / 2) as f32;

    let sample = |x: i32, y: i32| -> [f32; 3] {
        if x < 0 || y < 0 || x >= w as i32 || y >= h as i32 {
            return [0.0; 3];
        }
        let (r, g, b) = unpack(src.pixels[y as usize * w + x as usize]);
        [r as f32, g as f32, b as f32]
    };

    let mut dst = Frame {
        width: w,
        height: h,
        channels: src.channels,
        pixels: vec![0; w * h],
    };
    for y in 0..h {
        for x in 0..w {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            let sx = cos * dx - sin * dy + cx;
            let sy = sin * dx + cos * dy + cy;
            let (x0, y0) = (sx.floor() as i32, sy.floor() as i32);
            let (fx, fy) = (sx - x0 as f32, sy - y0 as f32);
            let (p00, p10) = (sample(x0, y0), sample(x0 + 1, y0));
            let (p01, p11) = (sample(x0, y0 + 1), sample(x0 + 1, y0 + 1));
            let mut out = [0u8; 3];
            for c in 0..3 {
                let top = p00[c] * (1.0 - fx) + p10[c] * fx;
                let bot = p01[c] * (1.0 - fx) + p11[c] * fx;
                out[c] = (top * (1.0 - fy) + bot * fy).round().clamp(0.0, 255.0) as u8;
            }
            dst.pixels[y * w + x] = rgb(out[0], out[1], out[2]);
        }
    }
    dst
}

/// Saturating per-channel offset.
pub fn brightness(src: &Frame, beta: i16) -> Frame {
    let beta = beta as i32;
    let shift = |v: u8| (v as i32 + beta).clamp(0, 255) as u8;
    let pixels = src
        .pixels
        .iter()
        .map(|&px| {
            let (r, g, b) = unpack(px);
            rgb(shift(r), shift(g), shift(b))
        })
        .collect();
    Frame {
        pixels,
        ..src.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(w: usize, h: usize) -> Frame {
        let mut f = Frame::filled(w, h, 0);
        for y in 0..h {
            for x in 0..w {
                let v = ((x * 255) / w.max(1)) as u8;
                f.pixels[y * w + x] = rgb(v, (y % 256) as u8, 255 - v);
            }
        }
        f
    }

    fn step_edge(w: usize, h: usize) -> Frame {
        let mut f = Frame::filled(w, h, 0);
        for y in 0..h {
            for x in w / 2..w {
                f.pixels[y * w + x] = rgb(255, 255, 255);
            }
        }
        f
    }

    #[test]
    fn every_filter_preserves_dimensions() {
        let src = gradient(37, 23);
        for sel in [
            FilterSelection::None,
            FilterSelection::Grayscale,
            FilterSelection::Blur,
            FilterSelection::Edge,
            FilterSelection::Sharpen,
        ] {
            let out = apply_filter(&src, sel);
            assert_eq!((out.width, out.height), (37, 23), "{sel}");
            assert_eq!(out.pixels.len(), 37 * 23, "{sel}");
        }
    }

    #[test]
    fn intensity_filters_return_displayable_gray() {
        let src = gradient(16, 16);
        for out in [grayscale(&src), canny(&src, 100, 200)] {
            assert_eq!(out.channels, Channels::Gray);
            for &px in &out.pixels {
                let (r, g, b) = unpack(px);
                assert!(r == g && g == b);
            }
        }
    }

    #[test]
    fn flat_image_is_a_fixed_point_of_blur_and_sharpen() {
        let flat = Frame::filled(9, 7, rgb(90, 140, 200));
        assert_eq!(gaussian_blur_5x5(&flat), flat);
        assert_eq!(sharpen(&flat), flat);
        assert!(canny(&flat, 100, 200).pixels.iter().all(|&p| p == 0));
    }

    #[test]
    fn canny_finds_a_vertical_step() {
        let out = canny(&step_edge(20, 10), 100, 200);
        for y in 0..10 {
            let row: Vec<u32> = (0..20).map(|x| out.pixel(x, y)).collect();
            assert!(row.iter().any(|&p| p != 0), "row {y} has no edge");
            assert_eq!(row[2], 0);
            assert_eq!(row[17], 0);
        }
    }

    #[test]
    fn blur_softens_a_step() {
        let out = gaussian_blur_5x5(&step_edge(20, 4));
        let (left, _, _) = unpack(out.pixel(9, 1));
        let (right, _, _) = unpack(out.pixel(10, 1));
        assert!(left > 0 && left < 128);
        assert!(right > 128 && right < 255);
    }

    #[test]
    fn rotation_keeps_center_and_blackens_corners() {
        let src = Frame::filled(41, 41, rgb(200, 100, 50));
        let out = rotate(&src, 45.0);
        assert_eq!(out.pixel(20, 20), rgb(200, 100, 50));
        assert_eq!(out.pixel(0, 0), 0);
    }

    #[test]
    fn brightness_saturates() {
        let src = Frame::filled(2, 2, rgb(250, 5, 128));
        assert_eq!(brightness(&src, 10).pixel(0, 0), rgb(255, 15, 138));
        assert_eq!(brightness(&src, -10).pixel(1, 1), rgb(240, 0, 118));
        assert_eq!(augment(&src, Augmentation::Brightness(0)), src);
    }
}
