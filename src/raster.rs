// Software drawing: pixels, lines, outlines, and a tiny 5x7 bitmap font.
// Everything here writes straight into a Frame; callers decide which copy
// (preview, authoritative, display) they hand in.

use crate::types::{Frame, Point, Rect};

/// Put a pixel on the frame if (x,y) is inside bounds.
#[inline]
pub fn put_pixel(fb: &mut Frame, x: i32, y: i32, color: u32) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    if x >= fb.width || y >= fb.height {
        return;
    }
    let idx = y * fb.width + x;
    fb.pixels[idx] = color;
}

/// Draw a thin line between (x0,y0) and (x1,y1) using Bresenham.
pub fn draw_line(fb: &mut Frame, x0: i32, y0: i32, x1: i32, y1: i32, color: u32) {
    let (mut x0, mut y0) = (x0, y0);
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        put_pixel(fb, x0, y0, color);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

/// Solid rectangle, clipped to the frame.
pub fn fill_rect(fb: &mut Frame, rect: Rect, color: u32) {
    let x0 = rect.x.max(0);
    let y0 = rect.y.max(0);
    let x1 = (rect.x + rect.w).min(fb.width as i32);
    let y1 = (rect.y + rect.h).min(fb.height as i32);
    for y in y0..y1 {
        let row = y as usize * fb.width;
        for x in x0..x1 {
            fb.pixels[row + x as usize] = color;
        }
    }
}

/// Rectangle outline through two opposite corners. Thick outlines grow
/// evenly inward and outward around the nominal edge.
pub fn stroke_rect(fb: &mut Frame, a: Point, b: Point, color: u32, thickness: i32) {
    let (x0, x1) = (a.x.min(b.x), a.x.max(b.x));
    let (y0, y1) = (a.y.min(b.y), a.y.max(b.y));
    let t = thickness.max(1);
    for i in 0..t {
        let o = i - t / 2;
        let (l, r, top, bot) = (x0 - o, x1 + o, y0 - o, y1 + o);
        if l > r || top > bot {
            continue;
        }
        draw_line(fb, l, top, r, top, color);
        draw_line(fb, l, bot, r, bot, color);
        draw_line(fb, l, top, l, bot, color);
        draw_line(fb, r, top, r, bot, color);
    }
}

/// Circle outline: every pixel whose center lies within `thickness / 2`
/// of the nominal radius.
pub fn stroke_circle(fb: &mut Frame, center: Point, radius: i32, color: u32, thickness: i32) {
    if radius <= 0 {
        return;
    }
    let half = thickness.max(1) as f32 / 2.0;
    let inner = (radius as f32 - half).max(0.0);
    let outer = radius as f32 + half;
    let (inner2, outer2) = (inner * inner, outer * outer);
    let reach = outer.ceil() as i32;

    let y_lo = (center.y - reach).max(0);
    let y_hi = (center.y + reach).min(fb.height as i32 - 1);
    let x_lo = (center.x - reach).max(0);
    let x_hi = (center.x + reach).min(fb.width as i32 - 1);
    for y in y_lo..=y_hi {
        for x in x_lo..=x_hi {
            let dx = (x - center.x) as f32;
            let dy = (y - center.y) as f32;
            let d2 = dx * dx + dy * dy;
            if d2 >= inner2 && d2 <= outer2 {
                put_pixel(fb, x, y, color);
            }
        }
    }
}

/// Closed polygon outline.
pub fn stroke_polygon(fb: &mut Frame, corners: &[Point], color: u32) {
    if corners.len() < 2 {
        return;
    }
    for (i, a) in corners.iter().enumerate() {
        let b = corners[(i + 1) % corners.len()];
        draw_line(fb, a.x, a.y, b.x, b.y, color);
    }
}

/* ---------- 5x7 bitmap font ---------- */

/// Glyph cell width including the 1-pixel spacing.
const ADVANCE: i32 = 6;
const GLYPH_H: i32 = 7;

/// Return a 5x7 glyph bitmap. Lowercase letters share the uppercase shapes.
/// Each u8 is a row; the low 5 bits are the pixels (bit 4 = leftmost).
fn glyph5x7(ch: char) -> Option<[u8; 7]> {
    macro_rules! g { ($a:expr,$b:expr,$c:expr,$d:expr,$e:expr,$f:expr,$g:expr) => {
        Some([$a,$b,$c,$d,$e,$f,$g])
    }; }

    match ch.to_ascii_uppercase() {
        '0' => g!(0b01110,0b10001,0b10011,0b10101,0b11001,0b10001,0b01110),
        '1' => g!(0b00100,0b01100,0b00100,0b00100,0b00100,0b00100,0b01110),
        '2' => g!(0b01110,0b10001,0b00001,0b00010,0b00100,0b01000,0b11111),
        '3' => g!(0b11110,0b00001,0b00001,0b01110,0b00001,0b00001,0b11110),
        '4' => g!(0b00010,0b00110,0b01010,0b10010,0b11111,0b00010,0b00010),
        '5' => g!(0b11111,0b10000,0b11110,0b00001,0b00001,0b10001,0b01110),
        '6' => g!(0b00110,0b01000,0b10000,0b11110,0b10001,0b10001,0b01110),
        '7' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b01000,0b01000),
        '8' => g!(0b01110,0b10001,0b10001,0b01110,0b10001,0b10001,0b01110),
        '9' => g!(0b01110,0b10001,0b10001,0b01111,0b00001,0b00010,0b01100),

        'A' => g!(0b01110,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'B' => g!(0b11110,0b10001,0b10001,0b11110,0b10001,0b10001,0b11110),
        'C' => g!(0b01110,0b10001,0b10000,0b10000,0b10000,0b10001,0b01110),
        'D' => g!(0b11100,0b10010,0b10001,0b10001,0b10001,0b10010,0b11100),
        'E' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b11111),
        'F' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b10000),
        'G' => g!(0b01110,0b10001,0b10000,0b10111,0b10001,0b10001,0b01111),
        'H' => g!(0b10001,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'I' => g!(0b01110,0b00100,0b00100,0b00100,0b00100,0b00100,0b01110),
        'J' => g!(0b00111,0b00010,0b00010,0b00010,0b00010,0b10010,0b01100),
        'K' => g!(0b10001,0b10010,0b10100,0b11000,0b10100,0b10010,0b10001),
        'L' => g!(0b10000,0b10000,0b10000,0b10000,0b10000,0b10000,0b11111),
        'M' => g!(0b10001,0b11011,0b10101,0b10101,0b10001,0b10001,0b10001),
        'N' => g!(0b10001,0b10001,0b11001,0b10101,0b10011,0b10001,0b10001),
        'O' => g!(0b01110,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'P' => g!(0b11110,0b10001,0b10001,0b11110,0b10000,0b10000,0b10000),
        'Q' => g!(0b01110,0b10001,0b10001,0b10001,0b10101,0b10010,0b01101),
        'R' => g!(0b11110,0b10001,0b10001,0b11110,0b10100,0b10010,0b10001),
        'S' => g!(0b01111,0b10000,0b10000,0b01110,0b00001,0b00001,0b11110),
        'T' => g!(0b11111,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        'U' => g!(0b10001,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'V' => g!(0b10001,0b10001,0b10001,0b10001,0b10001,0b01010,0b00100),
        'W' => g!(0b10001,0b10001,0b10001,0b10101,0b10101,0b10101,0b01010),
        'X' => g!(0b10001,0b10001,0b01010,0b00100,0b01010,0b10001,0b10001),
        'Y' => g!(0b10001,0b10001,0b01010,0b00100,0b00100,0b00100,0b00100),
        'Z' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b10000,0b11111),

        ' ' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00000,0b00000),
        '|' => g!(0b00100,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        ':' => g!(0b00000,0b00100,0b00000,0b00000,0b00100,0b00000,0b00000),
        '.' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00100,0b00000),
        ',' => g!(0b00000,0b00000,0b00000,0b00000,0b00110,0b00100,0b01000),
        '-' => g!(0b00000,0b00000,0b00000,0b11111,0b00000,0b00000,0b00000),
        '+' => g!(0b00000,0b00100,0b00100,0b11111,0b00100,0b00100,0b00000),
        '=' => g!(0b00000,0b00000,0b11111,0b00000,0b11111,0b00000,0b00000),
        '_' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00000,0b11111),
        '/' => g!(0b00001,0b00010,0b00010,0b00100,0b01000,0b01000,0b10000),
        '(' => g!(0b00010,0b00100,0b01000,0b01000,0b01000,0b00100,0b00010),
        ')' => g!(0b01000,0b00100,0b00010,0b00010,0b00010,0b00100,0b01000),
        '[' => g!(0b01110,0b01000,0b01000,0b01000,0b01000,0b01000,0b01110),
        ']' => g!(0b01110,0b00010,0b00010,0b00010,0b00010,0b00010,0b01110),
        '!' => g!(0b00100,0b00100,0b00100,0b00100,0b00100,0b00000,0b00100),
        '?' => g!(0b01110,0b10001,0b00001,0b00010,0b00100,0b00000,0b00100),

        _ => None,
    }
}

/// Draw a single 5x7 character at (x,y), each font pixel a `scale`-sized block.
fn draw_char_5x7(fb: &mut Frame, x: i32, y: i32, ch: char, color: u32, scale: i32) {
    if let Some(rows) = glyph5x7(ch) {
        for (ry, rowbits) in rows.iter().enumerate() {
            for rx in 0..5 {
                if (rowbits & (1 << (4 - rx))) == 0 {
                    continue;
                }
                let px = x + rx * scale;
                let py = y + ry as i32 * scale;
                fill_rect(fb, Rect::new(px, py, scale, scale), color);
            }
        }
    }
}

/// Pixel size of `text` at `scale`, as (width, height).
pub fn text_size(text: &str, scale: i32) -> (i32, i32) {
    let n = text.chars().count() as i32;
    if n == 0 {
        return (0, GLYPH_H * scale);
    }
    (n * ADVANCE * scale - scale, GLYPH_H * scale)
}

/// Draw a text string with its top-left corner at (x,y).
pub fn draw_text(fb: &mut Frame, mut x: i32, y: i32, text: &str, color: u32, scale: i32) {
    let scale = scale.max(1);
    for ch in text.chars() {
        draw_char_5x7(fb, x, y, ch, color, scale);
        x += ADVANCE * scale;
    }
}

/// Text with a 1-pixel black shadow so it stays readable over video.
pub fn draw_text_shadowed(fb: &mut Frame, x: i32, y: i32, text: &str, color: u32) {
    draw_text(fb, x + 1, y + 1, text, 0x0000_0000, 1);
    draw_text(fb, x, y, text, color, 1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::rgb;

    const RED: u32 = 0x00FF_0000;

    #[test]
    fn drawing_outside_is_clipped() {
        let mut fb = Frame::filled(10, 10, 0);
        draw_line(&mut fb, -5, -5, 20, 20, RED);
        fill_rect(&mut fb, Rect::new(8, 8, 10, 10), RED);
        assert_eq!(fb.pixel(0, 0), RED);
        assert_eq!(fb.pixel(9, 9), RED);
    }

    #[test]
    fn rect_outline_leaves_interior() {
        let mut fb = Frame::filled(40, 40, 0);
        stroke_rect(&mut fb, Point::new(30, 30), Point::new(10, 10), RED, 2);
        assert_eq!(fb.pixel(10, 10), RED);
        assert_eq!(fb.pixel(30, 20), RED);
        assert_eq!(fb.pixel(20, 20), 0);
    }

    #[test]
    fn circle_outline_hits_radius() {
        let mut fb = Frame::filled(50, 50, 0);
        stroke_circle(&mut fb, Point::new(25, 25), 10, RED, 2);
        assert_eq!(fb.pixel(35, 25), RED);
        assert_eq!(fb.pixel(25, 15), RED);
        assert_eq!(fb.pixel(25, 25), 0);
        assert_eq!(fb.pixel(25, 40), 0);
    }

    #[test]
    fn text_size_matches_glyph_grid() {
        assert_eq!(text_size("Save", 1), (23, 7));
        assert_eq!(text_size("Ok", 3), (33, 21));
        let mut fb = Frame::filled(30, 10, 0);
        draw_text(&mut fb, 0, 0, "I", rgb(255, 255, 255), 1);
        // Top bar of 'I' is columns 1..=3.
        assert_eq!(fb.pixel(2, 0), rgb(255, 255, 255));
        assert_eq!(fb.pixel(0, 0), 0);
    }
}
