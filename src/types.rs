// Core types shared by every tool: frames, points, rectangles, regions.

use image::{GrayImage, Rgb, RgbImage};

/// Pack 8-bit channels as 0x00RRGGBB (what minifb wants).
#[inline]
pub const fn rgb(r: u8, g: u8, b: u8) -> u32 {
    ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

/// Unpack 0x00RRGGBB.
#[inline]
pub const fn unpack(px: u32) -> (u8, u8, u8) {
    (((px >> 16) & 0xFF) as u8, ((px >> 8) & 0xFF) as u8, (px & 0xFF) as u8)
}

/// Channel depth of a frame. Intensity frames still store packed pixels
/// (R = G = B) so they can be shown as-is; the tag decides how the frame is
/// serialized and how many elements it has.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channels {
    Color,
    Gray,
}

impl Channels {
    pub fn count(self) -> usize {
        match self {
            Channels::Color => 3,
            Channels::Gray => 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub width: usize,       // how wide the frame is (pixels)
    pub height: usize,      // how tall the frame is (pixels)
    pub channels: Channels, // 3-channel color or 1-channel intensity
    pub pixels: Vec<u32>,   // each entry is 0x00RRGGBB for minifb
}

impl Frame {
    /// A color frame filled with one value.
    pub fn filled(width: usize, height: usize, color: u32) -> Self {
        Self {
            width,
            height,
            channels: Channels::Color,
            pixels: vec![color; width * height],
        }
    }

    pub fn from_rgb_image(img: &RgbImage) -> Self {
        let (w, h) = img.dimensions();
        let pixels = img.pixels().map(|p| rgb(p[0], p[1], p[2])).collect();
        Self {
            width: w as usize,
            height: h as usize,
            channels: Channels::Color,
            pixels,
        }
    }

    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            let (r, g, b) = unpack(self.pixel(x as usize, y as usize));
            Rgb([r, g, b])
        })
    }

    /// Intensity view. Gray frames keep their value, color frames use luma.
    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            let px = self.pixel(x as usize, y as usize);
            let v = match self.channels {
                Channels::Gray => unpack(px).0,
                Channels::Color => luma(px),
            };
            image::Luma([v])
        })
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        self.pixels[y * self.width + x]
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Flat element list, row-major, R G B per pixel (one value for gray).
    pub fn samples(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * self.channels.count());
        for &px in &self.pixels {
            let (r, g, b) = unpack(px);
            match self.channels {
                Channels::Color => out.extend_from_slice(&[r, g, b]),
                Channels::Gray => out.push(r),
            }
        }
        out
    }

    /// Inverse of [`Frame::samples`]. `samples.len()` must be
    /// `width * height * channels.count()`.
    pub fn from_samples(width: usize, height: usize, channels: Channels, samples: &[u8]) -> Self {
        let pixels = match channels {
            Channels::Color => samples
                .chunks_exact(3)
                .map(|c| rgb(c[0], c[1], c[2]))
                .collect(),
            Channels::Gray => samples.iter().map(|&v| rgb(v, v, v)).collect(),
        };
        Self {
            width,
            height,
            channels,
            pixels,
        }
    }
}

/// ITU-R BT.601 luma with integer rounding.
#[inline]
pub fn luma(px: u32) -> u8 {
    let (r, g, b) = unpack(px);
    ((299 * r as u32 + 587 * g as u32 + 114 * b as u32 + 500) / 1000) as u8
}

/// A pixel position. Used for viewport (window) and image coordinates alike;
/// the Coordinate Mapper converts between the two.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Screen rectangle (x, y, w, h). Half-open: contains x..x+w, y..y+h.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.x + self.w && p.y >= self.y && p.y < self.y + self.h
    }
}

/// Selected region in image space.
/// Invariant: `x1 <= x2 <= width`, `y1 <= y2 <= height`, non-zero area.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub x1: usize,
    pub y1: usize,
    pub x2: usize,
    pub y2: usize,
}

impl Region {
    /// Build a region from two drag corners, in any order, clamped to a
    /// `width x height` buffer. Returns `None` when the clamped rectangle has
    /// no area.
    pub fn from_drag(a: Point, b: Point, width: usize, height: usize) -> Option<Self> {
        let clamp = |v: i32, hi: usize| v.clamp(0, hi as i32) as usize;
        let (x1, x2) = (a.x.min(b.x), a.x.max(b.x));
        let (y1, y2) = (a.y.min(b.y), a.y.max(b.y));
        let region = Self {
            x1: clamp(x1, width),
            y1: clamp(y1, height),
            x2: clamp(x2, width),
            y2: clamp(y2, height),
        };
        (region.width() > 0 && region.height() > 0).then_some(region)
    }

    pub fn width(&self) -> usize {
        self.x2 - self.x1
    }

    pub fn height(&self) -> usize {
        self.y2 - self.y1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drag_is_clamped_to_buffer() {
        let r = Region::from_drag(Point::new(-10, -10), Point::new(50, 50), 100, 100).unwrap();
        assert_eq!((r.x1, r.y1, r.x2, r.y2), (0, 0, 50, 50));

        let r = Region::from_drag(Point::new(120, 90), Point::new(60, 300), 100, 100).unwrap();
        assert_eq!((r.x1, r.y1, r.x2, r.y2), (60, 90, 100, 100));
    }

    #[test]
    fn zero_area_drag_has_no_region() {
        assert!(Region::from_drag(Point::new(5, 5), Point::new(5, 5), 100, 100).is_none());
        assert!(Region::from_drag(Point::new(5, 5), Point::new(5, 40), 100, 100).is_none());
        // Entirely outside the buffer clamps down to a line.
        assert!(Region::from_drag(Point::new(150, 10), Point::new(200, 50), 100, 100).is_none());
    }

    #[test]
    fn samples_follow_channel_depth() {
        let mut f = Frame::filled(2, 1, rgb(10, 20, 30));
        assert_eq!(f.samples(), vec![10, 20, 30, 10, 20, 30]);
        f.channels = Channels::Gray;
        f.pixels = vec![rgb(7, 7, 7), rgb(9, 9, 9)];
        assert_eq!(f.samples(), vec![7, 9]);
        let back = Frame::from_samples(2, 1, Channels::Gray, &[7, 9]);
        assert_eq!(back, f);
    }

    #[test]
    fn rect_is_half_open() {
        let r = Rect::new(10, 10, 150, 30);
        assert!(r.contains(Point::new(10, 10)));
        assert!(r.contains(Point::new(159, 39)));
        assert!(!r.contains(Point::new(160, 20)));
        assert!(!r.contains(Point::new(20, 40)));
    }
}
