// Viewport <-> image coordinate mapping.
//
// The window shows the image scaled by `zoom` and shifted by a scroll
// offset given in zoomed (viewport) pixels:
//
// ```text
// image    = (viewport + scroll) / zoom
// viewport = image * zoom - scroll
// ```
//
// Image coordinates keep their fractional part so a viewport point maps
// back onto itself exactly; [`ImagePoint::to_pixel`] floors to the pixel
// that covers it.

use crate::error::Error;
use crate::types::{Frame, Point};

/// A position in image space, sub-pixel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImagePoint {
    pub x: f32,
    pub y: f32,
}

impl ImagePoint {
    /// The image pixel containing this point.
    pub fn to_pixel(self) -> Point {
        Point::new(self.x.floor() as i32, self.y.floor() as i32)
    }
}

impl From<Point> for ImagePoint {
    fn from(p: Point) -> Self {
        Self {
            x: p.x as f32,
            y: p.y as f32,
        }
    }
}

fn check_zoom(zoom: f32) -> Result<(), Error> {
    if zoom.is_finite() && zoom > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidTransform(format!("zoom must be positive, got {zoom}")))
    }
}

pub fn to_image_space(p: Point, scroll: Point, zoom: f32) -> Result<ImagePoint, Error> {
    check_zoom(zoom)?;
    Ok(ImagePoint {
        x: (p.x + scroll.x) as f32 / zoom,
        y: (p.y + scroll.y) as f32 / zoom,
    })
}

pub fn to_viewport_space(p: ImagePoint, scroll: Point, zoom: f32) -> Result<Point, Error> {
    check_zoom(zoom)?;
    Ok(Point::new(
        (p.x * zoom).round() as i32 - scroll.x,
        (p.y * zoom).round() as i32 - scroll.y,
    ))
}

/// Current scroll/zoom of one window. Always holds a valid zoom.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    scroll: Point,
    zoom: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scroll: Point::new(0, 0),
            zoom: 1.0,
        }
    }
}

impl Viewport {
    pub fn new(scroll: Point, zoom: f32) -> Result<Self, Error> {
        check_zoom(zoom)?;
        Ok(Self { scroll, zoom })
    }

    pub fn scroll(&self) -> Point {
        self.scroll
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f32) -> Result<(), Error> {
        check_zoom(zoom)?;
        self.zoom = zoom;
        Ok(())
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.scroll.x += dx;
        self.scroll.y += dy;
    }

    /// Keep the scroll inside the zoomed image, so there is never more
    /// empty space than the image leaves on its own.
    pub fn clamp_scroll(&mut self, image: (usize, usize), view: (usize, usize)) {
        let max_x = ((image.0 as f32 * self.zoom).ceil() as i32 - view.0 as i32).max(0);
        let max_y = ((image.1 as f32 * self.zoom).ceil() as i32 - view.1 as i32).max(0);
        self.scroll.x = self.scroll.x.clamp(0, max_x);
        self.scroll.y = self.scroll.y.clamp(0, max_y);
    }

    pub fn to_image(&self, p: Point) -> ImagePoint {
        ImagePoint {
            x: (p.x + self.scroll.x) as f32 / self.zoom,
            y: (p.y + self.scroll.y) as f32 / self.zoom,
        }
    }

    pub fn to_viewport(&self, p: ImagePoint) -> Point {
        Point::new(
            (p.x * self.zoom).round() as i32 - self.scroll.x,
            (p.y * self.zoom).round() as i32 - self.scroll.y,
        )
    }

    /// Resample `frame` into a `width x height` view, nearest neighbour.
    /// Pixels that land outside the image get `background`.
    pub fn project(&self, frame: &Frame, width: usize, height: usize, background: u32) -> Frame {
        let mut out = Frame::filled(width, height, background);
        out.channels = frame.channels;
        for vy in 0..height {
            let iy = ((vy as i32 + self.scroll.y) as f32 / self.zoom).floor() as i64;
            if iy < 0 || iy >= frame.height as i64 {
                continue;
            }
            let src_row = iy as usize * frame.width;
            let dst_row = vy * width;
            for vx in 0..width {
                let ix = ((vx as i32 + self.scroll.x) as f32 / self.zoom).floor() as i64;
                if ix < 0 || ix >= frame.width as i64 {
                    continue;
                }
                out.pixels[dst_row + vx] = frame.pixels[src_row + ix as usize];
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_zoom_is_rejected() {
        let p = Point::new(3, 4);
        let origin = Point::new(0, 0);
        for zoom in [0.0, -1.0, f32::NAN] {
            assert!(matches!(
                to_image_space(p, origin, zoom),
                Err(Error::InvalidTransform(_))
            ));
            assert!(Viewport::new(origin, zoom).is_err());
        }
    }

    #[test]
    fn viewport_round_trip_is_exact() {
        for zoom in [0.25_f32, 0.5, 1.0, 1.5, 2.0, 3.0, 8.0] {
            for scroll in [Point::new(0, 0), Point::new(17, 230), Point::new(-40, 9)] {
                for x in (-50..700).step_by(37) {
                    for y in (-20..500).step_by(41) {
                        let p = Point::new(x, y);
                        let img = to_image_space(p, scroll, zoom).unwrap();
                        let back = to_viewport_space(img, scroll, zoom).unwrap();
                        assert!((back.x - p.x).abs() <= 1 && (back.y - p.y).abs() <= 1,
                            "{p:?} -> {back:?} at zoom {zoom}, scroll {scroll:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn image_round_trip_within_a_pixel() {
        let vp = Viewport::new(Point::new(12, 5), 1.75).unwrap();
        for x in 0..120 {
            let p = Point::new(x, 2 * x);
            let back = vp.to_image(vp.to_viewport(p.into())).to_pixel();
            assert!((back.x - p.x).abs() <= 1 && (back.y - p.y).abs() <= 1);
        }
    }

    #[test]
    fn projection_matches_mapping() {
        let mut frame = Frame::filled(4, 4, 0);
        for (i, px) in frame.pixels.iter_mut().enumerate() {
            *px = i as u32;
        }
        let vp = Viewport::new(Point::new(2, 0), 2.0).unwrap();
        let view = vp.project(&frame, 8, 8, 0xAB);
        for vy in 0..8 {
            for vx in 0..8 {
                let img = vp.to_image(Point::new(vx, vy)).to_pixel();
                let expect = if img.x < 4 && img.y < 4 {
                    frame.pixel(img.x as usize, img.y as usize)
                } else {
                    0xAB
                };
                assert_eq!(view.pixel(vx as usize, vy as usize), expect);
            }
        }
    }

    #[test]
    fn scroll_is_clamped_to_content() {
        let mut vp = Viewport::new(Point::new(-30, 900), 2.0).unwrap();
        vp.clamp_scroll((300, 200), (400, 300));
        assert_eq!(vp.scroll(), Point::new(0, 100));
    }
}
