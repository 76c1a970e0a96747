// Authoritative image buffer plus its throwaway preview.
//
// Previews are always rebuilt from a fresh copy of the authoritative frame,
// so repeated pointer moves never stack up. Only [`Canvas::commit`] writes
// into the authoritative frame.

use serde::Deserialize;

use crate::error::Error;
use crate::filters::{apply_filter, FilterSelection};
use crate::raster::{draw_text, stroke_circle, stroke_rect, text_size};
use crate::types::{rgb, Frame, Point, Region};

/// One drawing operation, in image space.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DrawOp {
    Rectangle { a: Point, b: Point },
    Circle { center: Point, radius: i32 },
    /// `at` is the bottom-left corner of the text.
    Text { at: Point, content: String },
    /// Selection outline; previewed but never committed.
    Marquee { a: Point, b: Point },
}

/// Colors and sizes used for drawing operations.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct InkStyle {
    pub rectangle: [u8; 3],
    pub circle: [u8; 3],
    pub text: [u8; 3],
    pub marquee: [u8; 3],
    pub thickness: i32,
    pub text_scale: i32,
}

impl Default for InkStyle {
    fn default() -> Self {
        Self {
            rectangle: [0, 255, 0],
            circle: [0, 0, 255],
            text: [255, 255, 0],
            marquee: [0, 255, 0],
            thickness: 2,
            text_scale: 3,
        }
    }
}

fn color([r, g, b]: [u8; 3]) -> u32 {
    rgb(r, g, b)
}

fn paint(fb: &mut Frame, op: &DrawOp, ink: &InkStyle) {
    match op {
        DrawOp::Rectangle { a, b } => stroke_rect(fb, *a, *b, color(ink.rectangle), ink.thickness),
        DrawOp::Marquee { a, b } => stroke_rect(fb, *a, *b, color(ink.marquee), ink.thickness),
        DrawOp::Circle { center, radius } => {
            stroke_circle(fb, *center, *radius, color(ink.circle), ink.thickness)
        }
        DrawOp::Text { at, content } => {
            let (_, th) = text_size(content, ink.text_scale);
            draw_text(fb, at.x, at.y - th, content, color(ink.text), ink.text_scale);
        }
    }
}

pub struct Canvas {
    authoritative: Frame,
    preview: Option<Frame>,
    region: Option<Region>,
    ink: InkStyle,
}

impl Canvas {
    pub fn new(frame: Frame, ink: InkStyle) -> Self {
        Self {
            authoritative: frame,
            preview: None,
            region: None,
            ink,
        }
    }

    pub fn authoritative(&self) -> &Frame {
        &self.authoritative
    }

    pub fn preview(&self) -> Option<&Frame> {
        self.preview.as_ref()
    }

    pub fn region(&self) -> Option<Region> {
        self.region
    }

    /// Replace the document image (next camera frame). Any preview is
    /// dropped; the region survives only if it still fits.
    pub fn load(&mut self, frame: Frame) {
        if let Some(r) = self.region {
            if r.x2 > frame.width || r.y2 > frame.height {
                self.region = None;
            }
        }
        self.authoritative = frame;
        self.preview = None;
    }

    /// Render `op` over a fresh copy of the authoritative frame.
    pub fn apply_preview(&mut self, op: &DrawOp) -> &Frame {
        let mut fb = self.authoritative.clone();
        paint(&mut fb, op, &self.ink);
        self.preview.insert(fb)
    }

    /// Write `op` into the authoritative frame once and drop the preview.
    /// Marquees only ever preview; committing one just drops the preview.
    pub fn commit(&mut self, op: &DrawOp) {
        if !matches!(op, DrawOp::Marquee { .. }) {
            paint(&mut self.authoritative, op, &self.ink);
        }
        self.preview = None;
    }

    pub fn discard_preview(&mut self) {
        self.preview = None;
    }

    /// Turn a finished drag into the current region. A drag that clamps to
    /// nothing leaves the previous region in place.
    pub fn select_region(&mut self, a: Point, b: Point) -> Option<Region> {
        self.preview = None;
        let f = &self.authoritative;
        let region = Region::from_drag(a, b, f.width, f.height)?;
        self.region = Some(region);
        Some(region)
    }

    pub fn clear_region(&mut self) {
        self.region = None;
    }

    /// Owned copy of the pixels under `region`.
    pub fn crop(&self, region: &Region) -> Frame {
        let src = &self.authoritative;
        let mut pixels = Vec::with_capacity(region.width() * region.height());
        for y in region.y1..region.y2 {
            let row = y * src.width;
            pixels.extend_from_slice(&src.pixels[row + region.x1..row + region.x2]);
        }
        Frame {
            width: region.width(),
            height: region.height(),
            channels: src.channels,
            pixels,
        }
    }

    /// Clamp the rectangle between two corners and copy it out.
    pub fn extract_region(&self, a: Point, b: Point) -> Result<Frame, Error> {
        let f = &self.authoritative;
        let region = Region::from_drag(a, b, f.width, f.height).ok_or_else(|| {
            Error::EmptySelection(format!("({}, {})-({}, {}) has no area inside the image", a.x, a.y, b.x, b.y))
        })?;
        Ok(self.crop(&region))
    }

    /// The committed region and a copy of its pixels.
    pub fn selected_crop(&self) -> Result<(Region, Frame), Error> {
        let region = self
            .region
            .ok_or_else(|| Error::EmptySelection("drag a region on the image first".into()))?;
        Ok((region, self.crop(&region)))
    }

    /// Filtered copy of whatever is on screen right now (preview if a drag is
    /// in progress, the authoritative frame otherwise).
    pub fn apply_filter(&self, selection: FilterSelection) -> Frame {
        let base = self.preview.as_ref().unwrap_or(&self.authoritative);
        apply_filter(base, selection)
    }

    /// What the window should show: filtered base plus the outline of the
    /// committed region when no drag is in progress.
    pub fn compose(&self, selection: FilterSelection) -> Frame {
        let mut out = self.apply_filter(selection);
        if let (None, Some(r)) = (&self.preview, self.region) {
            let op = DrawOp::Marquee {
                a: Point::new(r.x1 as i32, r.y1 as i32),
                b: Point::new(r.x2 as i32 - 1, r.y2 as i32 - 1),
            };
            paint(&mut out, &op, &self.ink);
        }
        out
    }
}
