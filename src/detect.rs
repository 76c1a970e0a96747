// Marker overlay for the camera tool. Detection itself is pluggable; this
// module only defines the seam and draws whatever a detector reports.

use crate::raster::{draw_text_shadowed, stroke_polygon};
use crate::types::{Frame, Point};

/// One detected marker: its id and its corner polygon in image space.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetectedRegion {
    pub id: u32,
    pub corners: Vec<Point>,
}

pub trait MarkerDetector {
    fn detect(&self, frame: &Frame) -> Vec<DetectedRegion>;
}

/// Detector that never finds anything (default for the camera tool).
#[derive(Debug, Default)]
pub struct NoMarkers;

impl MarkerDetector for NoMarkers {
    fn detect(&self, _frame: &Frame) -> Vec<DetectedRegion> {
        Vec::new()
    }
}

/// Copy of `frame` with each region outlined and labelled with its id.
pub fn render_detections(frame: &Frame, regions: &[DetectedRegion], color: u32) -> Frame {
    let mut out = frame.clone();
    for r in regions {
        stroke_polygon(&mut out, &r.corners, color);
        if let Some(first) = r.corners.first() {
            draw_text_shadowed(&mut out, first.x, first.y - 10, &format!("ID {}", r.id), color);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::rgb;

    struct FixedSquare;

    impl MarkerDetector for FixedSquare {
        fn detect(&self, _frame: &Frame) -> Vec<DetectedRegion> {
            vec![DetectedRegion {
                id: 3,
                corners: vec![Point::new(20, 20), Point::new(40, 20), Point::new(40, 40), Point::new(20, 40)],
            }]
        }
    }

    #[test]
    fn overlay_outlines_without_touching_input() {
        let frame = Frame::filled(64, 64, 0);
        let found = FixedSquare.detect(&frame);
        let out = render_detections(&frame, &found, rgb(0, 255, 0));
        assert!(frame.pixels.iter().all(|&p| p == 0));
        assert_eq!(out.pixel(30, 20), rgb(0, 255, 0));
        assert_eq!(out.pixel(40, 30), rgb(0, 255, 0));
        assert_eq!(out.pixel(30, 30), 0);
        assert!(NoMarkers.detect(&frame).is_empty());
    }
}
