// Clickable buttons drawn over the image.
//
// Widgets live in viewport (window) space. Layout is a pure function of the
// container width so it can simply be recomputed when the window resizes.

use serde::Deserialize;

use crate::mode::Command;
use crate::raster::{draw_line, draw_text, fill_rect, text_size};
use crate::types::{rgb, Frame, Point, Rect};

#[derive(Clone, Debug, PartialEq)]
pub struct Widget {
    pub rect: Rect,
    pub label: String,
    pub action: Command,
}

/// Button geometry and colors.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct WidgetStyle {
    pub width: i32,
    pub height: i32,
    pub margin: i32,
    pub fill: [u8; 3],
    pub border: [u8; 3],
    pub label: [u8; 3],
}

impl Default for WidgetStyle {
    fn default() -> Self {
        Self {
            width: 150,
            height: 30,
            margin: 10,
            fill: [200, 200, 200],
            border: [0, 0, 0],
            label: [0, 0, 0],
        }
    }
}

/// Lay buttons out left to right, one group per row. A row that does not fit
/// in `container_width` wraps onto extra rows; a button always gets at least
/// one slot per row, even if the window is narrower than the button.
pub fn layout(container_width: usize, rows: &[Vec<(&str, Command)>], style: &WidgetStyle) -> Vec<Widget> {
    let mut widgets = Vec::new();
    let step_x = style.width + style.margin;
    let step_y = style.height + style.margin;
    let mut y = style.margin;

    for row in rows.iter().filter(|r| !r.is_empty()) {
        let mut x = style.margin;
        for (label, action) in row {
            if x > style.margin && x + style.width > container_width as i32 {
                x = style.margin;
                y += step_y;
            }
            widgets.push(Widget {
                rect: Rect::new(x, y, style.width, style.height),
                label: (*label).to_string(),
                action: action.clone(),
            });
            x += step_x;
        }
        y += step_y;
    }
    widgets
}

/// First widget in layout order whose rectangle contains `point`.
pub fn hit_test(point: Point, widgets: &[Widget]) -> Option<&Widget> {
    widgets.iter().find(|w| w.rect.contains(point))
}

/// Copy of `frame` with every widget drawn on top: fill, 1 px border,
/// centered label. The input frame is left untouched.
pub fn render(frame: &Frame, widgets: &[Widget], style: &WidgetStyle) -> Frame {
    let mut out = frame.clone();
    let [fr, fg, fb] = style.fill;
    let [br, bg, bb] = style.border;
    let [lr, lg, lb] = style.label;
    let (fill, border, label) = (rgb(fr, fg, fb), rgb(br, bg, bb), rgb(lr, lg, lb));

    for w in widgets {
        let r = w.rect;
        fill_rect(&mut out, r, fill);
        let (x1, y1) = (r.x + r.w - 1, r.y + r.h - 1);
        draw_line(&mut out, r.x, r.y, x1, r.y, border);
        draw_line(&mut out, r.x, y1, x1, y1, border);
        draw_line(&mut out, r.x, r.y, r.x, y1, border);
        draw_line(&mut out, x1, r.y, x1, y1, border);

        let (tw, th) = text_size(&w.label, 1);
        draw_text(&mut out, r.x + (r.w - tw) / 2, r.y + (r.h - th) / 2, &w.label, label, 1);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::FilterSelection;

    fn camera_rows() -> Vec<Vec<(&'static str, Command)>> {
        vec![
            vec![
                ("Grayscale", Command::SelectFilter(FilterSelection::Grayscale)),
                ("Blur", Command::SelectFilter(FilterSelection::Blur)),
                ("Edge Detection", Command::SelectFilter(FilterSelection::Edge)),
                ("Sharpen", Command::SelectFilter(FilterSelection::Sharpen)),
            ],
            vec![("Save Frame", Command::SaveFrame), ("Quit", Command::Quit)],
        ]
    }

    #[test]
    fn layout_is_deterministic_and_row_based() {
        let style = WidgetStyle::default();
        let a = layout(640, &camera_rows(), &style);
        let b = layout(640, &camera_rows(), &style);
        assert_eq!(a, b);
        assert_eq!(a.len(), 6);
        assert_eq!(a[0].rect, Rect::new(10, 10, 150, 30));
        assert_eq!(a[3].rect, Rect::new(490, 10, 150, 30));
        assert_eq!(a[4].rect, Rect::new(10, 50, 150, 30));
        assert_eq!(a[5].rect, Rect::new(170, 50, 150, 30));
    }

    #[test]
    fn narrow_container_wraps() {
        let widgets = layout(400, &camera_rows(), &WidgetStyle::default());
        // Two fit in 400 px (10, 170); the third would end at 480.
        assert_eq!(widgets[2].rect, Rect::new(10, 50, 150, 30));
        assert_eq!(widgets[3].rect, Rect::new(170, 50, 150, 30));
        assert_eq!(widgets[4].rect.y, 90);
    }

    #[test]
    fn hit_test_finds_containing_widget() {
        let widgets = layout(640, &camera_rows(), &WidgetStyle::default());
        let hit = hit_test(Point::new(100, 20), &widgets).unwrap();
        assert_eq!(hit.label, "Grayscale");
        assert_eq!(hit_test(Point::new(200, 60), &widgets).unwrap().action, Command::Quit);
        // The margin between buttons belongs to nobody.
        assert!(hit_test(Point::new(165, 20), &widgets).is_none());
        assert!(hit_test(Point::new(300, 300), &widgets).is_none());
    }

    #[test]
    fn overlapping_widgets_resolve_to_first() {
        let widgets = vec![
            Widget { rect: Rect::new(0, 0, 50, 50), label: "A".into(), action: Command::SaveFrame },
            Widget { rect: Rect::new(25, 25, 50, 50), label: "B".into(), action: Command::Quit },
        ];
        assert_eq!(hit_test(Point::new(30, 30), &widgets).unwrap().label, "A");
        assert_eq!(hit_test(Point::new(60, 60), &widgets).unwrap().label, "B");
    }

    #[test]
    fn render_leaves_input_untouched() {
        let frame = Frame::filled(640, 120, rgb(1, 2, 3));
        let before = frame.clone();
        let style = WidgetStyle::default();
        let widgets = layout(640, &camera_rows(), &style);
        let out = render(&frame, &widgets, &style);
        assert_eq!(frame, before);
        assert_ne!(out, frame);
        assert_eq!(out.pixel(10, 10), rgb(0, 0, 0)); // border corner
        assert_eq!(out.pixel(12, 12), rgb(200, 200, 200)); // fill
        assert_eq!(out.pixel(5, 5), rgb(1, 2, 3)); // margin
    }
}
