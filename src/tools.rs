// The four interactive tools. They all run the same loop; a `Profile` only
// decides the window title, where frames come from, which buttons are
// shown and what each key does.

use crate::display::KeyPress;
use crate::filters::{Augmentation, FilterSelection};
use crate::mode::{Command, Shape, Tool};
use crate::settings::LabelerSettings;

pub type ButtonRows = Vec<Vec<(&'static str, Command)>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Profile {
    CameraOverlay,
    Labeler,
    Sketch,
    Crop,
}

impl Profile {
    pub fn title(self) -> &'static str {
        match self {
            Profile::CameraOverlay => "Camera Feed",
            Profile::Labeler => "Image",
            Profile::Sketch => "Canvas",
            Profile::Crop => "Select ROI",
        }
    }

    /// Live tools pull a new frame every cycle; the others load one image.
    pub fn live(self) -> bool {
        matches!(self, Profile::CameraOverlay)
    }

    pub fn resizable(self) -> bool {
        !self.live()
    }

    /// Static images go through scroll/zoom; the camera is shown 1:1.
    pub fn scrollable(self) -> bool {
        matches!(self, Profile::Labeler | Profile::Crop)
    }

    pub fn initial_tool(self) -> Option<Tool> {
        match self {
            Profile::CameraOverlay => None,
            Profile::Labeler | Profile::Crop => Some(Tool::Region),
            Profile::Sketch => Some(Tool::Shape(Shape::Rectangle)),
        }
    }

    pub fn buttons(self, steps: &LabelerSettings) -> ButtonRows {
        match self {
            Profile::CameraOverlay => vec![
                vec![
                    ("Grayscale", Command::SelectFilter(FilterSelection::Grayscale)),
                    ("Blur", Command::SelectFilter(FilterSelection::Blur)),
                    ("Edge Detection", Command::SelectFilter(FilterSelection::Edge)),
                    ("Sharpen", Command::SelectFilter(FilterSelection::Sharpen)),
                ],
                vec![
                    ("No Filter", Command::SelectFilter(FilterSelection::None)),
                    ("Save Frame", Command::SaveFrame),
                    ("Quit", Command::Quit),
                ],
            ],
            Profile::Labeler => vec![vec![
                ("Rotate", Command::Augment(Augmentation::Rotate45)),
                ("Grayscale", Command::Augment(Augmentation::Grayscale)),
                ("Bright -", Command::StepBrightness(-steps.brightness_step)),
                ("Bright +", Command::StepBrightness(steps.brightness_step)),
                ("Save", Command::SaveArtifacts),
            ]],
            Profile::Sketch | Profile::Crop => Vec::new(),
        }
    }

    pub fn key_command(self, key: KeyPress, steps: &LabelerSettings) -> Option<Command> {
        if matches!(key, KeyPress::Char('q') | KeyPress::Escape) {
            return Some(Command::Quit);
        }
        let pan = steps.pan_step;
        let command = match (self, key) {
            (Profile::CameraOverlay, KeyPress::Char(c)) => Command::SelectFilter(match c {
                'g' => FilterSelection::Grayscale,
                'b' => FilterSelection::Blur,
                'e' => FilterSelection::Edge,
                's' => FilterSelection::Sharpen,
                'n' => FilterSelection::None,
                _ => return None,
            }),

            (Profile::Labeler, KeyPress::Char('r')) => Command::Augment(Augmentation::Rotate45),
            (Profile::Labeler, KeyPress::Char('g')) => Command::Augment(Augmentation::Grayscale),
            (Profile::Labeler, KeyPress::Char('[')) => Command::StepBrightness(-steps.brightness_step),
            (Profile::Labeler, KeyPress::Char(']')) => Command::StepBrightness(steps.brightness_step),
            (Profile::Labeler, KeyPress::Char('s')) => Command::SaveArtifacts,

            (Profile::Labeler | Profile::Crop, KeyPress::Char('c')) => Command::ClearSelection,
            (Profile::Labeler | Profile::Crop, KeyPress::Char('+')) => Command::ZoomIn,
            (Profile::Labeler | Profile::Crop, KeyPress::Char('-')) => Command::ZoomOut,
            (Profile::Labeler | Profile::Crop, KeyPress::Left) => Command::Pan { dx: -pan, dy: 0 },
            (Profile::Labeler | Profile::Crop, KeyPress::Right) => Command::Pan { dx: pan, dy: 0 },
            (Profile::Labeler | Profile::Crop, KeyPress::Up) => Command::Pan { dx: 0, dy: -pan },
            (Profile::Labeler | Profile::Crop, KeyPress::Down) => Command::Pan { dx: 0, dy: pan },

            (Profile::Crop, KeyPress::Enter | KeyPress::Space) => Command::SaveCrop,

            (Profile::Sketch, KeyPress::Char('r')) => Command::SelectTool(Tool::Shape(Shape::Rectangle)),
            (Profile::Sketch, KeyPress::Char('c')) => Command::SelectTool(Tool::Shape(Shape::Circle)),
            (Profile::Sketch, KeyPress::Char('t')) => Command::SelectTool(Tool::Text),

            _ => return None,
        };
        Some(command)
    }
}
