// Interaction modes and the state machine that moves between them.
//
// Every input (pointer event, key, widget click) ends up in one of the two
// `Session::on_*` methods together with the canvas it acts on. Nothing is
// captured ahead of time, so handlers always see the current buffer.

use log::{debug, info};

use crate::canvas::{Canvas, DrawOp};
use crate::filters::{Augmentation, FilterSelection};
use crate::types::{Point, Region};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    Rectangle,
    Circle,
}

/// Which drawing tool a pointer drag uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tool {
    Region,
    Shape(Shape),
    Text,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Idle,
    DraggingRegion { start: Point },
    DraggingShape { shape: Shape, start: Point },
    PlacingText { start: Point },
}

impl Mode {
    pub fn is_dragging(&self) -> bool {
        !matches!(self, Mode::Idle)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Mode::Idle => "IDLE",
            Mode::DraggingRegion { .. } => "SELECTING",
            Mode::DraggingShape { .. } => "DRAWING",
            Mode::PlacingText { .. } => "TEXT",
        }
    }
}

/// Everything a key press or widget click can ask for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    SelectTool(Tool),
    SelectFilter(FilterSelection),
    Augment(Augmentation),
    /// Move the labeler's brightness offset by this much and show the result.
    StepBrightness(i16),
    ClearSelection,
    Pan { dx: i32, dy: i32 },
    ZoomIn,
    ZoomOut,
    SaveFrame,
    SaveArtifacts,
    SaveCrop,
    Quit,
}

/// Pointer events in image space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pointer {
    Down(Point),
    Move(Point),
    Up(Point),
}

/// What the interaction loop has to do after an event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reaction {
    Nothing,
    Redraw,
    RegionCommitted(Region),
    /// Needs something the state machine does not own (sink, viewport,
    /// secondary windows).
    Perform(Command),
    Quit,
}

/// Per-document interaction state.
pub struct Session {
    mode: Mode,
    tool: Option<Tool>,
    filter: FilterSelection,
    text: String,
    deferred: Vec<Command>,
}

impl Session {
    /// `tool` is `None` for tools that only take widget clicks.
    pub fn new(tool: Option<Tool>, text: impl Into<String>) -> Self {
        Self {
            mode: Mode::Idle,
            tool,
            filter: FilterSelection::None,
            text: text.into(),
            deferred: Vec::new(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn tool(&self) -> Option<Tool> {
        self.tool
    }

    pub fn filter(&self) -> FilterSelection {
        self.filter
    }

    pub fn on_pointer(&mut self, event: Pointer, canvas: &mut Canvas) -> Reaction {
        match (self.mode, event) {
            (Mode::Idle, Pointer::Down(p)) => {
                self.mode = match self.tool {
                    Some(Tool::Region) => Mode::DraggingRegion { start: p },
                    Some(Tool::Shape(shape)) => Mode::DraggingShape { shape, start: p },
                    Some(Tool::Text) => Mode::PlacingText { start: p },
                    None => return Reaction::Nothing,
                };
                debug!("pointer down at {p:?}: {:?}", self.mode);
                Reaction::Nothing
            }
            (Mode::Idle, _) => Reaction::Nothing,
            (_, Pointer::Down(_)) => Reaction::Nothing,

            (Mode::DraggingRegion { start }, Pointer::Move(p)) => {
                canvas.apply_preview(&DrawOp::Marquee { a: start, b: p });
                Reaction::Redraw
            }
            (Mode::DraggingShape { shape, start }, Pointer::Move(p)) => {
                canvas.apply_preview(&shape_op(shape, start, p));
                Reaction::Redraw
            }
            (Mode::PlacingText { .. }, Pointer::Move(_)) => Reaction::Nothing,

            (Mode::DraggingRegion { start }, Pointer::Up(p)) => {
                let reaction = match canvas.select_region(start, p) {
                    Some(region) => {
                        info!("Region selected: ({}, {})-({}, {})", region.x1, region.y1, region.x2, region.y2);
                        Reaction::RegionCommitted(region)
                    }
                    None => {
                        debug!("empty region drag ignored");
                        Reaction::Redraw
                    }
                };
                self.finish(canvas);
                reaction
            }
            (Mode::DraggingShape { shape, start }, Pointer::Up(p)) => {
                if start == p {
                    debug!("zero-size {shape:?} ignored");
                    canvas.discard_preview();
                } else {
                    canvas.commit(&shape_op(shape, start, p));
                }
                self.finish(canvas);
                Reaction::Redraw
            }
            (Mode::PlacingText { .. }, Pointer::Up(p)) => {
                if !self.text.is_empty() {
                    canvas.commit(&DrawOp::Text {
                        at: p,
                        content: self.text.clone(),
                    });
                }
                self.finish(canvas);
                Reaction::Redraw
            }
        }
    }

    /// The single place every command is decided. Tool and filter switches
    /// that arrive mid-drag wait until the drag ends.
    pub fn on_command(&mut self, command: Command, canvas: &mut Canvas) -> Reaction {
        match command {
            Command::SelectTool(_) | Command::SelectFilter(_) if self.mode.is_dragging() => {
                debug!("deferring {command:?} until the drag ends");
                self.deferred.push(command);
                Reaction::Nothing
            }
            Command::SelectTool(tool) => {
                info!("Tool set to: {tool:?}");
                self.tool = Some(tool);
                Reaction::Redraw
            }
            Command::SelectFilter(filter) => {
                info!("Filter set to: {filter}");
                self.filter = filter;
                Reaction::Redraw
            }
            Command::ClearSelection => {
                canvas.clear_region();
                Reaction::Redraw
            }
            Command::Quit => Reaction::Quit,
            Command::Augment(_)
            | Command::StepBrightness(_)
            | Command::Pan { .. }
            | Command::ZoomIn
            | Command::ZoomOut
            | Command::SaveFrame
            | Command::SaveArtifacts
            | Command::SaveCrop => Reaction::Perform(command),
        }
    }

    fn finish(&mut self, canvas: &mut Canvas) {
        self.mode = Mode::Idle;
        for command in std::mem::take(&mut self.deferred) {
            self.on_command(command, canvas);
        }
    }
}

fn shape_op(shape: Shape, start: Point, end: Point) -> DrawOp {
    match shape {
        Shape::Rectangle => DrawOp::Rectangle { a: start, b: end },
        Shape::Circle => {
            let dx = (end.x - start.x) as f64;
            let dy = (end.y - start.y) as f64;
            DrawOp::Circle {
                center: start,
                radius: (dx * dx + dy * dy).sqrt() as i32,
            }
        }
    }
}
