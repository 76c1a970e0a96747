// Windows: showing frames and collecting pointer/key input.
// The loop only talks to the `DisplaySink` trait; `MinifbDisplay` is the
// real on-screen implementation.

use log::warn;
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use crate::error::Error;
use crate::types::{Frame, Point};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyPress {
    Char(char),
    Enter,
    Space,
    Escape,
    Up,
    Down,
    Left,
    Right,
}

/// Input in viewport (window) coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    PointerDown(Point),
    PointerMove(Point),
    PointerUp(Point),
    Key(KeyPress),
}

pub trait DisplaySink {
    /// Show `frame` in the window called `title`. The main window takes input;
    /// any other title opens (or reuses) a secondary view-only window.
    fn present(&mut self, frame: &Frame, title: &str) -> Result<(), Error>;
    /// Keep windows responsive without pushing new pixels.
    fn pump(&mut self);
    /// Input gathered since the last call, oldest first.
    fn poll_events(&mut self) -> Vec<InputEvent>;
    /// False once the user closed the main window.
    fn is_open(&self) -> bool;
    /// Current drawable size of the main window.
    fn size(&self) -> (usize, usize);
}

pub struct MinifbDisplay {
    title: String,
    window: Window,             // the main window; input comes from here
    extra: Vec<(String, Window)>, // "Selected ROI", "Processed ROI", ...
    mouse_down: bool,
    last_pos: Option<Point>,
}

impl MinifbDisplay {
    /// Visual: a new empty window appears with the chosen title.
    pub fn new(title: &str, width: usize, height: usize, resizable: bool, target_fps: usize) -> Result<Self, Error> {
        let opts = WindowOptions {
            resize: resizable,
            ..WindowOptions::default()
        };
        let mut window = Window::new(title, width, height, opts).map_err(|e| Error::WindowInit(e.to_string()))?;
        window.set_target_fps(target_fps);
        Ok(Self {
            title: title.to_string(),
            window,
            extra: Vec::new(),
            mouse_down: false,
            last_pos: None,
        })
    }

    fn secondary(&mut self, title: &str, frame: &Frame) -> Result<&mut Window, Error> {
        self.extra.retain(|(_, w)| w.is_open());
        // A secondary window keeps the size of the first frame it showed.
        let pos = self
            .extra
            .iter()
            .position(|(t, w)| t == title && w.get_size() == (frame.width, frame.height));
        let idx = match pos {
            Some(i) => i,
            None => {
                self.extra.retain(|(t, _)| t != title);
                let w = Window::new(title, frame.width.max(1), frame.height.max(1), WindowOptions::default())
                    .map_err(|e| Error::WindowInit(e.to_string()))?;
                self.extra.push((title.to_string(), w));
                self.extra.len() - 1
            }
        };
        Ok(&mut self.extra[idx].1)
    }
}

fn map_key(key: Key) -> Option<KeyPress> {
    const LETTERS: [(Key, char); 26] = [
        (Key::A, 'a'), (Key::B, 'b'), (Key::C, 'c'), (Key::D, 'd'), (Key::E, 'e'),
        (Key::F, 'f'), (Key::G, 'g'), (Key::H, 'h'), (Key::I, 'i'), (Key::J, 'j'),
        (Key::K, 'k'), (Key::L, 'l'), (Key::M, 'm'), (Key::N, 'n'), (Key::O, 'o'),
        (Key::P, 'p'), (Key::Q, 'q'), (Key::R, 'r'), (Key::S, 's'), (Key::T, 't'),
        (Key::U, 'u'), (Key::V, 'v'), (Key::W, 'w'), (Key::X, 'x'), (Key::Y, 'y'),
        (Key::Z, 'z'),
    ];
    if let Some((_, c)) = LETTERS.iter().find(|(k, _)| *k == key) {
        return Some(KeyPress::Char(*c));
    }
    let press = match key {
        Key::Enter | Key::NumPadEnter => KeyPress::Enter,
        Key::Space => KeyPress::Space,
        Key::Escape => KeyPress::Escape,
        Key::Up => KeyPress::Up,
        Key::Down => KeyPress::Down,
        Key::Left => KeyPress::Left,
        Key::Right => KeyPress::Right,
        // '+' shares a key with '=' on most layouts
        Key::Equal | Key::NumPadPlus => KeyPress::Char('+'),
        Key::Minus | Key::NumPadMinus => KeyPress::Char('-'),
        Key::LeftBracket => KeyPress::Char('['),
        Key::RightBracket => KeyPress::Char(']'),
        _ => return None,
    };
    Some(press)
}

impl DisplaySink for MinifbDisplay {
    fn present(&mut self, frame: &Frame, title: &str) -> Result<(), Error> {
        let window = if title == self.title {
            &mut self.window
        } else {
            self.secondary(title, frame)?
        };
        window
            .update_with_buffer(&frame.pixels, frame.width, frame.height)
            .map_err(|e| Error::WindowUpdate(e.to_string()))
    }

    fn pump(&mut self) {
        self.window.update();
        for (title, w) in &mut self.extra {
            if w.is_open() {
                w.update();
            } else {
                warn!("{title} window closed");
            }
        }
        self.extra.retain(|(_, w)| w.is_open());
    }

    fn poll_events(&mut self) -> Vec<InputEvent> {
        let mut events: Vec<InputEvent> = self
            .window
            .get_keys_pressed(KeyRepeat::No)
            .into_iter()
            .filter_map(map_key)
            .map(InputEvent::Key)
            .collect();

        let pos = self
            .window
            .get_mouse_pos(MouseMode::Clamp)
            .map(|(x, y)| Point::new(x.max(0.0) as i32, y.max(0.0) as i32));
        let down = self.window.get_mouse_down(MouseButton::Left);

        if let Some(p) = pos {
            match (self.mouse_down, down) {
                (false, true) => events.push(InputEvent::PointerDown(p)),
                (true, true) if self.last_pos != Some(p) => events.push(InputEvent::PointerMove(p)),
                (true, false) => events.push(InputEvent::PointerUp(p)),
                _ => {}
            }
            self.last_pos = Some(p);
        }
        self.mouse_down = down;
        events
    }

    fn is_open(&self) -> bool {
        self.window.is_open()
    }

    fn size(&self) -> (usize, usize) {
        self.window.get_size()
    }
}
