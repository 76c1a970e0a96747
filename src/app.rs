// The interaction loop shared by every tool.
//
// One cycle: get a frame (live tools) or reuse the loaded image, redraw if
// anything changed, then feed every pending input event through the widget
// layer and the session. The loop owns nothing platform specific; frames,
// windows and files come in through the three traits.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use log::{debug, error, info, warn};

use crate::artifacts::{write_crop_report, ArtifactSet};
use crate::canvas::Canvas;
use crate::detect::{render_detections, MarkerDetector, NoMarkers};
use crate::display::{DisplaySink, InputEvent};
use crate::error::Error;
use crate::filters::{augment, Augmentation};
use crate::mapper::Viewport;
use crate::mode::{Command, Pointer, Reaction, Session, Shape, Tool};
use crate::raster::draw_text_shadowed;
use crate::settings::Settings;
use crate::sink::PersistenceSink;
use crate::source::FrameSource;
use crate::tools::Profile;
use crate::types::{rgb, Frame, Point};
use crate::widget::{hit_test, layout, render, Widget};

pub const SELECTED_WINDOW: &str = "Selected ROI";
pub const PROCESSED_WINDOW: &str = "Processed ROI";
pub const BRIGHTNESS_WINDOW: &str = "Brightness Adjusted ROI";
pub const CROPPED_WINDOW: &str = "Cropped Image";

const MIN_ZOOM: f32 = 0.05;
const MAX_ZOOM: f32 = 32.0;
const MAX_BRIGHTNESS: i16 = 100;

/// Why `App::run` returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopExit {
    Quit,
    SourceExhausted,
    WindowClosed,
}

enum Flow {
    Continue,
    Quit,
}

struct FpsCounter {
    since: Instant,
    frames: u32,
    fps: f32,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            since: Instant::now(),
            frames: 0,
            fps: 0.0,
        }
    }

    fn tick(&mut self) {
        self.frames += 1;
        let elapsed = self.since.elapsed();
        if elapsed >= Duration::from_secs(1) {
            self.fps = self.frames as f32 / elapsed.as_secs_f32();
            info!("FPS: {:.1}", self.fps);
            self.frames = 0;
            self.since = Instant::now();
        }
    }
}

pub struct App {
    profile: Profile,
    settings: Settings,
    session: Session,
    canvas: Option<Canvas>,
    viewport: Viewport,
    widgets: Vec<Widget>,
    layout_width: Option<usize>,
    detector: Box<dyn MarkerDetector>,
    brightness: i16,
    saved_frames: u32,
    dirty: bool,
    fps: FpsCounter,
}

impl App {
    pub fn new(profile: Profile, settings: Settings) -> Result<Self, Error> {
        let viewport = if profile.scrollable() {
            Viewport::new(Point::new(0, 0), settings.labeler.zoom)?
        } else {
            Viewport::default()
        };
        Ok(Self {
            profile,
            session: Session::new(profile.initial_tool(), settings.draw.text.clone()),
            settings,
            canvas: None,
            viewport,
            widgets: Vec::new(),
            layout_width: None,
            detector: Box::new(NoMarkers),
            brightness: 0,
            saved_frames: 0,
            dirty: true,
            fps: FpsCounter::new(),
        })
    }

    pub fn with_detector(mut self, detector: Box<dyn MarkerDetector>) -> Self {
        self.detector = detector;
        self
    }

    pub fn canvas(&self) -> Option<&Canvas> {
        self.canvas.as_ref()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Current labeler brightness offset.
    pub fn brightness(&self) -> i16 {
        self.brightness
    }

    pub fn run<S, D, K>(&mut self, source: &mut S, display: &mut D, sink: &mut K) -> Result<LoopExit, Error>
    where
        S: FrameSource + ?Sized,
        D: DisplaySink + ?Sized,
        K: PersistenceSink + ?Sized,
    {
        let budget = self.settings.camera.max_frame_failures.max(1);
        let mut failures = 0;
        info!("{} started", self.profile.title());

        loop {
            if !display.is_open() {
                info!("Window closed");
                return Ok(LoopExit::WindowClosed);
            }

            let mut acquired = true;
            if self.profile.live() || self.canvas.is_none() {
                let next = source.next_frame().and_then(|frame| match frame {
                    Some(f) if f.is_empty() => Err(Error::FrameAcquisition("source delivered an empty frame".into())),
                    other => Ok(other),
                });
                match next {
                    Ok(Some(frame)) => {
                        failures = 0;
                        self.load(frame);
                    }
                    Ok(None) => {
                        info!("Frame source exhausted");
                        return Ok(LoopExit::SourceExhausted);
                    }
                    Err(e) if e.is_recoverable() => {
                        failures += 1;
                        warn!("{e} ({failures}/{budget})");
                        if failures >= budget {
                            error!("No frame after {budget} attempts, stopping");
                            return Ok(LoopExit::SourceExhausted);
                        }
                        acquired = false;
                    }
                    Err(e) => return Err(e),
                }
            }

            // Input is still handled while grabs fail, so quitting never waits
            // for the failure budget.
            if acquired && self.dirty {
                self.redraw(display)?;
                self.dirty = false;
            } else {
                display.pump();
            }

            for event in display.poll_events() {
                if let Flow::Quit = self.dispatch(event, display, sink)? {
                    info!("Quit requested");
                    return Ok(LoopExit::Quit);
                }
            }
        }
    }

    fn load(&mut self, frame: Frame) {
        match &mut self.canvas {
            Some(canvas) => canvas.load(frame),
            None => {
                debug!("first frame {}x{}", frame.width, frame.height);
                self.canvas = Some(Canvas::new(frame, self.settings.ink.clone()));
            }
        }
        self.dirty = true;
    }

    fn redraw<D: DisplaySink + ?Sized>(&mut self, display: &mut D) -> Result<(), Error> {
        let Some(canvas) = &self.canvas else {
            return Ok(());
        };
        let mut shown = canvas.compose(self.session.filter());
        let found = self.detector.detect(canvas.authoritative());
        if !found.is_empty() {
            let [r, g, b] = self.settings.ink.marquee;
            shown = render_detections(&shown, &found, rgb(r, g, b));
        }

        let (w, h) = display.size();
        if self.profile.scrollable() {
            self.viewport.clamp_scroll(image_size(canvas), (w, h));
        }
        let [r, g, b] = self.settings.window.background;
        let view = self.viewport.project(&shown, w, h, rgb(r, g, b));

        if self.layout_width != Some(w) {
            let rows = self.profile.buttons(&self.settings.labeler);
            self.widgets = layout(w, &rows, &self.settings.widgets);
            self.layout_width = Some(w);
            debug!("laid out {} widgets for width {w}", self.widgets.len());
        }
        let mut view = render(&view, &self.widgets, &self.settings.widgets);

        if self.profile.live() {
            self.fps.tick();
        }
        let hud = self.hud_text();
        draw_text_shadowed(&mut view, 8, h as i32 - 15, &hud, rgb(255, 255, 255));

        display.present(&view, self.profile.title())
    }

    fn hud_text(&self) -> String {
        let tool = match self.session.tool() {
            None => "-",
            Some(Tool::Region) => "region",
            Some(Tool::Shape(Shape::Rectangle)) => "rectangle",
            Some(Tool::Shape(Shape::Circle)) => "circle",
            Some(Tool::Text) => "text",
        };
        let mut hud = format!(
            "{} | tool: {tool} | filter: {}",
            self.session.mode().label(),
            self.session.filter()
        );
        if self.profile.live() {
            hud.push_str(&format!(" | FPS: {:.1}", self.fps.fps));
        }
        hud
    }

    fn dispatch<D, K>(&mut self, event: InputEvent, display: &mut D, sink: &mut K) -> Result<Flow, Error>
    where
        D: DisplaySink + ?Sized,
        K: PersistenceSink + ?Sized,
    {
        let pointer = match event {
            InputEvent::Key(key) => {
                return match self.profile.key_command(key, &self.settings.labeler) {
                    Some(command) => self.command(command, display, sink),
                    None => Ok(Flow::Continue),
                };
            }
            InputEvent::PointerDown(p) => {
                if let Some(widget) = hit_test(p, &self.widgets) {
                    debug!("clicked {}", widget.label);
                    let command = widget.action.clone();
                    return self.command(command, display, sink);
                }
                Pointer::Down(self.to_image(p))
            }
            InputEvent::PointerMove(p) => Pointer::Move(self.to_image(p)),
            InputEvent::PointerUp(p) => Pointer::Up(self.to_image(p)),
        };
        let Some(canvas) = self.canvas.as_mut() else {
            return Ok(Flow::Continue);
        };
        let reaction = self.session.on_pointer(pointer, canvas);
        self.react(reaction, display, sink)
    }

    fn to_image(&self, p: Point) -> Point {
        self.viewport.to_image(p).to_pixel()
    }

    fn command<D, K>(&mut self, command: Command, display: &mut D, sink: &mut K) -> Result<Flow, Error>
    where
        D: DisplaySink + ?Sized,
        K: PersistenceSink + ?Sized,
    {
        let Some(canvas) = self.canvas.as_mut() else {
            // Nothing loaded yet; only quitting makes sense.
            return Ok(match command {
                Command::Quit => Flow::Quit,
                _ => Flow::Continue,
            });
        };
        let reaction = self.session.on_command(command, canvas);
        self.react(reaction, display, sink)
    }

    fn react<D, K>(&mut self, reaction: Reaction, display: &mut D, sink: &mut K) -> Result<Flow, Error>
    where
        D: DisplaySink + ?Sized,
        K: PersistenceSink + ?Sized,
    {
        match reaction {
            Reaction::Nothing => {}
            Reaction::Redraw => self.dirty = true,
            Reaction::RegionCommitted(region) => {
                self.dirty = true;
                if let (Profile::Labeler, Some(canvas)) = (self.profile, &self.canvas) {
                    display.present(&canvas.crop(&region), SELECTED_WINDOW)?;
                }
            }
            Reaction::Perform(command) => {
                let result = self.perform(command, display, sink);
                report(result)?;
            }
            Reaction::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Commands that reach past the session: files, windows, the viewport.
    fn perform<D, K>(&mut self, command: Command, display: &mut D, sink: &mut K) -> Result<(), Error>
    where
        D: DisplaySink + ?Sized,
        K: PersistenceSink + ?Sized,
    {
        let Some(canvas) = &self.canvas else {
            return Ok(());
        };
        let dir = self.settings.output.dir.as_path();
        let ext = self.settings.image_extension();

        match command {
            Command::SaveFrame => {
                let frame = canvas.apply_filter(self.session.filter());
                let secs = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or_default();
                self.saved_frames += 1;
                let path = dir.join(format!("frame_{secs}_{}.{ext}", self.saved_frames));
                sink.save_frame(&path, &frame)?;
                info!("Frame saved to {}", path.display());
            }
            Command::SaveArtifacts => {
                let (_, crop) = canvas.selected_crop()?;
                let report = ArtifactSet::derive(crop).write(dir, ext, sink);
                report.log();
                if !report.all_ok() {
                    warn!("{} of {} artifacts were not saved", report.failures().count(), report.outcomes.len());
                }
            }
            Command::SaveCrop => {
                let (region, crop) = canvas.selected_crop()?;
                let report = write_crop_report(&crop, &region, dir, ext, sink);
                report.log();
                if report.all_ok() {
                    display.present(&crop, CROPPED_WINDOW)?;
                }
            }
            Command::Augment(aug) => {
                let (_, crop) = canvas.selected_crop()?;
                display.present(&augment(&crop, aug), PROCESSED_WINDOW)?;
            }
            Command::StepBrightness(delta) => {
                self.brightness = (self.brightness + delta).clamp(-MAX_BRIGHTNESS, MAX_BRIGHTNESS);
                info!("Brightness: {}", self.brightness);
                let (_, crop) = canvas.selected_crop()?;
                let adjusted = augment(&crop, Augmentation::Brightness(self.brightness));
                display.present(&adjusted, BRIGHTNESS_WINDOW)?;
            }
            Command::Pan { dx, dy } => {
                self.viewport.pan(dx, dy);
                self.viewport.clamp_scroll(image_size(canvas), display.size());
                self.dirty = true;
            }
            Command::ZoomIn | Command::ZoomOut => {
                let step = self.settings.labeler.zoom_step;
                let zoom = match command {
                    Command::ZoomIn => self.viewport.zoom() * step,
                    _ => self.viewport.zoom() / step,
                };
                self.viewport.set_zoom(zoom.clamp(MIN_ZOOM, MAX_ZOOM))?;
                self.viewport.clamp_scroll(image_size(canvas), display.size());
                info!("Zoom: {:.2}", self.viewport.zoom());
                self.dirty = true;
            }
            Command::SelectTool(_) | Command::SelectFilter(_) | Command::ClearSelection | Command::Quit => {
                debug!("{command:?} is handled by the session");
            }
        }
        Ok(())
    }
}

fn image_size(canvas: &Canvas) -> (usize, usize) {
    let f = canvas.authoritative();
    (f.width, f.height)
}

/// Log errors the loop can live with and pass the rest up.
fn report(result: Result<(), Error>) -> Result<(), Error> {
    match result {
        Ok(()) => Ok(()),
        Err(e @ Error::EmptySelection(_)) => {
            warn!("{e}");
            Ok(())
        }
        Err(e) if e.is_recoverable() => {
            error!("{e}");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::KeyPress;
    use crate::filters::{grayscale, FilterSelection};
    use crate::source::Still;
    use crate::types::Channels;
    use std::collections::VecDeque;
    use std::path::{Path, PathBuf};

    #[derive(Default)]
    struct Script {
        batches: VecDeque<Vec<InputEvent>>,
        presented: Vec<(String, Frame)>,
        size: (usize, usize),
    }

    impl DisplaySink for Script {
        fn present(&mut self, frame: &Frame, title: &str) -> Result<(), Error> {
            self.presented.push((title.to_string(), frame.clone()));
            Ok(())
        }
        fn pump(&mut self) {}
        fn poll_events(&mut self) -> Vec<InputEvent> {
            self.batches.pop_front().unwrap_or_default()
        }
        fn is_open(&self) -> bool {
            !self.batches.is_empty()
        }
        fn size(&self) -> (usize, usize) {
            self.size
        }
    }

    #[derive(Default)]
    struct Paths(Vec<PathBuf>);

    impl PersistenceSink for Paths {
        fn save_frame(&mut self, path: &Path, _frame: &Frame) -> Result<(), Error> {
            self.0.push(path.into());
            Ok(())
        }
        fn save_text(&mut self, path: &Path, _text: &str) -> Result<(), Error> {
            self.0.push(path.into());
            Ok(())
        }
    }

    /// Keeps what was written, for checking pixels.
    #[derive(Default)]
    struct Kept(Vec<(PathBuf, Frame)>);

    impl PersistenceSink for Kept {
        fn save_frame(&mut self, path: &Path, frame: &Frame) -> Result<(), Error> {
            self.0.push((path.into(), frame.clone()));
            Ok(())
        }
        fn save_text(&mut self, _path: &Path, _text: &str) -> Result<(), Error> {
            Ok(())
        }
    }

    struct Flaky(u32);

    impl FrameSource for Flaky {
        fn next_frame(&mut self) -> Result<Option<Frame>, Error> {
            self.0 += 1;
            Err(Error::FrameAcquisition(format!("attempt {}", self.0)))
        }
    }

    fn script(size: (usize, usize), batches: Vec<Vec<InputEvent>>) -> Script {
        Script {
            batches: batches.into(),
            size,
            ..Script::default()
        }
    }

    #[test]
    fn camera_gives_up_after_failure_budget() {
        let mut app = App::new(Profile::CameraOverlay, Settings::default()).unwrap();
        let mut display = script((64, 48), vec![vec![]; 100]);
        let mut source = Flaky(0);
        let exit = app.run(&mut source, &mut display, &mut Paths::default()).unwrap();
        assert_eq!(exit, LoopExit::SourceExhausted);
        assert_eq!(source.0, 30);
        assert!(display.presented.is_empty());
    }

    #[test]
    fn quit_is_heard_while_frames_keep_failing() {
        let mut app = App::new(Profile::CameraOverlay, Settings::default()).unwrap();
        let mut display = script((64, 48), vec![vec![InputEvent::Key(KeyPress::Char('q'))]; 100]);
        let mut source = Flaky(0);
        let exit = app.run(&mut source, &mut display, &mut Paths::default()).unwrap();
        assert_eq!(exit, LoopExit::Quit);
        assert_eq!(source.0, 1);
    }

    #[test]
    fn filter_key_changes_only_the_display() {
        let mut app = App::new(Profile::CameraOverlay, Settings::default()).unwrap();
        let mut display = script((40, 30), vec![vec![InputEvent::Key(KeyPress::Char('e'))], vec![]]);
        let mut source = Still::new(Frame::filled(40, 30, rgb(90, 90, 90)));
        // The camera tool is live, so a one-shot source ends the loop.
        let exit = app.run(&mut source, &mut display, &mut Paths::default()).unwrap();
        assert_eq!(exit, LoopExit::SourceExhausted);
        assert_eq!(app.session().filter(), FilterSelection::Edge);
        assert!(app.canvas().unwrap().authoritative().pixels.iter().all(|&p| p == rgb(90, 90, 90)));
    }

    #[test]
    fn widget_click_runs_its_command() {
        let mut app = App::new(Profile::CameraOverlay, Settings::default()).unwrap();
        // Quit is third in the second row: x 330..480, y 50..80.
        let mut display = script((640, 480), vec![vec![InputEvent::PointerDown(Point::new(400, 60))]]);
        let mut source = Still::blank(640, 480);
        let exit = app.run(&mut source, &mut display, &mut Paths::default()).unwrap();
        assert_eq!(exit, LoopExit::Quit);
        assert_eq!(display.presented[0].0, "Camera Feed");
    }

    #[test]
    fn save_frame_button_writes_the_filtered_frame() {
        let mut app = App::new(Profile::CameraOverlay, Settings::default()).unwrap();
        // Save Frame is second in the second row: x 170..320, y 50..80.
        let mut display = script(
            (640, 480),
            vec![vec![InputEvent::Key(KeyPress::Char('g')), InputEvent::PointerDown(Point::new(200, 60))]],
        );
        let src = Frame::filled(640, 480, rgb(30, 60, 90));
        let mut sink = Kept::default();
        let exit = app.run(&mut Still::new(src.clone()), &mut display, &mut sink).unwrap();
        assert_eq!(exit, LoopExit::WindowClosed);

        assert_eq!(sink.0.len(), 1);
        let (path, saved) = &sink.0[0];
        let name = path.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("frame_") && name.ends_with("_1.png"), "{name}");
        // No buttons or status line, just the grayscale image.
        assert_eq!(saved, &grayscale(&src));
        assert!(saved.pixels.iter().all(|&p| p == rgb(54, 54, 54)));
    }

    #[test]
    fn augmentations_show_the_selected_crop() {
        let mut app = App::new(Profile::Labeler, Settings::default()).unwrap();
        let mut display = script(
            (640, 480),
            vec![
                vec![
                    InputEvent::PointerDown(Point::new(100, 100)),
                    InputEvent::PointerMove(Point::new(140, 120)),
                    InputEvent::PointerUp(Point::new(140, 120)),
                ],
                vec![
                    InputEvent::Key(KeyPress::Char('r')),
                    InputEvent::Key(KeyPress::Char('g')),
                    InputEvent::Key(KeyPress::Char(']')),
                ],
            ],
        );
        let src = Frame::filled(640, 480, rgb(250, 5, 128));
        app.run(&mut Still::new(src.clone()), &mut display, &mut Paths::default()).unwrap();

        let shown = |title: &str| -> Vec<Frame> {
            display.presented.iter().filter(|(t, _)| t == title).map(|(_, f)| f.clone()).collect()
        };
        let processed = shown(PROCESSED_WINDOW);
        assert_eq!(processed.len(), 2);

        let rotated = &processed[0];
        assert_eq!((rotated.width, rotated.height), (40, 20));
        assert_eq!(rotated.pixel(20, 10), rgb(250, 5, 128));
        assert_eq!(rotated.pixel(0, 0), 0);

        assert_eq!(processed[1].channels, Channels::Gray);
        assert!(processed[1].pixels.iter().all(|&p| p == rgb(92, 92, 92)));

        let brighter = shown(BRIGHTNESS_WINDOW);
        assert_eq!(brighter.len(), 1);
        assert_eq!(app.brightness(), 10);
        assert!(brighter[0].pixels.iter().all(|&p| p == rgb(255, 15, 138)));

        // The loaded image is never modified by an augmentation.
        assert_eq!(app.canvas().unwrap().authoritative(), &src);
    }

    #[test]
    fn pan_is_clamped_before_the_next_pointer_event() {
        let mut app = App::new(Profile::Crop, Settings::default()).unwrap();
        let mut display = script(
            (200, 200),
            vec![vec![
                InputEvent::Key(KeyPress::Left),
                InputEvent::Key(KeyPress::Right),
                InputEvent::PointerDown(Point::new(10, 10)),
                InputEvent::PointerMove(Point::new(50, 30)),
                InputEvent::PointerUp(Point::new(50, 30)),
            ]],
        );
        app.run(&mut Still::blank(400, 400), &mut display, &mut Paths::default()).unwrap();
        // Left from the origin stays at 0, so Right lands one step in.
        assert_eq!(app.viewport().scroll(), Point::new(40, 0));
        let region = app.canvas().unwrap().region().unwrap();
        assert_eq!((region.x1, region.y1, region.x2, region.y2), (50, 10, 90, 30));
    }

    #[test]
    fn labeler_saves_nothing_without_a_region() {
        let mut app = App::new(Profile::Labeler, Settings::default()).unwrap();
        let mut display = script((100, 100), vec![vec![InputEvent::Key(KeyPress::Char('s'))], vec![]]);
        let mut sink = Paths::default();
        let exit = app.run(&mut Still::blank(100, 100), &mut display, &mut sink).unwrap();
        assert_eq!(exit, LoopExit::WindowClosed);
        assert!(sink.0.is_empty());
    }

    #[test]
    fn brightness_is_bounded() {
        let mut app = App::new(Profile::Labeler, Settings::default()).unwrap();
        let ups = vec![InputEvent::Key(KeyPress::Char(']')); 15];
        let mut display = script((100, 100), vec![ups]);
        app.run(&mut Still::blank(100, 100), &mut display, &mut Paths::default()).unwrap();
        assert_eq!(app.brightness(), 100);
    }

    #[test]
    fn zoom_changes_pointer_mapping() {
        let mut app = App::new(Profile::Crop, Settings::default()).unwrap();
        let mut display = script(
            (200, 200),
            vec![
                vec![InputEvent::Key(KeyPress::Char('+'))],
                vec![
                    InputEvent::PointerDown(Point::new(50, 50)),
                    InputEvent::PointerMove(Point::new(100, 100)),
                    InputEvent::PointerUp(Point::new(100, 100)),
                    InputEvent::Key(KeyPress::Enter),
                ],
            ],
        );
        let mut sink = Paths::default();
        app.run(&mut Still::blank(200, 200), &mut display, &mut sink).unwrap();
        assert_eq!(app.viewport().zoom(), 1.25);
        let region = app.canvas().unwrap().region().unwrap();
        assert_eq!((region.x1, region.y1, region.x2, region.y2), (40, 40, 80, 80));
        let names: Vec<String> = sink.0.iter().map(|p| p.file_name().unwrap().to_string_lossy().into_owned()).collect();
        assert_eq!(names, ["cropped_image.png", "roi_data.txt"]);
        assert_eq!(display.presented.last().unwrap().0, CROPPED_WINDOW);
    }
}
