// roi-canvas: pick a tool on the command line, everything else is the
// shared interaction loop.
//
//   roi-canvas camera            live feed + filter buttons (g/b/e/s/n, q)
//   roi-canvas label <image>     drag a region, r/g/[ ] to augment, s to save
//   roi-canvas draw              r/c/t pick rectangle/circle/text, drag to draw
//   roi-canvas crop <image>      drag a region, Enter/Space to save, c to retry

use clap::Parser;
use env_logger::Env;
use log::info;

use roi_canvas::app::{App, LoopExit};
use roi_canvas::camera::CameraCapture;
use roi_canvas::cli::{CliArgs, ToolCommand};
use roi_canvas::display::MinifbDisplay;
use roi_canvas::error::Error;
use roi_canvas::settings::{load_config, Settings};
use roi_canvas::sink::DiskSink;
use roi_canvas::source::{FrameSource, Still};
use roi_canvas::tools::Profile;

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = CliArgs::parse();
    let (file, _) = load_config(args.config.as_deref())?;
    let settings = Settings::resolve(file, &args.overrides())?;

    /* --- Frame source + window size ---
       The camera decides its own size; images open at their size, capped
       to the configured maximum (scroll/zoom reach the rest). */
    let (profile, mut source, (width, height)): (Profile, Box<dyn FrameSource>, (usize, usize)) = match &args.tool {
        ToolCommand::Camera { .. } => {
            let c = &settings.camera;
            let cam = CameraCapture::new(c.index, c.width, c.height)?;
            let (w, h) = cam.resolution();
            (Profile::CameraOverlay, Box::new(cam) as Box<dyn FrameSource>, (w as usize, h as usize))
        }
        ToolCommand::Label { image } | ToolCommand::Crop { image } => {
            let still = Still::open(image)?;
            let (w, h) = still.size().unwrap_or((settings.draw.width, settings.draw.height));
            info!("Loaded {} ({w}x{h})", image.display());
            let profile = match args.tool {
                ToolCommand::Label { .. } => Profile::Labeler,
                _ => Profile::Crop,
            };
            let size = (w.min(settings.window.max_width), h.min(settings.window.max_height));
            (profile, Box::new(still) as Box<dyn FrameSource>, size)
        }
        ToolCommand::Draw { .. } => {
            let (w, h) = (settings.draw.width, settings.draw.height);
            (Profile::Sketch, Box::new(Still::blank(w, h)) as Box<dyn FrameSource>, (w, h))
        }
    };

    let mut display = MinifbDisplay::new(
        profile.title(),
        width.max(1),
        height.max(1),
        profile.resizable(),
        settings.window.target_fps,
    )?;
    let mut sink = DiskSink;

    /* --- Main loop --- */
    let mut app = App::new(profile, settings)?;
    match app.run(source.as_mut(), &mut display, &mut sink)? {
        LoopExit::Quit | LoopExit::WindowClosed => info!("Bye"),
        LoopExit::SourceExhausted => info!("Frame source ended"),
    }
    Ok(())
}
