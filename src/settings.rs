// Layered settings: built-in defaults, then an optional TOML file, then
// command-line overrides.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;

use crate::canvas::InkStyle;
use crate::error::Error;
use crate::widget::WidgetStyle;

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "roi-canvas.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub camera: Option<CameraFileConfig>,
    pub window: Option<WindowFileConfig>,
    pub output: Option<OutputFileConfig>,
    pub labeler: Option<LabelerFileConfig>,
    pub draw: Option<DrawFileConfig>,
    pub widgets: Option<WidgetStyle>,
    pub ink: Option<InkStyle>,
}

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(default)]
pub struct CameraFileConfig {
    pub index: Option<u32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub max_frame_failures: Option<u32>,
}

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(default)]
pub struct WindowFileConfig {
    pub max_width: Option<usize>,
    pub max_height: Option<usize>,
    pub target_fps: Option<usize>,
    pub background: Option<[u8; 3]>,
}

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(default)]
pub struct OutputFileConfig {
    pub dir: Option<PathBuf>,
    pub image_extension: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(default)]
pub struct LabelerFileConfig {
    pub brightness_step: Option<i16>,
    pub pan_step: Option<i32>,
    pub zoom: Option<f32>,
    pub zoom_step: Option<f32>,
}

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(default)]
pub struct DrawFileConfig {
    pub width: Option<usize>,
    pub height: Option<usize>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CameraSettings {
    pub index: u32,
    pub width: u32,
    pub height: u32,
    /// Consecutive failed grabs before the camera counts as gone.
    pub max_frame_failures: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowSettings {
    pub max_width: usize,
    pub max_height: usize,
    pub target_fps: usize,
    /// Fill for window area not covered by the image.
    pub background: [u8; 3],
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputSettings {
    pub dir: PathBuf,
    pub image_extension: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelerSettings {
    pub brightness_step: i16,
    pub pan_step: i32,
    pub zoom: f32,
    pub zoom_step: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawSettings {
    pub width: usize,
    pub height: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub camera: CameraSettings,
    pub window: WindowSettings,
    pub output: OutputSettings,
    pub labeler: LabelerSettings,
    pub draw: DrawSettings,
    pub widgets: WidgetStyle,
    pub ink: InkStyle,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            camera: CameraSettings {
                index: 0,
                width: 640,
                height: 480,
                max_frame_failures: 30,
            },
            window: WindowSettings {
                max_width: 1280,
                max_height: 800,
                target_fps: 60,
                background: [48, 48, 48],
            },
            output: OutputSettings {
                dir: PathBuf::from("output"),
                image_extension: "png".to_string(),
            },
            labeler: LabelerSettings {
                brightness_step: 10,
                pan_step: 40,
                zoom: 1.0,
                zoom_step: 1.25,
            },
            draw: DrawSettings {
                width: 800,
                height: 600,
                text: "OpenCV".to_string(),
            },
            widgets: WidgetStyle::default(),
            ink: InkStyle::default(),
        }
    }
}

/// Values given on the command line. `None` keeps the file/default value.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub output_dir: Option<PathBuf>,
    pub camera_index: Option<u32>,
    pub camera_width: Option<u32>,
    pub camera_height: Option<u32>,
    pub canvas_width: Option<usize>,
    pub canvas_height: Option<usize>,
    pub text: Option<String>,
}

/// Read the config file. An explicit path must exist; the default file is
/// optional.
pub fn load_config(explicit: Option<&Path>) -> Result<(FileConfig, Option<PathBuf>), Error> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => {
            let p = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !p.is_file() {
                return Ok((FileConfig::default(), None));
            }
            p
        }
    };
    let raw = fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
    let file = parse_config(&raw).map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
    info!("Loaded settings from {}", path.display());
    Ok((file, Some(path)))
}

pub fn parse_config(raw: &str) -> Result<FileConfig, toml::de::Error> {
    toml::from_str(raw)
}

impl Settings {
    pub fn resolve(file: FileConfig, cli: &Overrides) -> Result<Self, Error> {
        let mut s = Settings::default();

        if let Some(c) = file.camera {
            s.camera.index = c.index.unwrap_or(s.camera.index);
            s.camera.width = c.width.unwrap_or(s.camera.width);
            s.camera.height = c.height.unwrap_or(s.camera.height);
            s.camera.max_frame_failures = c.max_frame_failures.unwrap_or(s.camera.max_frame_failures);
        }
        if let Some(w) = file.window {
            s.window.max_width = w.max_width.unwrap_or(s.window.max_width);
            s.window.max_height = w.max_height.unwrap_or(s.window.max_height);
            s.window.target_fps = w.target_fps.unwrap_or(s.window.target_fps);
            s.window.background = w.background.unwrap_or(s.window.background);
        }
        if let Some(o) = file.output {
            s.output.dir = o.dir.unwrap_or(s.output.dir);
            s.output.image_extension = o.image_extension.unwrap_or(s.output.image_extension);
        }
        if let Some(l) = file.labeler {
            s.labeler.brightness_step = l.brightness_step.unwrap_or(s.labeler.brightness_step);
            s.labeler.pan_step = l.pan_step.unwrap_or(s.labeler.pan_step);
            s.labeler.zoom = l.zoom.unwrap_or(s.labeler.zoom);
            s.labeler.zoom_step = l.zoom_step.unwrap_or(s.labeler.zoom_step);
        }
        if let Some(d) = file.draw {
            s.draw.width = d.width.unwrap_or(s.draw.width);
            s.draw.height = d.height.unwrap_or(s.draw.height);
            s.draw.text = d.text.unwrap_or(s.draw.text);
        }
        if let Some(w) = file.widgets {
            s.widgets = w;
        }
        if let Some(i) = file.ink {
            s.ink = i;
        }

        if let Some(dir) = &cli.output_dir {
            s.output.dir = dir.clone();
        }
        s.camera.index = cli.camera_index.unwrap_or(s.camera.index);
        s.camera.width = cli.camera_width.unwrap_or(s.camera.width);
        s.camera.height = cli.camera_height.unwrap_or(s.camera.height);
        s.draw.width = cli.canvas_width.unwrap_or(s.draw.width);
        s.draw.height = cli.canvas_height.unwrap_or(s.draw.height);
        if let Some(text) = &cli.text {
            s.draw.text = text.clone();
        }

        s.validate()?;
        Ok(s)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.labeler.zoom_step.is_nan() || self.labeler.zoom_step <= 1.0 {
            return Err(Error::Config(format!(
                "labeler.zoom_step must be greater than 1, got {}",
                self.labeler.zoom_step
            )));
        }
        if self.draw.width == 0 || self.draw.height == 0 {
            return Err(Error::Config("draw canvas must not be empty".into()));
        }
        if self.output.image_extension.trim_start_matches('.').is_empty() {
            return Err(Error::Config("output.image_extension is empty".into()));
        }
        Ok(())
    }

    /// Extension without a leading dot.
    pub fn image_extension(&self) -> &str {
        self.output.image_extension.trim_start_matches('.')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let s = Settings::resolve(parse_config("").unwrap(), &Overrides::default()).unwrap();
        assert_eq!(s, Settings::default());
        assert_eq!(s.widgets.width, 150);
        assert_eq!(s.draw.text, "OpenCV");
    }

    #[test]
    fn file_then_cli_override_defaults() {
        let file = parse_config(
            r#"
            [camera]
            index = 2
            width = 1280

            [output]
            dir = "shots"
            image_extension = ".jpg"

            [widgets]
            width = 120

            [ink]
            thickness = 4
            "#,
        )
        .unwrap();
        let cli = Overrides {
            camera_index: Some(5),
            text: Some("hello".into()),
            ..Default::default()
        };
        let s = Settings::resolve(file, &cli).unwrap();
        assert_eq!(s.camera.index, 5);
        assert_eq!(s.camera.width, 1280);
        assert_eq!(s.camera.height, 480);
        assert_eq!(s.output.dir, PathBuf::from("shots"));
        assert_eq!(s.image_extension(), "jpg");
        assert_eq!(s.widgets.width, 120);
        assert_eq!(s.widgets.height, 30);
        assert_eq!(s.ink.thickness, 4);
        assert_eq!(s.ink.rectangle, [0, 255, 0]);
        assert_eq!(s.draw.text, "hello");
    }

    #[test]
    fn bad_values_are_config_errors() {
        for step in ["0.5", "1.0", "nan"] {
            let file = parse_config(&format!("[labeler]\nzoom_step = {step}\n")).unwrap();
            assert!(matches!(Settings::resolve(file, &Overrides::default()), Err(Error::Config(_))), "{step}");
        }
        assert!(parse_config("[nonsense]\nx = 1\n").is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = load_config(Some(Path::new("/no/such/roi-canvas.toml"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn explicit_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "[draw]\nwidth = 320\n").unwrap();
        let (file, source) = load_config(Some(&path)).unwrap();
        assert_eq!(source, Some(path));
        let s = Settings::resolve(file, &Overrides::default()).unwrap();
        assert_eq!(s.draw.width, 320);
    }
}
