// Where saved images and text end up.
use std::fs;
use std::path::{Path, PathBuf};

use image::ImageFormat;

use crate::error::Error;
use crate::types::{Channels, Frame};

pub trait PersistenceSink {
    fn save_frame(&mut self, path: &Path, frame: &Frame) -> Result<(), Error>;
    fn save_text(&mut self, path: &Path, text: &str) -> Result<(), Error>;
}

/// Writes files next to their final name first and renames them into place,
/// so a failed write never leaves a half-written artifact behind.
#[derive(Debug, Default)]
pub struct DiskSink;

fn partial_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.partial"))
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> Error + '_ {
    move |source| Error::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn ensure_parent(path: &Path) -> Result<(), Error> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(io_err(parent))
        }
        _ => Ok(()),
    }
}

fn publish(tmp: &Path, path: &Path, written: Result<(), Error>) -> Result<(), Error> {
    let result = written.and_then(|()| fs::rename(tmp, path).map_err(io_err(path)));
    if result.is_err() {
        let _ = fs::remove_file(tmp);
    }
    result
}

impl PersistenceSink for DiskSink {
    fn save_frame(&mut self, path: &Path, frame: &Frame) -> Result<(), Error> {
        ensure_parent(path)?;
        let image_err = |source| Error::Image {
            path: path.to_path_buf(),
            source,
        };
        let format = ImageFormat::from_path(path).map_err(image_err)?;
        let tmp = partial_path(path);
        let written = match frame.channels {
            Channels::Color => frame.to_rgb_image().save_with_format(&tmp, format),
            Channels::Gray => frame.to_gray_image().save_with_format(&tmp, format),
        }
        .map_err(image_err);
        publish(&tmp, path, written)
    }

    fn save_text(&mut self, path: &Path, text: &str) -> Result<(), Error> {
        ensure_parent(path)?;
        let tmp = partial_path(path);
        let written = fs::write(&tmp, text).map_err(io_err(&tmp));
        publish(&tmp, path, written)
    }
}
