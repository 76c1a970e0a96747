// One error type for the whole crate.
// Every variant states *where* things went wrong.
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Zoom/scale that cannot be inverted. Setup bug, treated as fatal.
    #[error("Invalid transform: {0}")]
    InvalidTransform(String),

    /// Grabbing/decoding a frame failed, or the source is gone.
    #[error("Frame acquisition error: {0}")]
    FrameAcquisition(String),

    /// Reading or writing a file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Encoding/decoding an image file failed.
    #[error("Image codec error on {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Something needs a committed region and there is none.
    #[error("No region selected: {0}")]
    EmptySelection(String),

    #[error("Window init error: {0}")]
    WindowInit(String), // Creating the window failed

    #[error("Window update error: {0}")]
    WindowUpdate(String), // Updating the window buffer failed

    #[error("Camera init error: {0}")]
    CameraInit(String), // Opening/starting the camera failed

    #[error("Config error: {0}")]
    Config(String), // Reading/parsing the settings file failed
}

impl Error {
    /// Errors the interaction loop reports and then keeps going after.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::FrameAcquisition(_)
                | Error::Io { .. }
                | Error::Image { .. }
                | Error::EmptySelection(_)
        )
    }
}
