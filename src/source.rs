// Frame sources: where the interaction loop gets its image from.
use std::path::Path;

use crate::error::Error;
use crate::types::{rgb, Frame};

/// Pull-based frame supply.
/// `Ok(None)` means the stream has ended; `Err` is a failed grab that the
/// caller may retry.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, Error>;
}

/// A single image: yields it once, then reports end-of-stream.
pub struct Still {
    frame: Option<Frame>,
}

impl Still {
    pub fn new(frame: Frame) -> Self {
        Self { frame: Some(frame) }
    }

    /// Decode an image file (any format `image` understands) as RGB.
    pub fn open(path: &Path) -> Result<Self, Error> {
        let img = image::open(path).map_err(|source| Error::Image {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(Frame::from_rgb_image(&img.to_rgb8())))
    }

    /// Black canvas for the drawing tool.
    pub fn blank(width: usize, height: usize) -> Self {
        Self::new(Frame::filled(width, height, rgb(0, 0, 0)))
    }

    /// Size of the frame not yet handed out.
    pub fn size(&self) -> Option<(usize, usize)> {
        self.frame.as_ref().map(|f| (f.width, f.height))
    }
}

impl FrameSource for Still {
    fn next_frame(&mut self) -> Result<Option<Frame>, Error> {
        Ok(self.frame.take())
    }
}
