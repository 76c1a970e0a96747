// Opens a camera and converts its frames into packed 0x00RRGGBB Frames.

use log::info;
// Bring in nokhwa types for camera control.
use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    utils::{
        CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
    },
};

use crate::error::Error;
use crate::source::FrameSource;
use crate::types::{rgb, Frame};

// A small wrapper around nokhwa::Camera so the interaction loop stays clean.
pub struct CameraCapture {
    cam: Camera,
    width: u32,
    height: u32,
}

impl CameraCapture {
    /// Open camera `index` near the requested resolution (falls back if not exact)
    /// and start streaming.
    pub fn new(index: u32, width: u32, height: u32) -> Result<Self, Error> {
        let idx = CameraIndex::Index(index);

        let fmt = CameraFormat::new(
            Resolution::new(width, height),
            FrameFormat::YUYV, // uncompressed; cheap to convert to RGB
            30,                // target FPS
        );
        let req = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(fmt));

        // This fails if no device exists at that index.
        let mut cam = Camera::new(idx, req)
            .map_err(|e| Error::CameraInit(format!("Create camera {index}: {e}")))?;

        cam.open_stream()
            .map_err(|e| Error::CameraInit(format!("Open stream: {e}")))?;

        // The actual stream might choose a slightly different resolution.
        let actual = cam.resolution();
        info!("Camera {index} streaming at {}x{}", actual.width(), actual.height());

        Ok(Self {
            cam,
            width: actual.width(),
            height: actual.height(),
        })
    }

    /// Report the actual resolution the camera is delivering.
    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl FrameSource for CameraCapture {
    /// Blocks until the camera hands over the next frame.
    fn next_frame(&mut self) -> Result<Option<Frame>, Error> {
        let frame = self
            .cam
            .frame()
            .map_err(|e| Error::FrameAcquisition(format!("Fetch frame: {e}")))?;

        let rgb_img = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| Error::FrameAcquisition(format!("Decode RGB: {e}")))?;

        // Packed by hand: nokhwa may link a different `image` version than ours.
        let (w, h) = rgb_img.dimensions();
        let mut out = Frame::filled(w as usize, h as usize, 0);
        for (dst, pixel) in out.pixels.iter_mut().zip(rgb_img.pixels()) {
            *dst = rgb(pixel[0], pixel[1], pixel[2]);
        }
        Ok(Some(out))
    }
}

impl Drop for CameraCapture {
    fn drop(&mut self) {
        let _ = self.cam.stop_stream();
    }
}
