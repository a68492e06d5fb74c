//! Webcam capture through `nokhwa`.

use image::RgbImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
};
use nokhwa::Camera;

use crate::config::CaptureSettings;
use crate::error::{Error, Result};
use crate::source::CaptureDevice;

pub struct NokhwaCamera {
    camera: Camera,
    released: bool,
}

impl NokhwaCamera {
    /// Open camera `settings.camera_index`, asking for the configured
    /// resolution. The driver may pick the closest format it supports.
    pub fn open(settings: &CaptureSettings) -> Result<Self> {
        let preferred = CameraFormat::new(
            Resolution::new(settings.width, settings.height),
            FrameFormat::MJPEG,
            30,
        );
        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(preferred));
        let mut camera = Camera::new(CameraIndex::Index(settings.camera_index), requested)
            .map_err(|e| Error::Camera(e.to_string()))?;
        camera
            .open_stream()
            .map_err(|e| Error::Camera(e.to_string()))?;

        let res = camera.resolution();
        log::info!(
            "opened camera {} ({}) at {}x{}",
            settings.camera_index,
            camera.info().human_name(),
            res.width(),
            res.height()
        );
        Ok(Self {
            camera,
            released: false,
        })
    }
}

impl CaptureDevice for NokhwaCamera {
    fn read_frame(&mut self) -> Result<RgbImage> {
        let buffer = self
            .camera
            .frame()
            .map_err(|e| Error::CaptureRead(e.to_string()))?;
        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| Error::CaptureRead(e.to_string()))?;
        let (width, height) = decoded.dimensions();
        RgbImage::from_raw(width, height, decoded.into_raw())
            .ok_or_else(|| Error::CaptureRead("frame buffer size mismatch".into()))
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = self.camera.stop_stream() {
            log::warn!("failed to stop camera stream: {e}");
        }
    }
}
