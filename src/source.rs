//! Where frames come from: a still image or a live capture device.
//!
//! The two are mutually exclusive. Loading an image stops capture and
//! releases the device; the most recent camera frame is kept so the canvas
//! does not go blank when capture stops.

use std::path::Path;
use std::time::{Duration, Instant};

use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::error::Result;

/// A frame grabber with an open/close lifecycle.
pub trait CaptureDevice {
    /// Block until the next frame is available.
    fn read_frame(&mut self) -> Result<RgbImage>;

    /// Close the device. Called exactly once by [`SourceController`].
    fn release(&mut self);
}

/// Decode an image file and downscale it so neither side exceeds
/// `max_dimension`.
pub fn load_image_file<P: AsRef<Path>>(path: P, max_dimension: u32) -> Result<RgbImage> {
    let img = image::open(path.as_ref())?.to_rgb8();
    Ok(fit_within(img, max_dimension))
}

/// Downscale preserving aspect ratio when either side exceeds `max_dimension`.
pub fn fit_within(img: RgbImage, max_dimension: u32) -> RgbImage {
    let (w, h) = img.dimensions();
    if max_dimension == 0 || (w <= max_dimension && h <= max_dimension) {
        return img;
    }
    let scale = (max_dimension as f64 / w as f64).min(max_dimension as f64 / h as f64);
    let new_w = ((w as f64 * scale) as u32).max(1);
    let new_h = ((h as f64 * scale) as u32).max(1);
    imageops::resize(&img, new_w, new_h, FilterType::Triangle)
}

enum Mode<D> {
    Idle,
    Still,
    Live { device: D, next_due: Instant },
}

/// Owns the active frame source and the current frame.
pub struct SourceController<D: CaptureDevice> {
    mode: Mode<D>,
    frame: Option<RgbImage>,
    interval: Duration,
    mirror: bool,
    max_dimension: u32,
}

impl<D: CaptureDevice> SourceController<D> {
    pub fn new(interval: Duration, mirror: bool, max_dimension: u32) -> Self {
        Self {
            mode: Mode::Idle,
            frame: None,
            interval,
            mirror,
            max_dimension,
        }
    }

    /// Switch to a still image read from `path`. Capture is stopped first;
    /// on a decode failure the previous frame is kept.
    pub fn load_image<P: AsRef<Path>>(&mut self, path: P) -> Result<&RgbImage> {
        self.stop_capture();
        let img = load_image_file(path.as_ref(), self.max_dimension)?;
        log::info!(
            "loaded {} ({}x{})",
            path.as_ref().display(),
            img.width(),
            img.height()
        );
        Ok(self.set_image(img))
    }

    /// Switch to an already decoded still image.
    pub fn set_image(&mut self, img: RgbImage) -> &RgbImage {
        self.stop_capture();
        self.mode = Mode::Still;
        self.frame.insert(img)
    }

    /// Switch to live capture. The first pull is due immediately.
    pub fn start_capture(&mut self, device: D) {
        self.stop_capture();
        log::info!("capture started, pulling every {:?}", self.interval);
        self.mode = Mode::Live {
            device,
            next_due: Instant::now(),
        };
    }

    /// Stop live capture, releasing the device. Returns `false` when capture
    /// was not running.
    pub fn stop_capture(&mut self) -> bool {
        if !self.is_live() {
            return false;
        }
        if let Mode::Live { mut device, .. } = std::mem::replace(&mut self.mode, Mode::Idle) {
            device.release();
            log::info!("capture stopped");
        }
        true
    }

    pub fn is_live(&self) -> bool {
        matches!(self.mode, Mode::Live { .. })
    }

    pub fn is_still(&self) -> bool {
        matches!(self.mode, Mode::Still)
    }

    /// When the next live pull is due.
    pub fn next_due(&self) -> Option<Instant> {
        match &self.mode {
            Mode::Live { next_due, .. } => Some(*next_due),
            _ => None,
        }
    }

    /// Pull a frame if capture is live and due.
    ///
    /// Returns the new frame, or `None` when nothing was pulled. A read
    /// failure stops capture before the error is returned.
    pub fn poll(&mut self, now: Instant) -> Result<Option<&RgbImage>> {
        let Mode::Live { device, next_due } = &mut self.mode else {
            return Ok(None);
        };
        if now < *next_due {
            return Ok(None);
        }

        match device.read_frame() {
            Ok(mut frame) => {
                *next_due = now + self.interval;
                if self.mirror {
                    imageops::flip_horizontal_in_place(&mut frame);
                }
                Ok(Some(self.frame.insert(frame)))
            }
            Err(e) => {
                log::warn!("capture read failed: {e}");
                self.stop_capture();
                Err(e)
            }
        }
    }

    /// The still image, or the latest captured frame.
    pub fn current_frame(&self) -> Option<&RgbImage> {
        self.frame.as_ref()
    }
}

impl<D: CaptureDevice> Drop for SourceController<D> {
    fn drop(&mut self) {
        self.stop_capture();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use image::Rgb;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Counters {
        reads: Cell<usize>,
        releases: Cell<usize>,
    }

    struct FakeCamera {
        counters: Rc<Counters>,
        fail_after: Option<usize>,
    }

    impl CaptureDevice for FakeCamera {
        fn read_frame(&mut self) -> Result<RgbImage> {
            let n = self.counters.reads.get();
            self.counters.reads.set(n + 1);
            if self.fail_after.is_some_and(|limit| n >= limit) {
                return Err(Error::CaptureRead("device unplugged".into()));
            }
            // left half white, right half black
            Ok(RgbImage::from_fn(4, 2, |x, _| {
                if x < 2 {
                    Rgb([255, 255, 255])
                } else {
                    Rgb([0, 0, 0])
                }
            }))
        }

        fn release(&mut self) {
            self.counters.releases.set(self.counters.releases.get() + 1);
        }
    }

    fn controller() -> SourceController<FakeCamera> {
        SourceController::new(Duration::from_millis(15), true, 800)
    }

    fn camera(fail_after: Option<usize>) -> (FakeCamera, Rc<Counters>) {
        let counters = Rc::new(Counters::default());
        (
            FakeCamera {
                counters: Rc::clone(&counters),
                fail_after,
            },
            counters,
        )
    }

    #[test]
    fn pulls_respect_interval() {
        let mut src = controller();
        let (cam, counters) = camera(None);
        src.start_capture(cam);

        let t0 = src.next_due().unwrap();
        assert!(src.poll(t0).unwrap().is_some());
        assert!(src.poll(t0 + Duration::from_millis(5)).unwrap().is_none());
        assert!(src.poll(t0 + Duration::from_millis(15)).unwrap().is_some());
        assert_eq!(counters.reads.get(), 2);
    }

    #[test]
    fn frames_are_mirrored() {
        let mut src = controller();
        let (cam, _) = camera(None);
        src.start_capture(cam);
        let frame = src.poll(Instant::now()).unwrap().unwrap();
        assert_eq!(frame.get_pixel(0, 0), &Rgb([0, 0, 0]));
        assert_eq!(frame.get_pixel(3, 0), &Rgb([255, 255, 255]));
    }

    #[test]
    fn stop_is_idempotent_and_releases_once() {
        let mut src = controller();
        let (cam, counters) = camera(None);
        src.start_capture(cam);
        assert!(src.stop_capture());
        assert!(!src.stop_capture());
        assert_eq!(counters.releases.get(), 1);
        assert!(!src.is_live());
    }

    #[test]
    fn read_failure_stops_capture() {
        let mut src = controller();
        let (cam, counters) = camera(Some(1));
        src.start_capture(cam);
        let now = Instant::now();
        assert!(src.poll(now).is_ok());
        let err = src.poll(now + Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, Error::CaptureRead(_)));
        assert!(!src.is_live());
        assert_eq!(counters.releases.get(), 1);
        // last good frame is kept
        assert!(src.current_frame().is_some());
        assert!(src.poll(now + Duration::from_secs(2)).unwrap().is_none());
        assert_eq!(counters.reads.get(), 2);
    }

    #[test]
    fn still_image_ends_capture() {
        let mut src = controller();
        let (cam, counters) = camera(None);
        src.start_capture(cam);
        src.poll(Instant::now()).unwrap();

        src.set_image(RgbImage::new(10, 10));
        assert!(src.is_still());
        assert_eq!(counters.releases.get(), 1);
        for ms in [0, 15, 30, 1000] {
            assert!(src.poll(Instant::now() + Duration::from_millis(ms)).unwrap().is_none());
        }
        assert_eq!(counters.reads.get(), 1);
        assert_eq!(src.current_frame().unwrap().dimensions(), (10, 10));
    }

    #[test]
    fn dropping_releases_device() {
        let (cam, counters) = camera(None);
        {
            let mut src = controller();
            src.start_capture(cam);
        }
        assert_eq!(counters.releases.get(), 1);
    }

    #[test]
    fn failed_load_keeps_previous_image() {
        let mut src = controller();
        src.set_image(RgbImage::new(3, 3));
        assert!(src.load_image("/nonexistent/face.png").is_err());
        assert_eq!(src.current_frame().unwrap().dimensions(), (3, 3));
    }

    #[test]
    fn large_images_are_downscaled() {
        let img = fit_within(RgbImage::new(1600, 1200), 800);
        assert_eq!(img.dimensions(), (800, 600));
        let img = fit_within(RgbImage::new(300, 2000), 800);
        assert_eq!(img.dimensions(), (120, 800));
        let img = fit_within(RgbImage::new(640, 480), 800);
        assert_eq!(img.dimensions(), (640, 480));
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("face.png");
        RgbImage::from_pixel(1000, 500, Rgb([9, 9, 9])).save(&path).unwrap();

        let mut src = controller();
        let img = src.load_image(&path).unwrap();
        assert_eq!(img.dimensions(), (800, 400));
        assert!(src.is_still());
    }
}
