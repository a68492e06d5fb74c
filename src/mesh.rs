//! Face-mesh landmark detector.
//!
//! Two stages, as in the usual face-mesh pipeline:
//!
//! 1. A frontal face detector (SeetaFace via `rustface`) finds the face box.
//! 2. The box is squared, enlarged and cropped, then the landmark network
//!    (ONNX, `192x192` NHWC RGB input in [0,1]) regresses 468 or 478 points
//!    in crop pixels plus a face-presence logit.
//!
//! While the presence score stays above the tracking threshold the next call
//! skips stage 1 and crops around the previous landmarks instead.

use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::Array4;
use rustface::{Detector, ImageData};

use crate::config::DetectorSettings;
use crate::detector::{LandmarkDetector, FACE_MESH_LANDMARKS, FACE_MESH_REFINED_LANDMARKS};
use crate::error::{Error, Result};
use crate::types::{BoundingBox, FaceLandmarks, Point};

/// Side of the square network input.
pub const INPUT_SIZE: u32 = 192;

/// Enlargement of the face box before cropping.
const ROI_SCALE: f32 = 1.5;

pub struct FaceMesh {
    face_detector: Box<dyn Detector>,
    session: ort::Session,
    settings: DetectorSettings,
    /// Region of interest derived from the previous frame's landmarks.
    tracked_roi: Option<BoundingBox>,
}

impl FaceMesh {
    pub fn new(settings: &DetectorSettings) -> Result<Self> {
        let detector_path = settings.face_detector_model.to_str().ok_or_else(|| {
            Error::FaceDetector(format!(
                "invalid path {}",
                settings.face_detector_model.display()
            ))
        })?;
        let mut face_detector = rustface::create_detector(detector_path)
            .map_err(|e| Error::FaceDetector(e.to_string()))?;
        face_detector.set_min_face_size(settings.min_face_size);
        face_detector.set_score_thresh(settings.face_score_threshold);
        face_detector.set_pyramid_scale_factor(0.8);
        face_detector.set_slide_window_step(4, 4);

        let session = ort::Session::builder()?
            .with_intra_threads(settings.intra_threads)?
            .commit_from_file(&settings.landmark_model)?;

        log::info!(
            "face mesh ready: landmarks={} faces={} refine={}",
            settings.landmark_model.display(),
            settings.face_detector_model.display(),
            settings.refine_landmarks
        );

        Ok(Self {
            face_detector,
            session,
            settings: settings.clone(),
            tracked_roi: None,
        })
    }

    /// Face box of the highest scoring detection, in image pixels.
    fn find_face(&mut self, image: &RgbImage) -> Option<BoundingBox> {
        let gray = imageops::grayscale(image);
        let (width, height) = gray.dimensions();
        let faces = self
            .face_detector
            .detect(&ImageData::new(gray.as_raw(), width, height));

        let best = faces
            .iter()
            .max_by(|a, b| a.score().total_cmp(&b.score()))?;
        let bbox = best.bbox();
        log::debug!("face box {}x{} at ({}, {})", bbox.width(), bbox.height(), bbox.x(), bbox.y());
        Some(BoundingBox::new(
            bbox.x() as f32,
            bbox.y() as f32,
            bbox.width() as f32,
            bbox.height() as f32,
        ))
    }

    /// Run the landmark network on `roi`. Returns points in image pixels and
    /// the face presence probability.
    fn run_mesh(&self, image: &RgbImage, roi: &BoundingBox) -> Result<(Vec<Point>, f32)> {
        let crop = imageops::crop_imm(
            image,
            roi.x as u32,
            roi.y as u32,
            roi.width as u32,
            roi.height as u32,
        )
        .to_image();
        let input = imageops::resize(&crop, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);

        let side = INPUT_SIZE as usize;
        let tensor = Array4::from_shape_fn((1, side, side, 3), |(_, y, x, c)| {
            input.get_pixel(x as u32, y as u32)[c] as f32 / 255.0
        });

        let outputs = self.session.run(ort::inputs![tensor]?)?;
        if outputs.len() < 2 {
            return Err(Error::Detection(format!(
                "landmark model has {} outputs, expected coordinates and face flag",
                outputs.len()
            )));
        }
        let coords: Vec<f32> = outputs[0].try_extract_tensor::<f32>()?.iter().copied().collect();
        let logit = outputs[1]
            .try_extract_tensor::<f32>()?
            .iter()
            .next()
            .copied()
            .unwrap_or(f32::NEG_INFINITY);

        let available = coords.len() / 3;
        if available < FACE_MESH_LANDMARKS {
            return Err(Error::Detection(format!(
                "landmark model returned {available} points, \
                 expected at least {FACE_MESH_LANDMARKS}"
            )));
        }
        let count = if self.settings.refine_landmarks {
            available.min(FACE_MESH_REFINED_LANDMARKS)
        } else {
            FACE_MESH_LANDMARKS
        };

        let input_side = INPUT_SIZE as f32;
        let points = coords
            .chunks_exact(3)
            .take(count)
            .map(|xyz| roi.denormalize_point(Point::new(xyz[0] / input_side, xyz[1] / input_side)))
            .collect();
        Ok((points, sigmoid(logit)))
    }
}

impl LandmarkDetector for FaceMesh {
    fn detect(&mut self, image: &RgbImage) -> Result<Option<FaceLandmarks>> {
        let (w, h) = image.dimensions();
        if w == 0 || h == 0 {
            return Ok(None);
        }
        let image_box = BoundingBox::new(0.0, 0.0, w as f32, h as f32);

        let mut result = None;
        if let Some(roi) = self.tracked_roi.take() {
            let roi = roi.clamp_to(w as f32, h as f32);
            if !roi.is_empty() {
                let (points, presence) = self.run_mesh(image, &roi)?;
                if presence >= self.settings.min_tracking_confidence {
                    result = Some((points, presence));
                } else {
                    log::debug!("lost track (presence {presence:.2}), re-detecting");
                }
            }
        }

        if result.is_none() {
            let Some(face) = self.find_face(image) else {
                return Ok(None);
            };
            let roi = face
                .squared_and_scaled(ROI_SCALE)
                .clamp_to(w as f32, h as f32);
            if roi.is_empty() {
                return Ok(None);
            }
            let (points, presence) = self.run_mesh(image, &roi)?;
            if presence < self.settings.min_detection_confidence {
                log::debug!("face presence {presence:.2} below detection threshold");
                return Ok(None);
            }
            result = Some((points, presence));
        }

        let Some((points, presence)) = result else {
            return Ok(None);
        };
        if presence >= self.settings.min_tracking_confidence {
            self.tracked_roi =
                BoundingBox::enclosing(&points).map(|b| b.squared_and_scaled(ROI_SCALE));
        }

        let normalized = points
            .into_iter()
            .map(|p| image_box.normalize_point(p))
            .collect();
        Ok(Some(FaceLandmarks::new(normalized)))
    }

    fn reset(&mut self) {
        self.tracked_roi = None;
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_range() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(10.0) > 0.99);
        assert!(sigmoid(-10.0) < 0.01);
        assert_eq!(sigmoid(f32::NEG_INFINITY), 0.0);
    }

    #[test]
    fn missing_models_fail_cleanly() {
        let settings = DetectorSettings {
            face_detector_model: "/nonexistent/seeta.bin".into(),
            landmark_model: "/nonexistent/face_landmark.onnx".into(),
            ..DetectorSettings::default()
        };
        assert!(matches!(FaceMesh::new(&settings), Err(Error::FaceDetector(_))));
    }
}
