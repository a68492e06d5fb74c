//! Application settings.
//!
//! All fields have defaults, so a settings file only needs the values it
//! changes:
//!
//! ```json
//! { "capture": { "camera_index": 1 }, "display": { "landmark_radius": 4 } }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub window: WindowSettings,
    pub display: DisplaySettings,
    pub capture: CaptureSettings,
    pub image: ImageSettings,
    pub detector: DetectorSettings,
}

impl Settings {
    /// Read settings from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let settings = serde_json::from_str(&text)?;
        log::info!("loaded settings from {}", path.as_ref().display());
        Ok(settings)
    }

    /// Settings from `path` if given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub width: f32,
    pub height: f32,
    pub min_width: f32,
    pub min_height: f32,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 720.0,
            min_width: 900.0,
            min_height: 700.0,
        }
    }
}

/// Overlay appearance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub landmark_radius: i32,
    pub landmark_color: [u8; 3],
    pub selected_landmark_color: [u8; 3],
    pub wireframe_color: [u8; 3],
    pub wireframe_alpha: f32,
    pub contour_color: [u8; 3],
    pub contour_thickness: u32,
    pub show_wireframe: bool,
    pub show_contours: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            landmark_radius: 3,
            landmark_color: [0, 255, 255],
            selected_landmark_color: [255, 0, 0],
            wireframe_color: [0, 255, 255],
            wireframe_alpha: 0.4,
            contour_color: [0, 255, 0],
            contour_thickness: 2,
            show_wireframe: true,
            show_contours: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    pub camera_index: u32,
    pub width: u32,
    pub height: u32,
    /// Delay between two frame pulls.
    pub interval_ms: u64,
    /// Flip frames horizontally so the preview behaves like a mirror.
    pub mirror: bool,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            camera_index: 0,
            width: 640,
            height: 480,
            interval_ms: 15,
            mirror: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSettings {
    /// Loaded images are downscaled so neither side exceeds this.
    pub max_dimension: u32,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self { max_dimension: 800 }
    }
}

/// Face-mesh detector configuration. Applied once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorSettings {
    /// ONNX face-mesh landmark network.
    pub landmark_model: PathBuf,
    /// SeetaFace frontal face detector model used to find the face box.
    pub face_detector_model: PathBuf,
    /// Fixed tesselation edge list for the wireframe overlay. Without one,
    /// each detected face is triangulated.
    pub tesselation: Option<PathBuf>,
    /// Keep the 10 iris landmarks (478 points) when the model provides them.
    pub refine_landmarks: bool,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
    pub face_score_threshold: f64,
    pub min_face_size: u32,
    pub intra_threads: usize,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            landmark_model: PathBuf::from("models/face_landmark.onnx"),
            face_detector_model: PathBuf::from("models/seeta_fd_frontal_v1.0.bin"),
            tesselation: None,
            refine_landmarks: true,
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
            face_score_threshold: 2.0,
            min_face_size: 40,
            intra_threads: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{ "capture": { "camera_index": 2 }, "display": { "landmark_radius": 5 } }"#,
        )
        .unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.capture.camera_index, 2);
        assert_eq!(settings.capture.interval_ms, 15);
        assert_eq!(settings.display.landmark_radius, 5);
        assert_eq!(settings.display.wireframe_alpha, 0.4);
        assert_eq!(settings.image, ImageSettings::default());
        assert_eq!(settings.detector, DetectorSettings::default());
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            Settings::load(&path),
            Err(crate::Error::Config(_))
        ));
    }

    #[test]
    fn no_path_gives_defaults() {
        assert_eq!(Settings::load_or_default(None).unwrap(), Settings::default());
    }
}
