use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Could not open camera: {0}")]
    Camera(String),

    #[error("Could not read frame from camera: {0}")]
    CaptureRead(String),

    #[error("Landmark detection failed: {0}")]
    Detection(String),

    #[cfg(feature = "mesh")]
    #[error("ONNX runtime error: {0}")]
    Model(#[from] ort::Error),

    #[error("Failed to load face detector: {0}")]
    FaceDetector(String),

    #[error("Invalid edge list at line {line}: {reason}")]
    Topology { line: usize, reason: String },

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("No landmarks are currently selected")]
    EmptySelection,
}

pub type Result<T> = std::result::Result<T, Error>;
