use image::RgbImage;

use crate::error::Result;
use crate::types::FaceLandmarks;

/// Number of landmarks produced by the face mesh.
pub const FACE_MESH_LANDMARKS: usize = 468;
/// Landmarks with the ten refined iris points appended.
pub const FACE_MESH_REFINED_LANDMARKS: usize = 478;

/// Finds the landmarks of one face in an RGB image.
///
/// Implementations are configured once and then called for every processed
/// frame. `Ok(None)` means no face was found. Only the first face matters;
/// implementations may stop after it.
pub trait LandmarkDetector {
    fn detect(&mut self, image: &RgbImage) -> Result<Option<FaceLandmarks>>;

    /// Forget tracking state carried over from previous frames.
    fn reset(&mut self) {}
}
