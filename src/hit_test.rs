use crate::types::RenderedLandmark;

/// Click tolerance as a multiple of the marker radius.
pub const TOLERANCE_FACTOR: i32 = 3;

/// Index of the rendered landmark nearest to `(x, y)`.
///
/// Only landmarks strictly closer than `TOLERANCE_FACTOR * landmark_radius`
/// are eligible. Equidistant candidates resolve to the first one in render
/// order.
pub fn nearest_landmark(
    x: i32,
    y: i32,
    rendered: &[RenderedLandmark],
    landmark_radius: i32,
) -> Option<usize> {
    let tolerance = (TOLERANCE_FACTOR * landmark_radius) as i64;
    let mut best_dist_sq = tolerance * tolerance;
    let mut best = None;

    for lm in rendered {
        let dx = (lm.x - x) as i64;
        let dy = (lm.y - y) as i64;
        let dist_sq = dx * dx + dy * dy;
        if dist_sq < best_dist_sq {
            best_dist_sq = dist_sq;
            best = Some(lm.index);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points() -> Vec<RenderedLandmark> {
        vec![
            RenderedLandmark::new(10, 10, 1),
            RenderedLandmark::new(50, 50, 2),
            RenderedLandmark::new(12, 12, 3),
        ]
    }

    #[test]
    fn closest_eligible_wins() {
        assert_eq!(nearest_landmark(11, 11, &points(), 3), Some(1));
        assert_eq!(nearest_landmark(13, 13, &points(), 3), Some(3));
        assert_eq!(nearest_landmark(48, 52, &points(), 3), Some(2));
    }

    #[test]
    fn far_click_is_a_miss() {
        assert_eq!(nearest_landmark(200, 200, &points(), 3), None);
    }

    #[test]
    fn tolerance_is_strict() {
        let pts = [RenderedLandmark::new(0, 0, 7)];
        // distance exactly 9 is not eligible with radius 3
        assert_eq!(nearest_landmark(9, 0, &pts, 3), None);
        assert_eq!(nearest_landmark(8, 0, &pts, 3), Some(7));
    }

    #[test]
    fn ties_go_to_first_rendered() {
        let pts = [RenderedLandmark::new(0, 0, 4), RenderedLandmark::new(2, 0, 5)];
        assert_eq!(nearest_landmark(1, 0, &pts, 3), Some(4));
    }

    #[test]
    fn no_face_means_no_hit() {
        assert_eq!(nearest_landmark(0, 0, &[], 3), None);
    }
}
