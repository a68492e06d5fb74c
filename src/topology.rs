//! Connectivity of the 468-point face mesh.
//!
//! Contour edges are compiled in. The wireframe comes either from a
//! Delaunay triangulation of each detected face or from a fixed edge list
//! in a text file with one `start,end` pair per line; blank lines and `#`
//! comments are ignored.

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use spade::{DelaunayTriangulation, HasPosition, Point2, Triangulation};

use crate::error::{Error, Result};
use crate::types::FaceLandmarks;

pub type Edge = (usize, usize);

#[rustfmt::skip]
pub const LIPS: &[Edge] = &[
    (61, 146), (146, 91), (91, 181), (181, 84), (84, 17),
    (17, 314), (314, 405), (405, 321), (321, 375), (375, 291),
    (61, 185), (185, 40), (40, 39), (39, 37), (37, 0),
    (0, 267), (267, 269), (269, 270), (270, 409), (409, 291),
    (78, 95), (95, 88), (88, 178), (178, 87), (87, 14),
    (14, 317), (317, 402), (402, 318), (318, 324), (324, 308),
    (78, 191), (191, 80), (80, 81), (81, 82), (82, 13),
    (13, 312), (312, 311), (311, 310), (310, 415), (415, 308),
];

#[rustfmt::skip]
pub const LEFT_EYE: &[Edge] = &[
    (263, 249), (249, 390), (390, 373), (373, 374), (374, 380), (380, 381), (381, 382), (382, 362),
    (263, 466), (466, 388), (388, 387), (387, 386), (386, 385), (385, 384), (384, 398), (398, 362),
];

#[rustfmt::skip]
pub const LEFT_EYEBROW: &[Edge] = &[
    (276, 283), (283, 282), (282, 295), (295, 285),
    (300, 293), (293, 334), (334, 296), (296, 336),
];

#[rustfmt::skip]
pub const RIGHT_EYE: &[Edge] = &[
    (33, 7), (7, 163), (163, 144), (144, 145), (145, 153), (153, 154), (154, 155), (155, 133),
    (33, 246), (246, 161), (161, 160), (160, 159), (159, 158), (158, 157), (157, 173), (173, 133),
];

#[rustfmt::skip]
pub const RIGHT_EYEBROW: &[Edge] = &[
    (46, 53), (53, 52), (52, 65), (65, 55),
    (70, 63), (63, 105), (105, 66), (66, 107),
];

#[rustfmt::skip]
pub const FACE_OVAL: &[Edge] = &[
    (10, 338), (338, 297), (297, 332), (332, 284), (284, 251), (251, 389),
    (389, 356), (356, 454), (454, 323), (323, 361), (361, 288), (288, 397),
    (397, 365), (365, 379), (379, 378), (378, 400), (400, 377), (377, 152),
    (152, 148), (148, 176), (176, 149), (149, 150), (150, 136), (136, 172),
    (172, 58), (58, 132), (132, 93), (93, 234), (234, 127), (127, 162),
    (162, 21), (21, 54), (54, 103), (103, 67), (67, 109), (109, 10),
];

/// Where wireframe edges come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tesselation {
    /// Triangulate the landmarks of every face as it is drawn.
    Delaunay,
    /// A fixed edge list over landmark indices.
    Edges(Vec<Edge>),
}

/// Wireframe and contour edges used for overlay drawing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshTopology {
    pub tesselation: Tesselation,
    pub contours: Vec<Edge>,
}

impl Default for MeshTopology {
    fn default() -> Self {
        Self::face_mesh()
    }
}

impl MeshTopology {
    /// Face-mesh contours with a triangulated wireframe.
    pub fn face_mesh() -> Self {
        let contours = [LIPS, LEFT_EYE, LEFT_EYEBROW, RIGHT_EYE, RIGHT_EYEBROW, FACE_OVAL].concat();
        Self {
            tesselation: Tesselation::Delaunay,
            contours,
        }
    }

    /// Face-mesh contours plus the fixed tesselation read from `path`.
    pub fn with_tesselation_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let edges = parse_edges(&text)?;
        log::info!(
            "loaded {} tesselation edges from {}",
            edges.len(),
            path.as_ref().display()
        );
        Ok(Self {
            tesselation: Tesselation::Edges(edges),
            ..Self::face_mesh()
        })
    }

    /// Use the tesselation file if one is configured and readable, otherwise
    /// triangulate each face.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::face_mesh();
        };
        match Self::with_tesselation_file(path) {
            Ok(topology) => topology,
            Err(e) => {
                log::warn!(
                    "cannot load tesselation {}, triangulating instead: {}",
                    path.display(),
                    e
                );
                Self::face_mesh()
            }
        }
    }

    /// Wireframe edges for `face` drawn on a `width x height` image.
    pub fn wireframe_edges(
        &self,
        face: &FaceLandmarks,
        width: u32,
        height: u32,
    ) -> Cow<'_, [Edge]> {
        match &self.tesselation {
            Tesselation::Edges(edges) => Cow::Borrowed(edges.as_slice()),
            Tesselation::Delaunay => Cow::Owned(triangulate(face, width as f64, height as f64)),
        }
    }
}

struct MeshVertex {
    position: Point2<f64>,
    landmark: usize,
}

impl HasPosition for MeshVertex {
    type Scalar = f64;

    fn position(&self) -> Point2<f64> {
        self.position
    }
}

/// Delaunay edges over the landmarks of `face`, laid out at `width x height`
/// so the triangles match what is drawn. Coincident landmarks share a vertex.
pub fn triangulate(face: &FaceLandmarks, width: f64, height: f64) -> Vec<Edge> {
    let mut mesh = DelaunayTriangulation::<MeshVertex>::new();
    for (landmark, p) in face.points.iter().enumerate() {
        let position = Point2::new(p.x as f64 * width, p.y as f64 * height);
        if !(position.x.is_finite() && position.y.is_finite()) {
            continue;
        }
        // first landmark at a position keeps the vertex
        if mesh.locate_vertex(position).is_some() {
            continue;
        }
        if let Err(e) = mesh.insert(MeshVertex { position, landmark }) {
            log::debug!("landmark {landmark} left out of the wireframe: {e:?}");
        }
    }
    mesh.undirected_edges()
        .map(|edge| {
            let [a, b] = edge.vertices();
            (a.data().landmark, b.data().landmark)
        })
        .collect()
}

/// Parse `start,end` lines. Whitespace is accepted as separator too.
pub fn parse_edges(text: &str) -> Result<Vec<Edge>> {
    let mut edges = Vec::new();
    for (n, raw) in text.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let mut fields = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|f| !f.is_empty());
        let (Some(a), Some(b), None) = (fields.next(), fields.next(), fields.next()) else {
            return Err(Error::Topology {
                line: n + 1,
                reason: format!("expected two indices, got {line:?}"),
            });
        };
        let parse = |f: &str| {
            f.parse::<usize>().map_err(|e| Error::Topology {
                line: n + 1,
                reason: format!("{f:?}: {e}"),
            })
        };
        edges.push((parse(a)?, parse(b)?));
    }
    Ok(edges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::types::Point;

    #[test]
    fn contour_edge_count() {
        let topo = MeshTopology::face_mesh();
        assert_eq!(topo.contours.len(), 124);
        assert_eq!(topo.tesselation, Tesselation::Delaunay);
        assert!(topo.contours.iter().all(|&(a, b)| a < 468 && b < 468));
    }

    /// 468 landmarks on a jittered 26 x 18 grid.
    fn grid_face() -> FaceLandmarks {
        let points = (0..468)
            .map(|i| {
                let (col, row) = ((i % 26) as f32, (i / 26) as f32);
                let jitter = ((i * 7) % 5) as f32 * 0.002;
                Point::new(0.1 + col * 0.03 + jitter, 0.1 + row * 0.045 + jitter)
            })
            .collect();
        FaceLandmarks::new(points)
    }

    #[test]
    fn default_wireframe_covers_the_mesh() {
        let face = grid_face();
        let settings = Settings::default();
        let topo = MeshTopology::load_or_default(settings.detector.tesselation.as_deref());
        assert_eq!(topo, MeshTopology::default());
        let edges = topo.wireframe_edges(&face, 640, 480);

        // a planar triangulation of n points has at most 3n - 6 edges
        assert!(edges.len() > 468 && edges.len() <= 3 * 468 - 6);
        assert!(edges.iter().all(|&(a, b)| a < 468 && b < 468 && a != b));

        let mut touched = vec![false; 468];
        for &(a, b) in edges.iter() {
            touched[a] = true;
            touched[b] = true;
        }
        assert!(touched.iter().all(|&t| t));
    }

    #[test]
    fn triangle_has_three_edges() {
        let face = FaceLandmarks::new(vec![
            Point::new(0.1, 0.1),
            Point::new(0.9, 0.1),
            Point::new(0.5, 0.9),
            // duplicate of the first point
            Point::new(0.1, 0.1),
        ]);
        let mut edges: Vec<Edge> = triangulate(&face, 100.0, 100.0)
            .into_iter()
            .map(|(a, b)| (a.min(b), a.max(b)))
            .collect();
        edges.sort();
        assert_eq!(edges, vec![(0, 1), (0, 2), (1, 2)]);
    }

    #[test]
    fn file_edges_are_used_as_is() {
        let topo = MeshTopology {
            tesselation: Tesselation::Edges(vec![(3, 4)]),
            contours: vec![],
        };
        assert_eq!(&*topo.wireframe_edges(&grid_face(), 10, 10), &[(3, 4)]);
    }

    #[test]
    fn face_oval_is_closed() {
        assert_eq!(FACE_OVAL.first().unwrap().0, FACE_OVAL.last().unwrap().1);
        for w in FACE_OVAL.windows(2) {
            assert_eq!(w[0].1, w[1].0);
        }
    }

    #[test]
    fn parse_accepts_comments_and_separators() {
        let text = "# tesselation\n127, 34\n34 139\n\n139,127  # closing\n";
        assert_eq!(parse_edges(text).unwrap(), vec![(127, 34), (34, 139), (139, 127)]);
    }

    #[test]
    fn parse_reports_line_number() {
        let err = parse_edges("1,2\n3\n").unwrap_err();
        assert!(matches!(err, Error::Topology { line: 2, .. }));

        let err = parse_edges("1,2\n3,x\n").unwrap_err();
        assert!(matches!(err, Error::Topology { line: 2, .. }));
    }

    #[test]
    fn missing_file_falls_back_to_triangulation() {
        let topo = MeshTopology::load_or_default(Some(Path::new("/nonexistent/tesselation.txt")));
        assert_eq!(topo, MeshTopology::face_mesh());
        assert_eq!(MeshTopology::load_or_default(None), MeshTopology::face_mesh());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tess.txt");
        std::fs::write(&path, "0,1\n1,2\n").unwrap();
        let topo = MeshTopology::with_tesselation_file(&path).unwrap();
        assert_eq!(topo.tesselation, Tesselation::Edges(vec![(0, 1), (1, 2)]));
        assert_eq!(topo.contours.len(), 124);
    }
}
