//! # mesh-picker
//!
//! Pick face-mesh landmark indices by clicking on them, over a webcam feed or
//! a still image, and export the chosen set as text.
//!
//! The crate is split so everything except the window is testable headless:
//!
//! - **Mapping**: detector-normalized coordinates to letterboxed canvas pixels
//! - **Selection**: an always-sorted index set plus the shipped default set
//! - **Hit testing**: nearest rendered landmark within three marker radii
//! - **Rendering**: frame, blended wireframe, opaque contours and markers into
//!   one RGBA canvas
//! - **Sources**: still image or live capture, pulled on a fixed cadence
//! - **Export**: line, comma and list-literal views and the export file
//!
//! With the `mesh` feature, [`mesh::FaceMesh`] provides landmarks from an ONNX
//! face-mesh network; `camera` adds webcam capture; `cli` builds the
//! command-line tool and `gui` the desktop application.
//!
//! ## Quick Start
//!
//! ```rust
//! use image::{Rgb, RgbImage};
//! use mesh_picker::{
//!     export, FaceLandmarks, MeshTopology, Overlays, Point, RenderStyle, Renderer,
//!     SelectionSet,
//! };
//!
//! let frame = RgbImage::from_pixel(640, 480, Rgb([40, 40, 40]));
//! let face = FaceLandmarks::new(vec![Point::new(0.5, 0.5), Point::new(0.6, 0.4)]);
//!
//! let renderer = Renderer::new(RenderStyle::default(), MeshTopology::face_mesh());
//! let mut selection = SelectionSet::new();
//! selection.toggle(1);
//!
//! let out = renderer.render(&frame, Some(&face), &selection, Overlays::default(), (800, 600));
//! assert_eq!(out.landmarks.len(), 2);
//! assert_eq!(export::list_literal(&selection.sorted_list()), "[1]");
//! ```

#[cfg(feature = "camera")]
pub mod camera;
pub mod config;
pub mod detector;
mod error;
pub mod export;
pub mod hit_test;
pub mod mapper;
#[cfg(feature = "mesh")]
pub mod mesh;
pub mod render;
pub mod selection;
pub mod session;
pub mod source;
pub mod topology;
mod types;

pub use config::Settings;
pub use detector::LandmarkDetector;
pub use error::{Error, Result};
pub use hit_test::nearest_landmark;
pub use mapper::{CanvasLayout, Letterbox};
pub use render::{Overlays, RenderOutput, RenderStatus, RenderStyle, Renderer};
pub use selection::{SelectionSet, DEFAULT_LANDMARK_INDICES};
pub use session::{Notice, SelectorSession, Severity};
pub use source::{CaptureDevice, SourceController};
pub use topology::{MeshTopology, Tesselation};
pub use types::{BoundingBox, FaceLandmarks, Point, RenderedLandmark};
