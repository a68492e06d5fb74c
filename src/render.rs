//! Raster rendering of a frame with the face-mesh overlay.
//!
//! The output is a canvas-sized RGBA image: the letterboxed frame, the
//! optional wireframe (blended) and contours (opaque), then one filled marker
//! per landmark. Marker positions are returned alongside so clicks can be
//! resolved against exactly what was drawn.

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};

use crate::config::DisplaySettings;
use crate::mapper::{CanvasLayout, Letterbox};
use crate::selection::SelectionSet;
use crate::topology::{Edge, MeshTopology};
use crate::types::{FaceLandmarks, RenderedLandmark};

#[derive(Debug, Clone, PartialEq)]
pub struct RenderStyle {
    pub landmark_radius: i32,
    pub landmark_color: Rgba<u8>,
    pub selected_landmark_color: Rgba<u8>,
    pub wireframe_color: Rgb<u8>,
    pub wireframe_alpha: f32,
    pub contour_color: Rgb<u8>,
    pub contour_thickness: u32,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self::from(&DisplaySettings::default())
    }
}

impl From<&DisplaySettings> for RenderStyle {
    fn from(d: &DisplaySettings) -> Self {
        let opaque = |[r, g, b]: [u8; 3]| Rgba([r, g, b, 255]);
        Self {
            landmark_radius: d.landmark_radius,
            landmark_color: opaque(d.landmark_color),
            selected_landmark_color: opaque(d.selected_landmark_color),
            wireframe_color: Rgb(d.wireframe_color),
            wireframe_alpha: d.wireframe_alpha.clamp(0.0, 1.0),
            contour_color: Rgb(d.contour_color),
            contour_thickness: d.contour_thickness.max(1),
        }
    }
}

/// Which edge overlays to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlays {
    pub wireframe: bool,
    pub contours: bool,
}

impl Default for Overlays {
    fn default() -> Self {
        Self {
            wireframe: true,
            contours: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// Face found, this many markers drawn.
    Landmarks(usize),
    /// Frame drawn without markers.
    NoFace,
    /// Canvas not laid out; frame drawn at native size.
    Unscaled,
    EmptyImage,
}

pub struct RenderOutput {
    pub canvas: RgbaImage,
    pub landmarks: Vec<RenderedLandmark>,
    pub status: RenderStatus,
    pub layout: CanvasLayout,
}

pub struct Renderer {
    pub style: RenderStyle,
    pub topology: MeshTopology,
}

impl Renderer {
    pub fn new(style: RenderStyle, topology: MeshTopology) -> Self {
        Self { style, topology }
    }

    /// Draw `image` on a `canvas_w x canvas_h` canvas, with markers for
    /// `face` colored by membership in `selection`.
    pub fn render(
        &self,
        image: &RgbImage,
        face: Option<&FaceLandmarks>,
        selection: &SelectionSet,
        overlays: Overlays,
        (canvas_w, canvas_h): (u32, u32),
    ) -> RenderOutput {
        let layout = CanvasLayout::compute(image.width(), image.height(), canvas_w, canvas_h);
        let lb = match layout {
            CanvasLayout::Empty => {
                return RenderOutput {
                    canvas: black_canvas(canvas_w, canvas_h),
                    landmarks: Vec::new(),
                    status: RenderStatus::EmptyImage,
                    layout,
                }
            }
            CanvasLayout::Native => {
                return RenderOutput {
                    canvas: image::DynamicImage::ImageRgb8(image.clone()).to_rgba8(),
                    landmarks: Vec::new(),
                    status: RenderStatus::Unscaled,
                    layout,
                }
            }
            CanvasLayout::Letterboxed(lb) => lb,
        };

        let mut scaled = imageops::resize(
            image,
            lb.scaled_width,
            lb.scaled_height,
            FilterType::Triangle,
        );
        if let Some(face) = face {
            if overlays.wireframe {
                self.blend_wireframe(&mut scaled, face);
            }
            if overlays.contours {
                self.draw_contours(&mut scaled, face);
            }
        }

        let mut canvas = black_canvas(canvas_w, canvas_h);
        let scaled = image::DynamicImage::ImageRgb8(scaled).to_rgba8();
        imageops::replace(&mut canvas, &scaled, lb.offset_x as i64, lb.offset_y as i64);

        let Some(face) = face else {
            return RenderOutput {
                canvas,
                landmarks: Vec::new(),
                status: RenderStatus::NoFace,
                layout,
            };
        };

        let landmarks = self.draw_markers(&mut canvas, &lb, face, selection);
        RenderOutput {
            status: RenderStatus::Landmarks(landmarks.len()),
            canvas,
            landmarks,
            layout,
        }
    }

    fn blend_wireframe(&self, base: &mut RgbImage, face: &FaceLandmarks) {
        let (w, h) = base.dimensions();
        let edges = self.topology.wireframe_edges(face, w, h);
        if edges.is_empty() {
            return;
        }
        let mut mask = GrayImage::new(w, h);
        for (a, b) in edge_segments(&edges, face, w, h) {
            draw_line_segment_mut(&mut mask, a, b, Luma([255]));
        }

        let alpha = self.style.wireframe_alpha;
        let color = self.style.wireframe_color;
        for (px, m) in base.pixels_mut().zip(mask.pixels()) {
            if m[0] == 0 {
                continue;
            }
            for c in 0..3 {
                let v = alpha * color[c] as f32 + (1.0 - alpha) * px[c] as f32;
                px[c] = v.round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    fn draw_contours(&self, base: &mut RgbImage, face: &FaceLandmarks) {
        let t = self.style.contour_thickness as i32;
        let shift = (t - 1) / 2;
        for (a, b) in edge_segments(&self.topology.contours, face, base.width(), base.height()) {
            for dy in 0..t {
                for dx in 0..t {
                    let (ox, oy) = ((dx - shift) as f32, (dy - shift) as f32);
                    draw_line_segment_mut(
                        base,
                        (a.0 + ox, a.1 + oy),
                        (b.0 + ox, b.1 + oy),
                        self.style.contour_color,
                    );
                }
            }
        }
    }

    fn draw_markers(
        &self,
        canvas: &mut RgbaImage,
        lb: &Letterbox,
        face: &FaceLandmarks,
        selection: &SelectionSet,
    ) -> Vec<RenderedLandmark> {
        let mut rendered = Vec::with_capacity(face.num_landmarks());
        for (index, p) in face.points.iter().enumerate() {
            let (x, y) = lb.map(*p);
            let color = if selection.contains(index) {
                self.style.selected_landmark_color
            } else {
                self.style.landmark_color
            };
            draw_filled_circle_mut(canvas, (x, y), self.style.landmark_radius, color);
            rendered.push(RenderedLandmark::new(x, y, index));
        }
        rendered
    }
}

fn black_canvas(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_pixel(w, h, Rgba([0, 0, 0, 255]))
}

/// Line endpoints in scaled-image pixels. Edges naming a landmark the face
/// does not have are skipped.
fn edge_segments<'a>(
    edges: &'a [Edge],
    face: &'a FaceLandmarks,
    w: u32,
    h: u32,
) -> impl Iterator<Item = ((f32, f32), (f32, f32))> + 'a {
    let px = move |p: crate::types::Point| ((p.x * w as f32).round(), (p.y * h as f32).round());
    edges.iter().filter_map(move |&(s, e)| {
        let a = face.get(s)?;
        let b = face.get(e)?;
        Some((px(a), px(b)))
    })
}
