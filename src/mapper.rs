//! Mapping from detector-normalized coordinates to canvas pixels.
//!
//! The source image is scaled uniformly to fit the canvas and centered,
//! leaving symmetric padding on one axis (letterboxing).

use crate::types::Point;

/// Uniform fit of an image inside a canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    /// Scale factor applied to both axes.
    pub scale: f64,
    /// Scaled image width in canvas pixels.
    pub scaled_width: u32,
    /// Scaled image height in canvas pixels.
    pub scaled_height: u32,
    pub offset_x: i32,
    pub offset_y: i32,
}

impl Letterbox {
    /// Fit a `image_w x image_h` image into a `canvas_w x canvas_h` canvas.
    ///
    /// `None` when any side is zero. [`CanvasLayout::compute`] also covers
    /// the canvas that is not laid out yet.
    pub fn fit(image_w: u32, image_h: u32, canvas_w: u32, canvas_h: u32) -> Option<Self> {
        if image_w == 0 || image_h == 0 || canvas_w == 0 || canvas_h == 0 {
            return None;
        }
        let scale = (canvas_w as f64 / image_w as f64).min(canvas_h as f64 / image_h as f64);
        let scaled_width = ((image_w as f64 * scale).round() as u32).clamp(1, canvas_w);
        let scaled_height = ((image_h as f64 * scale).round() as u32).clamp(1, canvas_h);
        Some(Self {
            scale,
            scaled_width,
            scaled_height,
            offset_x: (canvas_w - scaled_width) as i32 / 2,
            offset_y: (canvas_h - scaled_height) as i32 / 2,
        })
    }

    /// Canvas pixel position of a normalized landmark.
    pub fn map(&self, p: Point) -> (i32, i32) {
        let x = (p.x as f64 * self.scaled_width as f64).round() as i32 + self.offset_x;
        let y = (p.y as f64 * self.scaled_height as f64).round() as i32 + self.offset_y;
        (x, y)
    }

    /// Whether a canvas pixel lies on the scaled image, borders included.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.offset_x
            && x <= self.offset_x + self.scaled_width as i32
            && y >= self.offset_y
            && y <= self.offset_y + self.scaled_height as i32
    }
}

/// How an image is placed on the canvas for one render cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CanvasLayout {
    /// Image has no pixels; nothing is drawn.
    Empty,
    /// Canvas not laid out yet; image drawn at native size, no overlays.
    Native,
    Letterboxed(Letterbox),
}

impl CanvasLayout {
    pub fn compute(image_w: u32, image_h: u32, canvas_w: u32, canvas_h: u32) -> Self {
        if image_w == 0 || image_h == 0 {
            return CanvasLayout::Empty;
        }
        if canvas_w <= 1 || canvas_h <= 1 {
            return CanvasLayout::Native;
        }
        Letterbox::fit(image_w, image_h, canvas_w, canvas_h)
            .map_or(CanvasLayout::Native, CanvasLayout::Letterboxed)
    }
}
