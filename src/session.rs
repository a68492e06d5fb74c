//! Application state and user actions, independent of any GUI toolkit.
//!
//! A [`SelectorSession`] owns everything the picker needs between events:
//! the selection, the frame source, the detector, the latest detection and
//! the marker positions of the last render. Every user action is a method;
//! the toolkit only forwards events, draws [`RenderOutput`]s, shows the
//! status line and pops up [`Notice`]s.

use std::collections::VecDeque;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::config::Settings;
use crate::detector::LandmarkDetector;
use crate::error::{Error, Result};
use crate::export;
use crate::hit_test::nearest_landmark;
use crate::render::{Overlays, RenderOutput, RenderStyle, Renderer};
use crate::selection::{SelectionSet, DEFAULT_LANDMARK_INDICES};
use crate::source::{CaptureDevice, SourceController};
use crate::topology::MeshTopology;
use crate::types::{FaceLandmarks, RenderedLandmark};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A message the user has to acknowledge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub title: String,
    pub message: String,
}

impl Notice {
    fn new(severity: Severity, title: &str, message: impl Into<String>) -> Self {
        Self {
            severity,
            title: title.to_string(),
            message: message.into(),
        }
    }
}

/// What the current frame is, for status wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Image,
    Webcam,
}

pub struct SelectorSession<D: CaptureDevice> {
    selection: SelectionSet,
    source: SourceController<D>,
    detector: Option<Box<dyn LandmarkDetector>>,
    renderer: Renderer,
    overlays: Overlays,
    face: Option<FaceLandmarks>,
    frame_kind: FrameKind,
    rendered: Vec<RenderedLandmark>,
    status: String,
    notices: VecDeque<Notice>,
    dirty: bool,
    last_canvas: (u32, u32),
}

impl<D: CaptureDevice> SelectorSession<D> {
    pub fn new(
        settings: &Settings,
        detector: Option<Box<dyn LandmarkDetector>>,
        topology: MeshTopology,
    ) -> Self {
        let source = SourceController::new(
            Duration::from_millis(settings.capture.interval_ms),
            settings.capture.mirror,
            settings.image.max_dimension,
        );
        Self {
            selection: SelectionSet::new(),
            source,
            detector,
            renderer: Renderer::new(RenderStyle::from(&settings.display), topology),
            overlays: Overlays {
                wireframe: settings.display.show_wireframe,
                contours: settings.display.show_contours,
            },
            face: None,
            frame_kind: FrameKind::Image,
            rendered: Vec::new(),
            status: "Ready - Select a source to begin".to_string(),
            notices: VecDeque::new(),
            dirty: true,
            last_canvas: (0, 0),
        }
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    fn set_status(&mut self, msg: impl Into<String>) {
        self.status = msg.into();
        log::debug!("status: {}", self.status);
    }

    fn notify(&mut self, notice: Notice) {
        match notice.severity {
            Severity::Error => log::warn!("{}: {}", notice.title, notice.message),
            _ => log::info!("{}: {}", notice.title, notice.message),
        }
        self.notices.push_back(notice);
    }

    /// Notices raised since the last call, oldest first.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    // ---- sources ----

    /// Stop capture (if running) and show the image at `path`.
    pub fn load_image<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.source.stop_capture();
        let name = path
            .as_ref()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.as_ref().display().to_string());
        self.set_status(format!("Loading image: {name}..."));

        let loaded = self.source.load_image(path.as_ref()).map(|_| ());
        if let Err(e) = loaded {
            self.set_status(format!("Error loading image: {e}"));
            self.notify(Notice::new(Severity::Error, "Image Error", e.to_string()));
            return Err(e);
        }
        self.frame_kind = FrameKind::Image;
        if let Some(detector) = self.detector.as_mut() {
            detector.reset();
        }
        self.set_status("Processing face landmarks...");
        self.process_current_frame();
        Ok(())
    }

    /// Switch to live capture on an opened device, or report why it could
    /// not be opened.
    pub fn start_capture(&mut self, device: Result<D>) {
        match device {
            Ok(device) => {
                self.source.start_capture(device);
                if let Some(detector) = self.detector.as_mut() {
                    detector.reset();
                }
                self.frame_kind = FrameKind::Webcam;
                self.set_status("Webcam active");
            }
            Err(e) => {
                self.set_status(format!("Webcam error: {e}"));
                self.notify(Notice::new(Severity::Error, "Webcam Error", e.to_string()));
            }
        }
    }

    pub fn stop_capture(&mut self) {
        if self.source.stop_capture() {
            self.set_status("Webcam stopped");
        }
    }

    pub fn is_live(&self) -> bool {
        self.source.is_live()
    }

    pub fn next_capture_due(&self) -> Option<Instant> {
        self.source.next_due()
    }

    pub fn has_frame(&self) -> bool {
        self.source.current_frame().is_some()
    }

    /// Pull and process a camera frame if one is due. Returns whether a new
    /// frame was processed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let polled = self.source.poll(now).map(|frame| frame.is_some());
        match polled {
            Ok(true) => {
                self.process_current_frame();
                true
            }
            Ok(false) => false,
            Err(e) => {
                self.set_status("Error: Could not read frame from webcam");
                self.notify(Notice::new(Severity::Error, "Webcam Error", e.to_string()));
                self.dirty = true;
                false
            }
        }
    }

    /// Run the detector on the current frame and schedule a redraw.
    pub fn process_current_frame(&mut self) {
        self.face = None;
        self.rendered.clear();
        self.dirty = true;

        let Some(frame) = self.source.current_frame() else {
            return;
        };
        let Some(detector) = self.detector.as_mut() else {
            self.status = "No landmark model loaded".to_string();
            return;
        };

        match detector.detect(frame) {
            Ok(Some(face)) => {
                if self.frame_kind == FrameKind::Image {
                    self.status =
                        format!("Image loaded - {} landmarks detected", face.num_landmarks());
                }
                self.face = Some(face);
            }
            Ok(None) => {
                self.status = match self.frame_kind {
                    FrameKind::Image => "No face detected in the image",
                    FrameKind::Webcam => "No face detected in webcam view",
                }
                .to_string();
            }
            Err(e) => {
                log::warn!("detection failed: {e}");
                let what = match self.frame_kind {
                    FrameKind::Image => "image",
                    FrameKind::Webcam => "frame",
                };
                self.status = format!("Error processing {what}: {e}");
            }
        }
    }

    pub fn face(&self) -> Option<&FaceLandmarks> {
        self.face.as_ref()
    }

    // ---- rendering ----

    pub fn overlays(&self) -> Overlays {
        self.overlays
    }

    pub fn set_overlays(&mut self, overlays: Overlays) {
        if overlays != self.overlays {
            self.overlays = overlays;
            self.dirty = true;
        }
    }

    pub fn landmark_radius(&self) -> i32 {
        self.renderer.style.landmark_radius
    }

    /// Whether the canvas must be redrawn for a canvas of this size.
    pub fn needs_redraw(&self, canvas: (u32, u32)) -> bool {
        self.dirty || canvas != self.last_canvas
    }

    /// Draw the current frame on a canvas of the given size and remember
    /// where the markers went. `None` when there is no frame yet.
    pub fn render(&mut self, canvas: (u32, u32)) -> Option<RenderOutput> {
        self.dirty = false;
        self.last_canvas = canvas;
        let frame = self.source.current_frame()?;
        let out = self.renderer.render(
            frame,
            self.face.as_ref(),
            &self.selection,
            self.overlays,
            canvas,
        );
        self.rendered = out.landmarks.clone();
        Some(out)
    }

    pub fn rendered_landmarks(&self) -> &[RenderedLandmark] {
        &self.rendered
    }

    // ---- selection ----

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    /// Toggle the landmark under a canvas click, if any. Returns the toggled
    /// index.
    pub fn click(&mut self, x: i32, y: i32) -> Option<usize> {
        let index = nearest_landmark(x, y, &self.rendered, self.landmark_radius())?;
        self.toggle_landmark(index);
        Some(index)
    }

    pub fn toggle_landmark(&mut self, index: usize) -> bool {
        let selected = self.selection.toggle(index);
        log::debug!("landmark {index} {}", if selected { "selected" } else { "deselected" });
        self.selection_changed();
        selected
    }

    pub fn select_default(&mut self) {
        self.selection.select_default(&DEFAULT_LANDMARK_INDICES);
        self.selection_changed();
        self.set_status(format!("Selected {} default landmarks.", self.selection.len()));
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.selection_changed();
    }

    fn selection_changed(&mut self) {
        let count = self.selection.len();
        if count > 0 {
            self.set_status(format!("Selected {count} landmarks"));
        } else {
            self.set_status("No landmarks selected");
        }
        self.dirty = true;
    }

    pub fn sorted_indices(&self) -> Vec<usize> {
        self.selection.sorted_list()
    }

    pub fn listbox_labels(&self) -> Vec<String> {
        export::listbox_labels(&self.sorted_indices())
    }

    pub fn list_literal(&self) -> String {
        export::list_literal(&self.sorted_indices())
    }

    // ---- export ----

    /// Text to place on the clipboard, or `None` when nothing is selected.
    pub fn clipboard_text(&mut self) -> Option<String> {
        if self.selection.is_empty() {
            self.set_status("No landmarks selected to copy.");
            return None;
        }
        let text = self.list_literal();
        self.set_status(format!("Copied to clipboard: {text}"));
        self.notify(Notice::new(
            Severity::Info,
            "Clipboard",
            "Selected landmark list copied to clipboard!",
        ));
        Some(text)
    }

    /// Check there is something to save before asking for a file name.
    pub fn begin_save(&mut self) -> bool {
        if self.selection.is_empty() {
            self.notify(Notice::new(
                Severity::Info,
                "Nothing to Save",
                "No landmarks are currently selected",
            ));
            return false;
        }
        true
    }

    pub fn save_selection<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let indices = self.sorted_indices();
        match export::write_selection(path.as_ref(), &indices) {
            Ok(()) => {
                let name = path
                    .as_ref()
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.set_status(format!("Saved {} landmarks to {name}", indices.len()));
                Ok(())
            }
            Err(Error::EmptySelection) => {
                self.begin_save();
                Err(Error::EmptySelection)
            }
            Err(e) => {
                self.notify(Notice::new(
                    Severity::Error,
                    "Save Error",
                    format!("Error saving file: {e}"),
                ));
                Err(e)
            }
        }
    }

    /// Release the capture device before exit.
    pub fn shutdown(&mut self) {
        self.source.stop_capture();
    }
}
