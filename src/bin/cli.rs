//! CLI application for face-mesh landmark detection and index export.
//!
//! Usage:
//!   mesh-picker <image>                                   # Summary
//!   mesh-picker <image> --json                            # JSON output
//!   mesh-picker <image> --select default --export out.txt # Write index file
//!   mesh-picker <image> --select 1,33,263 --render out.png --canvas 800x600

use clap::Parser;
use mesh_picker::detector::LandmarkDetector;
use mesh_picker::mesh::FaceMesh;
use mesh_picker::source::load_image_file;
use mesh_picker::{
    export, MeshTopology, Overlays, RenderStatus, RenderStyle, Renderer, SelectionSet, Settings,
    DEFAULT_LANDMARK_INDICES,
};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mesh-picker")]
#[command(
    author,
    version,
    about = "Face-mesh landmark detection and index export",
    long_about = None
)]
struct Args {
    /// Input image file
    #[arg(required = true)]
    image: PathBuf,

    /// Settings file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Landmarks to select: `default` or a comma list such as 1,33,263
    #[arg(short, long)]
    select: Option<String>,

    /// Render the overlay to this PNG file
    #[arg(short, long)]
    render: Option<PathBuf>,

    /// Canvas size for --render, WIDTHxHEIGHT
    #[arg(long, default_value = "640x480", value_parser = parse_canvas)]
    canvas: (u32, u32),

    /// Write the selected indices to this file
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Output as JSON
    #[arg(short, long)]
    json: bool,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct Output {
    image: String,
    width: u32,
    height: u32,
    face_detected: bool,
    landmark_count: usize,
    selected: Vec<usize>,
    /// Selected indices the detected face does not have
    out_of_range: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rendered: Option<RenderOutput>,
}

#[derive(Serialize)]
struct RenderOutput {
    path: String,
    canvas_width: u32,
    canvas_height: u32,
    markers_drawn: usize,
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load_or_default(args.config.as_deref())?;

    let selection = match args.select.as_deref() {
        Some(list) => parse_selection(list)?,
        None => SelectionSet::new(),
    };

    log::info!("loading face mesh detector");
    let mut detector = FaceMesh::new(&settings.detector)?;

    let img = load_image_file(&args.image, settings.image.max_dimension)?;
    let (width, height) = img.dimensions();

    let face = detector.detect(&img)?;
    let landmark_count = face.as_ref().map_or(0, |f| f.num_landmarks());
    log::info!("{} landmarks detected", landmark_count);

    let selected = selection.sorted_list();
    let out_of_range = selected
        .iter()
        .copied()
        .filter(|&i| i >= landmark_count)
        .collect();

    let rendered = match &args.render {
        Some(path) => {
            let topology = MeshTopology::load_or_default(settings.detector.tesselation.as_deref());
            let renderer = Renderer::new(RenderStyle::from(&settings.display), topology);
            let overlays = Overlays {
                wireframe: settings.display.show_wireframe,
                contours: settings.display.show_contours,
            };
            let out = renderer.render(&img, face.as_ref(), &selection, overlays, args.canvas);
            out.canvas.save(path)?;
            let markers_drawn = match out.status {
                RenderStatus::Landmarks(n) => n,
                _ => 0,
            };
            Some(RenderOutput {
                path: path.display().to_string(),
                canvas_width: out.canvas.width(),
                canvas_height: out.canvas.height(),
                markers_drawn,
            })
        }
        None => None,
    };

    if let Some(path) = &args.export {
        export::write_selection(path, &selected)?;
    }

    let output = Output {
        image: args.image.display().to_string(),
        width,
        height,
        face_detected: face.is_some(),
        landmark_count,
        selected,
        out_of_range,
        rendered,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", format_human_readable(&output, args.export.as_ref()));
    }

    Ok(())
}

fn parse_canvas(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let w: u32 = w.trim().parse().map_err(|e| format!("bad width: {e}"))?;
    let h: u32 = h.trim().parse().map_err(|e| format!("bad height: {e}"))?;
    if w == 0 || h == 0 {
        return Err("canvas sides must be positive".into());
    }
    Ok((w, h))
}

fn parse_selection(list: &str) -> Result<SelectionSet, String> {
    if list.trim().eq_ignore_ascii_case("default") {
        let mut selection = SelectionSet::new();
        selection.select_default(&DEFAULT_LANDMARK_INDICES);
        return Ok(selection);
    }
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .map_err(|e| format!("bad landmark index '{s}': {e}"))
        })
        .collect()
}

fn format_human_readable(output: &Output, export: Option<&PathBuf>) -> String {
    let mut s = String::new();

    s.push_str(&format!("Image: {} ({}x{})\n", output.image, output.width, output.height));
    if output.face_detected {
        s.push_str(&format!("Landmarks: {} points\n", output.landmark_count));
    } else {
        s.push_str("\nNo face detected in the image\n");
    }

    if output.selected.is_empty() {
        s.push_str("No landmarks selected\n");
    } else {
        s.push_str(&format!("Selected {} landmarks\n", output.selected.len()));
        s.push_str(&format!("  {}\n", export::list_literal(&output.selected)));
    }
    if !output.out_of_range.is_empty() {
        s.push_str(&format!(
            "  Not on this face: {}\n",
            export::comma_separated(&output.out_of_range)
        ));
    }

    if let Some(r) = &output.rendered {
        s.push_str(&format!(
            "Rendered {}x{} canvas to {} ({} markers)\n",
            r.canvas_width, r.canvas_height, r.path, r.markers_drawn
        ));
    }
    if let Some(path) = export {
        s.push_str(&format!("Saved {} landmarks to {}\n", output.selected.len(), path.display()));
    }

    s
}
