//! CLI output formatting for each command.
//!
//! Every command prints the source first, then indented context lines:
//!
//! ```text
//! Cropped IMG_0042.jpg → /tmp/image_crop_k3Jd9a.jpg
//!     Region: (0.25, 0.25) to (0.75, 0.75) at 1x
//!     Output: 400x300
//!
//! Sampled IMG_0042.jpg → /tmp/image_crop_Qx81mZ.jpg
//!     Bounds: 1000x1000
//!     Output: 1333x1000
//!
//! IMG_0042.jpg
//!     Display: 3000x4000
//! ```
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::imaging::{CropRegion, DisplayDimensions};
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// The file name alone, or the whole path when there is none.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn dimensions_line(label: &str, dims: Option<DisplayDimensions>) -> String {
    match dims {
        Some(d) => format!("{}{}: {}x{}", indent(1), label, d.width, d.height),
        None => format!("{}{}: unknown", indent(1), label),
    }
}

pub fn format_crop_output(
    source: &Path,
    region: &CropRegion,
    output: &Path,
    dims: Option<DisplayDimensions>,
) -> Vec<String> {
    vec![
        format!("Cropped {} → {}", display_name(source), output.display()),
        format!(
            "{}Region: ({}, {}) to ({}, {}) at {}x",
            indent(1),
            region.left(),
            region.top(),
            region.right(),
            region.bottom(),
            region.scale()
        ),
        dimensions_line("Output", dims),
    ]
}

pub fn print_crop_output(
    source: &Path,
    region: &CropRegion,
    output: &Path,
    dims: Option<DisplayDimensions>,
) {
    for line in format_crop_output(source, region, output, dims) {
        println!("{}", line);
    }
}

pub fn format_sample_output(
    source: &Path,
    bounds: (u32, u32),
    output: &Path,
    dims: Option<DisplayDimensions>,
) -> Vec<String> {
    vec![
        format!("Sampled {} → {}", display_name(source), output.display()),
        format!("{}Bounds: {}x{}", indent(1), bounds.0, bounds.1),
        dimensions_line("Output", dims),
    ]
}

pub fn print_sample_output(
    source: &Path,
    bounds: (u32, u32),
    output: &Path,
    dims: Option<DisplayDimensions>,
) {
    for line in format_sample_output(source, bounds, output, dims) {
        println!("{}", line);
    }
}

pub fn format_options_output(source: &Path, dims: DisplayDimensions) -> Vec<String> {
    vec![
        display_name(source),
        dimensions_line("Display", Some(dims)),
    ]
}

pub fn print_options_output(source: &Path, dims: DisplayDimensions) {
    for line in format_options_output(source, dims) {
        println!("{}", line);
    }
}
