//! Text representations of a selection.
//!
//! Every function takes the already-sorted index list so all views agree on
//! order. The file layout produced by [`document`] is read by downstream
//! scripts and must not change:
//!
//! ```text
//! 1
//! 3
//! 5
//!
//! # Comma-separated format:
//! 1, 3, 5
//!
//! # Python list format:
//! [1, 3, 5]
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{Error, Result};

/// One index per line, each line terminated by `\n`.
pub fn lines(indices: &[usize]) -> String {
    indices.iter().map(|i| format!("{i}\n")).collect()
}

/// Indices joined with `", "` on a single line.
pub fn comma_separated(indices: &[usize]) -> String {
    indices
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Bracketed list literal, e.g. `[1, 3, 5]`.
pub fn list_literal(indices: &[usize]) -> String {
    format!("[{}]", comma_separated(indices))
}

/// Row labels for the selection list view.
pub fn listbox_labels(indices: &[usize]) -> Vec<String> {
    indices.iter().map(|i| format!("Landmark {i}")).collect()
}

/// Full export file content.
pub fn document(indices: &[usize]) -> String {
    let mut s = lines(indices);
    s.push_str("\n# Comma-separated format:\n");
    s.push_str(&comma_separated(indices));
    s.push_str("\n\n# Python list format:\n");
    s.push_str(&list_literal(indices));
    s
}

/// Write the export file. Refuses to write an empty selection.
///
/// A failed write may leave a partial file behind.
pub fn write_selection<P: AsRef<Path>>(path: P, indices: &[usize]) -> Result<()> {
    if indices.is_empty() {
        return Err(Error::EmptySelection);
    }
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    writer.write_all(document(indices).as_bytes())?;
    writer.flush()?;
    log::info!(
        "wrote {} landmark indices to {}",
        indices.len(),
        path.as_ref().display()
    );
    Ok(())
}
