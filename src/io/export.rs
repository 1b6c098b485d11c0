//! Export a rendered view to JSON.
//!
//! The file holds the view title, each panel's derived table, and the chart
//! artifact, so it can be replotted by any tool without reloading the dataset.

use std::fs::File;
use std::path::Path;

use tracing::info;

use crate::error::AppError;
use crate::view::RenderedView;

/// Write a rendered view as pretty-printed JSON.
pub fn write_view_json(path: &Path, view: &RenderedView) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create export JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, view)
        .map_err(|e| AppError::io(format!("Failed to write export JSON: {e}")))?;

    info!(path = %path.display(), view = view.kind.slug(), "exported view");
    Ok(())
}
