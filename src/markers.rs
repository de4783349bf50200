//! Printable QR markers, one per graph node
//!
//! Each marker encodes the bare node id, which is exactly the payload the
//! scanner hands to the navigator.

use std::path::{Path, PathBuf};

use qrcode::render::svg;
use qrcode::types::QrError;
use qrcode::{EcLevel, QrCode};
use thiserror::Error;
use tracing::info;

use crate::graph::Graph;

/// Pixel size of one QR module
const MODULE_PX: u32 = 10;

/// Errors from marker generation
#[derive(Debug, Error)]
pub enum MarkerError {
    #[error("failed to encode marker {id}: {source}")]
    Encode {
        id: String,
        #[source]
        source: QrError,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// File name of the marker for `id`
pub fn file_name(id: &str) -> String {
    format!("qr_{id}.svg")
}

/// Render one marker as an SVG document
pub fn render(id: &str) -> Result<String, MarkerError> {
    let code = QrCode::with_error_correction_level(id, EcLevel::L).map_err(|source| {
        MarkerError::Encode {
            id: id.to_string(),
            source,
        }
    })?;

    Ok(code
        .render::<svg::Color>()
        .module_dimensions(MODULE_PX, MODULE_PX)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .build())
}

/// Write a marker for every node of `graph` into `dir`
///
/// Returns the written paths in node declaration order.
pub fn write_all(graph: &Graph, dir: &Path) -> Result<Vec<PathBuf>, MarkerError> {
    std::fs::create_dir_all(dir).map_err(|source| MarkerError::Write {
        path: dir.to_owned(),
        source,
    })?;

    let mut written = Vec::with_capacity(graph.len());
    for id in graph.node_ids() {
        let path = dir.join(file_name(id));
        let image = render(id)?;
        std::fs::write(&path, image).map_err(|source| MarkerError::Write {
            path: path.clone(),
            source,
        })?;
        info!(id, path = %path.display(), "marker written");
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::sample;

    #[test]
    fn test_one_marker_per_node() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("qr_codes");
        let graph = sample::campus();

        let written = write_all(&graph, &out).unwrap();
        assert_eq!(written.len(), graph.len());
        assert_eq!(written[0], out.join("qr_N1.svg"));

        let mut files: Vec<_> = std::fs::read_dir(&out)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        files.sort();
        let mut expected: Vec<_> = graph.node_ids().map(file_name).collect();
        expected.sort();
        assert_eq!(files, expected);
    }

    #[test]
    fn test_render_is_svg() {
        let image = render("N6").unwrap();
        assert!(image.contains("<svg"));
        assert!(image.contains("#000000"));
    }

    #[test]
    fn test_unwritable_dir() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("taken");
        std::fs::write(&blocker, b"").unwrap();

        let err = write_all(&sample::campus(), &blocker).unwrap_err();
        assert!(matches!(err, MarkerError::Write { .. }));
    }
}
