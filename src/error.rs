//! Error types for chart2png.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for chart2png operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while converting chart documents.
///
/// `DirectoryNotFound` and `NoInputFiles` end a run before any file is
/// touched. Every other variant describes a single file and is recorded in
/// the run [`Summary`](crate::Summary) instead of aborting the batch.
#[derive(Debug, Error)]
pub enum Error {
    /// The figures directory does not exist.
    #[error("{} directory not found", .dir.display())]
    DirectoryNotFound { dir: PathBuf },

    /// The figures directory contains no chart documents.
    #[error("No HTML files found in {}", .dir.display())]
    NoInputFiles { dir: PathBuf },

    /// The chart document could not be opened or is not valid UTF-8.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The chart document carries no recognizable figure data.
    #[error("Could not extract figure data from {}", file_name(.path))]
    MarkerNotFound { path: PathBuf },

    /// No `Plotly.newPlot` call was found while reconstructing the figure.
    #[error("no Plotly.newPlot call found in document")]
    FigureNotFound,

    /// The embedded figure description is malformed.
    #[error("invalid figure data: {0}")]
    FigureParse(String),

    /// Every trace in the figure is of a type that cannot be drawn.
    #[error("figure has no drawable traces (unsupported trace types: {})", .kinds.join(", "))]
    UnsupportedFigure { kinds: Vec<String> },

    /// Invalid export configuration.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// The requested output format feature is not enabled.
    #[error("output format '{0}' is not enabled; enable the '{0}' feature in Cargo.toml")]
    FormatNotEnabled(&'static str),

    /// Failed to render to PNG format.
    #[error("PNG rendering failed: {0}")]
    PngRender(String),

    /// Failed to encode PNG image.
    #[error("PNG encoding failed: {0}")]
    PngEncode(String),

    /// The rendered image could not be written.
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_not_found_names_the_file_only() {
        let err = Error::MarkerNotFound {
            path: PathBuf::from("some/dir/c.html"),
        };
        assert_eq!(err.to_string(), "Could not extract figure data from c.html");
    }

    #[test]
    fn unsupported_figure_lists_trace_types() {
        let err = Error::UnsupportedFigure {
            kinds: vec!["heatmap".into(), "pie".into()],
        };
        assert_eq!(
            err.to_string(),
            "figure has no drawable traces (unsupported trace types: heatmap, pie)"
        );
    }

    #[test]
    fn directory_not_found_mentions_directory() {
        let err = Error::DirectoryNotFound {
            dir: PathBuf::from("../RESULTS/figures"),
        };
        assert_eq!(err.to_string(), "../RESULTS/figures directory not found");
    }
}
