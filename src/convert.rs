//! Batch conversion of a directory of chart documents.
//!
//! Each `*.html` file is paired with a `*.png` of the same base name in the
//! same directory. A pair is converted when the image is missing or not
//! strictly newer than the document; every file is attempted exactly once
//! and a failure on one file never stops the others.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::figure::{has_figure_marker, Figure};
use crate::render::render_figure;

/// Directory scanned by the command-line tool, relative to the working directory.
pub const DEFAULT_FIGURES_DIR: &str = "../RESULTS/figures";

/// Extension of chart documents.
pub const INPUT_EXTENSION: &str = "html";

/// Extension of rendered images.
pub const OUTPUT_EXTENSION: &str = "png";

/// What happened to one discovered chart document.
#[derive(Debug)]
pub enum FileStatus {
    /// The image was already newer than the document.
    UpToDate,
    /// The image was (re)written.
    Converted,
    /// Conversion was attempted and failed.
    Failed(Error),
}

/// The outcome for one input/output pair.
#[derive(Debug)]
pub struct FileReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub status: FileStatus,
}

/// Per-file results of one run.
#[derive(Debug, Default)]
pub struct Summary {
    pub files: Vec<FileReport>,
}

impl Summary {
    /// Number of chart documents found.
    pub fn discovered(&self) -> usize {
        self.files.len()
    }

    pub fn converted(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Converted))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Failed(_)))
    }

    /// Number of documents skipped as already up to date.
    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::UpToDate))
    }

    /// Reports of the files that failed.
    pub fn failures(&self) -> impl Iterator<Item = &FileReport> {
        self.files
            .iter()
            .filter(|f| matches!(f.status, FileStatus::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&FileStatus) -> bool) -> usize {
        self.files.iter().filter(|f| pred(&f.status)).count()
    }
}

/// Convert every stale chart document in `dir`.
///
/// # Errors
///
/// Only the two early-abort conditions are errors:
/// [`Error::DirectoryNotFound`] and [`Error::NoInputFiles`]. Per-file
/// failures are recorded in the returned [`Summary`].
///
/// # Example
///
/// ```rust,no_run
/// use chart2png::{run, Config};
///
/// let summary = run("../RESULTS/figures".as_ref(), &Config::default())?;
/// println!("Successfully converted: {}", summary.converted());
/// # Ok::<(), chart2png::Error>(())
/// ```
pub fn run(dir: &Path, config: &Config) -> Result<Summary> {
    let inputs = discover(dir)?;
    info!("Found {} HTML files to convert...", inputs.len());

    let mut summary = Summary::default();
    for input in inputs {
        let output = output_path(&input);
        let status = if !needs_conversion(&input) {
            FileStatus::UpToDate
        } else {
            match convert_one(&input, &output, config) {
                Ok(()) => FileStatus::Converted,
                Err(e) => {
                    match &e {
                        Error::MarkerNotFound { .. } => warn!("{e}"),
                        _ => warn!("Error converting {}: {e}", display_name(&input)),
                    }
                    FileStatus::Failed(e)
                }
            }
        };
        summary.files.push(FileReport {
            input,
            output,
            status,
        });
    }
    Ok(summary)
}

/// List the chart documents in `dir`, sorted by path.
pub fn discover(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::DirectoryNotFound {
            dir: dir.to_path_buf(),
        });
    }

    let mut inputs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == INPUT_EXTENSION) {
            inputs.push(path);
        }
    }
    if inputs.is_empty() {
        return Err(Error::NoInputFiles {
            dir: dir.to_path_buf(),
        });
    }

    inputs.sort();
    Ok(inputs)
}

/// The image path for a chart document: same directory and base name.
pub fn output_path(input: &Path) -> PathBuf {
    input.with_extension(OUTPUT_EXTENSION)
}

/// Whether `input` has no image yet or its image is not strictly newer.
///
/// Equal modification times count as stale. Unreadable timestamps also
/// count as stale; a vanished input then fails in [`convert_one`].
pub fn needs_conversion(input: &Path) -> bool {
    let output = output_path(input);
    match (modified(input), modified(&output)) {
        (Some(src), Some(dst)) if dst > src => {
            info!("PNG already up to date: {}", display_name(&output));
            false
        }
        (_, None) => {
            debug!("{} has no image yet", display_name(input));
            true
        }
        _ => true,
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Convert one chart document into a PNG image at `output`.
///
/// The image is fully rendered in memory, written to a temporary file next
/// to `output` and renamed over it, so a failure at any step leaves an
/// existing image untouched.
pub fn convert_one(input: &Path, output: &Path, config: &Config) -> Result<()> {
    let html = fs::read_to_string(input).map_err(|source| Error::Read {
        path: input.to_path_buf(),
        source,
    })?;

    if !has_figure_marker(&html) {
        return Err(Error::MarkerNotFound {
            path: input.to_path_buf(),
        });
    }

    let figure = Figure::from_html(&html)?;
    let png = render_figure(&figure, config)?;
    write_replacing(output, &png).map_err(|source| Error::Write {
        path: output.to_path_buf(),
        source,
    })?;

    info!(
        "Converted {} -> {}",
        display_name(input),
        display_name(output)
    );
    Ok(())
}

/// Replace `path` with `bytes` through a sibling temporary file.
fn write_replacing(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
