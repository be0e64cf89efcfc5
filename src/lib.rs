//! # chart2png
//!
//! Convert interactive Plotly HTML charts into static PNG images without a
//! browser.
//!
//! Chart documents written by Plotly's HTML export embed their figure as the
//! arguments of a `Plotly.newPlot(...)` call. This crate recovers that figure,
//! draws it as an SVG chart, and rasterizes the result through the
//! [Blitz](https://github.com/DioxusLabs/blitz) HTML engine.
//!
//! ## Batch conversion
//!
//! ```rust,no_run
//! use chart2png::{run, Config};
//!
//! let summary = run("../RESULTS/figures".as_ref(), &Config::default())?;
//! println!("Successfully converted: {}", summary.converted());
//! println!("Failed: {}", summary.failed());
//! # Ok::<(), chart2png::Error>(())
//! ```
//!
//! Documents whose PNG is already strictly newer are skipped; a failure on
//! one document is recorded in the [`Summary`] and the run moves on.
//!
//! ## Single figure
//!
//! ```rust,no_run
//! use chart2png::{render_figure, Config, Figure};
//!
//! let html = std::fs::read_to_string("chart.html")?;
//! let figure = Figure::from_html(&html)?;
//!
//! // 1200 x 800 at scale 2 by default
//! let png = render_figure(&figure, &Config::default())?;
//! std::fs::write("chart.png", png)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod config;
mod convert;
mod error;
pub mod figure;
mod render;

pub use config::Config;
pub use convert::{
    convert_one, discover, needs_conversion, output_path, run, FileReport, FileStatus, Summary,
    DEFAULT_FIGURES_DIR, INPUT_EXTENSION, OUTPUT_EXTENSION,
};
pub use error::{Error, Result};
pub use figure::{has_figure_marker, Figure};
pub use render::{render_figure, render_html};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = Config::new().width(1920).height(1080).scale(1.5);

        assert_eq!(config.width, 1920);
        assert_eq!(config.height, 1080);
        assert_eq!(config.scale, 1.5);
    }

    #[test]
    fn test_default_config_is_export_size() {
        let config = Config::default();
        assert_eq!(config.width, 1200);
        assert_eq!(config.height, 800);
        assert_eq!(config.scale, 2.0);
    }

    #[test]
    fn test_config_validation_zero_width() {
        let config = Config::new().width(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_height() {
        let config = Config::new().height(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_scale() {
        let config = Config::new().scale(0.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_negative_scale() {
        let config = Config::new().scale(-1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_valid() {
        let config = Config::new()
            .width(Config::MIN_DIMENSION)
            .height(Config::MIN_DIMENSION)
            .scale(1.0);
        assert!(config.validate().is_ok());
    }
}
