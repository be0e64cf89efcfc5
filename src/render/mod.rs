//! Rasterizing figures through the Blitz HTML engine.
//!
//! A figure is drawn as inline SVG inside a minimal HTML page, with its text
//! as positioned HTML over the SVG; the page is parsed, styled and laid out
//! by Blitz and painted to an RGBA buffer by `anyrender_vello_cpu`.

mod png;

use blitz_dom::DocumentConfig;
use blitz_html::HtmlDocument;
use blitz_traits::shell::{ColorScheme, Viewport};
use tracing::debug;

use crate::config::Config;
use crate::error::Result;
use crate::figure::Figure;

/// Render a figure to PNG bytes.
///
/// The figure is drawn at `config.width` x `config.height` and rasterized at
/// `config.scale`, so the image is `(width * scale) x (height * scale)` pixels.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFigure`](crate::Error::UnsupportedFigure) if
/// none of the figure's traces can be drawn, or any error of [`render_html`].
///
/// # Example
///
/// ```rust,no_run
/// use chart2png::{render_figure, Config, Figure};
///
/// let html = std::fs::read_to_string("chart.html")?;
/// let figure = Figure::from_html(&html)?;
/// let png = render_figure(&figure, &Config::default())?;
/// std::fs::write("chart.png", png)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn render_figure(figure: &Figure, config: &Config) -> Result<Vec<u8>> {
    config.validate()?;
    figure.ensure_drawable()?;
    let chart = figure.to_html(config.width, config.height);
    render_html(&figure_page(&chart, config), config)
}

/// Render an HTML page to PNG bytes.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, rendering or encoding
/// fails, or the `png` feature is disabled.
pub fn render_html(html: &str, config: &Config) -> Result<Vec<u8>> {
    config.validate()?;

    let mut document = create_document(html, config);

    // Resolve styles and compute layout
    document.resolve(0.0);

    let (width, height) = config.pixel_size();
    debug!(width, height, "painting page");
    png::render_to_png(&document, config)
}

/// Wrap a drawn figure in a page sized exactly to it.
fn figure_page(chart: &str, config: &Config) -> String {
    format!(
        "<!DOCTYPE html><html><head><style>\
         html, body {{ margin: 0; padding: 0; overflow: hidden; }}\
         body {{ background: {}; width: {}px; height: {}px; }}\
         svg {{ display: block; }}\
         </style></head><body>{chart}</body></html>",
        config.background_css(),
        config.width,
        config.height,
    )
}

/// Create and configure a Blitz document from HTML.
fn create_document(html: &str, config: &Config) -> HtmlDocument {
    let viewport = Viewport::new(config.width, config.height, config.scale, ColorScheme::Light);

    let doc_config = DocumentConfig {
        viewport: Some(viewport),
        ..Default::default()
    };

    HtmlDocument::from_html(html, doc_config)
}
