//! PNG rendering implementation using Blitz and Vello.

use crate::config::Config;
use crate::error::{Error, Result};

#[cfg(feature = "png")]
use anyrender::render_to_buffer;
#[cfg(feature = "png")]
use anyrender_vello_cpu::VelloCpuImageRenderer;
#[cfg(feature = "png")]
use blitz_html::HtmlDocument;
#[cfg(feature = "png")]
use blitz_paint::paint_scene;

/// Paint a laid-out Blitz document and encode it as PNG bytes.
#[cfg(feature = "png")]
pub fn render_to_png(document: &HtmlDocument, config: &Config) -> Result<Vec<u8>> {
    let scale = config.scale as f64;
    let (render_width, render_height) = config.pixel_size();

    // Background comes from the page's body style
    let buffer = render_to_buffer::<VelloCpuImageRenderer, _>(
        |scene| {
            paint_scene(scene, document.as_ref(), scale, render_width, render_height);
        },
        render_width,
        render_height,
    );

    let expected = render_width as usize * render_height as usize * 4;
    if buffer.len() != expected {
        return Err(Error::PngRender(format!(
            "renderer returned {} bytes, expected {expected}",
            buffer.len()
        )));
    }

    encode_png(&buffer, render_width, render_height)
}

/// Encode RGBA buffer to PNG bytes.
#[cfg(feature = "png")]
fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let mut output = Vec::new();

    {
        let mut encoder = png::Encoder::new(&mut output, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(png::Compression::Default);

        let mut writer = encoder
            .write_header()
            .map_err(|e| Error::PngEncode(e.to_string()))?;

        writer
            .write_image_data(buffer)
            .map_err(|e| Error::PngEncode(e.to_string()))?;
    }

    Ok(output)
}

#[cfg(not(feature = "png"))]
pub fn render_to_png(
    _document: &blitz_html::HtmlDocument,
    _config: &Config,
) -> Result<Vec<u8>> {
    Err(Error::FormatNotEnabled("png"))
}

#[cfg(all(test, feature = "png"))]
mod tests {
    use super::*;

    #[test]
    fn test_encode_png_signature() {
        let bytes = encode_png(&[255, 0, 0, 255], 1, 1).unwrap();
        assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[test]
    fn test_encode_png_rejects_short_buffer() {
        assert!(matches!(
            encode_png(&[0, 0, 0], 1, 1),
            Err(Error::PngEncode(_))
        ));
    }
}
